//! Tool-protocol adapter.
//!
//! A request names an operation and carries a parameter object:
//!
//! ```json
//! {"operation": "generate_sprite", "params": {"concept": "pixel art fire pet idle animation"}}
//! ```
//!
//! The reply is either `{"ok": true, "result": {...}}` or
//! `{"ok": false, "error": {"code": N, "message": "..."}}`, with codes taken
//! from JSON-RPC. Pipeline options in `params` use the same camelCase keys
//! as [`PipelineConfig`] and override the dispatcher's defaults.

use std::fmt;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::export::{encode_png, write_artifacts, AnimationMetadata, CodeBinding};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineResult, SetType, MAX_PADDING, MAX_UPSCALE};
use crate::validation::ValidationResult;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Operations the protocol declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateSprite,
    GenerateAssetSet,
    TransferMotion,
    ScanProject,
    SuggestAssets,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::GenerateSprite,
        Operation::GenerateAssetSet,
        Operation::TransferMotion,
        Operation::ScanProject,
        Operation::SuggestAssets,
    ];

    pub fn from_name(name: &str) -> Option<Operation> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::GenerateSprite => "generate_sprite",
            Operation::GenerateAssetSet => "generate_asset_set",
            Operation::TransferMotion => "transfer_motion",
            Operation::ScanProject => "scan_project",
            Operation::SuggestAssets => "suggest_assets",
        }
    }

    /// Whether this dispatcher can serve the operation.
    pub fn is_served(self) -> bool {
        matches!(self, Operation::GenerateSprite | Operation::GenerateAssetSet)
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::GenerateSprite => "Generate a sprite or animation from a text concept",
            Operation::GenerateAssetSet => "Generate a set of related sprites sharing one base concept",
            Operation::TransferMotion => "Retarget motion from a reference animation onto a sprite",
            Operation::ScanProject => "Scan a game project for existing assets",
            Operation::SuggestAssets => "Suggest assets a project is missing",
        }
    }

    /// JSON schema of the parameter object.
    pub fn schema(self) -> Value {
        match self {
            Operation::GenerateSprite => json!({
                "type": "object",
                "required": ["concept"],
                "properties": with_config_properties(json!({
                    "concept": {"type": "string", "maxLength": crate::concept::MAX_CONCEPT_LEN},
                    "outputDir": {"type": "string"}
                }))
            }),
            Operation::GenerateAssetSet => json!({
                "type": "object",
                "required": ["concept", "setType"],
                "properties": with_config_properties(json!({
                    "concept": {"type": "string", "maxLength": crate::concept::MAX_CONCEPT_LEN},
                    "setType": {"enum": ["directional", "animation", "color-variants"]},
                    "outputDir": {"type": "string"}
                }))
            }),
            Operation::TransferMotion => json!({
                "type": "object",
                "required": ["source", "target"],
                "properties": {
                    "source": {"type": "string"},
                    "target": {"type": "string"}
                }
            }),
            Operation::ScanProject => json!({
                "type": "object",
                "required": ["path"],
                "properties": {"path": {"type": "string"}}
            }),
            Operation::SuggestAssets => json!({
                "type": "object",
                "required": ["path"],
                "properties": {
                    "path": {"type": "string"},
                    "limit": {"type": "integer", "minimum": 1}
                }
            }),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn with_config_properties(mut properties: Value) -> Value {
    let config = json!({
        "enablePostProcessing": {"type": "boolean", "default": true},
        "enableValidation": {"type": "boolean", "default": true},
        "enableExport": {"type": "boolean", "default": true},
        "targetEngine": {"type": "string"},
        "allowBackend": {"type": "boolean", "default": true},
        "upscale": {"type": "integer", "minimum": 1, "maximum": MAX_UPSCALE, "default": 1},
        "upscaler": {"enum": ["nearest", "smooth"]},
        "layout": {"type": "string", "pattern": "^(horizontal|row|grid:[1-9][0-9]*)$"},
        "padding": {"type": "integer", "minimum": 0, "maximum": MAX_PADDING},
        "fit": {"enum": ["contain", "stretch"]},
        "anchor": {"enum": ["center", "bottom"]},
        "timeoutMs": {"type": "integer", "minimum": 1}
    });
    if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), config) {
        target.extend(extra);
    }
    properties
}

/// An incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub operation: String,
    #[serde(default)]
    pub params: Value,
}

/// Structured failure returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolError {
    pub code: i64,
    pub message: String,
}

impl ToolError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl Response {
    fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn failure(error: ToolError) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpriteParams {
    concept: String,
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetParams {
    concept: String,
    set_type: SetType,
    output_dir: Option<PathBuf>,
}

/// Routes requests to the pipeline.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pipeline: Pipeline,
    defaults: PipelineConfig,
}

impl Dispatcher {
    pub fn new(pipeline: Pipeline, defaults: PipelineConfig) -> Self {
        Self { pipeline, defaults }
    }

    /// Every declared operation with its schema.
    pub fn describe(&self) -> Value {
        let operations: Vec<Value> = Operation::ALL
            .into_iter()
            .map(|op| {
                json!({
                    "name": op.name(),
                    "description": op.description(),
                    "available": op.is_served(),
                    "params": op.schema(),
                })
            })
            .collect();
        json!({ "operations": operations })
    }

    /// Parse one JSON request and return the serialised response.
    pub fn handle_json(&self, input: &str) -> String {
        let response = match serde_json::from_str::<Request>(input) {
            Ok(request) => self.handle(&request),
            Err(e) => Response::failure(ToolError::new(PARSE_ERROR, format!("malformed request: {}", e))),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"ok":false,"error":{{"code":{},"message":"could not serialise response: {}"}}}}"#,
                INTERNAL_ERROR,
                e.to_string().replace('"', "'")
            )
        })
    }

    pub fn handle(&self, request: &Request) -> Response {
        debug!(operation = %request.operation, "tool request");
        let result = match Operation::from_name(&request.operation) {
            Some(Operation::GenerateSprite) => self.generate_sprite(&request.params),
            Some(Operation::GenerateAssetSet) => self.generate_asset_set(&request.params),
            Some(op) => Err(ToolError::new(
                METHOD_NOT_FOUND,
                format!("operation '{}' is not served by this dispatcher", op),
            )),
            None => Err(ToolError::new(
                METHOD_NOT_FOUND,
                format!("unknown operation '{}'", request.operation),
            )),
        };
        match result {
            Ok(value) => Response::success(value),
            Err(error) => {
                warn!(code = error.code, message = %error.message, "tool request failed");
                Response::failure(error)
            }
        }
    }

    fn generate_sprite(&self, params: &Value) -> Result<Value, ToolError> {
        let p: SpriteParams = parse_params(params)?;
        let config = self.config_from(params)?;
        let result = self.pipeline.execute(&p.concept, &config);
        render_result(&result, p.output_dir.as_ref())
    }

    fn generate_asset_set(&self, params: &Value) -> Result<Value, ToolError> {
        let p: SetParams = parse_params(params)?;
        let config = self.config_from(params)?;
        let results = self.pipeline.generate_asset_set(&p.concept, p.set_type, &config);
        let rendered = results
            .iter()
            .map(|r| render_result(r, p.output_dir.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "setType": p.set_type,
            "success": results.iter().all(|r| r.success),
            "results": rendered,
        }))
    }

    /// Dispatcher defaults overlaid with any option keys present in `params`.
    fn config_from(&self, params: &Value) -> Result<PipelineConfig, ToolError> {
        let mut merged = serde_json::to_value(&self.defaults)
            .map_err(|e| ToolError::new(INTERNAL_ERROR, e.to_string()))?;
        if let (Some(base), Some(overrides)) = (merged.as_object_mut(), params.as_object()) {
            for (key, value) in overrides {
                if base.contains_key(key) {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        let config: PipelineConfig =
            serde_json::from_value(merged).map_err(|e| ToolError::invalid_params(e.to_string()))?;
        config.check().map_err(|e| ToolError::invalid_params(e.to_string()))?;
        Ok(config)
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: &Value) -> Result<T, ToolError> {
    if !params.is_object() {
        return Err(ToolError::invalid_params("params must be an object"));
    }
    T::deserialize(params).map_err(|e| ToolError::invalid_params(e.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultPayload<'a> {
    name: String,
    success: bool,
    strategy: Option<crate::generate::StrategyKind>,
    frame_count: usize,
    warnings: Vec<String>,
    errors: &'a [String],
    validation: Option<&'a ValidationResult>,
    metadata: Option<&'a AnimationMetadata>,
    bindings: &'a [CodeBinding],
    sprite: Option<String>,
    sheet: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    written: Vec<String>,
}

fn render_result(result: &PipelineResult, output_dir: Option<&PathBuf>) -> Result<Value, ToolError> {
    let encode = |image: &image::RgbaImage| -> Result<String, ToolError> {
        encode_png(image)
            .map(|bytes| STANDARD.encode(bytes))
            .map_err(|e| ToolError::new(INTERNAL_ERROR, e.to_string()))
    };

    let written = match output_dir {
        Some(dir) if result.success => write_artifacts(result, dir)
            .map_err(|e| ToolError::new(INTERNAL_ERROR, e.to_string()))?
            .into_iter()
            .map(|p| p.display().to_string())
            .collect(),
        _ => Vec::new(),
    };

    let payload = ResultPayload {
        name: result.name(),
        success: result.success,
        strategy: result.strategy,
        frame_count: result.frames.len(),
        warnings: result.warning_messages(),
        errors: &result.errors,
        validation: result.validation.as_ref(),
        metadata: result.metadata.as_ref(),
        bindings: &result.bindings,
        sprite: result.sprite.as_ref().map(encode).transpose()?,
        sheet: result.sheet.as_ref().map(encode).transpose()?,
        written,
    };
    serde_json::to_value(payload).map_err(|e| ToolError::new(INTERNAL_ERROR, e.to_string()))
}
