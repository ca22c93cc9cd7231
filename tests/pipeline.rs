//! End-to-end runs through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::RgbaImage;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use pxgen::generate::{BackendError, SlotPool};
use pxgen::{
    compile, write_artifacts, BackendStrategy, CompiledPrompt, GenerationBackend, GenerationSpec, Generator,
    Layout, Pipeline, PipelineConfig, SetType, StrategyKind, ViolationKind, WarningKind,
};

const CONCEPT: &str = "pixel art fire pet idle animation";

#[derive(Debug, Default)]
struct DownBackend {
    calls: AtomicUsize,
}

impl GenerationBackend for DownBackend {
    fn name(&self) -> &str {
        "down"
    }

    fn generate(&self, _: &CompiledPrompt) -> Result<Vec<RgbaImage>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Status {
            status: 503,
            body: "maintenance".into(),
        })
    }
}

#[derive(Debug)]
struct StallingBackend;

impl GenerationBackend for StallingBackend {
    fn name(&self) -> &str {
        "stalling"
    }

    fn generate(&self, prompt: &CompiledPrompt) -> Result<Vec<RgbaImage>, BackendError> {
        thread::sleep(Duration::from_millis(400));
        Ok((0..prompt.frames).map(|_| RgbaImage::new(prompt.width, prompt.height)).collect())
    }
}

fn down_pipeline() -> (Pipeline, Arc<DownBackend>) {
    let backend = Arc::new(DownBackend::default());
    let strategy = BackendStrategy::new(backend.clone(), Arc::new(SlotPool::new(2))).with_retry_delay(Duration::ZERO);
    (Pipeline::new().with_generator(Generator::with_backend(strategy)), backend)
}

#[test]
fn idle_animation_with_unknown_engine() {
    let config = PipelineConfig::default().with_engine("genericEngine");
    let result = Pipeline::new().execute(CONCEPT, &config);

    assert!(result.success, "{:?}", result.errors);
    let spec = result.spec.as_ref().unwrap();
    assert_eq!(spec.frame_count(), 8);
    assert_eq!(spec.theme(), "fire");
    assert_eq!(spec.action(), "idle");

    let meta = result.metadata.as_ref().unwrap();
    assert_eq!(meta.frames.len(), 8);
    assert_eq!(meta.animations[0].name, "idle");
    assert_eq!(meta.animations[0].frames, (0..8).collect::<Vec<usize>>());
    assert!(meta.looping);

    assert!(result.has_warning(WarningKind::ExportUnsupportedEngine));
    assert_eq!(result.bindings.len(), 1);
    assert!(result.sprite.is_none());
}

#[test]
fn unavailable_backend_falls_back() {
    let (pipeline, backend) = down_pipeline();
    let result = pipeline.execute(CONCEPT, &PipelineConfig::default());

    assert!(result.success);
    assert_eq!(result.strategy, Some(StrategyKind::Procedural));
    assert!(result.has_warning(WarningKind::GenerationUnavailable));
    assert!(result
        .warning_messages()
        .iter()
        .any(|w| w.contains("procedural fallback")));
    assert_eq!(result.frames.len(), 8);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn fallback_output_matches_offline_run() {
    let (pipeline, _) = down_pipeline();
    let via_fallback = pipeline.execute(CONCEPT, &PipelineConfig::default());

    let offline = PipelineConfig {
        allow_backend: false,
        ..PipelineConfig::default()
    };
    let direct = pipeline.execute(CONCEPT, &offline);

    assert!(direct.success);
    assert!(!direct.has_warning(WarningKind::GenerationUnavailable));
    assert_eq!(via_fallback.sheet, direct.sheet);
}

#[test]
fn palette_violation_only_without_quantization() {
    let concept = "pixel art fire pet 4 colors";
    let raw = PipelineConfig {
        enable_post_processing: false,
        ..PipelineConfig::default()
    };
    let skipped = Pipeline::new().execute(concept, &raw);
    assert!(skipped.success);
    assert!(skipped.validation.as_ref().unwrap().has(ViolationKind::Palette));
    assert!(skipped.has_warning(WarningKind::ValidationViolation));

    let processed = Pipeline::new().execute(concept, &PipelineConfig::default());
    let validation = processed.validation.as_ref().unwrap();
    assert!(!validation.has(ViolationKind::Palette), "{:?}", validation.violations);
}

#[test]
fn processed_frames_share_dimensions() {
    let result = Pipeline::new().execute("pixel art knight walk cycle 64x48", &PipelineConfig::default());
    assert!(result.success);
    assert!(result.frames.len() > 1);
    assert!(result.frames.iter().all(|f| f.size() == (64, 48)));
}

#[test]
fn horizontal_sheet_width_is_sum_of_frame_widths() {
    let result = Pipeline::new().execute("pixel art bat run animation", &PipelineConfig::default());
    let meta = result.metadata.as_ref().unwrap();

    let widths: u32 = meta.frames.iter().map(|f| f.bounds.width).sum();
    assert_eq!(widths, meta.sprite_sheet_dimensions.width);
    assert_eq!(result.sheet.as_ref().unwrap().width(), widths);
    assert!(meta.check().is_ok());
}

#[test]
fn grid_layout_with_padding() {
    let config = PipelineConfig {
        layout: Layout::Grid { columns: 4 },
        padding: 2,
        ..PipelineConfig::default()
    };
    let result = Pipeline::new().execute(CONCEPT, &config);
    let sheet = result.sheet.as_ref().unwrap();
    assert_eq!(sheet.dimensions(), (4 * 32 + 3 * 2, 2 * 32 + 2));
}

#[test]
fn run_times_out_as_failed_result() {
    let strategy = BackendStrategy::new(Arc::new(StallingBackend), Arc::new(SlotPool::new(1)));
    let pipeline = Pipeline::new().with_generator(Generator::with_backend(strategy));
    let config = PipelineConfig::default().with_timeout(Duration::from_millis(50));

    let result = pipeline.execute_spec(GenerationSpec::builder("slime").build().unwrap(), &config);

    assert!(!result.success);
    assert!(result.spec.is_some());
    assert!(result.validation.unwrap().has(ViolationKind::Timeout));
}

#[test]
fn spec_runs_are_deterministic() {
    let spec = GenerationSpec::builder("golem").theme("stone").frame_count(4).seed(7).build().unwrap();
    assert_eq!(compile(&spec).seed, 7);

    let a = Pipeline::new().execute_spec(spec.clone(), &PipelineConfig::default());
    let b = Pipeline::new().execute_spec(spec, &PipelineConfig::default());
    assert_eq!(a.sheet, b.sheet);
}

#[test]
fn animation_set_writes_every_member() {
    let config = PipelineConfig::default().with_engine("phaser");
    let results = Pipeline::new().generate_asset_set("pixel art slime", SetType::Animation, &config);
    assert_eq!(results.len(), 5);

    let dir = TempDir::new().unwrap();
    for result in &results {
        assert!(result.success);
        write_artifacts(result, dir.path()).unwrap();
    }
    for action in ["idle", "walk", "run", "attack", "jump"] {
        assert!(dir.path().join(format!("slime-{}-sheet.png", action)).exists());
        assert!(dir.path().join("src").join(format!("slime-{}.js", action)).exists());
    }
}

#[test]
fn concept_with_path_separators_writes_inside_output_dir() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_engine("godot");
    for concept in ["/tmp/escape slime", "../../etc/passwd bat walk cycle", "C:\\temp\\x knight"] {
        let result = Pipeline::new().execute(concept, &config);
        assert!(result.success, "{}: {:?}", concept, result.errors);
        assert!(!result.name().contains(['/', '\\', '.']), "{}", result.name());

        let written = write_artifacts(&result, dir.path()).unwrap();
        assert!(!written.is_empty());
        assert!(written.iter().all(|p| p.starts_with(dir.path())), "{:?}", written);
    }
}

#[test]
fn huge_padding_degrades_export_instead_of_panicking() {
    let config = PipelineConfig {
        padding: 3_000_000_000,
        ..PipelineConfig::default()
    };
    let result = Pipeline::new().execute("pixel art bat run animation", &config);

    assert!(result.success);
    assert!(result.sheet.is_none());
    assert!(result.has_warning(WarningKind::ExportDegraded));
    assert!(config.check().is_err());
}

#[test]
fn oversize_requests_fail_in_interpretation() {
    for concept in ["slime 5000x5000", "slime 100000 frames", "4096px slime 64 frames", "99999999999x2 slime"] {
        let result = Pipeline::new().execute(concept, &PipelineConfig::default());
        assert!(!result.success, "{}", concept);
        assert!(result.spec.is_none(), "{}", concept);
        assert!(result.frames.is_empty());
        assert_eq!(result.errors.len(), 1);
    }
}

#[test]
fn largest_allowed_upscale_is_bounded_by_frame_edge() {
    let config = PipelineConfig {
        upscale: pxgen::pipeline::MAX_UPSCALE,
        ..PipelineConfig::default()
    };
    let result = Pipeline::new().execute("pixel art slime", &config);
    assert!(result.success);
    assert_eq!(result.sprite.as_ref().unwrap().dimensions(), (512, 512));
}
