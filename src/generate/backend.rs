//! External generative backend strategy.
//!
//! [`GenerationBackend`] is the seam to an image service. [`HttpBackend`]
//! talks JSON over HTTP; tests plug in their own implementations.
//! [`BackendStrategy`] wraps a backend with the shared slot pool and the
//! bounded retry policy: one retry after a fixed delay, then
//! `GenerationUnavailable`.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BackendSettings;
use crate::error::{GenError, Result};
use crate::prompt::CompiledPrompt;
use crate::types::{GenerationSpec, RawFrame};

use super::slots::SlotPool;

/// Why a backend call did not produce images.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend reported an error: {0}")]
    Reported(String),

    #[error("could not decode image {index}: {message}")]
    Decode { index: usize, message: String },

    #[error("expected {expected} images, backend returned {actual}")]
    ImageCount { expected: u32, actual: usize },

    #[error("no request slot became free within {0:?}")]
    Busy(Duration),
}

/// An image service that turns a compiled prompt into frames.
pub trait GenerationBackend: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether the backend should be tried at all right now.
    fn available(&self) -> bool {
        true
    }

    /// Produce `prompt.frames` images.
    fn generate(&self, prompt: &CompiledPrompt) -> std::result::Result<Vec<RgbaImage>, BackendError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    model: &'a str,
    width: u32,
    height: u32,
    seed: u64,
    num_images: u32,
    steps: u32,
    guidance: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON-over-HTTP image service client.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>, timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenError::Config {
                message: format!("Failed to build HTTP client: {}", e),
                help: None,
            })?;

        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }

    /// Build from settings, reading the API key from the configured env var.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let api_key = settings
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());

        Self::new(
            settings.url.clone(),
            Duration::from_secs(settings.timeout_secs),
            api_key,
        )
    }
}

impl GenerationBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.url
    }

    fn generate(&self, prompt: &CompiledPrompt) -> std::result::Result<Vec<RgbaImage>, BackendError> {
        let body = GenerateRequest {
            prompt: &prompt.prompt,
            negative_prompt: &prompt.negative_prompt,
            model: &prompt.model,
            width: prompt.width,
            height: prompt.height,
            seed: prompt.seed,
            num_images: prompt.frames,
            steps: prompt.steps,
            guidance: prompt.guidance,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: GenerateResponse = response.json()?;
        if let Some(error) = parsed.error {
            return Err(BackendError::Reported(error));
        }

        parsed
            .images
            .iter()
            .enumerate()
            .map(|(index, encoded)| decode_image(index, encoded))
            .collect()
    }
}

/// Decode a base64 PNG, tolerating a `data:` URL prefix.
fn decode_image(index: usize, encoded: &str) -> std::result::Result<RgbaImage, BackendError> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| BackendError::Decode {
            index,
            message: e.to_string(),
        })?;

    image::load_from_memory(&bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| BackendError::Decode {
            index,
            message: e.to_string(),
        })
}

/// A backend plus the shared slot pool and retry policy.
#[derive(Debug, Clone)]
pub struct BackendStrategy {
    backend: Arc<dyn GenerationBackend>,
    slots: Arc<SlotPool>,
    slot_wait: Duration,
    retry_delay: Duration,
}

impl BackendStrategy {
    pub fn new(backend: Arc<dyn GenerationBackend>, slots: Arc<SlotPool>) -> Self {
        Self {
            backend,
            slots,
            slot_wait: Duration::from_secs(5),
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn from_settings(backend: Arc<dyn GenerationBackend>, settings: &BackendSettings) -> Self {
        Self::new(backend, Arc::new(SlotPool::new(settings.slots)))
            .with_slot_wait(Duration::from_millis(settings.slot_wait_ms))
            .with_retry_delay(Duration::from_millis(settings.retry_delay_ms))
    }

    pub fn with_slot_wait(mut self, wait: Duration) -> Self {
        self.slot_wait = wait;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn available(&self) -> bool {
        self.backend.available()
    }

    pub fn slots(&self) -> &SlotPool {
        &self.slots
    }

    /// Generate frames, retrying once before reporting the backend unavailable.
    pub fn generate(&self, spec: &GenerationSpec, prompt: &CompiledPrompt) -> Result<Vec<RawFrame>> {
        let mut last_error = None;

        for attempt in 0..2 {
            if attempt > 0 {
                thread::sleep(self.retry_delay);
            }

            match self.attempt(spec, prompt) {
                Ok(frames) => return Ok(frames),
                Err(e) => {
                    warn!(backend = self.backend.name(), attempt, error = %e, "backend attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(GenError::GenerationUnavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "backend did not respond".to_string()),
        })
    }

    fn attempt(
        &self,
        spec: &GenerationSpec,
        prompt: &CompiledPrompt,
    ) -> std::result::Result<Vec<RawFrame>, BackendError> {
        let _slot = self
            .slots
            .acquire(self.slot_wait)
            .ok_or(BackendError::Busy(self.slot_wait))?;

        debug!(backend = self.backend.name(), seed = prompt.seed, "requesting frames");
        let images = self.backend.generate(prompt)?;

        if images.len() != spec.frame_count() as usize {
            return Err(BackendError::ImageCount {
                expected: spec.frame_count(),
                actual: images.len(),
            });
        }

        Ok(images
            .into_iter()
            .enumerate()
            .map(|(index, image)| RawFrame::new(index, image))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::prompt::compile;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that fails a fixed number of times before succeeding.
    #[derive(Debug, Default)]
    pub(crate) struct FlakyBackend {
        pub failures: usize,
        pub calls: AtomicUsize,
    }

    impl GenerationBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        fn generate(&self, prompt: &CompiledPrompt) -> std::result::Result<Vec<RgbaImage>, BackendError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(BackendError::Reported("model warming up".into()));
            }
            Ok((0..prompt.frames)
                .map(|_| RgbaImage::from_pixel(prompt.width, prompt.height, Rgba([9, 9, 9, 255])))
                .collect())
        }
    }

    fn spec(frames: u32) -> GenerationSpec {
        GenerationSpec::builder("bat").frame_count(frames).build().unwrap()
    }

    fn strategy(backend: Arc<dyn GenerationBackend>) -> BackendStrategy {
        BackendStrategy::new(backend, Arc::new(SlotPool::new(1))).with_retry_delay(Duration::ZERO)
    }

    #[test]
    fn test_backend_success() {
        let backend = Arc::new(FlakyBackend::default());
        let s = spec(3);
        let frames = strategy(backend.clone()).generate(&s, &compile(&s)).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].index(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backend_retries_once() {
        let backend = Arc::new(FlakyBackend {
            failures: 1,
            ..Default::default()
        });
        let s = spec(2);
        assert!(strategy(backend.clone()).generate(&s, &compile(&s)).is_ok());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backend_gives_up_after_retry() {
        let backend = Arc::new(FlakyBackend {
            failures: 10,
            ..Default::default()
        });
        let s = spec(2);
        let err = strategy(backend.clone()).generate(&s, &compile(&s)).unwrap_err();
        assert!(matches!(err, GenError::GenerationUnavailable { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_busy_pool_reports_unavailable() {
        let backend = Arc::new(FlakyBackend::default());
        let strategy = strategy(backend.clone()).with_slot_wait(Duration::from_millis(5));
        let _held = strategy.slots().acquire(Duration::ZERO).unwrap();

        let s = spec(1);
        let err = strategy.generate(&s, &compile(&s)).unwrap_err();
        assert!(err.to_string().contains("no request slot"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decode_image_accepts_data_url() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
        let encoded = STANDARD.encode(&png);

        let plain = decode_image(0, &encoded).unwrap();
        assert_eq!(plain, img);

        let url = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_image(0, &url).unwrap(), img);

        assert!(matches!(
            decode_image(4, "not base64!"),
            Err(BackendError::Decode { index: 4, .. })
        ));
    }

    #[test]
    fn test_unreachable_http_backend_is_unavailable() {
        let backend = HttpBackend::new("http://127.0.0.1:9/generate", Duration::from_millis(200), None)
            .unwrap();
        let s = spec(1);
        let err = strategy(Arc::new(backend)).generate(&s, &compile(&s)).unwrap_err();
        assert!(matches!(err, GenError::GenerationUnavailable { .. }));
    }
}
