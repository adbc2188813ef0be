//! Image-to-record extraction through a vision model.
//!
//! The extractor reads the image, sends a single chat request and turns
//! whatever text comes back into a complete [`ImageRecord`]: first as a JSON
//! object, then as a JSON object embedded in prose, and finally as a
//! degraded record carrying the raw text. Only a missing client, an
//! unreadable image or a failed call produce an error.

pub mod parse;
pub mod prompt;
pub mod trace;

use std::path::{Path, PathBuf};

use tracing::error;

use crate::db::models::ImageRecord;
use crate::llm::media::encode_image_data_uri;
use crate::llm::{ConfigurationError, VisionBackend};
use crate::utils::text::clip;
use crate::utils::timing::{log_parse_outcome, log_vision_timing, VisionCall};

pub use parse::ParseTier;
pub use prompt::VisionSettings;
pub use trace::DiagnosticTrace;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("AI analysis is not configured: {0}")]
    NotConfigured(ConfigurationError),
    #[error("Failed to read image {}: {message}", path.display())]
    ImageRead { path: PathBuf, message: String },
    #[error("AI analysis call failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct Analysis {
    /// Content fields only; `image_path` and `image_thumbnail` are empty.
    pub record: ImageRecord,
    pub tier: ParseTier,
    pub raw_response: String,
}

#[derive(Debug)]
pub struct ExtractionReport {
    pub outcome: Result<Analysis, ExtractionError>,
    pub trace: Vec<String>,
}

impl ExtractionReport {
    fn finish(outcome: Result<Analysis, ExtractionError>, trace: DiagnosticTrace) -> Self {
        ExtractionReport {
            outcome,
            trace: trace.into_entries(),
        }
    }
}

pub struct MetadataExtractor {
    backend: Result<Box<dyn VisionBackend>, ConfigurationError>,
    settings: VisionSettings,
}

impl MetadataExtractor {
    pub fn new(
        backend: Result<Box<dyn VisionBackend>, ConfigurationError>,
        settings: VisionSettings,
    ) -> Self {
        MetadataExtractor { backend, settings }
    }

    pub fn configuration_error(&self) -> Option<&ConfigurationError> {
        self.backend.as_ref().err()
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_ok()
    }

    pub async fn extract(&self, image_path: &Path) -> ExtractionReport {
        let mut trace = DiagnosticTrace::new();
        trace.info(format!("Starting analysis of {}", image_path.display()));

        let backend = match &self.backend {
            Ok(backend) => backend,
            Err(err) => {
                trace.error(format!("Vision client not initialized: {err}"));
                return ExtractionReport::finish(
                    Err(ExtractionError::NotConfigured(err.clone())),
                    trace,
                );
            }
        };

        let image_bytes = match tokio::fs::read(image_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                trace.error(format!(
                    "Failed to read image {}: {err}",
                    image_path.display()
                ));
                return ExtractionReport::finish(
                    Err(ExtractionError::ImageRead {
                        path: image_path.to_path_buf(),
                        message: err.to_string(),
                    }),
                    trace,
                );
            }
        };

        let data_uri = encode_image_data_uri(&image_bytes);
        trace.info(format!(
            "Encoded {} byte(s) as {} base64 character(s)",
            image_bytes.len(),
            data_uri.len()
        ));

        let payload = prompt::build_vision_payload(&self.settings, &data_uri);
        trace.info(format!(
            "Sending analysis request (provider={}, model={}, json_mode={})",
            backend.provider(),
            self.settings.model,
            self.settings.json_mode
        ));

        let call = VisionCall {
            provider: backend.provider(),
            model: &self.settings.model,
            image: image_path,
            image_bytes: image_bytes.len(),
        };
        let result = log_vision_timing(&call, || backend.chat_completion(&payload)).await;

        let raw_response = match result {
            Ok(reply) if reply.refused => {
                trace.warn(format!(
                    "Model refused the request; keeping its refusal as the response: {}",
                    clip(&reply.text, 200)
                ));
                reply.text
            }
            Ok(reply) => reply.text,
            Err(err) => {
                error!("Vision call failed for {}: {err:?}", image_path.display());
                trace.error(format!("Vision call failed: {err:#}"));
                return ExtractionReport::finish(
                    Err(ExtractionError::Transport(format!("{err:#}"))),
                    trace,
                );
            }
        };

        trace.info(format!(
            "Received {} character(s): {}",
            raw_response.chars().count(),
            clip(&raw_response, 200)
        ));

        let (record, tier) = parse::parse_response(&raw_response, image_path, &mut trace);
        log_parse_outcome(image_path, tier.as_str(), raw_response.chars().count());
        trace.info(format!("Analysis complete via {tier}"));

        ExtractionReport::finish(
            Ok(Analysis {
                record,
                tier,
                raw_response,
            }),
            trace,
        )
    }
}
