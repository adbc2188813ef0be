use anyhow::Result;
use tracing::error;

use crate::analysis::{MetadataExtractor, VisionSettings};
use crate::config::Config;
use crate::db::database::CatalogStore;
use crate::image_store::ImageStore;
use crate::llm::{ConfigurationError, VisionBackend, VisionClient};

/// Everything a command needs, built once at startup.
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogStore,
    pub images: ImageStore,
    pub extractor: MetadataExtractor,
}

impl AppState {
    pub async fn init(config: Config) -> Result<Self> {
        let backend = VisionClient::init(&config)
            .map(|client| Box::new(client) as Box<dyn VisionBackend>);
        if let Err(err) = &backend {
            error!("AI analysis disabled: {err}");
        }
        Self::with_backend(config, backend).await
    }

    pub async fn with_backend(
        config: Config,
        backend: Result<Box<dyn VisionBackend>, ConfigurationError>,
    ) -> Result<Self> {
        let catalog = CatalogStore::open(&config.database_path).await?;
        catalog.ensure_schema().await?;

        let images = ImageStore::new(config.uploads_dir(), config.thumbnails_dir());
        images.ensure_directories()?;

        let extractor = MetadataExtractor::new(backend, VisionSettings::from_config(&config));

        Ok(AppState {
            config,
            catalog,
            images,
            extractor,
        })
    }
}
