//! Application state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use slidecast_media::{check_ffmpeg, EncodingConfig, FfmpegAssembler, SlideImageRenderer};
use slidecast_storage::{AssetPublisher, LocalPublisher, R2Client};
use slidecast_store::{JobStore, MemoryJobStore, RestJobStore};
use slidecast_tts::{NarrationGenerator, OpenAiSpeechClient};
use slidecast_worker::{FfprobeDurationProbe, RenderContext, RenderOrchestrator, WorkerConfig};

use crate::config::{ApiConfig, PublishBackend, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: RenderOrchestrator,
    /// Directory served under `/media` when publishing locally
    pub media_root: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: RenderOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
            media_root: None,
        }
    }

    /// Serve `root` under `/media`.
    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = Some(root.into());
        self
    }

    /// Build every collaborator from the environment.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let worker = WorkerConfig::from_env();

        let store: Arc<dyn JobStore> = match config.store_backend {
            StoreBackend::Rest => Arc::new(RestJobStore::from_env().context("job store")?),
            StoreBackend::Memory => {
                warn!("Using in-memory job store; projects are lost on restart");
                Arc::new(MemoryJobStore::new())
            }
        };

        let mut media_root = None;
        let publisher: Arc<dyn AssetPublisher> = match config.publish_backend {
            PublishBackend::R2 => Arc::new(R2Client::from_env().context("R2 publisher")?),
            PublishBackend::Local => {
                let local = LocalPublisher::from_env();
                info!(root = %local.root().display(), "Publishing assets to local directory");
                media_root = Some(local.root().to_path_buf());
                Arc::new(local)
            }
        };

        let speech = OpenAiSpeechClient::from_env().context("speech client")?;
        if !speech.is_configured() {
            warn!("TTS_API_KEY not set; every slide will use placeholder narration");
        }
        let narration = NarrationGenerator::new(Arc::new(speech))
            .with_probe(Arc::new(FfprobeDurationProbe::new(worker.work_dir.join("probe"))));

        let mut images = SlideImageRenderer::load(worker.slide_font_path.as_deref()).context("slide font")?;
        if let Some(dir) = &worker.slide_font_dir {
            images = images.with_font_dir(dir).context("slide font directory")?;
            info!(families = images.family_count(), "Loaded slide font families");
        }

        if let Err(e) = check_ffmpeg() {
            warn!("FFmpeg unavailable, renders will fail at assembly: {}", e);
        }

        let ctx = RenderContext {
            store,
            narration,
            images: Arc::new(images),
            assembler: Arc::new(FfmpegAssembler::new(EncodingConfig::from_env())),
            publisher,
            config: worker,
        };

        let mut state = Self::new(config, RenderOrchestrator::new(ctx));
        state.media_root = media_root;
        Ok(state)
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.orchestrator.context().store
    }

    pub fn publisher(&self) -> &Arc<dyn AssetPublisher> {
        &self.orchestrator.context().publisher
    }

    pub fn narration(&self) -> &NarrationGenerator {
        &self.orchestrator.context().narration
    }
}
