//! One render attempt, from stored slides to a published video.
//!
//! Per-slide work (narration, image, asset upload) fans out up to
//! `max_slide_parallel` at a time. Slide-level failures degrade to a
//! placeholder or error card and never end the attempt. Anything else
//! becomes a single `failed` write with a one-line message.

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use slidecast_media::{SlideRenderer, TimelineItem, VideoAssembler};
use slidecast_models::editor::renumber;
use slidecast_models::{build_srt, segment_checked, ProjectId, ProjectSettings, Slide};
use slidecast_storage::{
    slide_audio_key, slide_image_key, subtitles_key, video_key, AssetPublisher, CONTENT_TYPE_MP3,
    CONTENT_TYPE_MP4, CONTENT_TYPE_PNG, CONTENT_TYPE_SRT,
};
use slidecast_store::{CompletedRender, JobStore};
use slidecast_tts::{NarrationGenerator, VoiceSelection};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::progress::{ProgressTracker, PROGRESS_ASSEMBLED, PROGRESS_LOADED};

/// Collaborators shared by every render.
pub struct RenderContext {
    pub store: Arc<dyn JobStore>,
    pub narration: NarrationGenerator,
    pub images: Arc<dyn SlideRenderer>,
    pub assembler: Arc<dyn VideoAssembler>,
    pub publisher: Arc<dyn AssetPublisher>,
    pub config: WorkerConfig,
}

/// A slide ready for assembly.
#[derive(Debug, Clone)]
struct PreparedSlide {
    slide: Slide,
    item: TimelineItem,
}

/// Run one attempt and write its terminal state.
///
/// The project must already be in `rendering`.
pub async fn execute_render(ctx: Arc<RenderContext>, project_id: ProjectId, logger: JobLogger) {
    let started = Instant::now();

    let attempt = tokio::select! {
        result = run_render(&ctx, &project_id, &logger) => result,
        never = heartbeat(&ctx, &project_id) => match never {},
    };

    let outcome = match attempt {
        Ok(result) => match ctx.store.complete_render(&project_id, &result).await {
            Ok(()) => Ok(result),
            Err(e) => Err(WorkerError::from(e)),
        },
        Err(e) => Err(e),
    };

    let elapsed = started.elapsed().as_secs_f64();
    match outcome {
        Ok(result) => {
            let duration = slidecast_models::editor::total_duration(&result.slides);
            logger.log_completion(&result.video_url, duration);
            metrics::record_render_completed(elapsed);
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            metrics::record_render_failed(e.kind(), elapsed);
            if let Err(store_err) = ctx.store.fail_render(&project_id, &e.user_message()).await {
                logger.log_error(&format!("could not record failure: {}", store_err));
            }
        }
    }
}

/// Keep the row's `updated_at` fresh while the attempt runs, including
/// steps that write no progress such as assembly.
async fn heartbeat(ctx: &RenderContext, project_id: &ProjectId) -> Infallible {
    let mut ticker = tokio::time::interval(ctx.config.heartbeat_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(e) = ctx.store.touch(project_id).await {
            warn!(project_id = %project_id, error = %e, "Render heartbeat failed");
        }
    }
}

/// Produce the completed render without writing a terminal state.
pub async fn run_render(
    ctx: &RenderContext,
    project_id: &ProjectId,
    logger: &JobLogger,
) -> WorkerResult<CompletedRender> {
    let project = ctx
        .store
        .get_project(project_id)
        .await?
        .ok_or_else(|| WorkerError::project_not_found(project_id.as_str()))?;

    let voice = VoiceSelection::try_from(&project.settings)?;
    if voice.pitch != 0.0 {
        debug!(pitch = voice.pitch, "Speech provider does not support pitch; ignoring");
    }

    let mut slides = project.slides.clone();
    if slides.is_empty() {
        slides = segment_checked(&project.script)?;
        ctx.store.replace_slides(project_id, None, &slides).await?;
    }
    slides.sort_by_key(|s| s.order);
    renumber(&mut slides);

    logger.log_start(slides.len());
    let tracker = ProgressTracker::new(slides.len());
    report(ctx, project_id, logger, tracker.milestone(PROGRESS_LOADED), "slides loaded").await;

    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    let work_dir = tempfile::Builder::new()
        .prefix(&format!("render-{}-", project_id))
        .tempdir_in(&ctx.config.work_dir)?;

    let settings = &project.settings;
    let voice = &voice;
    let tracker = &tracker;
    let work_path = work_dir.path();
    let results: Vec<WorkerResult<PreparedSlide>> = stream::iter(slides)
        .map(|slide| async move {
            let prepared =
                prepare_slide(ctx, project_id, slide, settings, voice, work_path, logger).await;
            if prepared.is_ok() {
                report(ctx, project_id, logger, tracker.slide_done(), "slide ready").await;
            }
            prepared
        })
        .buffer_unordered(ctx.config.max_slide_parallel.max(1))
        .collect()
        .await;

    let mut prepared = results.into_iter().collect::<WorkerResult<Vec<_>>>()?;
    prepared.sort_by_key(|p| p.slide.order);

    let items: Vec<TimelineItem> = prepared.iter().map(|p| p.item.clone()).collect();
    let output = work_dir.path().join("video.mp4");

    let assembly_started = Instant::now();
    let assembled = ctx.assembler.assemble(&items, &output).await?;
    metrics::record_assembly_duration(assembly_started.elapsed().as_secs_f64());
    report(ctx, project_id, logger, tracker.milestone(PROGRESS_ASSEMBLED), "video assembled").await;

    let video_url = ctx
        .publisher
        .publish_file(&assembled.path, &video_key(project_id.as_str()), CONTENT_TYPE_MP4)
        .await?;

    let slides: Vec<Slide> = prepared.into_iter().map(|p| p.slide).collect();
    let subtitle_url = if settings.enable_subtitles {
        publish_subtitles(ctx, project_id, &slides, logger).await
    } else {
        None
    };

    Ok(CompletedRender {
        video_url,
        subtitle_url,
        slides,
    })
}

/// Narrate and draw one slide, write both to disk and publish them.
async fn prepare_slide(
    ctx: &RenderContext,
    project_id: &ProjectId,
    mut slide: Slide,
    settings: &ProjectSettings,
    voice: &VoiceSelection,
    work_dir: &Path,
    logger: &JobLogger,
) -> WorkerResult<PreparedSlide> {
    let (narration, png) = tokio::join!(
        ctx.narration.synthesize(&slide.text, voice),
        render_image(ctx, &slide, settings, logger),
    );
    let png = png?;

    let image_path = work_dir.join(format!("slide_{:03}.png", slide.order));
    tokio::fs::write(&image_path, &png).await?;

    let audio_path = match narration.bytes() {
        Some(bytes) => {
            let path = work_dir.join(format!("slide_{:03}.mp3", slide.order));
            tokio::fs::write(&path, bytes).await?;
            Some(path)
        }
        None => None,
    };

    slide.duration_seconds = narration.duration_seconds.max(1);
    slide.image_url = publish_slide_asset(
        ctx,
        png,
        &slide_image_key(project_id.as_str(), slide.order),
        CONTENT_TYPE_PNG,
        "image",
        logger,
    )
    .await;
    slide.audio_url = match narration.bytes() {
        Some(bytes) => {
            publish_slide_asset(
                ctx,
                bytes.to_vec(),
                &slide_audio_key(project_id.as_str(), slide.order),
                CONTENT_TYPE_MP3,
                "audio",
                logger,
            )
            .await
        }
        None => Some(ctx.config.placeholder_audio_url.clone()),
    };

    let item = TimelineItem {
        order: slide.order,
        image: image_path,
        audio: audio_path,
        duration_seconds: slide.duration_seconds,
    };

    Ok(PreparedSlide { slide, item })
}

/// Draw the slide off the async runtime, falling back to the error card.
async fn render_image(
    ctx: &RenderContext,
    slide: &Slide,
    settings: &ProjectSettings,
    logger: &JobLogger,
) -> WorkerResult<Vec<u8>> {
    let renderer = Arc::clone(&ctx.images);
    let text = slide.text.clone();
    let order = slide.order;
    let template = slide.template;
    let task_settings = settings.clone();

    let rendered = tokio::task::spawn_blocking(move || {
        renderer.render(&text, order, template, &task_settings)
    })
    .await;

    let reason = match rendered {
        Ok(Ok(png)) => return Ok(png),
        Ok(Err(e)) => e.to_string(),
        Err(join) => join.to_string(),
    };
    logger.log_warning(&format!("slide {} image failed, using error card: {}", order, reason));
    metrics::record_slide_image_fallback();

    let renderer = Arc::clone(&ctx.images);
    let card_settings = settings.clone();
    tokio::task::spawn_blocking(move || renderer.error_card(order, &card_settings))
        .await
        .map_err(|e| WorkerError::task_failed(e.to_string()))?
        .map_err(WorkerError::from)
}

/// Upload a per-slide asset. Failure leaves the URL unset.
async fn publish_slide_asset(
    ctx: &RenderContext,
    data: Vec<u8>,
    key: &str,
    content_type: &str,
    asset: &'static str,
    logger: &JobLogger,
) -> Option<String> {
    match ctx.publisher.publish_bytes(data, key, content_type).await {
        Ok(url) => Some(url),
        Err(e) => {
            logger.log_warning(&format!("{} upload failed for {}: {}", asset, key, e));
            metrics::record_slide_publish_failure(asset);
            None
        }
    }
}

async fn publish_subtitles(
    ctx: &RenderContext,
    project_id: &ProjectId,
    slides: &[Slide],
    logger: &JobLogger,
) -> Option<String> {
    let srt = build_srt(slides);
    if srt.is_empty() {
        return None;
    }

    match ctx
        .publisher
        .publish_bytes(srt.into_bytes(), &subtitles_key(project_id.as_str()), CONTENT_TYPE_SRT)
        .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            logger.log_warning(&format!("subtitle upload failed: {}", e));
            None
        }
    }
}

/// Write a progress value if it rose. Store errors here are not fatal.
async fn report(
    ctx: &RenderContext,
    project_id: &ProjectId,
    logger: &JobLogger,
    value: Option<u8>,
    message: &str,
) {
    let Some(progress) = value else {
        return;
    };
    logger.log_progress(progress, message);
    if let Err(e) = ctx.store.update_progress(project_id, progress).await {
        warn!(project_id = %project_id, progress, "Progress update failed: {}", e);
    }
}
