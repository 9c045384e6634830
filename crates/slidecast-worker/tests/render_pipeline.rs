//! End-to-end render tests with in-memory collaborators.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use slidecast_media::{
    AssembledVideo, MediaError, MediaResult, SlideImageRenderer, SlideRenderer, TimelineItem, VideoAssembler,
};
use slidecast_models::{
    JobStatus, Project, ProjectId, ProjectSettings, ProjectStatus, RenderStatus, Slide, SlideTemplate, VoiceType,
};
use slidecast_storage::{AssetPublisher, LocalPublisher, StorageError, StorageResult};
use slidecast_store::{CompletedRender, JobStore, MemoryJobStore, StoreResult};
use slidecast_tts::{NarrationGenerator, SpeechError, SpeechProvider, SpeechResult, VoiceSelection};
use slidecast_worker::{RenderContext, RenderOrchestrator, WorkerConfig};

const PLACEHOLDER: &str = "data:audio/mp3;base64,mock";

// =============================================================================
// Fakes
// =============================================================================

/// Provider that is always down.
struct UnavailableSpeech;

#[async_trait]
impl SpeechProvider for UnavailableSpeech {
    async fn synthesize(&self, _: &str, _: &VoiceSelection) -> SpeechResult<Vec<u8>> {
        Err(SpeechError::provider_rejected(503, "overloaded"))
    }
}

/// Provider that returns fixed bytes.
struct CannedSpeech;

#[async_trait]
impl SpeechProvider for CannedSpeech {
    async fn synthesize(&self, _: &str, _: &VoiceSelection) -> SpeechResult<Vec<u8>> {
        Ok(b"ID3 canned audio".to_vec())
    }
}

/// Records timelines and writes a stand-in video file.
#[derive(Default)]
struct RecordingAssembler {
    delay: Duration,
    calls: Mutex<Vec<Vec<TimelineItem>>>,
}

impl RecordingAssembler {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Vec<TimelineItem>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoAssembler for RecordingAssembler {
    async fn assemble(&self, items: &[TimelineItem], output: &Path) -> MediaResult<AssembledVideo> {
        if items.is_empty() {
            return Err(MediaError::EmptyTimeline);
        }
        tokio::time::sleep(self.delay).await;
        self.calls.lock().unwrap().push(items.to_vec());
        tokio::fs::write(output, b"mp4").await?;

        Ok(AssembledVideo {
            path: output.to_path_buf(),
            duration_seconds: items.iter().map(|i| i.duration_seconds).sum(),
            segment_count: items.len(),
        })
    }
}

/// Assembler whose encoder always crashes.
struct CrashingAssembler;

#[async_trait]
impl VideoAssembler for CrashingAssembler {
    async fn assemble(&self, _: &[TimelineItem], _: &Path) -> MediaResult<AssembledVideo> {
        Err(MediaError::ffmpeg_failed(
            "encoder crashed",
            Some("Segmentation fault".to_string()),
            Some(139),
        ))
    }
}

/// Renderer that cannot draw slides but still draws error cards.
#[derive(Default)]
struct BrokenSlideRenderer {
    cards: Mutex<Vec<u32>>,
}

const ERROR_CARD: &[u8] = b"\x89PNG error card";

impl SlideRenderer for BrokenSlideRenderer {
    fn render(&self, _: &str, _: u32, _: SlideTemplate, _: &ProjectSettings) -> MediaResult<Vec<u8>> {
        Err(MediaError::ImageEncode("canvas too large".to_string()))
    }

    fn error_card(&self, index: u32, _: &ProjectSettings) -> MediaResult<Vec<u8>> {
        self.cards.lock().unwrap().push(index);
        Ok(ERROR_CARD.to_vec())
    }
}

/// Publisher that rejects the final video.
struct VideoRejectingPublisher {
    inner: LocalPublisher,
}

#[async_trait]
impl AssetPublisher for VideoRejectingPublisher {
    async fn publish_file(&self, _: &Path, key: &str, _: &str) -> StorageResult<String> {
        Err(StorageError::publish_failed(key, "bucket unavailable"))
    }

    async fn publish_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String> {
        self.inner.publish_bytes(data, key, content_type).await
    }
}

/// Memory store that records every progress value it holds after a write.
#[derive(Default)]
struct ProgressRecordingStore {
    inner: MemoryJobStore,
    observed: Mutex<Vec<u8>>,
}

#[async_trait]
impl JobStore for ProgressRecordingStore {
    async fn create_project(&self, project: &Project) -> StoreResult<()> {
        self.inner.create_project(project).await
    }

    async fn get_project(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        self.inner.get_project(id).await
    }

    async fn replace_slides(&self, id: &ProjectId, script: Option<&str>, slides: &[Slide]) -> StoreResult<()> {
        self.inner.replace_slides(id, script, slides).await
    }

    async fn mark_rendering(&self, id: &ProjectId) -> StoreResult<()> {
        self.inner.mark_rendering(id).await
    }

    async fn update_progress(&self, id: &ProjectId, progress: u8) -> StoreResult<()> {
        self.inner.update_progress(id, progress).await?;
        if let Some(status) = self.inner.get_status(id).await? {
            self.observed.lock().unwrap().push(status.progress);
        }
        Ok(())
    }

    async fn touch(&self, id: &ProjectId) -> StoreResult<()> {
        self.inner.touch(id).await
    }

    async fn complete_render(&self, id: &ProjectId, result: &CompletedRender) -> StoreResult<()> {
        self.inner.complete_render(id, result).await?;
        self.observed.lock().unwrap().push(100);
        Ok(())
    }

    async fn fail_render(&self, id: &ProjectId, error: &str) -> StoreResult<()> {
        self.inner.fail_render(id, error).await
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    orchestrator: RenderOrchestrator,
    store: Arc<dyn JobStore>,
    assembler: Arc<RecordingAssembler>,
    _work: TempDir,
    _public: TempDir,
}

struct HarnessBuilder {
    store: Arc<dyn JobStore>,
    speech: Arc<dyn SpeechProvider>,
    assembler: Arc<RecordingAssembler>,
    crash_encoder: bool,
    images: Arc<dyn SlideRenderer>,
    stale_after: Option<Duration>,
    reject_video: bool,
}

impl HarnessBuilder {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryJobStore::new()),
            speech: Arc::new(UnavailableSpeech),
            assembler: Arc::new(RecordingAssembler::default()),
            crash_encoder: false,
            images: Arc::new(SlideImageRenderer::without_font()),
            stale_after: None,
            reject_video: false,
        }
    }

    fn store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = store;
        self
    }

    fn speech(mut self, speech: Arc<dyn SpeechProvider>) -> Self {
        self.speech = speech;
        self
    }

    fn assembler(mut self, assembler: RecordingAssembler) -> Self {
        self.assembler = Arc::new(assembler);
        self
    }

    fn crash_encoder(mut self) -> Self {
        self.crash_encoder = true;
        self
    }

    fn images(mut self, images: Arc<dyn SlideRenderer>) -> Self {
        self.images = images;
        self
    }

    fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    fn reject_video(mut self) -> Self {
        self.reject_video = true;
        self
    }

    fn build(self) -> Harness {
        let work = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let local = LocalPublisher::new(public.path(), "http://test/media");
        let publisher: Arc<dyn AssetPublisher> = if self.reject_video {
            Arc::new(VideoRejectingPublisher { inner: local })
        } else {
            Arc::new(local)
        };

        let defaults = WorkerConfig::default();
        let config = WorkerConfig {
            work_dir: work.path().to_path_buf(),
            max_slide_parallel: 2,
            placeholder_audio_url: PLACEHOLDER.to_string(),
            render_stale_after: self.stale_after.unwrap_or(defaults.render_stale_after),
            ..defaults
        };

        let assembler: Arc<dyn VideoAssembler> = if self.crash_encoder {
            Arc::new(CrashingAssembler)
        } else {
            self.assembler.clone()
        };

        let ctx = RenderContext {
            store: Arc::clone(&self.store),
            narration: NarrationGenerator::new(self.speech),
            images: self.images,
            assembler,
            publisher,
            config,
        };

        Harness {
            orchestrator: RenderOrchestrator::new(ctx),
            store: self.store,
            assembler: self.assembler,
            _work: work,
            _public: public,
        }
    }
}

impl Harness {
    async fn create(&self, project: &Project) {
        self.store.create_project(project).await.unwrap();
    }

    async fn render(&self, id: &ProjectId) -> Project {
        let handle = self.orchestrator.start_render(id).await.unwrap();
        assert!(handle.accepted);
        handle.wait().await.unwrap();
        self.store.get_project(id).await.unwrap().unwrap()
    }

    async fn status(&self, id: &ProjectId) -> RenderStatus {
        self.store.get_status(id).await.unwrap().unwrap()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_two_slide_script_renders_to_completion() {
    let harness = HarnessBuilder::new().build();
    let project = Project::new_draft("Python", "Intro text.\n\n---\n\nSecond slide with print(\"hi\").");
    harness.create(&project).await;

    assert_eq!(project.slides[0].template, SlideTemplate::TitleImage);
    assert_eq!(project.slides[1].template, SlideTemplate::Code);

    let done = harness.render(&project.id).await;
    assert_eq!(done.status, ProjectStatus::Completed);
    assert!(done.video_url.as_deref().unwrap().ends_with("video.mp4"));

    let slide_total: u32 = done.slides.iter().map(|s| s.duration_seconds).sum();
    assert_eq!(done.duration_seconds, slide_total);

    let calls = harness.assembler.calls();
    assert_eq!(calls.len(), 1);
    let assembled: u32 = calls[0].iter().map(|i| i.duration_seconds).sum();
    assert_eq!(assembled, slide_total);

    let status = harness.status(&project.id).await;
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.progress, 100);
    assert!(status.video_url.is_some());
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_all_narration_failures_still_complete() {
    let harness = HarnessBuilder::new().speech(Arc::new(UnavailableSpeech)).build();
    let project = Project::new_draft("Lecture", "one\n---\ntwo\n---\nthree");
    harness.create(&project).await;

    let done = harness.render(&project.id).await;

    assert_eq!(done.status, ProjectStatus::Completed);
    assert!(done
        .slides
        .iter()
        .all(|s| s.audio_url.as_deref() == Some(PLACEHOLDER)));

    let calls = harness.assembler.calls();
    assert_eq!(calls[0].len(), 3);
    assert!(calls[0].iter().all(|item| item.audio.is_none()));
    let expected: u32 = done.slides.iter().map(|s| s.duration_seconds).sum();
    assert_eq!(calls[0].iter().map(|i| i.duration_seconds).sum::<u32>(), expected);
}

#[tokio::test]
async fn test_timeline_is_in_slide_order() {
    let harness = HarnessBuilder::new().speech(Arc::new(CannedSpeech)).build();
    let script = (1..=6).map(|n| format!("Slide number {}", n)).collect::<Vec<_>>().join("\n---\n");
    let project = Project::new_draft("Ordered", script);
    harness.create(&project).await;

    let done = harness.render(&project.id).await;

    let orders: Vec<u32> = harness.assembler.calls()[0].iter().map(|i| i.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
    assert!(done.slides.iter().all(|s| s.image_url.is_some()));
    assert!(done
        .slides
        .iter()
        .all(|s| s.audio_url.as_deref().is_some_and(|u| u.ends_with(".mp3"))));
}

#[tokio::test]
async fn test_concurrent_start_renders_once() {
    let harness = HarnessBuilder::new()
        .assembler(RecordingAssembler::slow(Duration::from_millis(200)))
        .build();
    let project = Project::new_draft("Lecture", "one\n---\ntwo");
    harness.create(&project).await;

    let first = harness.orchestrator.start_render(&project.id).await.unwrap();
    let second = harness.orchestrator.start_render(&project.id).await.unwrap();

    assert!(first.accepted);
    assert!(!second.accepted);

    first.wait().await.unwrap();
    second.wait().await.unwrap();

    assert_eq!(harness.assembler.calls().len(), 1);
    assert_eq!(harness.status(&project.id).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_stored_rendering_state_blocks_new_render() {
    let harness = HarnessBuilder::new().build();
    let project = Project::new_draft("Lecture", "one");
    harness.create(&project).await;
    harness.store.mark_rendering(&project.id).await.unwrap();

    let handle = harness.orchestrator.start_render(&project.id).await.unwrap();
    assert!(!handle.accepted);
    assert!(harness.assembler.calls().is_empty());
}

#[tokio::test]
async fn test_rerender_after_completion_is_fresh_attempt() {
    let harness = HarnessBuilder::new().build();
    let project = Project::new_draft("Lecture", "one\n---\ntwo");
    harness.create(&project).await;

    harness.render(&project.id).await;
    let again = harness.render(&project.id).await;

    assert_eq!(again.status, ProjectStatus::Completed);
    assert_eq!(harness.assembler.calls().len(), 2);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let store = Arc::new(ProgressRecordingStore::default());
    let harness = HarnessBuilder::new().store(store.clone()).build();
    let project = Project::new_draft("Lecture", "a\n---\nb\n---\nc\n---\nd\n---\ne");
    harness.create(&project).await;

    harness.render(&project.id).await;

    let observed = store.observed.lock().unwrap().clone();
    assert!(!observed.is_empty());
    assert!(observed.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", observed);
    assert_eq!(observed.last(), Some(&100));
    assert!(observed[..observed.len() - 1].iter().all(|p| *p < 100));
}

#[tokio::test]
async fn test_empty_project_fails_with_segmentation_error() {
    let harness = HarnessBuilder::new().build();
    let project = Project::new_draft("Empty", "   ---   ");
    harness.create(&project).await;

    let failed = harness.render(&project.id).await;

    assert_eq!(failed.status, ProjectStatus::Failed);
    assert!(failed.error_message.unwrap().contains("no slides"));
    assert!(failed.video_url.is_none());
    assert!(harness.assembler.calls().is_empty());
}

#[tokio::test]
async fn test_missing_slides_are_resegmented_from_script() {
    let harness = HarnessBuilder::new().build();
    let mut project = Project::new_draft("Lecture", "");
    project.script = "first\n---\nsecond".to_string();
    harness.create(&project).await;

    let done = harness.render(&project.id).await;

    assert_eq!(done.status, ProjectStatus::Completed);
    assert_eq!(done.slides.len(), 2);
}

#[tokio::test]
async fn test_clone_voice_fails_fast() {
    let harness = HarnessBuilder::new().speech(Arc::new(CannedSpeech)).build();
    let settings = ProjectSettings {
        voice: VoiceType::Clone,
        ..ProjectSettings::default()
    };
    let project = Project::new_draft("Lecture", "one").with_settings(settings);
    harness.create(&project).await;

    let failed = harness.render(&project.id).await;

    assert_eq!(failed.status, ProjectStatus::Failed);
    assert!(failed.error_message.unwrap().starts_with("Narration unavailable"));
    assert!(harness.assembler.calls().is_empty());
}

#[tokio::test]
async fn test_publish_failure_fails_without_video() {
    let harness = HarnessBuilder::new().reject_video().build();
    let project = Project::new_draft("Lecture", "one\n---\ntwo");
    harness.create(&project).await;

    let failed = harness.render(&project.id).await;

    assert_eq!(failed.status, ProjectStatus::Failed);
    assert!(failed.video_url.is_none());
    assert!(failed.progress.unwrap() < 100);

    let status = harness.status(&project.id).await;
    assert_eq!(status.status, JobStatus::Failed);
    assert_eq!(status.error.as_deref(), Some("Could not publish the finished video"));
}

#[tokio::test]
async fn test_encoder_failure_fails_without_video() {
    let harness = HarnessBuilder::new().crash_encoder().build();
    let project = Project::new_draft("Lecture", "one\n---\ntwo");
    harness.create(&project).await;

    let failed = harness.render(&project.id).await;

    assert_eq!(failed.status, ProjectStatus::Failed);
    assert!(failed.video_url.is_none());
    assert!(failed.progress.unwrap() < 100);

    let status = harness.status(&project.id).await;
    assert_eq!(status.status, JobStatus::Failed);
    assert_eq!(status.error.as_deref(), Some("Video encoding failed"));
    assert!(status.video_url.is_none());
}

#[tokio::test]
async fn test_failed_slide_image_uses_error_card() {
    let images = Arc::new(BrokenSlideRenderer::default());
    let harness = HarnessBuilder::new().images(images.clone()).build();
    let project = Project::new_draft("Lecture", "one\n---\ntwo");
    harness.create(&project).await;

    let done = harness.render(&project.id).await;

    assert_eq!(done.status, ProjectStatus::Completed);
    let mut cards = images.cards.lock().unwrap().clone();
    cards.sort_unstable();
    assert_eq!(cards, vec![1, 2]);

    // The cards, not missing images, went into the video
    let calls = harness.assembler.calls();
    assert_eq!(calls[0].len(), 2);
    assert!(done.slides.iter().all(|s| s.image_url.is_some()));
}

#[tokio::test]
async fn test_order_gaps_are_closed_before_assembly() {
    let harness = HarnessBuilder::new().build();
    let mut project = Project::new_draft("Gaps", "first\n---\nsecond");
    project.slides[1].order = 3;
    harness.create(&project).await;

    let done = harness.render(&project.id).await;

    let orders: Vec<u32> = harness.assembler.calls()[0].iter().map(|i| i.order).collect();
    assert_eq!(orders, vec![1, 2]);
    let stored: Vec<u32> = done.slides.iter().map(|s| s.order).collect();
    assert_eq!(stored, vec![1, 2]);
    assert_eq!(done.slides[1].text, "second");
}

#[tokio::test]
async fn test_long_assembly_stays_active_for_other_workers() {
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let stale_after = Duration::from_secs(1);
    let first = HarnessBuilder::new()
        .store(store.clone())
        .stale_after(stale_after)
        .assembler(RecordingAssembler::slow(Duration::from_millis(3500)))
        .build();
    let second = HarnessBuilder::new().store(store.clone()).stale_after(stale_after).build();

    let project = Project::new_draft("Lecture", "one\n---\ntwo");
    first.create(&project).await;

    let running = first.orchestrator.start_render(&project.id).await.unwrap();
    assert!(running.accepted);

    // Well past the threshold with no progress change since the slides finished
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let rival = second.orchestrator.start_render(&project.id).await.unwrap();
    assert!(!rival.accepted);

    running.wait().await.unwrap();
    rival.wait().await.unwrap();

    assert_eq!(first.assembler.calls().len(), 1);
    assert!(second.assembler.calls().is_empty());
    assert_eq!(first.status(&project.id).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_subtitles_follow_setting() {
    let harness = HarnessBuilder::new().build();
    let with_subs = Project::new_draft("Subs", "one\n---\ntwo");
    let without_subs = Project::new_draft("No subs", "one\n---\ntwo").with_settings(ProjectSettings {
        enable_subtitles: false,
        ..ProjectSettings::default()
    });
    harness.create(&with_subs).await;
    harness.create(&without_subs).await;

    let a = harness.render(&with_subs.id).await;
    let b = harness.render(&without_subs.id).await;

    assert!(a.subtitle_url.as_deref().unwrap().ends_with("subtitles.srt"));
    assert!(b.subtitle_url.is_none());
}

#[tokio::test]
async fn test_unknown_project_is_an_error() {
    let harness = HarnessBuilder::new().build();
    let result = harness.orchestrator.start_render(&ProjectId::from_string("nope")).await;

    assert!(result.is_err());
    assert!(!harness.orchestrator.is_active(&ProjectId::from_string("nope")));
}
