//! Export orchestration: one plan per target frame, routed to the raster
//! or video backend by media kind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::color::Color;
use reframe_frame_model::media::MediaKind;
use reframe_frame_model::target::TargetFrame;
use reframe_frame_model::transform::Transform;
use reframe_processing_core::planner::{plan_composition, CompositionPlan};

use crate::engine::{EngineConfig, EngineHandle};
use crate::probe::{DefaultProber, MediaInfo, MediaProber};
use crate::raster::{ImageOutput, ImageRasterBackend, RasterBackend};
use crate::video::{EncodeOptions, FfmpegVideoBackend, ProgressFn, VideoBackend};

/// Default JPEG quality when the request does not override it.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Progress callback for export rendering.
pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportProgress {
    /// Target frame label.
    pub label: String,

    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of one target's export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Preparing,
    Rendering,
    Complete,
    Failed,
}

/// What to export and where.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source media file.
    pub source: PathBuf,

    /// Directory receiving `<stem>_<label>.<ext>` files.
    pub output_dir: PathBuf,

    /// Fill for areas the media does not cover.
    pub background: Color,

    /// Video encoder settings.
    pub encode: EncodeOptions,

    /// Quality for JPEG sources.
    pub jpeg_quality: u8,
}

impl ExportRequest {
    pub fn new(source: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            background: Color::BLACK,
            encode: EncodeOptions::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_encode(mut self, encode: EncodeOptions) -> Self {
        self.encode = encode;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Output file for `label`.
    pub fn output_path(&self, label: &str, kind: MediaKind) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        let ext = match kind {
            MediaKind::Video => "mp4",
            MediaKind::Image => ImageOutput::for_source(&self.source, self.jpeg_quality).extension(),
        };
        self.output_dir.join(format!("{stem}_{label}.{ext}"))
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportArtifact {
    pub label: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub kind: MediaKind,
}

/// Result for one target of a batch.
#[derive(Debug)]
pub struct ExportOutcome {
    pub label: String,
    pub result: ReframeResult<ExportArtifact>,
}

impl ExportOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Routes plans to backends.
///
/// Video jobs hold the engine's job lock for their whole encode, so at
/// most one runs at a time. Image jobs take no lock.
pub struct ExportOrchestrator {
    engine: Arc<EngineHandle>,
    prober: Arc<dyn MediaProber>,
    raster: Arc<dyn RasterBackend>,
    video: Arc<dyn VideoBackend>,
}

impl ExportOrchestrator {
    /// ffprobe, the `image` compositor and ffmpeg.
    pub fn new(engine: Arc<EngineHandle>) -> Self {
        Self {
            engine,
            prober: Arc::new(DefaultProber::default()),
            raster: Arc::new(ImageRasterBackend),
            video: Arc::new(FfmpegVideoBackend),
        }
    }

    /// Engine and prober built from the same tool paths.
    pub fn from_config(config: EngineConfig) -> Self {
        let prober = DefaultProber::new(config.ffprobe.clone());
        Self::new(Arc::new(EngineHandle::new(config))).with_prober(Arc::new(prober))
    }

    pub fn with_prober(mut self, prober: Arc<dyn MediaProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_raster_backend(mut self, raster: Arc<dyn RasterBackend>) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_video_backend(mut self, video: Arc<dyn VideoBackend>) -> Self {
        self.video = video;
        self
    }

    pub fn engine(&self) -> &Arc<EngineHandle> {
        &self.engine
    }

    /// Probe on the blocking pool.
    pub async fn probe(&self, source: &Path) -> ReframeResult<MediaInfo> {
        let prober = self.prober.clone();
        let path = source.to_path_buf();
        tokio::task::spawn_blocking(move || prober.probe(&path))
            .await
            .map_err(|e| ReframeError::probe(format!("probe task failed: {e}")))?
    }

    /// Plan for one target without rendering it.
    pub fn plan(
        &self,
        media: &MediaInfo,
        target: &TargetFrame,
        transform: &Transform,
        background: Color,
    ) -> CompositionPlan {
        plan_composition(&media.dimensions, target, transform, background)
    }

    /// Probe the source and export a single target.
    pub async fn export_target(
        &self,
        request: &ExportRequest,
        target: &TargetFrame,
        transform: &Transform,
        progress: Option<ProgressCallback>,
    ) -> ReframeResult<ExportArtifact> {
        let media = self.probe(&request.source).await?;
        self.export_probed(request, &media, target, transform, progress)
            .await
    }

    /// Export every target in order, one at a time.
    ///
    /// A failed target is recorded and the batch moves on.
    pub async fn export_all(
        &self,
        request: &ExportRequest,
        targets: &[TargetFrame],
        transforms: &BTreeMap<String, Transform>,
        progress: Option<ProgressCallback>,
    ) -> ReframeResult<Vec<ExportOutcome>> {
        let media = self.probe(&request.source).await?;
        tracing::info!(
            source = %request.source.display(),
            kind = media.kind.as_str(),
            dimensions = %media.dimensions,
            targets = targets.len(),
            "Starting batch export"
        );

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let transform = transforms
                .get(target.label())
                .copied()
                .unwrap_or_default();
            let result = self
                .export_probed(request, &media, target, &transform, progress.clone())
                .await;
            if let Err(e) = &result {
                tracing::warn!(label = target.label(), error = %e, "Target export failed");
            }
            outcomes.push(ExportOutcome {
                label: target.label().to_string(),
                result,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!(
            succeeded = outcomes.len() - failed,
            failed,
            "Batch export finished"
        );
        Ok(outcomes)
    }

    async fn export_probed(
        &self,
        request: &ExportRequest,
        media: &MediaInfo,
        target: &TargetFrame,
        transform: &Transform,
        progress: Option<ProgressCallback>,
    ) -> ReframeResult<ExportArtifact> {
        let label = target.label().to_string();
        report(&progress, &label, 0.0, ExportStage::Preparing);

        let plan = self.plan(media, target, transform, request.background);
        tracing::info!(
            label = %label,
            kind = media.kind.as_str(),
            output = %format!("{}x{}", plan.pad_width, plan.pad_height),
            scale = plan.final_scale,
            "Exporting target"
        );

        let rendered = match media.kind {
            MediaKind::Video => {
                self.render_video(request, media, plan, &label, progress.clone())
                    .await
            }
            MediaKind::Image => self.render_image(request, plan).await,
        };
        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(e) => {
                report(&progress, &label, 0.0, ExportStage::Failed);
                return Err(e);
            }
        };

        let path = request.output_path(&label, media.kind);
        if let Err(e) = write_output(&path, &bytes).await {
            report(&progress, &label, 0.0, ExportStage::Failed);
            return Err(e);
        }

        report(&progress, &label, 1.0, ExportStage::Complete);
        tracing::info!(label = %label, path = %path.display(), bytes = bytes.len(), "Export written");
        Ok(ExportArtifact {
            label,
            path,
            bytes: bytes.len() as u64,
            kind: media.kind,
        })
    }

    async fn render_video(
        &self,
        request: &ExportRequest,
        media: &MediaInfo,
        plan: CompositionPlan,
        label: &str,
        progress: Option<ProgressCallback>,
    ) -> ReframeResult<Vec<u8>> {
        let engine = self.engine.get().await?;
        let _job = engine.lock_job().await;

        let backend = self.video.clone();
        let source = request.source.clone();
        let options = request.encode.clone();
        let duration = media.duration_secs;
        let relay: Option<ProgressFn> = progress.map(|cb| {
            let label = label.to_string();
            Arc::new(move |fraction: f64| {
                cb(ExportProgress {
                    label: label.clone(),
                    progress: fraction.clamp(0.0, 1.0),
                    stage: ExportStage::Rendering,
                });
            }) as ProgressFn
        });

        let worker_engine = engine.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            backend.encode(
                &worker_engine,
                &plan,
                &source,
                &options,
                duration,
                relay.as_ref(),
            )
        })
        .await
        .map_err(|e| ReframeError::encode(format!("encode task failed: {e}")))??;

        if bytes.is_empty() {
            return Err(ReframeError::encode("video backend returned no data"));
        }
        Ok(bytes)
    }

    async fn render_image(
        &self,
        request: &ExportRequest,
        plan: CompositionPlan,
    ) -> ReframeResult<Vec<u8>> {
        let backend = self.raster.clone();
        let source = request.source.clone();
        let output = ImageOutput::for_source(&source, request.jpeg_quality);
        let bytes = tokio::task::spawn_blocking(move || backend.render(&plan, &source, output))
            .await
            .map_err(|e| ReframeError::encode(format!("render task failed: {e}")))??;

        if bytes.is_empty() {
            return Err(ReframeError::encode("raster backend returned no data"));
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for ExportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOrchestrator")
            .field("engine", &self.engine)
            .field("video", &self.video.name())
            .finish_non_exhaustive()
    }
}

fn report(progress: &Option<ProgressCallback>, label: &str, value: f64, stage: ExportStage) {
    if let Some(cb) = progress {
        cb(ExportProgress {
            label: label.to_string(),
            progress: value,
            stage,
        });
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> ReframeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use reframe_frame_model::media::MediaDimensions;

    use crate::engine::{EngineConfig, VideoEngine};

    struct FixedProber(MediaKind);

    impl MediaProber for FixedProber {
        fn probe(&self, _path: &Path) -> ReframeResult<MediaInfo> {
            Ok(MediaInfo {
                kind: self.0,
                dimensions: MediaDimensions::new(1920, 1080).unwrap(),
                duration_secs: Some(4.0),
            })
        }
    }

    /// Tracks peak concurrency and fails for one label.
    #[derive(Default)]
    struct Recorder {
        active: AtomicUsize,
        peak: AtomicUsize,
        fail_label: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn failing(label: &str) -> Self {
            Self {
                fail_label: Some(label.to_string()),
                ..Self::default()
            }
        }

        fn run(&self, plan: &CompositionPlan) -> ReframeResult<Vec<u8>> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(40));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(plan.target_label.clone());

            if self.fail_label.as_deref() == Some(plan.target_label.as_str()) {
                return Err(ReframeError::encode("ffmpeg exited with status 1"));
            }
            Ok(format!("{}x{}", plan.pad_width, plan.pad_height).into_bytes())
        }
    }

    impl VideoBackend for Recorder {
        fn encode(
            &self,
            _engine: &VideoEngine,
            plan: &CompositionPlan,
            _source: &Path,
            _options: &EncodeOptions,
            _duration_secs: Option<f64>,
            progress: Option<&ProgressFn>,
        ) -> ReframeResult<Vec<u8>> {
            if let Some(cb) = progress {
                cb(0.5);
            }
            self.run(plan)
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    impl RasterBackend for Recorder {
        fn render(
            &self,
            plan: &CompositionPlan,
            _source: &Path,
            _output: ImageOutput,
        ) -> ReframeResult<Vec<u8>> {
            self.run(plan)
        }
    }

    fn engine() -> Arc<EngineHandle> {
        Arc::new(EngineHandle::with_initializer(|| async {
            Ok(VideoEngine::new(EngineConfig::default(), "test"))
        }))
    }

    fn orchestrator(kind: MediaKind, backend: Arc<Recorder>) -> ExportOrchestrator {
        ExportOrchestrator::new(engine())
            .with_prober(Arc::new(FixedProber(kind)))
            .with_video_backend(backend.clone())
            .with_raster_backend(backend)
    }

    fn out_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_output_naming() {
        let request = ExportRequest::new("/media/holiday.clip.mov", "/out");
        assert_eq!(
            request.output_path("square", MediaKind::Video),
            PathBuf::from("/out/holiday.clip_square.mp4")
        );

        let photo = ExportRequest::new("/media/cat.jpeg", "/out");
        assert_eq!(
            photo.output_path("portrait", MediaKind::Image),
            PathBuf::from("/out/cat_portrait.jpg")
        );
        let still = ExportRequest::new("/media/cat.webp", "/out");
        assert_eq!(
            still.output_path("portrait", MediaKind::Image),
            PathBuf::from("/out/cat_portrait.png")
        );
    }

    #[tokio::test]
    async fn test_batch_continues_past_failure() {
        let backend = Arc::new(Recorder::failing("landscape"));
        let orchestrator = orchestrator(MediaKind::Video, backend.clone());
        let dir = out_dir("reframe_test_export_batch");
        let request = ExportRequest::new("clip.mp4", &dir);

        let outcomes = orchestrator
            .export_all(&request, &TargetFrame::defaults(), &BTreeMap::new(), None)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[2].is_ok());
        assert_eq!(outcomes[1].label, "landscape");
        let err = outcomes[1].result.as_ref().unwrap_err();
        assert!(err.to_string().starts_with("Processing failed"));

        let square = outcomes[0].result.as_ref().unwrap();
        assert_eq!(square.path, dir.join("clip_square.mp4"));
        assert_eq!(std::fs::read(&square.path).unwrap(), b"1080x1080");
        assert!(!dir.join("clip_landscape.mp4").exists());

        assert_eq!(
            *backend.seen.lock().unwrap(),
            vec!["square", "landscape", "portrait"]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_batch_uses_per_target_transform() {
        let backend = Arc::new(Recorder::default());
        let orchestrator = orchestrator(MediaKind::Image, backend);
        let dir = out_dir("reframe_test_export_transforms");
        let request = ExportRequest::new("photo.png", &dir);

        let media = orchestrator.probe(Path::new("photo.png")).await.unwrap();
        let zoomed = Transform::new(2.0, 0.0, 0.0);
        let plan = orchestrator.plan(&media, &TargetFrame::square(), &zoomed, Color::BLACK);
        assert!(plan.needs_crop());

        let transforms = BTreeMap::from([("square".to_string(), zoomed)]);
        let outcomes = orchestrator
            .export_all(&request, &[TargetFrame::square()], &transforms, None)
            .await
            .unwrap();
        assert!(outcomes[0].is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_video_jobs_never_overlap() {
        let backend = Arc::new(Recorder::default());
        let orchestrator = orchestrator(MediaKind::Video, backend.clone());
        let dir = out_dir("reframe_test_export_video_serial");
        let request = ExportRequest::new("clip.mp4", &dir);
        let identity = Transform::IDENTITY;

        let square = TargetFrame::square();
        let portrait = TargetFrame::portrait();
        let (a, b) = tokio::join!(
            orchestrator.export_target(&request, &square, &identity, None),
            orchestrator.export_target(&request, &portrait, &identity, None),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_image_jobs_may_overlap() {
        let backend = Arc::new(Recorder::default());
        let orchestrator = orchestrator(MediaKind::Image, backend.clone());
        let dir = out_dir("reframe_test_export_image_parallel");
        let request = ExportRequest::new("photo.png", &dir);
        let identity = Transform::IDENTITY;

        let square = TargetFrame::square();
        let portrait = TargetFrame::portrait();
        let (a, b) = tokio::join!(
            orchestrator.export_target(&request, &square, &identity, None),
            orchestrator.export_target(&request, &portrait, &identity, None),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(backend.peak.load(Ordering::SeqCst), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_progress_stages() {
        let backend = Arc::new(Recorder::default());
        let orchestrator = orchestrator(MediaKind::Video, backend);
        let dir = out_dir("reframe_test_export_progress");
        let request = ExportRequest::new("clip.mp4", &dir);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let progress: ProgressCallback = Arc::new(move |p: ExportProgress| {
            sink.lock().unwrap().push((p.stage, p.progress));
        });

        orchestrator
            .export_target(&request, &TargetFrame::square(), &Transform::IDENTITY, Some(progress))
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (ExportStage::Preparing, 0.0),
                (ExportStage::Rendering, 0.5),
                (ExportStage::Complete, 1.0),
            ]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_engine_failure_fails_only_video() {
        let failing = Arc::new(EngineHandle::with_initializer(|| async {
            Err(ReframeError::engine_unavailable("no ffmpeg"))
        }));
        let backend = Arc::new(Recorder::default());
        let orchestrator = ExportOrchestrator::new(failing)
            .with_prober(Arc::new(FixedProber(MediaKind::Video)))
            .with_video_backend(backend.clone());
        let request = ExportRequest::new("clip.mp4", out_dir("reframe_test_export_engine"));

        let err = orchestrator
            .export_target(&request, &TargetFrame::square(), &Transform::IDENTITY, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReframeError::EngineUnavailable { .. }));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_probes_with_configured_ffprobe() {
        let clip = std::env::temp_dir().join("reframe_test_export_from_config.mp4");
        std::fs::write(&clip, b"not a video").unwrap();

        let orchestrator = ExportOrchestrator::from_config(EngineConfig {
            ffprobe: PathBuf::from("/nonexistent/reframe-ffprobe"),
            ..EngineConfig::default()
        });
        let err = orchestrator.probe(&clip).await.unwrap_err();
        assert!(matches!(err, ReframeError::Probe { .. }));
        assert!(err.to_string().contains("/nonexistent/reframe-ffprobe"));
        assert!(!orchestrator.engine().is_ready());

        std::fs::remove_file(&clip).ok();
    }
}
