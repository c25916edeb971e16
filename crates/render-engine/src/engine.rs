//! The shared video engine and its lazily initialized handle.
//!
//! Starting the engine means locating a working ffmpeg, reading its
//! version and preparing a scratch directory. That happens at most once
//! per successful attempt: every caller that asks while initialization is
//! in flight awaits the same future. A failed attempt is handed to all of
//! its waiters and then forgotten, so the next request starts over.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use reframe_common::error::{ReframeError, ReframeResult};

use crate::scratch::ScratchFiles;

/// Where to find the tools and where to put temporary files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub scratch_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            scratch_dir: std::env::temp_dir().join("reframe-engine"),
        }
    }
}

/// A started video engine. Runs one job at a time.
#[derive(Debug)]
pub struct VideoEngine {
    config: EngineConfig,
    version: String,
    job_lock: AsyncMutex<()>,
    next_job: AtomicU64,
}

impl VideoEngine {
    /// Wrap an already verified toolchain.
    pub fn new(config: EngineConfig, version: impl Into<String>) -> Self {
        Self {
            config,
            version: version.into(),
            job_lock: AsyncMutex::new(()),
            next_job: AtomicU64::new(0),
        }
    }

    /// Verify ffmpeg runs and prepare the scratch directory.
    pub async fn start(config: EngineConfig) -> ReframeResult<Self> {
        let ffmpeg = config.ffmpeg.clone();
        let version = tokio::task::spawn_blocking(move || ffmpeg_version(&ffmpeg))
            .await
            .map_err(|e| ReframeError::engine_unavailable(format!("engine probe task failed: {e}")))??;

        tokio::fs::create_dir_all(&config.scratch_dir)
            .await
            .map_err(|e| {
                ReframeError::engine_unavailable(format!(
                    "cannot create scratch directory {}: {e}",
                    config.scratch_dir.display()
                ))
            })?;

        tracing::info!(
            version = %version,
            scratch = %config.scratch_dir.display(),
            "Video engine ready"
        );
        Ok(Self::new(config, version))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.config.ffmpeg
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.config.scratch_dir
    }

    /// Wait for exclusive use of the engine.
    pub async fn lock_job(&self) -> MutexGuard<'_, ()> {
        self.job_lock.lock().await
    }

    /// Fresh scratch file pair for the next job.
    pub fn scratch_files(&self, input_ext: &str, output_ext: &str) -> ScratchFiles {
        let id = self.next_job.fetch_add(1, Ordering::Relaxed);
        ScratchFiles::new(&self.config.scratch_dir, id, input_ext, output_ext)
    }
}

type Initializer = Box<dyn Fn() -> BoxFuture<'static, ReframeResult<VideoEngine>> + Send + Sync>;

// The error side is a message: `Shared` needs a cloneable output.
type InitFuture = Shared<BoxFuture<'static, Result<Arc<VideoEngine>, String>>>;

/// Lazily started, memoized access to the video engine.
pub struct EngineHandle {
    init: Initializer,
    slot: Mutex<Option<InitFuture>>,
}

impl EngineHandle {
    /// Handle that starts a real engine with `config` on first use.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_initializer(move || VideoEngine::start(config.clone()))
    }

    /// Handle with a custom start routine.
    pub fn with_initializer<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ReframeResult<VideoEngine>> + Send + 'static,
    {
        Self {
            init: Box::new(move || init().boxed()),
            slot: Mutex::new(None),
        }
    }

    /// The engine, starting it if needed.
    pub async fn get(&self) -> ReframeResult<Arc<VideoEngine>> {
        let attempt = {
            let mut slot = self.lock_slot();
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    tracing::debug!("Starting video engine");
                    let fresh = (self.init)()
                        .map(|result| result.map(Arc::new).map_err(|e| e.to_string()))
                        .boxed()
                        .shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        match attempt.clone().await {
            Ok(engine) => Ok(engine),
            Err(message) => {
                let mut slot = self.lock_slot();
                // A retry may already have replaced the slot.
                if slot.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
                    *slot = None;
                    tracing::warn!(error = %message, "Video engine failed to start");
                }
                Err(ReframeError::engine_unavailable(message))
            }
        }
    }

    /// Whether a started engine is memoized.
    pub fn is_ready(&self) -> bool {
        self.lock_slot()
            .as_ref()
            .and_then(|attempt| attempt.peek())
            .is_some_and(|result| result.is_ok())
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<InitFuture>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

fn ffmpeg_version(ffmpeg: &Path) -> ReframeResult<String> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-version"])
        .output()
        .map_err(|e| {
            ReframeError::engine_unavailable(format!("cannot run {}: {e}", ffmpeg.display()))
        })?;

    if !output.status.success() {
        return Err(ReframeError::engine_unavailable(format!(
            "{} -version exited with {}",
            ffmpeg.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_version_line(&stdout).unwrap_or_else(|| "unknown".to_string()))
}

/// `ffmpeg version 6.1.1-3ubuntu5 Copyright ...` -> `6.1.1-3ubuntu5`.
fn parse_version_line(output: &str) -> Option<String> {
    let line = output.lines().next()?;
    let rest = line.trim().strip_prefix("ffmpeg version ")?;
    rest.split_whitespace().next().map(str::to_string)
}
