//! ffmpeg video backend.
//!
//! Each job copies the source into the engine's scratch directory, runs
//! ffmpeg with the plan's filter chain and `-progress pipe:1`, and reads
//! the encoded file back.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use reframe_common::config::EncodeDefaults;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_processing_core::planner::{CompositionPlan, OUTPUT_PIXEL_FORMAT};

use crate::engine::VideoEngine;

/// Receives progress in `[0, 1]`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Encoder settings for one video job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub codec: String,
    pub preset: String,
    pub crf: u8,
    /// 0 lets ffmpeg choose.
    pub threads: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::from(&EncodeDefaults::default())
    }
}

impl From<&EncodeDefaults> for EncodeOptions {
    fn from(defaults: &EncodeDefaults) -> Self {
        Self {
            codec: defaults.video_codec.clone(),
            preset: defaults.preset.clone(),
            crf: defaults.crf,
            threads: defaults.threads,
        }
    }
}

/// Encodes one plan into an mp4.
pub trait VideoBackend: Send + Sync {
    fn encode(
        &self,
        engine: &VideoEngine,
        plan: &CompositionPlan,
        source: &Path,
        options: &EncodeOptions,
        duration_secs: Option<f64>,
        progress: Option<&ProgressFn>,
    ) -> ReframeResult<Vec<u8>>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegVideoBackend;

impl VideoBackend for FfmpegVideoBackend {
    fn encode(
        &self,
        engine: &VideoEngine,
        plan: &CompositionPlan,
        source: &Path,
        options: &EncodeOptions,
        duration_secs: Option<f64>,
        progress: Option<&ProgressFn>,
    ) -> ReframeResult<Vec<u8>> {
        let input_ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let scratch = engine.scratch_files(input_ext, "mp4");

        std::fs::copy(source, scratch.input()).map_err(|e| {
            ReframeError::encode(format!("cannot stage {}: {e}", source.display()))
        })?;

        let args = ffmpeg_args(scratch.input(), scratch.output(), plan, options);
        tracing::debug!(label = %plan.target_label, args = ?args, "Running ffmpeg");

        let mut child = Command::new(engine.ffmpeg())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReframeError::encode(format!("failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            label = %plan.target_label,
            filter = %plan.filter_chain(),
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReframeError::encode("failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReframeError::encode("failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once a full stderr pipe goes unread.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut output = String::new();
            match BufReader::new(stderr).read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let started = std::time::Instant::now();
        let mut state = ProgressState::default();
        let mut last_advance_secs = 0.0f64;
        let mut last_advance_wall = std::time::Instant::now();
        let mut line = String::new();
        let mut reader = BufReader::new(stdout);
        loop {
            line.clear();
            let bytes = match reader.read_line(&mut line) {
                Ok(bytes) => bytes,
                Err(e) => {
                    terminate(&mut child);
                    let _ = stderr_task.join();
                    return Err(ReframeError::encode(format!(
                        "failed reading ffmpeg progress: {e}"
                    )));
                }
            };
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key != "progress" {
                continue;
            }

            if state.out_time_secs > last_advance_secs + 0.001 {
                last_advance_secs = state.out_time_secs;
                last_advance_wall = std::time::Instant::now();
            } else if last_advance_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    label = %plan.target_label,
                    out_time_secs = state.out_time_secs,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_advance_wall = std::time::Instant::now();
            }
            if let Some(cb) = progress {
                cb(state.fraction(duration_secs));
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReframeError::encode(format!("failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReframeError::encode(format!(
                "ffmpeg exited with {status}: {}",
                last_lines(&stderr_output, 12)
            )));
        }

        let bytes = std::fs::read(scratch.output())
            .map_err(|e| ReframeError::encode(format!("ffmpeg produced no output: {e}")))?;
        if bytes.is_empty() {
            return Err(ReframeError::encode("ffmpeg produced an empty file"));
        }

        tracing::info!(
            label = %plan.target_label,
            bytes = bytes.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "ffmpeg encode finished"
        );
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Full ffmpeg argument list for one job.
pub fn ffmpeg_args(
    input: &Path,
    output: &Path,
    plan: &CompositionPlan,
    options: &EncodeOptions,
) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "0:a?".to_string(),
        "-vf".to_string(),
        plan.filter_chain(),
        "-c:v".to_string(),
        options.codec.clone(),
        "-preset".to_string(),
        options.preset.clone(),
        "-crf".to_string(),
        options.crf.to_string(),
        "-pix_fmt".to_string(),
        OUTPUT_PIXEL_FORMAT.to_string(),
    ];
    if options.threads > 0 {
        args.push("-threads".to_string());
        args.push(options.threads.to_string());
    }
    args.extend(
        [
            "-c:a",
            "aac",
            "-b:a",
            "160k",
            "-movflags",
            "+faststart",
            "-progress",
            "pipe:1",
            "-nostats",
        ]
        .map(str::to_string),
    );
    args.push(output.display().to_string());
    args
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports out_time_ms in microseconds.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, duration_secs: Option<f64>) -> f64 {
        if self.complete {
            return 1.0;
        }
        match duration_secs {
            Some(total) if total > 0.0 => (self.out_time_secs / total).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Kill and reap a child that is being abandoned.
fn terminate(child: &mut Child) {
    if let Err(err) = child.kill() {
        tracing::debug!(pid = child.id(), error = %err, "ffmpeg already exited");
    }
    if let Err(err) = child.wait() {
        tracing::warn!(pid = child.id(), error = %err, "Failed to reap ffmpeg");
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}
