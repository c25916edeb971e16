//! Per-job scratch files in the video engine's working directory.

use std::path::{Path, PathBuf};

/// Input copy and output file for one video job.
///
/// Both files are removed when the guard drops, whether the job
/// succeeded or failed.
#[derive(Debug)]
pub struct ScratchFiles {
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    /// Reserve `job-<id>-in.<input_ext>` and `job-<id>-out.<output_ext>`
    /// in `dir`. Nothing is created on disk yet.
    pub fn new(dir: &Path, job_id: u64, input_ext: &str, output_ext: &str) -> Self {
        let pid = std::process::id();
        Self {
            input: dir.join(format!("job-{pid}-{job_id}-in.{input_ext}")),
            output: dir.join(format!("job-{pid}-{job_id}-out.{output_ext}")),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_both_files() {
        let dir = std::env::temp_dir().join("reframe_test_scratch");
        std::fs::create_dir_all(&dir).unwrap();

        let (input, output) = {
            let scratch = ScratchFiles::new(&dir, 1, "mov", "mp4");
            std::fs::write(scratch.input(), b"in").unwrap();
            std::fs::write(scratch.output(), b"out").unwrap();
            (scratch.input().to_path_buf(), scratch.output().to_path_buf())
        };

        assert!(!input.exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_drop_tolerates_missing_files() {
        let dir = std::env::temp_dir().join("reframe_test_scratch_missing");
        let scratch = ScratchFiles::new(&dir, 7, "mp4", "mp4");
        assert!(scratch.input().ends_with(format!(
            "job-{}-7-in.mp4",
            std::process::id()
        )));
        drop(scratch);
    }
}
