use crate::error::AppError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Progress tracking and reporting for one run.
///
/// Every candidate ends up either as a success (with its output path) or
/// a failure (with the error kind and message). The tally drives the final
/// summary, the failure report and the process exit code.

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub candidate: String,
    pub kind: &'static str,
    pub message: String,
}

/// Tracks outcomes for a run.
///
/// # Examples
///
/// ```
/// use ytmux::DownloadProgress;
///
/// let mut progress = DownloadProgress::new();
/// progress.record_success("clip [abc]", "download/clip.mp4".into());
/// assert_eq!(progress.exit_code(), 0);
/// ```
#[derive(Debug)]
pub struct DownloadProgress {
    pub start_time: Instant,
    pub interrupted: bool,
    completed: Vec<(String, PathBuf)>,
    failures: Vec<Failure>,
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            interrupted: false,
            completed: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self, candidate: impl Into<String>, output: PathBuf) {
        self.completed.push((candidate.into(), output));
    }

    pub fn record_failure(&mut self, candidate: impl Into<String>, error: &AppError) {
        self.failures.push(Failure {
            candidate: candidate.into(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn successes(&self) -> &[(String, PathBuf)] {
        &self.completed
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// 0 if anything succeeded, even in an interrupted run; otherwise 130
    /// after an interrupt and 1 for a plain failure.
    pub fn exit_code(&self) -> i32 {
        if !self.completed.is_empty() {
            0
        } else if self.interrupted {
            130
        } else {
            1
        }
    }

    pub fn print_summary(&self) {
        println!("\nDownload Summary:");
        println!(
            "Total time: {:.1}s",
            self.start_time.elapsed().as_secs_f64()
        );
        println!("Successfully downloaded: {}", self.completed.len());
        for (candidate, output) in &self.completed {
            println!("  {} -> {}", candidate, output.display());
        }
        println!("Failed downloads: {}", self.failures.len());
        for failure in &self.failures {
            println!("  {}: {}", failure.candidate, failure.message);
        }
        if self.interrupted {
            println!("Run was interrupted");
        }
    }

    /// Appends failed candidates to `<log_dir>/failed.txt`.
    pub fn export_failures(&self, log_dir: &Path) -> std::io::Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(log_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("failed.txt"))?;

        let mut writer = std::io::BufWriter::new(file);

        writeln!(
            writer,
            "\n=== Failed Downloads Report {} ===",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        for failure in &self.failures {
            writeln!(writer, "Candidate: {}", failure.candidate)?;
            writeln!(writer, "Kind: {}", failure.kind)?;
            writeln!(writer, "Error: {}", failure.message)?;
            writeln!(writer, "---")?;
        }

        writer.flush()?;
        Ok(())
    }
}
