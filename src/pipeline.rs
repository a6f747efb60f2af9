use crate::config::RunConfig;
use crate::downloader::Downloader;
use crate::error::{AppError, Result};
use crate::merger::Merger;
use crate::model::{DownloadJob, VideoReference};
use crate::naming;
use crate::progress::DownloadProgress;
use crate::prompt::Prompt;
use crate::resolver;
use crate::selector;
use crate::tools::{MediaSource, Muxer};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

/// Drives resolve → select → download → merge for every token and candidate.
///
/// A failure in one candidate is logged and recorded, and the loop moves on;
/// only an interrupt stops the run early.
pub struct Pipeline<'a> {
    source: &'a dyn MediaSource,
    muxer: &'a dyn Muxer,
    config: &'a RunConfig,
    interrupt: Option<watch::Receiver<bool>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn MediaSource, muxer: &'a dyn Muxer, config: &'a RunConfig) -> Self {
        Self {
            source,
            muxer,
            config,
            interrupt: None,
        }
    }

    /// Stops the run once the flag behind `interrupt` turns true.
    pub fn with_interrupt(mut self, interrupt: watch::Receiver<bool>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub async fn run(&self, tokens: &[String], prompt: &mut dyn Prompt) -> DownloadProgress {
        let mut progress = DownloadProgress::new();

        for token in tokens {
            if self.is_interrupted() {
                progress.interrupted = true;
                break;
            }
            self.run_token(token, prompt, &mut progress).await;
        }

        info!(
            "Run finished: {} succeeded, {} failed",
            progress.successes().len(),
            progress.failures().len()
        );
        progress
    }

    #[instrument(skip(self, prompt, progress))]
    async fn run_token(
        &self,
        token: &str,
        prompt: &mut dyn Prompt,
        progress: &mut DownloadProgress,
    ) {
        // An explicit destination is known before anything is fetched.
        if let Some(output) = naming::explicit_destination(self.config) {
            if let Err(e) = naming::ensure_available(&output, self.config.force) {
                error!("Skipping '{}': {}", token, e);
                progress.record_failure(token, &e);
                return;
            }
        }

        let references =
            match resolver::resolve(self.source, token, self.config.max_results).await {
                Ok(references) => references,
                Err(e) => {
                    error!("Could not resolve '{}': {}", token, e);
                    progress.record_failure(token, &e);
                    return;
                }
            };

        let total = references.len();
        for (index, reference) in references.iter().enumerate() {
            if self.is_interrupted() {
                progress.interrupted = true;
                return;
            }

            info!("Candidate {}/{}: {}", index + 1, total, reference);
            let start = std::time::Instant::now();

            match self.process_candidate(reference, prompt).await {
                Ok(output) => {
                    info!(
                        "Candidate {} completed in {:.1}s: {}",
                        index + 1,
                        start.elapsed().as_secs_f64(),
                        output.display()
                    );
                    progress.record_success(reference.to_string(), output);
                }
                Err(AppError::Interrupted) => {
                    warn!("Interrupted while processing {}", reference);
                    progress.record_failure(reference.to_string(), &AppError::Interrupted);
                    progress.interrupted = true;
                    return;
                }
                Err(e) => {
                    error!("Candidate {} failed: {}", reference, e);
                    progress.record_failure(reference.to_string(), &e);
                }
            }
        }
    }

    /// One candidate end to end. The destination is checked before any
    /// stream is listed or fetched.
    pub async fn process_candidate(
        &self,
        reference: &VideoReference,
        prompt: &mut dyn Prompt,
    ) -> Result<PathBuf> {
        let output = naming::destination(self.config, reference);
        naming::ensure_available(&output, self.config.force)?;

        let selection =
            selector::select_streams(self.source, reference, self.config, prompt).await?;
        let mut job = DownloadJob::new(reference.clone(), selection, output);

        let transfer = async {
            Downloader::new(self.source, self.config)
                .download(&mut job)
                .await?;
            Merger::new(self.muxer).merge(job).await
        };

        tokio::select! {
            result = transfer => result,
            _ = wait_for_interrupt(self.interrupt.clone()) => Err(AppError::Interrupted),
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}

/// Resolves once the flag is set; never resolves without a receiver or
/// after the sender is gone.
async fn wait_for_interrupt(interrupt: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = interrupt else {
        return std::future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}
