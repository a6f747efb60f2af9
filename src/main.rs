use clap::Parser;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use ytmux::error::Result;
use ytmux::logging::{init_tracing, LogFlush};
use ytmux::tools::{locate_libraries, Ffmpeg, YtDlp};
use ytmux::{Cli, Pipeline, RunConfig, StdinPrompt};

/// Time the pipeline gets to wind down after Ctrl-C before the process is
/// ended for it (it may be blocked on a prompt).
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

/// Main entry point for the application.
///
/// # Steps
/// 1. Parses arguments into a `RunConfig`
/// 2. Initializes logging to stderr and the log directory
/// 3. Locates (or installs) yt-dlp and ffmpeg
/// 4. Runs the pipeline over every token, flushes the log file and exits
///    with the run's status
///
/// # Errors
/// Returns error if:
/// - Arguments are invalid
/// - Logging initialization fails
/// - The external tools cannot be located or installed
#[tokio::main]
async fn main() -> Result<()> {
    let (config, tokens) = RunConfig::from_cli(Cli::parse())?;
    let logs = LogFlush::new(init_tracing(&config.log_dir, config.verbose)?);

    info!("Starting ytmux for {} token(s)", tokens.len());

    let (interrupt, watcher) = watch_interrupt(logs.clone());
    let outcome = run_application(&config, &tokens, interrupt).await;
    watcher.abort();

    let code = match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("Run aborted: {}", e);
            logs.flush();
            return Err(e);
        }
    };

    if code == 0 {
        info!("Application completed successfully");
    }
    logs.flush();

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Wires the real tools into the pipeline and returns the exit code.
///
/// # Arguments
/// * `config` - Frozen run configuration
/// * `tokens` - Video ids, URLs or search queries, processed in order
async fn run_application(
    config: &RunConfig,
    tokens: &[String],
    interrupt: watch::Receiver<bool>,
) -> Result<i32> {
    let libraries = locate_libraries(config).await?;

    let mut source = YtDlp::new(&libraries, config.timeout()).with_cookies(config.cookie_file());
    if config.libs_dir.is_some() {
        source = source.with_ffmpeg_location(&libraries.ffmpeg);
    }
    let muxer = Ffmpeg::new(&libraries, config.timeout());

    if config.update_downloader {
        if let Err(e) = source.update().await {
            warn!("yt-dlp update failed, continuing with the installed version: {}", e);
        }
    }

    if let Some(cookies) = config.cookie_file() {
        info!("Using cookies from {}", cookies.display());
    }

    let pipeline = Pipeline::new(&source, &muxer, config).with_interrupt(interrupt);
    let progress = pipeline.run(tokens, &mut StdinPrompt).await;

    progress.print_summary();
    if let Err(e) = progress.export_failures(&config.log_dir) {
        error!("Failed to export failure report: {}", e);
    }

    Ok(progress.exit_code())
}

/// Spawns the Ctrl-C watcher.
///
/// The flag lets the pipeline abandon the current transfer and drop its
/// temporaries; `main` then finishes normally and aborts this task. A
/// pipeline blocked on a prompt never looks at the flag, so once the grace
/// period runs out the watcher flushes the log file and exits with 130.
fn watch_interrupt(logs: LogFlush) -> (watch::Receiver<bool>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cleaning up");
            let _ = tx.send(true);
            tokio::time::sleep(INTERRUPT_GRACE).await;
            warn!("Run did not stop within {:?}, exiting", INTERRUPT_GRACE);
            logs.flush();
            std::process::exit(130);
        }
    });

    (rx, handle)
}
