//! Fetch a video's best (or hand-picked) video-only and audio-only streams
//! and mux them into a single file.
//!
//! A token is resolved to one or more candidate videos, each candidate's
//! streams are listed and chosen, downloaded into a temporary area, and
//! merged with a stream copy into the destination.
//!
//! # Architecture
//!
//! The application is structured into several key components:
//! - `tools`: `MediaSource` and `Muxer` capabilities, backed by yt-dlp and ffmpeg
//! - `resolver`: token to candidate videos
//! - `selector`: stream filtering, sorting and auto/interactive choice
//! - `downloader` / `merger`: the transfer phase of one candidate
//! - `naming`: destination paths and collision checks
//! - `pipeline`: the per-candidate loop with error isolation
//! - `progress`: run summary, failure report and exit code
//!
//! # Example
//! ```no_run
//! use ytmux::tools::{locate_libraries, Ffmpeg, YtDlp};
//! use ytmux::{Pipeline, RunConfig, StdinPrompt};
//!
//! async fn example() {
//!     let config = RunConfig::default();
//!     let libraries = locate_libraries(&config).await.unwrap();
//!     let source = YtDlp::new(&libraries, config.timeout());
//!     let muxer = Ffmpeg::new(&libraries, config.timeout());
//!
//!     let pipeline = Pipeline::new(&source, &muxer, &config);
//!     let progress = pipeline.run(&["dQw4w9WgXcQ".to_string()], &mut StdinPrompt).await;
//!     progress.print_summary();
//! }
//! ```
pub mod config;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod merger;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod resolver;
pub mod selector;
pub mod tools;

// Re-export commonly used items
pub use config::{Cli, RunConfig};
pub use downloader::Downloader;
pub use error::AppError;
pub use merger::Merger;
pub use model::{DownloadJob, StreamKind, StreamSelection, StreamVariant, VideoReference};
pub use pipeline::Pipeline;
pub use progress::DownloadProgress;
pub use prompt::{Prompt, ScriptedPrompt, StdinPrompt};
