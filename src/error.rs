use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for the application.
///
/// The first six variants are the per-candidate failures the pipeline
/// recovers from: they are logged, recorded in the run summary, and the
/// next candidate is attempted. The rest are plumbing errors that usually
/// surface wrapped in one of those.

/// Represents all possible errors that can occur in the application.
///
/// # Error Categories
///
/// - Resolution: turning a token into candidate videos
/// - Selection: filtering and choosing stream variants
/// - Transfer: downloading streams and muxing them
/// - Output: destination collisions
/// - IO / parsing / external tool failures
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("No streams error: {0}")]
    NoStreams(String),

    #[error("Selection error: {0}")]
    Selection(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Merge error: {0}")]
    Merge(String),

    #[error("Output already exists: {} (use --force to overwrite)", .0.display())]
    OutputExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Youtube error: {0}")]
    Youtube(#[from] yt_dlp::error::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("{0}")]
    Custom(String),
}

impl AppError {
    /// Short machine-friendly name of the error kind, used in the failure report.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Resolution(_) => "ResolutionError",
            AppError::NoStreams(_) => "NoStreamsError",
            AppError::Selection(_) => "SelectionError",
            AppError::Download(_) => "DownloadError",
            AppError::Merge(_) => "MergeError",
            AppError::OutputExists(_) => "OutputExistsError",
            AppError::Io(_) => "IoError",
            AppError::Youtube(_) => "YoutubeError",
            AppError::InvalidArgument(_) => "InvalidArgument",
            AppError::Interrupted => "Interrupted",
            AppError::Custom(_) => "Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
