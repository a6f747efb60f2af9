//! Capability interfaces over the two external tools.
//!
//! The pipeline only ever talks to a [`MediaSource`] and a [`Muxer`], so
//! both can be swapped for fakes in tests.

use crate::error::Result;
use crate::model::{StreamVariant, VideoReference};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::Ffmpeg;
pub use ytdlp::{locate_libraries, YtDlp};

/// The media-fetching side: search, metadata and stream download.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Up to `limit` candidates for a free-text query, in relevance order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoReference>>;

    /// Metadata for a single URL.
    async fn lookup(&self, url: &str) -> Result<VideoReference>;

    /// Every stream variant the source offers for the video, unfiltered.
    async fn list_variants(&self, reference: &VideoReference) -> Result<Vec<StreamVariant>>;

    /// Downloads one variant to `dest` and returns the written path.
    async fn fetch(
        &self,
        reference: &VideoReference,
        variant: &StreamVariant,
        dest: &Path,
        cookies: Option<&Path>,
    ) -> Result<PathBuf>;
}

/// The muxing side: combine a video-only and an audio-only file losslessly.
#[async_trait]
pub trait Muxer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn mux(&self, video: &Path, audio: &Path, dest: &Path) -> Result<()>;
}
