use super::Muxer;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;
use yt_dlp::executor::Executor;
use yt_dlp::client::deps::Libraries;

/// [`Muxer`] backed by the `ffmpeg` executable, stream copy only.
pub struct Ffmpeg {
    executable: PathBuf,
    timeout: Duration,
}

impl Ffmpeg {
    pub fn new(libraries: &Libraries, timeout: Duration) -> Self {
        Self {
            executable: libraries.ffmpeg.clone(),
            timeout,
        }
    }
}

/// First video track of the first input, first audio track of the second,
/// both copied without re-encoding. `-strict experimental` lets older builds
/// put Opus into an MP4 container.
fn mux_args(video: &Path, audio: &Path, dest: &Path) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .map(String::from)
        .to_vec();
    args.push(video.to_string_lossy().into_owned());
    args.push("-i".to_string());
    args.push(audio.to_string_lossy().into_owned());
    args.extend(
        ["-map", "0:v:0", "-map", "1:a:0", "-c", "copy", "-strict", "experimental"]
            .map(String::from),
    );
    args.push(dest.to_string_lossy().into_owned());
    args
}

#[async_trait]
impl Muxer for Ffmpeg {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    #[instrument(skip(self))]
    async fn mux(&self, video: &Path, audio: &Path, dest: &Path) -> Result<()> {
        let executor = Executor::new(self.executable.clone(), mux_args(video, audio, dest), self.timeout);

        executor
            .execute()
            .await
            .map_err(|e| AppError::Merge(format!("ffmpeg failed for {}: {}", dest.display(), e)))?;
        Ok(())
    }
}
