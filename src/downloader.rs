use crate::config::RunConfig;
use crate::error::{AppError, Result};
use crate::model::{DownloadJob, StreamVariant, TempArea, VideoReference};
use crate::tools::MediaSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Fetches the two chosen streams of a job into a fresh temporary area.
///
/// # Fields
/// * `source` - The media source doing the actual transfer
/// * `cookies` - Cookie file forwarded to every fetch, when present on disk
pub struct Downloader<'a> {
    source: &'a dyn MediaSource,
    cookies: Option<PathBuf>,
}

impl<'a> Downloader<'a> {
    pub fn new(source: &'a dyn MediaSource, config: &RunConfig) -> Self {
        Self {
            source,
            cookies: config.cookie_file().map(Path::to_path_buf),
        }
    }

    /// Downloads the video stream, then the audio stream, and records the
    /// temporary paths on the job.
    ///
    /// # Details
    /// The temporary area only becomes part of the job once both streams
    /// are on disk. If either fetch fails the area is dropped here, which
    /// removes anything already written, and the job is left untouched.
    ///
    /// # Errors
    /// * `Download` if either transfer fails or produces an empty file
    #[instrument(skip_all, fields(id = %job.reference.id))]
    pub async fn download(&self, job: &mut DownloadJob) -> Result<()> {
        let temp = TempArea::create()
            .map_err(|e| AppError::Download(format!("cannot create temporary area: {}", e)))?;
        debug!("Temporary area at {}", temp.path().display());

        let video_dest = temp.file("video", &job.selection.video.ext);
        let audio_dest = temp.file("audio", &job.selection.audio.ext);

        let fetched = async {
            let video = self
                .fetch_stream(&job.reference, &job.selection.video, &video_dest)
                .await?;
            let audio = self
                .fetch_stream(&job.reference, &job.selection.audio, &audio_dest)
                .await?;
            Ok::<_, AppError>((video, audio))
        }
        .await;

        match fetched {
            Ok((video, audio)) => {
                job.video_file = Some(video);
                job.audio_file = Some(audio);
                job.temp = Some(temp);
                Ok(())
            }
            Err(e) => {
                warn!("Discarding partial download: {}", e);
                drop(temp);
                Err(e)
            }
        }
    }

    async fn fetch_stream(
        &self,
        reference: &VideoReference,
        variant: &StreamVariant,
        dest: &Path,
    ) -> Result<PathBuf> {
        info!("Downloading {} stream {}", kind_label(variant), variant);

        let path = self
            .source
            .fetch(reference, variant, dest, self.cookies.as_deref())
            .await?;

        let size = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.len())
            .map_err(|e| AppError::Download(format!("{} unreadable: {}", path.display(), e)))?;
        if size == 0 {
            return Err(AppError::Download(format!(
                "{} stream {} came back empty",
                kind_label(variant),
                variant.selector
            )));
        }

        debug!("Fetched {} bytes into {}", size, path.display());
        Ok(path)
    }
}

fn kind_label(variant: &StreamVariant) -> &'static str {
    if variant.is_video() {
        "video"
    } else {
        "audio"
    }
}
