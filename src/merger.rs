use crate::error::{AppError, Result};
use crate::model::DownloadJob;
use crate::tools::Muxer;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{info, instrument, warn};

/// Muxes a downloaded job into its destination and tears the job down.
pub struct Merger<'a> {
    muxer: &'a dyn Muxer,
}

impl<'a> Merger<'a> {
    pub fn new(muxer: &'a dyn Muxer) -> Self {
        Self { muxer }
    }

    /// Combines the job's two temporary files into `job.output`.
    ///
    /// The muxer writes to a hidden staging file next to the destination,
    /// which is renamed into place only on success. The staging file is
    /// deleted when dropped, so neither a failed merge nor an abandoned one
    /// leaves a partial file behind. Both temporary inputs are removed
    /// whatever the outcome.
    #[instrument(skip_all, fields(id = %job.reference.id, output = %job.output.display()))]
    pub async fn merge(&self, mut job: DownloadJob) -> Result<PathBuf> {
        let temp = job.take_temp();
        let result = self.merge_inputs(&job).await;

        cleanup_temp_files(&job).await;
        drop(temp);

        result
    }

    async fn merge_inputs(&self, job: &DownloadJob) -> Result<PathBuf> {
        let (video, audio) = job
            .inputs()
            .ok_or_else(|| AppError::Merge("job has not been downloaded".to_string()))?;
        ensure_input(video).await?;
        ensure_input(audio).await?;

        let parent = job
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        let staging = staging_file(&job.output, parent)
            .map_err(|e| AppError::Merge(format!("cannot create staging file: {}", e)))?;
        info!("Merging with {}", self.muxer.name());

        self.muxer.mux(video, audio, &staging).await?;

        staging.persist(&job.output).map_err(|e| {
            AppError::Merge(format!(
                "could not move merged file into {}: {}",
                job.output.display(),
                e.error
            ))
        })?;

        info!("Merged into {}", job.output.display());
        Ok(job.output.clone())
    }
}

/// `dir/name.mp4` -> `dir/.name.XXXXXX.part.mp4`, removed on drop. The
/// extension is kept so the muxer still infers the container from it.
fn staging_file(output: &Path, dir: &Path) -> std::io::Result<TempPath> {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = match output.extension() {
        Some(ext) => format!(".part.{}", ext.to_string_lossy()),
        None => ".part".to_string(),
    };

    let file = tempfile::Builder::new()
        .prefix(&format!(".{}.", stem))
        .suffix(&suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

async fn ensure_input(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(AppError::Merge(format!("{} is empty", path.display()))),
        Err(e) => Err(AppError::Merge(format!("{} is missing: {}", path.display(), e))),
    }
}

/// Removes the temporary inputs; errors are logged but not propagated.
async fn cleanup_temp_files(job: &DownloadJob) {
    for path in [&job.video_file, &job.audio_file].into_iter().flatten() {
        remove_if_exists(path).await;
    }
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not delete {}: {}", path.display(), e),
    }
}
