use super::MediaSource;
use crate::config::RunConfig;
use crate::error::{AppError, Result};
use crate::model::{StreamKind, StreamVariant, VideoReference};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, instrument};
use yt_dlp::executor::Executor;
use yt_dlp::client::deps::Libraries;

/// [`MediaSource`] backed by the `yt-dlp` executable.
///
/// Metadata fetched by [`MediaSource::lookup`] already carries the format
/// list, so it is kept per URL and reused by [`MediaSource::list_variants`]
/// instead of asking yt-dlp twice.
pub struct YtDlp {
    executable: PathBuf,
    ffmpeg_location: Option<PathBuf>,
    cookies: Option<PathBuf>,
    timeout: Duration,
    variants: Mutex<HashMap<String, Vec<StreamVariant>>>,
}

/// The part of `yt-dlp --dump-json` output this crate reads.
#[derive(Debug, Deserialize)]
struct RawInfo {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    fps: Option<f64>,
    #[serde(default)]
    tbr: Option<f64>,
    #[serde(default)]
    vbr: Option<f64>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    filesize: Option<f64>,
    #[serde(default)]
    filesize_approx: Option<f64>,
}

impl YtDlp {
    pub fn new(libraries: &Libraries, timeout: Duration) -> Self {
        Self {
            executable: libraries.youtube.clone(),
            ffmpeg_location: None,
            cookies: None,
            timeout,
            variants: Mutex::new(HashMap::new()),
        }
    }

    /// Points yt-dlp at a specific ffmpeg binary for its own fixups.
    pub fn with_ffmpeg_location(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg_location = Some(ffmpeg.into());
        self
    }

    /// Cookie file used for metadata requests (downloads receive it per call).
    pub fn with_cookies(mut self, cookies: Option<&Path>) -> Self {
        self.cookies = cookies.map(Path::to_path_buf);
        self
    }

    /// Runs `yt-dlp --update`.
    pub async fn update(&self) -> Result<()> {
        info!("Updating yt-dlp");
        self.execute(vec!["--update".to_string()]).await?;
        Ok(())
    }

    fn base_args(&self, cookies: Option<&Path>) -> Vec<String> {
        let mut args = vec!["--no-progress".to_string(), "--no-warnings".to_string()];
        if let Some(cookies) = cookies.or(self.cookies.as_deref()) {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }
        args
    }

    async fn execute(
        &self,
        args: Vec<String>,
    ) -> std::result::Result<String, yt_dlp::error::Error> {
        let executor = Executor::new(self.executable.clone(), args, self.timeout);
        let output = executor.execute().await?;
        Ok(output.stdout)
    }

    fn remember(&self, url: &str, variants: Vec<StreamVariant>) {
        if let Ok(mut cache) = self.variants.lock() {
            cache.insert(url.to_string(), variants);
        }
    }

    fn remembered(&self, url: &str) -> Option<Vec<StreamVariant>> {
        self.variants.lock().ok()?.get(url).cloned()
    }

    async fn dump_info(&self, url: &str) -> Result<RawInfo> {
        let mut args = self.base_args(None);
        args.extend(["--dump-json", "--no-playlist", url].map(String::from));

        let stdout = self
            .execute(args)
            .await
            .map_err(|e| AppError::Resolution(format!("info fetch for {} failed: {}", url, e)))?;
        parse_info(&stdout, url)
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoReference>> {
        let mut args = self.base_args(None);
        args.extend(["--flat-playlist".to_string(), "--dump-json".to_string()]);
        args.push(format!("ytsearch{}:{}", limit, query));

        let stdout = self
            .execute(args)
            .await
            .map_err(|e| AppError::Resolution(format!("search for '{}' failed: {}", query, e)))?;

        let references = parse_search_output(&stdout, query)?;
        debug!("Search returned {} entries", references.len());
        Ok(references.into_iter().take(limit).collect())
    }

    #[instrument(skip(self))]
    async fn lookup(&self, url: &str) -> Result<VideoReference> {
        let info = self.dump_info(url).await?;
        let reference = reference_from_info(&info, url);
        self.remember(url, variants_from_formats(&info.formats));
        self.remember(&reference.url, variants_from_formats(&info.formats));
        Ok(reference)
    }

    #[instrument(skip(self), fields(id = %reference.id))]
    async fn list_variants(&self, reference: &VideoReference) -> Result<Vec<StreamVariant>> {
        if let Some(variants) = self.remembered(&reference.url) {
            debug!("Using already fetched formats");
            return Ok(variants);
        }

        let info = self.dump_info(&reference.url).await?;
        let variants = variants_from_formats(&info.formats);
        self.remember(&reference.url, variants.clone());
        Ok(variants)
    }

    #[instrument(
        skip(self, reference, cookies),
        fields(id = %reference.id, format = %variant.selector)
    )]
    async fn fetch(
        &self,
        reference: &VideoReference,
        variant: &StreamVariant,
        dest: &Path,
        cookies: Option<&Path>,
    ) -> Result<PathBuf> {
        let mut args = self.base_args(cookies);
        args.extend([
            "--no-playlist".to_string(),
            "--no-part".to_string(),
            "-f".to_string(),
            variant.selector.clone(),
            "-o".to_string(),
            dest.to_string_lossy().into_owned(),
            reference.url.clone(),
        ]);

        self.execute(args).await.map_err(|e| {
            AppError::Download(format!(
                "format {} of {} failed: {}",
                variant.selector, reference.id, e
            ))
        })?;

        if !dest.exists() {
            return Err(AppError::Download(format!(
                "yt-dlp reported success but {} was not written",
                dest.display()
            )));
        }
        Ok(dest.to_path_buf())
    }
}

/// Locates the two binaries for this run, installing them first when asked.
///
/// With `--libs-dir` the binaries are expected (or installed) there;
/// otherwise the bare names are resolved through `PATH` at spawn time.
pub async fn locate_libraries(config: &RunConfig) -> Result<Libraries> {
    let Some(dir) = &config.libs_dir else {
        return Ok(Libraries::new(
            PathBuf::from(executable_name("yt-dlp")),
            PathBuf::from(executable_name("ffmpeg")),
        ));
    };

    let libraries = Libraries::new(
        dir.join(executable_name("yt-dlp")),
        dir.join(executable_name("ffmpeg")),
    );

    if libraries.youtube.exists() && libraries.ffmpeg.exists() {
        return Ok(libraries);
    }

    if !config.install_deps {
        return Err(AppError::InvalidArgument(format!(
            "yt-dlp or ffmpeg missing from {} (pass --install-deps to fetch them)",
            dir.display()
        )));
    }

    info!("Installing yt-dlp and ffmpeg into {}", dir.display());
    tokio::fs::create_dir_all(dir).await?;
    let installed = libraries.install_dependencies().await?;
    Ok(installed)
}

fn executable_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

fn reference_from_info(info: &RawInfo, requested: &str) -> VideoReference {
    let url = info
        .webpage_url
        .clone()
        .unwrap_or_else(|| requested.to_string());
    let title = info.title.clone().unwrap_or_else(|| info.id.clone());
    VideoReference::new(info.id.clone(), url, title)
}

/// Output that does not parse is a resolution failure like any other
/// unusable info fetch.
fn parse_info(stdout: &str, url: &str) -> Result<RawInfo> {
    serde_json::from_str(stdout.trim())
        .map_err(|e| AppError::Resolution(format!("unreadable info for {}: {}", url, e)))
}

/// `--flat-playlist --dump-json` prints one JSON object per line.
fn parse_search_output(stdout: &str, query: &str) -> Result<Vec<VideoReference>> {
    let mut references = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: RawInfo = serde_json::from_str(line).map_err(|e| {
            AppError::Resolution(format!("unreadable search result for '{}': {}", query, e))
        })?;
        let url = entry
            .webpage_url
            .clone()
            .or_else(|| entry.url.clone().filter(|u| u.starts_with("http")))
            .unwrap_or_else(|| watch_url(&entry.id));
        let title = entry.title.clone().unwrap_or_else(|| entry.id.clone());
        references.push(VideoReference::new(entry.id, url, title));
    }
    Ok(references)
}

fn is_none_codec(codec: Option<&str>) -> bool {
    codec == Some("none")
}

fn is_real_codec(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if c != "none" && !c.is_empty())
}

/// Keeps only video-only and audio-only formats; muxed and storyboard
/// formats are dropped.
fn variants_from_formats(formats: &[RawFormat]) -> Vec<StreamVariant> {
    formats.iter().filter_map(variant_from_format).collect()
}

fn variant_from_format(format: &RawFormat) -> Option<StreamVariant> {
    let vcodec = format.vcodec.as_deref();
    let acodec = format.acodec.as_deref();

    let (kind, codec, bitrate) = if is_real_codec(vcodec) && is_none_codec(acodec) {
        if format.height.is_none() {
            return None;
        }
        (StreamKind::VideoOnly, vcodec, format.vbr.or(format.tbr))
    } else if is_real_codec(acodec) && is_none_codec(vcodec) {
        (StreamKind::AudioOnly, acodec, format.abr.or(format.tbr))
    } else {
        return None;
    };

    Some(StreamVariant {
        kind,
        selector: format.format_id.clone(),
        ext: format.ext.clone().unwrap_or_else(|| "mp4".to_string()),
        codec: codec.map(str::to_string),
        height: format.height,
        width: format.width,
        fps: format.fps,
        bitrate,
        filesize: format
            .filesize
            .or(format.filesize_approx)
            .map(|size| size as u64),
    })
}
