use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A resolved video: what the resolver hands to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    pub id: String,
    pub url: String,
    pub title: String,
}

impl VideoReference {
    pub fn new(id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    VideoOnly,
    AudioOnly,
}

/// One independently downloadable video-only or audio-only quality option.
///
/// `selector` is the yt-dlp `format_id` and is what gets passed back to
/// the downloader; everything else is for sorting and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub kind: StreamKind,
    pub selector: String,
    pub ext: String,
    pub codec: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub fps: Option<f64>,
    /// Kilobits per second.
    pub bitrate: Option<f64>,
    pub filesize: Option<u64>,
}

impl StreamVariant {
    pub fn is_video(&self) -> bool {
        self.kind == StreamKind::VideoOnly
    }

    pub fn is_audio(&self) -> bool {
        self.kind == StreamKind::AudioOnly
    }
}

impl fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StreamKind::VideoOnly => {
                write!(f, "{}p", self.height.unwrap_or(0))?;
                if let Some(fps) = self.fps {
                    write!(f, "{}", fps.round() as u32)?;
                }
            }
            StreamKind::AudioOnly => write!(f, "audio")?,
        }
        write!(f, " {}", self.ext)?;
        if let Some(codec) = &self.codec {
            write!(f, " {}", codec)?;
        }
        if let Some(bitrate) = self.bitrate {
            write!(f, " {:.0}k", bitrate)?;
        }
        if let Some(size) = self.filesize {
            write!(f, " {:.1}MiB", size as f64 / (1024.0 * 1024.0))?;
        }
        write!(f, " (id {})", self.selector)
    }
}

/// The pair of variants chosen for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSelection {
    pub video: StreamVariant,
    pub audio: StreamVariant,
}

/// Everything needed to turn a selection into the final file.
///
/// Built from a selection and a destination, then filled in by the
/// downloader. The temporary area is owned by the job: dropping the job
/// removes whatever was fetched into it.
#[derive(Debug)]
pub struct DownloadJob {
    pub reference: VideoReference,
    pub selection: StreamSelection,
    pub output: PathBuf,
    pub(crate) temp: Option<TempArea>,
    pub video_file: Option<PathBuf>,
    pub audio_file: Option<PathBuf>,
}

impl DownloadJob {
    pub fn new(reference: VideoReference, selection: StreamSelection, output: PathBuf) -> Self {
        Self {
            reference,
            selection,
            output,
            temp: None,
            video_file: None,
            audio_file: None,
        }
    }

    /// Both temporary inputs, once the downloader has filled them in.
    pub fn inputs(&self) -> Option<(&Path, &Path)> {
        match (&self.video_file, &self.audio_file) {
            (Some(video), Some(audio)) => Some((video.as_path(), audio.as_path())),
            _ => None,
        }
    }

    pub(crate) fn take_temp(&mut self) -> Option<TempArea> {
        self.temp.take()
    }
}

/// RAII guard for the per-job temporary directory.
///
/// Files inside are removed when the guard is dropped, whichever way the
/// job ends (success, error, or the future being dropped on interrupt).
#[derive(Debug)]
pub struct TempArea {
    dir: tempfile::TempDir,
}

impl TempArea {
    pub fn create() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("ytmux-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, stem: &str, ext: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{}", stem, ext))
    }
}
