#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use ytmux::error::{AppError, Result};
use ytmux::tools::{MediaSource, Muxer};
use ytmux::{RunConfig, StreamKind, StreamVariant, VideoReference};

pub fn video(selector: &str, height: u32) -> StreamVariant {
    StreamVariant {
        kind: StreamKind::VideoOnly,
        selector: selector.to_string(),
        ext: "mp4".to_string(),
        codec: Some("avc1".to_string()),
        height: Some(height),
        width: None,
        fps: Some(30.0),
        bitrate: Some(height as f64 * 2.0),
        filesize: None,
    }
}

pub fn audio(selector: &str, bitrate: f64) -> StreamVariant {
    StreamVariant {
        kind: StreamKind::AudioOnly,
        selector: selector.to_string(),
        ext: "m4a".to_string(),
        codec: Some("mp4a.40.2".to_string()),
        height: None,
        width: None,
        fps: None,
        bitrate: Some(bitrate),
        filesize: None,
    }
}

pub fn reference(id: &str, title: &str) -> VideoReference {
    VideoReference::new(id, format!("https://www.youtube.com/watch?v={}", id), title)
}

/// In-memory media source recording every call it receives.
pub struct FakeSource {
    pub search_results: Vec<VideoReference>,
    pub variants: Vec<StreamVariant>,
    /// Video ids whose every fetch fails.
    pub failing_ids: HashSet<String>,
    /// Selectors whose fetch fails.
    pub failing_selectors: HashSet<String>,
    /// Selectors whose fetch "succeeds" with a zero-byte file.
    pub empty_selectors: HashSet<String>,
    /// Selector whose fetch raises the interrupt flag and then hangs.
    pub hanging_selector: Option<(String, watch::Sender<bool>)>,
    pub calls: Mutex<Vec<String>>,
    pub written: Mutex<Vec<PathBuf>>,
    /// Cookie argument of every fetch, in call order.
    pub cookies_seen: Mutex<Vec<Option<PathBuf>>>,
}

impl FakeSource {
    pub fn new(variants: Vec<StreamVariant>) -> Self {
        Self {
            search_results: Vec::new(),
            variants,
            failing_ids: HashSet::new(),
            failing_selectors: HashSet::new(),
            empty_selectors: HashSet::new(),
            hanging_selector: None,
            calls: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
            cookies_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search_results(mut self, results: Vec<VideoReference>) -> Self {
        self.search_results = results;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().unwrap().clone()
    }

    pub fn cookies_seen(&self) -> Vec<Option<PathBuf>> {
        self.cookies_seen.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoReference>> {
        self.record(format!("search:{}:{}", query, limit));
        Ok(self.search_results.iter().take(limit).cloned().collect())
    }

    async fn lookup(&self, url: &str) -> Result<VideoReference> {
        self.record(format!("lookup:{}", url));
        let id = url.rsplit("v=").next().unwrap_or(url).to_string();
        Ok(reference(&id, &format!("Title {}", id)))
    }

    async fn list_variants(&self, reference: &VideoReference) -> Result<Vec<StreamVariant>> {
        self.record(format!("variants:{}", reference.id));
        Ok(self.variants.clone())
    }

    async fn fetch(
        &self,
        reference: &VideoReference,
        variant: &StreamVariant,
        dest: &Path,
        cookies: Option<&Path>,
    ) -> Result<PathBuf> {
        self.record(format!("fetch:{}:{}", reference.id, variant.selector));
        self.cookies_seen
            .lock()
            .unwrap()
            .push(cookies.map(Path::to_path_buf));

        if self.failing_ids.contains(&reference.id)
            || self.failing_selectors.contains(&variant.selector)
        {
            return Err(AppError::Download(format!(
                "simulated failure for {} format {}",
                reference.id, variant.selector
            )));
        }

        if self.empty_selectors.contains(&variant.selector) {
            std::fs::write(dest, b"")?;
        } else {
            std::fs::write(dest, format!("{}-{}", reference.id, variant.selector))?;
        }
        self.written.lock().unwrap().push(dest.to_path_buf());

        if let Some((selector, tx)) = &self.hanging_selector {
            if selector == &variant.selector {
                let _ = tx.send(true);
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }

        Ok(dest.to_path_buf())
    }
}

/// Muxer that concatenates its inputs, or fails on request.
#[derive(Default)]
pub struct FakeMuxer {
    pub fail: bool,
    /// Raises the interrupt flag after writing its output, then hangs.
    pub hang: Option<watch::Sender<bool>>,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl FakeMuxer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn hanging(interrupt: watch::Sender<bool>) -> Self {
        Self {
            hang: Some(interrupt),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Muxer for FakeMuxer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn mux(&self, video: &Path, audio: &Path, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(dest.to_path_buf());
        if self.fail {
            std::fs::write(dest, b"partial")?;
            return Err(AppError::Merge("simulated ffmpeg exit code 1".to_string()));
        }
        let mut bytes = std::fs::read(video)?;
        bytes.extend(std::fs::read(audio)?);
        std::fs::write(dest, bytes)?;

        if let Some(tx) = &self.hang {
            let _ = tx.send(true);
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(())
    }
}

/// Run configuration rooted in a scratch directory.
pub fn config_in(dir: &Path) -> RunConfig {
    RunConfig {
        skip_quality: true,
        output_dir: dir.join("download"),
        log_dir: dir.join("logs"),
        cookies: dir.join("cookies.txt"),
        ..RunConfig::default()
    }
}
