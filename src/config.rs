use crate::error::{AppError, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration management for the application.
///
/// Command-line flags are parsed by [`Cli`] and frozen into a [`RunConfig`],
/// which is threaded by reference through every stage of the pipeline.

/// Command-line interface.
#[derive(Parser, Debug, Clone)]
#[command(name = "ytmux")]
#[command(about = "Download a video's best video and audio streams and mux them into one file")]
pub struct Cli {
    /// Video ID, URL, or free-text search query
    #[arg(required = true, num_args = 1..)]
    pub tokens: Vec<String>,

    /// Auto-select the best quality, skip the interactive prompt
    #[arg(short = 's', long = "skip-quality")]
    pub skip_quality: bool,

    /// Explicit output file path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Maximum number of search candidates to attempt
    #[arg(short = 'm', long = "max-results", default_value_t = 1)]
    pub max_results: usize,

    /// Text inserted before the file extension
    #[arg(short = 'x', long = "suffix")]
    pub suffix: Option<String>,

    /// Overwrite an existing destination file
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Cap the selectable video resolution (e.g. 720 or 720p)
    #[arg(long = "max-res", value_parser = parse_resolution)]
    pub max_res: Option<u32>,

    /// Directory for finished files when --output is not given
    #[arg(long = "output-dir", default_value = "download")]
    pub output_dir: PathBuf,

    /// Directory for run logs and the failure report
    #[arg(long = "log-dir", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Cookie file passed to yt-dlp when it exists
    #[arg(long = "cookies", env = "YTMUX_COOKIES", default_value = "cookies.txt")]
    pub cookies: PathBuf,

    /// Directory holding yt-dlp and ffmpeg binaries (PATH is used otherwise)
    #[arg(long = "libs-dir")]
    pub libs_dir: Option<PathBuf>,

    /// Install missing yt-dlp/ffmpeg binaries into --libs-dir
    #[arg(long = "install-deps", requires = "libs_dir")]
    pub install_deps: bool,

    /// Run `yt-dlp --update` before downloading
    #[arg(long = "update-downloader")]
    pub update_downloader: bool,

    /// Timeout in seconds for each external command
    #[arg(long = "timeout", default_value_t = 1800)]
    pub timeout: u64,

    /// Debug-level logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Frozen run configuration.
///
/// # Examples
///
/// ```
/// use ytmux::RunConfig;
///
/// let config = RunConfig::default();
/// assert_eq!(config.max_results, 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub skip_quality: bool,
    pub output: Option<PathBuf>,
    pub max_results: usize,
    pub suffix: Option<String>,
    pub force: bool,
    pub max_res: Option<u32>,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub cookies: PathBuf,
    pub libs_dir: Option<PathBuf>,
    pub install_deps: bool,
    pub update_downloader: bool,
    pub timeout_secs: u64,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            skip_quality: false,
            output: None,
            max_results: 1,
            suffix: None,
            force: false,
            max_res: None,
            output_dir: PathBuf::from("download"),
            log_dir: PathBuf::from("logs"),
            cookies: PathBuf::from("cookies.txt"),
            libs_dir: None,
            install_deps: false,
            update_downloader: false,
            timeout_secs: 1800,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Builds the run configuration from parsed flags, returning it with the tokens.
    pub fn from_cli(cli: Cli) -> Result<(Self, Vec<String>)> {
        if cli.max_results == 0 {
            return Err(AppError::InvalidArgument(
                "--max-results must be at least 1".to_string(),
            ));
        }

        let config = Self {
            skip_quality: cli.skip_quality,
            output: cli.output,
            max_results: cli.max_results,
            suffix: cli.suffix.filter(|s| !s.is_empty()),
            force: cli.force,
            max_res: cli.max_res,
            output_dir: cli.output_dir,
            log_dir: cli.log_dir,
            cookies: cli.cookies,
            libs_dir: cli.libs_dir,
            install_deps: cli.install_deps,
            update_downloader: cli.update_downloader,
            timeout_secs: cli.timeout,
            verbose: cli.verbose,
        };
        Ok((config, cli.tokens))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The cookie file, only when it is actually present on disk.
    pub fn cookie_file(&self) -> Option<&std::path::Path> {
        if self.cookies.is_file() {
            Some(self.cookies.as_path())
        } else {
            None
        }
    }
}

/// Parses a resolution ceiling such as `720`, `720p` or `1080P`.
pub fn parse_resolution(value: &str) -> std::result::Result<u32, String> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_suffix('p')
        .or_else(|| trimmed.strip_suffix('P'))
        .unwrap_or(trimmed);

    match digits.parse::<u32>() {
        Ok(0) => Err("resolution must be greater than zero".to_string()),
        Ok(height) => Ok(height),
        Err(_) => Err(format!("invalid resolution '{}', expected e.g. 720 or 720p", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolution_forms() {
        assert_eq!(parse_resolution("720"), Ok(720));
        assert_eq!(parse_resolution("1080p"), Ok(1080));
        assert_eq!(parse_resolution(" 480P "), Ok(480));
        assert!(parse_resolution("hd").is_err());
        assert!(parse_resolution("0p").is_err());
    }

    #[test]
    fn cli_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "ytmux",
            "never gonna give you up",
            "-s",
            "-m",
            "5",
            "-x",
            "hq",
            "--max-res",
            "720p",
            "-f",
        ])
        .unwrap();
        let (config, tokens) = RunConfig::from_cli(cli).unwrap();

        assert_eq!(tokens, vec!["never gonna give you up".to_string()]);
        assert!(config.skip_quality);
        assert!(config.force);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.suffix.as_deref(), Some("hq"));
        assert_eq!(config.max_res, Some(720));
        assert_eq!(config.output_dir, PathBuf::from("download"));
    }

    #[test]
    fn zero_max_results_is_rejected() {
        let cli = Cli::try_parse_from(["ytmux", "dQw4w9WgXcQ", "-m", "0"]).unwrap();
        assert!(matches!(
            RunConfig::from_cli(cli),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_cookie_file_is_ignored() {
        let config = RunConfig {
            cookies: PathBuf::from("definitely/not/here/cookies.txt"),
            ..RunConfig::default()
        };
        assert!(config.cookie_file().is_none());
    }
}
