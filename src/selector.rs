use crate::config::RunConfig;
use crate::error::{AppError, Result};
use crate::model::{StreamSelection, StreamVariant, VideoReference};
use crate::prompt::Prompt;
use crate::tools::MediaSource;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

/// Attempts allowed per interactive question before giving up.
pub const MAX_ATTEMPTS: usize = 3;

/// Video-only and audio-only variants left after filtering, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates {
    pub video: Vec<StreamVariant>,
    pub audio: Vec<StreamVariant>,
}

/// Lists the reference's variants and picks one video and one audio stream.
///
/// With `skip_quality` the best pair is taken; otherwise both sorted lists
/// are shown through `prompt` and the user picks by index.
#[instrument(skip_all, fields(id = %reference.id))]
pub async fn select_streams(
    source: &dyn MediaSource,
    reference: &VideoReference,
    config: &RunConfig,
    prompt: &mut dyn Prompt,
) -> Result<StreamSelection> {
    let variants = source.list_variants(reference).await?;
    debug!("{} variants available", variants.len());

    let candidates = filter_variants(&variants, config.max_res)?;
    let selection = if config.skip_quality {
        auto_select(&candidates)
    } else {
        interactive_select(&candidates, prompt)?
    };

    info!(
        "Selected video {} and audio {}",
        selection.video, selection.audio
    );
    Ok(selection)
}

/// Partitions, applies the height ceiling, and sorts best first.
///
/// Fails with `NoStreams` when either side ends up empty.
pub fn filter_variants(variants: &[StreamVariant], max_res: Option<u32>) -> Result<Candidates> {
    let mut video: Vec<StreamVariant> = variants
        .iter()
        .filter(|v| v.is_video())
        .filter(|v| match (max_res, v.height) {
            (Some(ceiling), Some(height)) => height <= ceiling,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .cloned()
        .collect();
    let mut audio: Vec<StreamVariant> = variants
        .iter()
        .filter(|v| v.is_audio())
        .cloned()
        .collect();

    if video.is_empty() {
        return Err(AppError::NoStreams(match max_res {
            Some(ceiling) => format!("no video stream at or below {}p", ceiling),
            None => "no video-only stream available".to_string(),
        }));
    }
    if audio.is_empty() {
        return Err(AppError::NoStreams(
            "no audio-only stream available".to_string(),
        ));
    }

    video.sort_by(compare_video);
    audio.sort_by(compare_audio);
    Ok(Candidates { video, audio })
}

/// Highest resolution (then frame rate, then bitrate) video and highest bitrate audio.
pub fn auto_select(candidates: &Candidates) -> StreamSelection {
    StreamSelection {
        video: candidates.video[0].clone(),
        audio: candidates.audio[0].clone(),
    }
}

pub fn interactive_select(
    candidates: &Candidates,
    prompt: &mut dyn Prompt,
) -> Result<StreamSelection> {
    let video = choose(prompt, "video", &candidates.video)?;
    let audio = choose(prompt, "audio", &candidates.audio)?;

    Ok(StreamSelection {
        video: candidates.video[video].clone(),
        audio: candidates.audio[audio].clone(),
    })
}

fn choose(prompt: &mut dyn Prompt, label: &str, items: &[StreamVariant]) -> Result<usize> {
    prompt.show(&format!("Available {} streams:", label));
    for (index, item) in items.iter().enumerate() {
        prompt.show(&format!("{:>3}. {}", index + 1, item));
    }

    let question = format!(
        "Select {} stream [1-{}, Enter for 1]: ",
        label,
        items.len()
    );
    for attempt in 1..=MAX_ATTEMPTS {
        let Some(answer) = prompt.read_line(&question)? else {
            return Err(AppError::Selection(format!(
                "input closed while choosing a {} stream",
                label
            )));
        };

        match parse_choice(&answer, items.len()) {
            Ok(index) => return Ok(index),
            Err(reason) => {
                warn!("Rejected {} choice {:?} (attempt {})", label, answer, attempt);
                prompt.show(&reason);
            }
        }
    }

    Err(AppError::Selection(format!(
        "no valid {} choice after {} attempts",
        label, MAX_ATTEMPTS
    )))
}

/// One-based answer to a zero-based index; empty picks the first entry.
fn parse_choice(answer: &str, len: usize) -> std::result::Result<usize, String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(0);
    }
    match answer.parse::<usize>() {
        Ok(choice) if (1..=len).contains(&choice) => Ok(choice - 1),
        Ok(choice) => Err(format!("{} is out of range, pick 1-{}", choice, len)),
        Err(_) => Err(format!("'{}' is not a number, pick 1-{}", answer, len)),
    }
}

fn compare_float(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
}

fn compare_video(a: &StreamVariant, b: &StreamVariant) -> Ordering {
    b.height
        .cmp(&a.height)
        .then_with(|| compare_float(b.fps, a.fps))
        .then_with(|| compare_float(b.bitrate, a.bitrate))
        .then_with(|| a.selector.cmp(&b.selector))
}

fn compare_audio(a: &StreamVariant, b: &StreamVariant) -> Ordering {
    compare_float(b.bitrate, a.bitrate).then_with(|| a.selector.cmp(&b.selector))
}
