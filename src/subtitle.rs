use std::path::Path;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::Result;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A single timed caption, timestamps in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub start: i64,
    pub end: i64,
    pub text: String,
}

/// Render caption entries as an SRT document.
///
/// Blocks are numbered from 1 in input order. Entries are not validated, so
/// overlapping or reversed ranges come out exactly as given.
pub fn format_srt(captions: &[CaptionEntry]) -> String {
    let mut srt_content = String::new();

    for (index, caption) in captions.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(caption.start),
            format_srt_time(caption.end),
            caption.text
        ));
    }

    srt_content
}

/// Write caption entries to an SRT file
pub async fn write_srt<P: AsRef<Path>>(captions: &[CaptionEntry], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {} ({} captions)", output_path.display(), captions.len());

    fs::write(output_path, format_srt(captions)).await?;

    info!("SRT file generated successfully");
    Ok(())
}

/// Format a millisecond timestamp as SRT time (HH:MM:SS,mmm).
///
/// The value is read as a UTC wall-clock instant, so only the time of day
/// survives: 24h wraps to 00:00:00,000 and negative values count back from
/// midnight.
pub fn format_srt_time(millis: i64) -> String {
    let of_day = millis.rem_euclid(MILLIS_PER_DAY);
    let secs = (of_day / 1_000) as u32;
    let nanos = ((of_day % 1_000) * 1_000_000) as u32;

    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).unwrap_or(NaiveTime::MIN);

    format!(
        "{:02}:{:02}:{:02},{:03}",
        time.hour(),
        time.minute(),
        time.second(),
        time.nanosecond() / 1_000_000
    )
}
