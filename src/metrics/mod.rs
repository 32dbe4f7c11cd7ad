//! Reading-pace metrics: per-recording word counts and words per minute, and
//! aggregate analytics over all recordings in a Bible.
//!
//! Missing inputs never raise. A recording without a transcription has no word
//! count; one without a positive duration has no WPM. Aggregates over nothing
//! are absent rather than zero, except sums and counts.

pub mod stats;

use serde::Serialize;

use crate::types::Recording;
use stats::{HISTOGRAM_BINS, HistogramBin};

/// Number of non-empty whitespace-delimited tokens.
#[must_use]
pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Words per minute; defined only for a positive duration.
#[must_use]
pub fn wpm(word_count: u32, duration_seconds: f64) -> Option<f64> {
    if duration_seconds > 0.0 {
        Some(f64::from(word_count) / duration_seconds * 60.0)
    } else {
        None
    }
}

/// Derived values persisted alongside a recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RecordingMetrics {
    pub word_count: Option<u32>,
    pub wpm: Option<f64>,
}

impl RecordingMetrics {
    #[must_use]
    pub fn derive(transcription: Option<&str>, duration_seconds: Option<f64>) -> Self {
        let word_count = transcription.map(word_count);
        let wpm = match (word_count, duration_seconds) {
            (Some(words), Some(duration)) => wpm(words, duration),
            _ => None,
        };
        Self { word_count, wpm }
    }

    /// Stored values when present, otherwise recomputed from the transcription
    /// and duration. Rows written before these columns existed take the
    /// fallback path.
    #[must_use]
    pub fn effective(recording: &Recording) -> Self {
        let derived = Self::derive(
            recording.transcription_text.as_deref(),
            recording.duration_seconds,
        );
        Self {
            word_count: recording.word_count.or(derived.word_count),
            wpm: recording.wpm.or(derived.wpm),
        }
    }
}

/// WPM shown next to a recording in listings: only when there is transcribed
/// text and a positive duration.
#[must_use]
pub fn listing_wpm(recording: &Recording) -> Option<f64> {
    match recording.transcription_text.as_deref() {
        Some(text) if !text.is_empty() => RecordingMetrics::effective(recording).wpm,
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WpmStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub histogram: Vec<HistogramBin>,
}

impl WpmStats {
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let (min, max) = match stats::min_max(&sorted) {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };

        Self {
            count: sorted.len(),
            min,
            max,
            mean: stats::mean(&sorted),
            median: stats::percentile(&sorted, 0.5),
            std: stats::population_std(&sorted),
            q1: stats::percentile(&sorted, 0.25),
            q3: stats::percentile(&sorted, 0.75),
            histogram: stats::histogram(&sorted, HISTOGRAM_BINS),
        }
    }
}

/// Summary of every recording in one Bible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BibleAnalytics {
    pub bible_id: i64,
    pub total_recordings: usize,
    pub total_words: u64,
    pub avg_word_count: Option<f64>,
    pub avg_duration_seconds: Option<f64>,
    pub total_plays: i64,
    pub wpm_stats: WpmStats,
}

impl BibleAnalytics {
    pub fn compute<'a, I>(bible_id: i64, recordings: I) -> Self
    where
        I: IntoIterator<Item = &'a Recording>,
    {
        let mut total_recordings = 0usize;
        let mut word_counts = Vec::new();
        let mut total_duration = 0.0;
        let mut total_plays = 0i64;
        let mut wpm_values = Vec::new();

        for recording in recordings {
            total_recordings += 1;
            total_plays += recording.accessed_count;
            total_duration += recording.duration_seconds.unwrap_or(0.0);

            let metrics = RecordingMetrics::effective(recording);
            if let Some(words) = metrics.word_count {
                word_counts.push(words);
            }
            if let Some(pace) = metrics.wpm {
                wpm_values.push(pace);
            }
        }

        let total_words: u64 = word_counts.iter().map(|&w| u64::from(w)).sum();
        let avg_word_count = if word_counts.is_empty() {
            None
        } else {
            Some(total_words as f64 / word_counts.len() as f64)
        };

        // Denominator is every recording, including ones with no duration.
        let avg_duration_seconds = if total_recordings == 0 {
            None
        } else {
            Some(total_duration / total_recordings as f64)
        };

        Self {
            bible_id,
            total_recordings,
            total_words,
            avg_word_count,
            avg_duration_seconds,
            total_plays,
            wpm_stats: WpmStats::from_values(&wpm_values),
        }
    }
}
