//! Outlier score: a video's views relative to its channel's mean views per video.
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("statistic is not an integer: {0:?}")]
    NotNumeric(String),
    #[error("channel average views is not positive ({0})")]
    NonPositiveAverage(f64),
}

/// A channel statistic as the provider reports it: usually a decimal string,
/// sometimes already an integer.
pub trait Statistic {
    fn to_count(&self) -> Result<i64, ScoreError>;
}

impl Statistic for i64 {
    fn to_count(&self) -> Result<i64, ScoreError> {
        Ok(*self)
    }
}

impl Statistic for u64 {
    fn to_count(&self) -> Result<i64, ScoreError> {
        i64::try_from(*self).map_err(|_| ScoreError::NotNumeric(self.to_string()))
    }
}

impl Statistic for str {
    fn to_count(&self) -> Result<i64, ScoreError> {
        self.trim()
            .parse::<i64>()
            .map_err(|_| ScoreError::NotNumeric(self.to_string()))
    }
}

impl Statistic for String {
    fn to_count(&self) -> Result<i64, ScoreError> {
        self.as_str().to_count()
    }
}

impl<T: Statistic + ?Sized> Statistic for &T {
    fn to_count(&self) -> Result<i64, ScoreError> {
        (**self).to_count()
    }
}

/// Compute `views / (total_views / video_count)` rounded to two decimals.
///
/// A zero or negative video count is rejected here as well, even though
/// callers are expected to normalise it to 1 first.
pub fn try_outlier_score<T, C>(
    video_views: u64,
    channel_total_views: T,
    channel_video_count: C,
) -> Result<f64, ScoreError>
where
    T: Statistic,
    C: Statistic,
{
    let total = channel_total_views.to_count()? as f64;
    let count = channel_video_count.to_count()?;
    if count <= 0 {
        return Err(ScoreError::NonPositiveAverage(0.0));
    }
    let average = total / count as f64;
    if average <= 0.0 {
        return Err(ScoreError::NonPositiveAverage(average));
    }
    Ok(round2(video_views as f64 / average))
}

/// Best-effort variant of [`try_outlier_score`]: any failure yields `0.0`.
pub fn outlier_score<T, C>(video_views: u64, channel_total_views: T, channel_video_count: C) -> f64
where
    T: Statistic,
    C: Statistic,
{
    try_outlier_score(video_views, channel_total_views, channel_video_count).unwrap_or(0.0)
}

/// Two decimals, ties to even: 0.125 becomes 0.12.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_against_channel_average() {
        assert_eq!(outlier_score(1000, "10000", "10"), 10.0);
        assert_eq!(outlier_score(500, 10_000_i64, 10_i64), 0.5);
        assert_eq!(outlier_score(0, "10000", "10"), 0.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(outlier_score(1, "3", "1"), 0.33);
        assert_eq!(outlier_score(2, "3", "1"), 0.67);
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(outlier_score(1, "8", "1"), 0.12);
        assert_eq!(outlier_score(3, "8", "1"), 0.38);
        assert_eq!(outlier_score(5, "8", "1"), 0.62);
    }

    #[test]
    fn zero_average_scores_zero() {
        assert_eq!(outlier_score(1000, "0", "5"), 0.0);
        assert!(matches!(
            try_outlier_score(1000, "0", "5"),
            Err(ScoreError::NonPositiveAverage(_))
        ));
    }

    #[test]
    fn zero_video_count_is_guarded() {
        let score = outlier_score(100, "100", "0");
        assert!(score.is_finite());
        assert_eq!(score, 0.0);
        assert_eq!(outlier_score(100, "100", "-4"), 0.0);
    }

    #[test]
    fn non_numeric_statistics_score_zero() {
        assert_eq!(outlier_score(100, "lots", "4"), 0.0);
        assert_eq!(outlier_score(100, "100", "1.5"), 0.0);
        assert_eq!(
            try_outlier_score(100, "", "4"),
            Err(ScoreError::NotNumeric(String::new()))
        );
    }

    #[test]
    fn accepts_owned_and_padded_strings() {
        let total = String::from(" 4000 ");
        assert_eq!(outlier_score(2000, &total, String::from("4")), 2.0);
    }
}
