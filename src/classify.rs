use crate::model::VideoRecord;

/// Longest duration, in seconds, still counted as a short.
pub const SHORT_MAX_SECONDS: u64 = 60;

/// Whether a video lands in the shorts bucket. Unreadable durations are
/// stored as 0 and therefore count as shorts.
pub fn is_short(video: &VideoRecord) -> bool {
    video.duration_seconds <= SHORT_MAX_SECONDS
}

/// Stable partition into `(regular, shorts)`; input order is kept in both.
pub fn classify(videos: Vec<VideoRecord>) -> (Vec<VideoRecord>, Vec<VideoRecord>) {
    let (shorts, regular): (Vec<_>, Vec<_>) = videos.into_iter().partition(is_short);
    (regular, shorts)
}
