//! Momentum scoring, one function per upstream source.
//!
//! The formulas measure different things (upvote velocity, raw plays,
//! log-views plus engagement) but all land on a finite, non-negative number so
//! the aggregator can order the merged set by this field alone.

use chrono::{DateTime, Utc};

/// Age floor for velocity scoring; keeps just-published posts from dividing by ~0.
pub const MIN_AGE_HOURS: f64 = 0.1;

/// YouTube videos under this many views are treated as noise.
pub const YOUTUBE_MIN_VIEWS: u64 = 10_000;

/// Clamp NaN, infinities and negatives to 0.
pub fn sanitize_momentum(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}

/// Hours between `created` and `now`; negative for future timestamps.
pub fn age_hours(created: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - created).num_milliseconds() as f64 / 3_600_000.0
}

/// Upvotes per hour since posting.
pub fn reddit_momentum(ups: f64, created: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = age_hours(created, now).max(MIN_AGE_HOURS);
    sanitize_momentum((ups / hours).round())
}

/// Play count taken as-is; the upstream ranking is already recency-biased.
pub fn play_count_momentum(plays: f64) -> f64 {
    sanitize_momentum(plays)
}

/// `log10(views + 1) * 10` plus the engagement rate scaled by 1000.
pub fn youtube_momentum(views: u64, likes: u64, comments: u64) -> f64 {
    let views_f = views as f64;
    let base = (views_f + 1.0).log10() * 10.0;
    let engagement = if views == 0 {
        0.0
    } else {
        likes.saturating_add(comments) as f64 / views_f * 1000.0
    };
    sanitize_momentum((base + engagement).round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reddit_velocity_is_upvotes_per_hour() {
        let now = Utc::now();
        let created = now - Duration::hours(2);
        assert_eq!(reddit_momentum(120.0, created, now), 60.0);
    }

    #[test]
    fn reddit_fresh_posts_use_age_floor() {
        let now = Utc::now();
        assert_eq!(reddit_momentum(5.0, now, now), 50.0);
        // Clock skew: a post "from the future" still uses the floor.
        let future = now + Duration::minutes(30);
        assert_eq!(reddit_momentum(5.0, future, now), 50.0);
    }

    #[test]
    fn youtube_reference_case() {
        assert_eq!(youtube_momentum(100_000, 5_000, 300), 103.0);
    }

    #[test]
    fn youtube_zero_views_has_no_engagement_term() {
        assert_eq!(youtube_momentum(0, 10, 10), 0.0);
    }

    #[test]
    fn scores_are_never_negative_or_nan() {
        let now = Utc::now();
        assert_eq!(reddit_momentum(-40.0, now - Duration::hours(1), now), 0.0);
        assert_eq!(play_count_momentum(f64::NAN), 0.0);
        assert_eq!(play_count_momentum(f64::INFINITY), 0.0);
        assert_eq!(play_count_momentum(-1.0), 0.0);
        assert_eq!(play_count_momentum(1_234.0), 1_234.0);
    }
}
