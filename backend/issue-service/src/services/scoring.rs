//! Priority scoring
//!
//! Pure arithmetic over the analysis outputs and repository counts. All the
//! weights and thresholds live here so the whole scheme is testable without
//! a database or an AI client.

use crate::models::{PriorityLabel, ScoreBreakdown};

/// Fixed contribution of elapsed time at creation
const TIME_PENDING_SCORE: i32 = 10;

/// Weighted blend of text and image severity, clamped to 1..=10.
///
/// Weights come from configuration; text-dominant by default since the text
/// model is the stronger signal.
pub fn fuse_severity(
    text_severity: i32,
    image_severity: i32,
    text_weight: f64,
    image_weight: f64,
) -> i32 {
    let combined =
        (text_severity as f64 * text_weight) + (image_severity as f64 * image_weight);
    (combined.round() as i32).clamp(1, 10)
}

/// Impact of the reported location, keyed off the description text.
///
/// Tiers are checked in order; the first match wins.
pub fn location_impact(description: &str) -> i32 {
    let lower = description.to_lowercase();
    if lower.contains("hospital") || lower.contains("school") {
        90
    } else if lower.contains("station") || lower.contains("main road") {
        75
    } else if lower.contains("market") {
        65
    } else {
        40
    }
}

/// Score from the count of unresolved issues platform-wide
pub fn frequency_score(unresolved_count: i64) -> i32 {
    if unresolved_count >= 7 {
        100
    } else if unresolved_count >= 4 {
        75
    } else if unresolved_count >= 2 {
        50
    } else {
        20
    }
}

/// Final score and component breakdown for a new issue
#[derive(Debug, Clone, Copy)]
pub struct PriorityScore {
    pub score: i32,
    pub label: PriorityLabel,
    pub breakdown: ScoreBreakdown,
}

/// Compute the priority score from the fused severity (1-10), the
/// description, the unresolved-issue count and the AI urgency boost.
pub fn compute_priority(
    fused_severity: i32,
    description: &str,
    unresolved_count: i64,
    ai_boost: i32,
) -> PriorityScore {
    // Severity moves from the 1-10 scale onto 0-100 like the other components
    let severity = fused_severity * 10;
    let location = location_impact(description);
    let frequency = frequency_score(unresolved_count);
    let time_pending = TIME_PENDING_SCORE;

    let base = (severity as f64 * 0.50
        + location as f64 * 0.30
        + frequency as f64 * 0.10
        + time_pending as f64 * 0.10)
        .round() as i32;

    let score = (base + ai_boost).min(100);

    PriorityScore {
        score,
        label: PriorityLabel::from_score(score),
        breakdown: ScoreBreakdown {
            severity,
            frequency,
            location_impact: location,
            time_pending,
            ai_adjustment: ai_boost,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuse_severity_default_weights() {
        assert_eq!(fuse_severity(10, 5, 0.8, 0.2), 9);
        assert_eq!(fuse_severity(5, 5, 0.8, 0.2), 5);
        assert_eq!(fuse_severity(1, 10, 0.8, 0.2), 3);
    }

    #[test]
    fn test_fuse_severity_clamps() {
        assert_eq!(fuse_severity(0, 0, 0.8, 0.2), 1);
        assert_eq!(fuse_severity(10, 10, 1.0, 1.0), 10);
    }

    #[test]
    fn test_location_impact_tiers() {
        assert_eq!(location_impact("pothole near the HOSPITAL gate"), 90);
        assert_eq!(location_impact("leak behind the school"), 90);
        assert_eq!(location_impact("garbage at the bus station"), 75);
        assert_eq!(location_impact("crack on the main road"), 75);
        assert_eq!(location_impact("flooding in the market lane"), 65);
        assert_eq!(location_impact("dark alley light broken"), 40);
    }

    #[test]
    fn test_location_impact_first_tier_wins() {
        assert_eq!(location_impact("market next to the hospital"), 90);
    }

    #[test]
    fn test_frequency_score_steps() {
        assert_eq!(frequency_score(0), 20);
        assert_eq!(frequency_score(1), 20);
        assert_eq!(frequency_score(2), 50);
        assert_eq!(frequency_score(3), 50);
        assert_eq!(frequency_score(4), 75);
        assert_eq!(frequency_score(6), 75);
        assert_eq!(frequency_score(7), 100);
        assert_eq!(frequency_score(5000), 100);
    }

    #[test]
    fn test_compute_priority_breakdown() {
        // severity 8 -> 80, hospital -> 90, 3 unresolved -> 50, time 10
        // base = round(40 + 27 + 5 + 1) = 73, +12 boost = 85
        let result = compute_priority(8, "burst pipe flooding the hospital entry", 3, 12);
        assert_eq!(result.breakdown.severity, 80);
        assert_eq!(result.breakdown.location_impact, 90);
        assert_eq!(result.breakdown.frequency, 50);
        assert_eq!(result.breakdown.time_pending, 10);
        assert_eq!(result.breakdown.ai_adjustment, 12);
        assert_eq!(result.score, 85);
        assert_eq!(result.label, PriorityLabel::High);
    }

    #[test]
    fn test_compute_priority_caps_at_100() {
        let result = compute_priority(10, "dangerous collapse at the hospital", 20, 15);
        assert_eq!(result.score, 100);
        assert_eq!(result.label, PriorityLabel::High);
    }

    #[test]
    fn test_compute_priority_low_end() {
        // severity 1 -> 10, no keywords -> 40, 0 unresolved -> 20, time 10
        // base = round(5 + 12 + 2 + 1) = 20
        let result = compute_priority(1, "small cosmetic scuff on a bench", 0, 0);
        assert_eq!(result.score, 20);
        assert_eq!(result.label, PriorityLabel::Low);
    }

    #[test]
    fn test_score_monotone_in_severity() {
        let mut previous = 0;
        for severity in 1..=10 {
            let result = compute_priority(severity, "plain report text", 0, 0);
            assert!(result.score >= previous);
            previous = result.score;
        }
    }
}
