//! Abuse controls around issue submission and fake-report penalties
//!
//! Three gates run before any AI spend: a per-reporter cooldown, a daily
//! cap, and a duplicate-location window. Separately, the trust penalty for
//! confirmed fake reports lives here, including the ban-and-delete path
//! when a reporter's trust hits zero.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{banned_email_repo, issue_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::User;

/// Rough meters-to-degrees factor near the equator; fine for a 50m window
const METERS_TO_DEGREES: f64 = 0.00045;

const TRUST_PENALTY: i32 = 25;

/// Submission gates, thresholds from configuration
#[derive(Debug, Clone, Copy)]
pub struct AbuseGuard {
    pub rate_limit_minutes: i64,
    pub daily_issue_limit: i64,
    pub duplicate_radius_meters: f64,
    pub duplicate_issue_threshold: i64,
}

impl AbuseGuard {
    /// Run the cooldown and daily-cap gates for a reporter
    pub async fn check_reporter(&self, pool: &PgPool, reporter: Uuid) -> Result<()> {
        let now = Utc::now();

        if let Some(last) = issue_repo::latest_issue_by_reporter(pool, reporter).await? {
            if let Some(remaining) =
                remaining_cooldown_minutes(last.created_at, now, self.rate_limit_minutes)
            {
                warn!(%reporter, remaining, "Submission rejected by cooldown");
                return Err(AppError::RateLimited {
                    reason: format!(
                        "Please wait {} minutes before reporting another issue",
                        remaining
                    ),
                    retry_after_minutes: remaining,
                });
            }
        }

        let midnight = start_of_utc_day(now);
        let today_count =
            issue_repo::count_issues_by_reporter_since(pool, reporter, midnight).await?;

        if daily_cap_reached(today_count, self.daily_issue_limit) {
            warn!(%reporter, today_count, "Submission rejected by daily cap");
            return Err(AppError::RateLimited {
                reason: "Daily issue limit reached".to_string(),
                retry_after_minutes: minutes_until_next_utc_day(now),
            });
        }

        Ok(())
    }

    /// Reject a location that already carries enough nearby reports
    pub async fn check_location(&self, pool: &PgPool, lat: f64, lng: f64) -> Result<()> {
        let range = self.duplicate_radius_meters * METERS_TO_DEGREES;

        let nearby = issue_repo::count_issues_in_box(
            pool,
            lat - range,
            lat + range,
            lng - range,
            lng + range,
        )
        .await?;

        if location_saturated(nearby, self.duplicate_issue_threshold) {
            warn!(lat, lng, nearby, "Submission rejected as duplicate location");
            return Err(AppError::Conflict(
                "Multiple issues already reported at this location. Please support existing reports."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Outcome of penalizing a reporter for a confirmed fake report
#[derive(Debug, Clone)]
pub enum PenaltyOutcome {
    /// Trust reduced, account still active
    Penalized { user: User },

    /// Trust hit zero: email blacklisted and account deleted
    Banned { name: String, email: String },
}

/// Apply the fake-report trust penalty to a reporter.
///
/// Trust drops by 25 with a floor of zero. Hitting exactly zero bans the
/// email and deletes the account; the blacklist insert happens first so a
/// crash between the two steps cannot leave a deletable-but-unbanned user.
pub async fn apply_fake_report_penalty(
    pool: &PgPool,
    reporter: &User,
    admin_id: Uuid,
) -> Result<PenaltyOutcome> {
    let new_score = penalized_trust(reporter.trust_score);

    if new_score == 0 {
        banned_email_repo::insert_banned_email(
            pool,
            &reporter.email,
            Some(reporter.id),
            Some(&reporter.name),
            "Multiple fake reports (Trust score reached 0)",
            Some(admin_id),
        )
        .await?;

        user_repo::delete_user(pool, reporter.id).await?;

        info!(user = %reporter.id, email = %reporter.email, "Reporter banned after trust hit zero");

        return Ok(PenaltyOutcome::Banned {
            name: reporter.name.clone(),
            email: reporter.email.clone(),
        });
    }

    let user = user_repo::update_trust_score(pool, reporter.id, new_score)
        .await?
        .ok_or_else(|| AppError::NotFound("User who reported this issue not found".to_string()))?;

    info!(user = %user.id, trust_score = user.trust_score, "Reporter trust score reduced");

    Ok(PenaltyOutcome::Penalized { user })
}

fn daily_cap_reached(today_count: i64, limit: i64) -> bool {
    today_count >= limit
}

fn location_saturated(nearby_count: i64, threshold: i64) -> bool {
    nearby_count >= threshold
}

/// Trust score after one fake-report deduction, floored at zero
fn penalized_trust(current: i32) -> i32 {
    (current - TRUST_PENALTY).max(0)
}

/// Minutes left on the cooldown, rounded up; None once it has elapsed
fn remaining_cooldown_minutes(
    last_created: DateTime<Utc>,
    now: DateTime<Utc>,
    limit_minutes: i64,
) -> Option<i64> {
    let elapsed_secs = (now - last_created).num_seconds().max(0);
    let elapsed_minutes = elapsed_secs as f64 / 60.0;
    let limit = limit_minutes as f64;

    if elapsed_minutes < limit {
        Some((limit - elapsed_minutes).ceil() as i64)
    } else {
        None
    }
}

fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

fn minutes_until_next_utc_day(now: DateTime<Utc>) -> i64 {
    let next_midnight = start_of_utc_day(now) + Duration::days(1);
    ((next_midnight - now).num_seconds() as f64 / 60.0).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cooldown_remaining_rounds_up() {
        let last = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        // 14.5 minutes elapsed of a 15 minute cooldown leaves ceil(0.5) = 1
        let now = last + Duration::seconds(14 * 60 + 30);
        assert_eq!(remaining_cooldown_minutes(last, now, 15), Some(1));

        // 1 minute elapsed leaves 14
        let now = last + Duration::minutes(1);
        assert_eq!(remaining_cooldown_minutes(last, now, 15), Some(14));

        // 5 minutes elapsed leaves 10
        let now = last + Duration::minutes(5);
        assert_eq!(remaining_cooldown_minutes(last, now, 15), Some(10));
    }

    #[test]
    fn test_cooldown_elapsed() {
        let last = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            remaining_cooldown_minutes(last, last + Duration::minutes(15), 15),
            None
        );
        assert_eq!(
            remaining_cooldown_minutes(last, last + Duration::hours(3), 15),
            None
        );
    }

    #[test]
    fn test_cooldown_immediate_resubmit() {
        let last = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(remaining_cooldown_minutes(last, last, 15), Some(15));
    }

    #[test]
    fn test_start_of_utc_day() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap();
        let midnight = start_of_utc_day(now);
        assert_eq!(midnight, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_minutes_until_next_utc_day() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(minutes_until_next_utc_day(now), 30);
    }

    #[test]
    fn test_daily_cap_boundary() {
        // 5 issues already created today block the 6th
        assert!(!daily_cap_reached(4, 5));
        assert!(daily_cap_reached(5, 5));
        assert!(daily_cap_reached(6, 5));
    }

    #[test]
    fn test_duplicate_location_threshold() {
        // 8 nearby reports reject the 9th; 7 still accept
        assert!(!location_saturated(7, 8));
        assert!(location_saturated(8, 8));
    }

    #[test]
    fn test_trust_penalty_arithmetic() {
        assert_eq!(penalized_trust(100), 75);
        assert_eq!(penalized_trust(25), 0);
        // The floor keeps already-low scores at exactly zero
        assert_eq!(penalized_trust(10), 0);
        assert_eq!(penalized_trust(0), 0);
    }
}
