//! Token and connectivity health check
//!
//! Two checks, always both run:
//! 1. `GET /athlete` confirms the token authenticates
//! 2. a one-record activity listing over the last 90 days confirms the token
//!    can read activities
//!
//! Each failure carries a remediation hint from
//! [`FetcherError::remediation`].

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::fetcher::strava_config::HEALTH_CHECK_LOOKBACK_DAYS;
use crate::fetcher::strava_http::{AthleteSummary, StravaHttpClient};
use crate::fetcher::{ActivitySource, FetcherError, PageQuery};

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    /// Check succeeded
    Passed,
    /// Check failed
    Failed {
        /// What went wrong
        error: String,
        /// What to do about it
        remediation: String,
    },
}

impl CheckStatus {
    fn failed(error: &FetcherError) -> Self {
        CheckStatus::Failed {
            error: error.to_string(),
            remediation: error.remediation().to_string(),
        }
    }

    /// True for [`CheckStatus::Passed`]
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckStatus::Passed)
    }
}

/// Result of the athlete profile check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AthleteCheck {
    /// Check status
    #[serde(flatten)]
    pub status: CheckStatus,
    /// Profile, when retrieved
    pub athlete: Option<AthleteSummary>,
}

/// Most recent activity seen by the listing check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySample {
    /// Activity id
    pub id: Option<i64>,
    /// Activity name
    pub name: Option<String>,
    /// Start timestamp as sent upstream
    pub start_date: Option<String>,
}

/// Result of the activity listing check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityCheck {
    /// Check status
    #[serde(flatten)]
    pub status: CheckStatus,
    /// Records returned (0 or 1)
    pub count: usize,
    /// First record, if any
    pub sample: Option<ActivitySample>,
}

/// Combined health check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Athlete profile check
    pub athlete: AthleteCheck,
    /// Activity listing check
    pub activities: ActivityCheck,
}

impl HealthReport {
    /// True only when both checks passed
    pub fn passed(&self) -> bool {
        self.athlete.status.is_passed() && self.activities.status.is_passed()
    }
}

/// Run both checks against `client`
pub async fn run_health_check(client: &StravaHttpClient) -> HealthReport {
    run_health_check_at(client, Utc::now()).await
}

/// Run both checks, looking back from `now`
pub async fn run_health_check_at(client: &StravaHttpClient, now: DateTime<Utc>) -> HealthReport {
    let athlete = match client.get_athlete().await {
        Ok(athlete) => {
            info!(athlete_id = athlete.id, "Athlete profile retrieved");
            AthleteCheck {
                status: CheckStatus::Passed,
                athlete: Some(athlete),
            }
        }
        Err(e) => {
            warn!(error = %e, "Athlete check failed");
            AthleteCheck {
                status: CheckStatus::failed(&e),
                athlete: None,
            }
        }
    };

    let query = PageQuery {
        after: (now - Duration::days(HEALTH_CHECK_LOOKBACK_DAYS)).timestamp(),
        before: None,
        page: 1,
        per_page: 1,
    };

    let activities = match client.fetch_page(&query).await {
        Ok(records) => {
            info!(count = records.len(), "Activities endpoint reachable");
            let sample = records.first().map(|r| ActivitySample {
                id: r.get("id").and_then(|v| v.as_i64()),
                name: r.get("name").and_then(|v| v.as_str()).map(str::to_string),
                start_date: r.get("start_date").and_then(|v| v.as_str()).map(str::to_string),
            });
            ActivityCheck {
                status: CheckStatus::Passed,
                count: records.len(),
                sample,
            }
        }
        Err(e) => {
            warn!(error = %e, "Activity check failed");
            ActivityCheck {
                status: CheckStatus::failed(&e),
                count: 0,
                sample: None,
            }
        }
    };

    HealthReport {
        athlete,
        activities,
    }
}
