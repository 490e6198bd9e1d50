use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::model::location::Coordinate;
use crate::model::scooter::ScooterId;
use crate::model::user::UserId;

pub type RideId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub user_id: UserId,
    pub scooter_id: ScooterId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_location: Coordinate,
    pub end_location: Option<Coordinate>,
    /// Kilometers between start and end location. 0 until completed.
    pub distance: f64,
    /// Whole seconds, truncated. The fare is billed on the exact elapsed
    /// milliseconds, so a 59.9 s ride shows 59 here.
    pub duration_seconds: i64,
    pub cost: Decimal,
    pub status: RideStatus,
    pub payment_id: Option<Uuid>,
}

impl Ride {
    pub(crate) fn start(
        user_id: UserId,
        scooter_id: ScooterId,
        start_location: Coordinate,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            scooter_id,
            start_time,
            end_time: None,
            start_location,
            end_location: None,
            distance: 0.0,
            duration_seconds: 0,
            cost: Decimal::ZERO,
            status: RideStatus::Active,
            payment_id: None,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideStatus {
    Active,
    Completed,
    Cancelled,
    Paused,
}

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        use RideStatus::*;
        matches!(
            (self, next),
            (Active, Paused)
                | (Paused, Active)
                | (Active, Completed)
                | (Active, Cancelled)
                | (Paused, Completed)
                | (Paused, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Active => "Active",
            RideStatus::Completed => "Completed",
            RideStatus::Cancelled => "Cancelled",
            RideStatus::Paused => "Paused",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(RideStatus::Active),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" | "canceled" => Ok(RideStatus::Cancelled),
            "paused" => Ok(RideStatus::Paused),
            other => Err(format!("unknown ride status '{}'", other)),
        }
    }
}

/// History filter: optional status plus a case-insensitive search over ride id and scooter id.
#[derive(Debug, Clone, Default)]
pub struct RideFilter {
    pub status: Option<RideStatus>,
    pub search: Option<String>,
}

impl RideFilter {
    pub fn matches(&self, ride: &Ride) -> bool {
        if let Some(status) = self.status {
            if ride.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                ride.id.to_string().contains(&needle)
                    || ride.scooter_id.to_lowercase().contains(&needle)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideSummary {
    pub total_rides: usize,
    pub completed_rides: usize,
    pub total_distance_km: f64,
    pub total_cost: Decimal,
}

// Request bodies

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartRideRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub scooter_id: String,
    pub qr_code: String,
    #[validate]
    pub location: Coordinate,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndRideRequest {
    #[validate]
    pub location: Coordinate,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRideRequest {
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RideHistoryQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_exit() {
        for next in [
            RideStatus::Active,
            RideStatus::Paused,
            RideStatus::Completed,
            RideStatus::Cancelled,
        ] {
            assert!(!RideStatus::Completed.can_transition_to(next));
            assert!(!RideStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn open_states_can_terminate() {
        assert!(RideStatus::Active.can_transition_to(RideStatus::Paused));
        assert!(RideStatus::Paused.can_transition_to(RideStatus::Active));
        assert!(RideStatus::Paused.can_transition_to(RideStatus::Completed));
        assert!(RideStatus::Active.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Active.can_transition_to(RideStatus::Active));
        assert!(!RideStatus::Paused.can_transition_to(RideStatus::Paused));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("completed".parse::<RideStatus>().unwrap(), RideStatus::Completed);
        assert_eq!("PAUSED".parse::<RideStatus>().unwrap(), RideStatus::Paused);
        assert!("finished".parse::<RideStatus>().is_err());
    }

    #[test]
    fn filter_matches_scooter_id_and_status() {
        let ride = Ride::start(
            "user_001".to_string(),
            "scooter_002".to_string(),
            Coordinate::new(37.0, -122.0),
            Utc::now(),
        );

        let by_scooter = RideFilter {
            status: None,
            search: Some("SCOOTER_002".to_string()),
        };
        assert!(by_scooter.matches(&ride));

        let wrong_status = RideFilter {
            status: Some(RideStatus::Completed),
            search: None,
        };
        assert!(!wrong_status.matches(&ride));

        assert!(RideFilter::default().matches(&ride));
    }

    #[test]
    fn new_ride_has_no_terminal_fields() {
        let ride = Ride::start(
            "user_001".to_string(),
            "scooter_001".to_string(),
            Coordinate::new(37.0, -122.0),
            Utc::now(),
        );
        assert_eq!(ride.status, RideStatus::Active);
        assert!(ride.end_time.is_none());
        assert!(ride.end_location.is_none());
        assert!(ride.payment_id.is_none());
        assert_eq!(ride.cost, Decimal::ZERO);
        assert_eq!(ride.duration_seconds, 0);
    }
}
