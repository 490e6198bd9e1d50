use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::location::{validate_finite, Coordinate};

pub type ScooterId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scooter {
    pub id: ScooterId,
    pub model: String,
    pub battery_level: u8,
    pub is_available: bool,
    pub location: Coordinate,
    /// Charged per minute of ride time, despite the name.
    pub hourly_rate: Decimal,
    pub max_speed: f64,
    pub range: f64,
    pub last_maintenance: DateTime<Utc>,
    /// Unlock token printed on the scooter. Never changes after registration.
    pub qr_code: String,
}

impl Scooter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<ScooterId>,
        model: impl Into<String>,
        battery_level: u8,
        location: Coordinate,
        hourly_rate: Decimal,
        max_speed: f64,
        range: f64,
        last_maintenance: DateTime<Utc>,
        qr_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            battery_level,
            is_available: true,
            location,
            hourly_rate,
            max_speed,
            range,
            last_maintenance,
            qr_code: qr_code.into(),
        }
    }

    /// Checks the static fields a scooter must satisfy before it joins a fleet.
    pub fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("scooter id must not be empty".to_string());
        }
        if self.qr_code.is_empty() {
            return Err(format!("scooter {} has an empty qr code", self.id));
        }
        if self.battery_level > 100 {
            return Err(format!(
                "scooter {} battery level {} is above 100",
                self.id, self.battery_level
            ));
        }
        if self.hourly_rate <= Decimal::ZERO {
            return Err(format!("scooter {} rate must be greater than 0", self.id));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0), custom = "validate_finite")]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0), custom = "validate_finite")]
    pub lon: f64,
    #[validate(range(min = 0.0), custom = "validate_finite")]
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyScooter {
    #[serde(flatten)]
    pub scooter: Scooter,
    pub distance_meters: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FareQuoteResponse {
    pub scooter_id: ScooterId,
    pub minutes: u32,
    pub rate_per_minute: Decimal,
    pub estimate: Decimal,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scooter {
        Scooter::new(
            "scooter_001",
            "SwiftX Pro",
            85,
            Coordinate::new(37.7749, -122.4194),
            Decimal::new(25, 2),
            25.0,
            50.0,
            Utc::now(),
            "SWIFT001",
        )
    }

    #[test]
    fn new_scooter_is_available() {
        assert!(sample().is_available);
        assert!(sample().check().is_ok());
    }

    #[test]
    fn check_rejects_bad_fields() {
        let mut s = sample();
        s.hourly_rate = Decimal::ZERO;
        assert!(s.check().is_err());

        let mut s = sample();
        s.battery_level = 101;
        assert!(s.check().is_err());

        let mut s = sample();
        s.qr_code.clear();
        assert!(s.check().is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["qrCode"], "SWIFT001");
        assert_eq!(json["isAvailable"], true);
        assert_eq!(json["hourlyRate"], "0.25");
    }
}
