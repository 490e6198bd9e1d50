//! Demo fleet around downtown San Francisco and a demo rider.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::error::LedgerResult;
use crate::ledger::RideLedger;
use crate::model::{Coordinate, PaymentMethod, PaymentType, Scooter, User};

pub const DEMO_USER_ID: &str = "user_001";

pub fn demo_fleet() -> Vec<Scooter> {
    let now = Utc::now();
    let rows: [(&str, &str, u8, f64, f64, i64, f64, f64, i64, &str); 5] = [
        ("scooter_001", "SwiftX Pro", 85, 37.7749, -122.4194, 25, 25.0, 50.0, 7, "SWIFT001"),
        ("scooter_002", "EcoRide Plus", 92, 37.7849, -122.4094, 30, 30.0, 60.0, 3, "SWIFT002"),
        ("scooter_003", "SwiftX Pro", 45, 37.7649, -122.4294, 25, 25.0, 50.0, 14, "SWIFT003"),
        ("scooter_004", "EcoRide Plus", 78, 37.7949, -122.3994, 30, 30.0, 60.0, 1, "SWIFT004"),
        ("scooter_005", "SwiftX Pro", 95, 37.7549, -122.4394, 25, 25.0, 50.0, 5, "SWIFT005"),
    ];

    rows.iter()
        .map(|&(id, model, battery, lat, lon, cents, max_speed, range, days, code)| {
            Scooter::new(
                id,
                model,
                battery,
                Coordinate::new(lat, lon),
                Decimal::new(cents, 2),
                max_speed,
                range,
                now - Duration::days(days),
                code,
            )
        })
        .collect()
}

pub fn demo_user() -> User {
    let mut user = User::new(
        DEMO_USER_ID,
        "John Doe",
        "john.doe@example.com",
        "+1 (555) 123-4567",
    );
    user.rating = 4.8;
    user.total_rides = 47;
    user.member_since = Utc::now() - Duration::days(365);
    user.payment_methods = vec![
        PaymentMethod {
            id: "pm_001".to_string(),
            kind: PaymentType::CreditCard,
            last_four_digits: "1234".to_string(),
            expiry_date: "12/25".to_string(),
            is_default: true,
        },
        PaymentMethod {
            id: "pm_002".to_string(),
            kind: PaymentType::ApplePay,
            last_four_digits: String::new(),
            expiry_date: String::new(),
            is_default: false,
        },
    ];
    user
}

/// scooter_003 is out on a ride in the demo data; open that ride for real so
/// its availability flag is backed by a ride.
pub async fn open_demo_rides(ledger: &RideLedger) -> LedgerResult<()> {
    let scooter = ledger.get_scooter("scooter_003").await?;
    ledger
        .start_ride_at(
            DEMO_USER_ID,
            &scooter.id,
            &scooter.qr_code,
            scooter.location,
            Utc::now() - Duration::hours(1),
        )
        .await?;
    Ok(())
}
