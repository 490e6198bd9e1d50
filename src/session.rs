//! Rider-facing flow on top of the ledger: find a scooter, scan to unlock,
//! finish and pay. Hardware access comes in through the collaborator traits
//! so the flow runs the same against real devices and test doubles.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::collaborators::{LocationProvider, PaymentGateway, QrCodeReader};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::RideLedger;
use crate::model::{Coordinate, Payment, Ride, RideId, Scooter};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedRide {
    pub ride: Ride,
    /// Absent when the ride cost nothing.
    pub payment: Option<Payment>,
}

pub struct RideSession<L, Q> {
    ledger: Arc<RideLedger>,
    location: L,
    reader: Q,
    gateway: Arc<dyn PaymentGateway>,
    radius_meters: f64,
}

impl<L, Q> RideSession<L, Q>
where
    L: LocationProvider,
    Q: QrCodeReader,
{
    pub fn new(
        ledger: Arc<RideLedger>,
        location: L,
        reader: Q,
        gateway: Arc<dyn PaymentGateway>,
        radius_meters: f64,
    ) -> Self {
        Self {
            ledger,
            location,
            reader,
            gateway,
            radius_meters,
        }
    }

    fn here(&self) -> LedgerResult<Coordinate> {
        self.location
            .current_location()
            .ok_or(LedgerError::LocationUnavailable)
    }

    pub async fn nearby(&self) -> LedgerResult<Vec<Scooter>> {
        let here = self.here()?;
        Ok(self
            .ledger
            .nearby_available_scooters(here, self.radius_meters)
            .await)
    }

    /// Scans a code and starts a ride on `scooter_id` from the current position.
    ///
    /// A cancelled scan counts as an empty code, which never unlocks anything.
    pub async fn unlock(&self, user_id: &str, scooter_id: &str) -> LedgerResult<Ride> {
        let here = self.here()?;
        let code = self.reader.scan().await.unwrap_or_default();
        self.ledger.start_ride(user_id, scooter_id, &code, here).await
    }

    /// Ends the ride where the rider stands now, charges the fare to
    /// `payment_method_id` and records the charge on the ride.
    pub async fn finish(&self, ride_id: RideId, payment_method_id: &str) -> LedgerResult<FinishedRide> {
        let here = self.here()?;
        let ride = self.ledger.end_ride(ride_id, here, Utc::now()).await?;

        if ride.cost == Decimal::ZERO {
            return Ok(FinishedRide { ride, payment: None });
        }

        self.ledger.reserve_payment(ride.id).await?;
        let payment = match self
            .gateway
            .charge(payment_method_id, ride.id, ride.cost)
            .await
        {
            Ok(payment) => payment,
            Err(err) => {
                self.ledger.release_payment(ride.id).await;
                return Err(err);
            }
        };
        let ride = self.ledger.record_payment(ride.id, payment.id).await?;

        Ok(FinishedRide {
            ride,
            payment: Some(payment),
        })
    }
}
