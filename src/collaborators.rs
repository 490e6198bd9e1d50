//! Interfaces the presentation layer consumes around the ride core, plus the
//! in-memory payment gateway the server runs with.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{Coordinate, Payment, PaymentStatus, RideId};

/// Source of the rider's current position. `None` while there is no fix.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Option<Coordinate>;
}

/// Camera-backed scanner. Yields the decoded string, or `None` if the user backed out.
#[async_trait]
pub trait QrCodeReader: Send + Sync {
    async fn scan(&self) -> Option<String>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        payment_method_id: &str,
        ride_id: RideId,
        amount: Decimal,
    ) -> LedgerResult<Payment>;
}

/// Gateway that settles every charge immediately and keeps the receipts.
pub struct InMemoryPaymentGateway {
    currency: String,
    declined: RwLock<HashSet<String>>,
    payments: RwLock<Vec<Payment>>,
}

impl InMemoryPaymentGateway {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            declined: RwLock::new(HashSet::new()),
            payments: RwLock::new(Vec::new()),
        }
    }

    /// Marks a payment method as declined for all future charges.
    pub async fn decline(&self, payment_method_id: &str) {
        self.declined.write().await.insert(payment_method_id.to_string());
    }

    pub async fn payments_for_ride(&self, ride_id: RideId) -> Vec<Payment> {
        self.payments
            .read()
            .await
            .iter()
            .filter(|p| p.ride_id == ride_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self,
        payment_method_id: &str,
        ride_id: RideId,
        amount: Decimal,
    ) -> LedgerResult<Payment> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::PaymentDeclined(format!(
                "negative amount {}",
                amount
            )));
        }
        if self.declined.read().await.contains(payment_method_id) {
            tracing::warn!(ride_id = %ride_id, payment_method_id = %payment_method_id, "Charge declined");
            return Err(LedgerError::PaymentDeclined(format!(
                "method {} was declined",
                payment_method_id
            )));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            ride_id,
            amount,
            currency: self.currency.clone(),
            status: PaymentStatus::Completed,
            payment_method_id: payment_method_id.to_string(),
            timestamp: Utc::now(),
            description: format!("Scooter ride {}", ride_id),
        };
        self.payments.write().await.push(payment.clone());

        tracing::info!(ride_id = %ride_id, payment_id = %payment.id, amount = %amount, "Charge settled");
        Ok(payment)
    }
}
