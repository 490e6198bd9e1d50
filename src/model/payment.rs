use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::model::ride::RideId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PaymentType,
    /// Empty for wallet types.
    pub last_four_digits: String,
    pub expiry_date: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Apple Pay")]
    ApplePay,
    #[serde(rename = "PayPal")]
    PayPal,
}

impl PaymentType {
    pub fn is_card(self) -> bool {
        matches!(self, PaymentType::CreditCard | PaymentType::DebitCard)
    }
}

/// A charge recorded against a finished ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub ride_id: RideId,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method_id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentMethodRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PaymentType,
    #[serde(default)]
    pub last_four_digits: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddPaymentMethodRequest {
    pub fn validate_digits(&self) -> Result<(), String> {
        if self.kind.is_card() {
            if self.last_four_digits.len() != 4
                || !self.last_four_digits.chars().all(|c| c.is_ascii_digit())
            {
                return Err("cards need exactly four trailing digits".to_string());
            }
        } else if !self.last_four_digits.is_empty() {
            return Err(format!("{:?} methods carry no card digits", self.kind));
        }
        Ok(())
    }

    pub fn into_method(self) -> PaymentMethod {
        PaymentMethod {
            id: self.id,
            kind: self.kind,
            last_four_digits: self.last_four_digits,
            expiry_date: self.expiry_date,
            is_default: self.is_default,
        }
    }
}
