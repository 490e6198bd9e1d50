use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::payment::PaymentMethod;

pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_image: Option<String>,
    pub rating: f64,
    /// Only ever grows, once per completed ride.
    pub total_rides: u32,
    pub member_since: DateTime<Utc>,
    pub payment_methods: Vec<PaymentMethod>,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            profile_image: None,
            rating: 0.0,
            total_rides: 0,
            member_since: Utc::now(),
            payment_methods: Vec::new(),
        }
    }

    pub fn default_payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|m| m.is_default)
    }
}
