//! Users and their payment methods.
//!
//! The ride ledger only touches this through [`AccountBook::record_completed_ride`].

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{PaymentMethod, User, UserId};

#[derive(Default)]
pub struct AccountBook {
    users: RwLock<HashMap<UserId, User>>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn insert_user(&self, user: User) -> LedgerResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(LedgerError::Duplicate(format!("user {}", user.id)));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> LedgerResult<User> {
        let users = self.users.read().await;
        users
            .get(user_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("user {}", user_id)))
    }

    pub async fn payment_methods(&self, user_id: &str) -> LedgerResult<Vec<PaymentMethod>> {
        Ok(self.get_user(user_id).await?.payment_methods)
    }

    pub async fn default_payment_method(&self, user_id: &str) -> LedgerResult<Option<PaymentMethod>> {
        Ok(self.get_user(user_id).await?.default_payment_method().cloned())
    }

    /// Adds a method. A method flagged default takes the flag from the
    /// previous default; the first method a user adds always becomes default.
    pub async fn add_payment_method(
        &self,
        user_id: &str,
        mut method: PaymentMethod,
    ) -> LedgerResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("user {}", user_id)))?;

        if user.payment_methods.iter().any(|m| m.id == method.id) {
            return Err(LedgerError::Duplicate(format!("payment method {}", method.id)));
        }

        if user.payment_methods.is_empty() {
            method.is_default = true;
        }
        if method.is_default {
            for existing in user.payment_methods.iter_mut() {
                existing.is_default = false;
            }
        }
        user.payment_methods.push(method);

        Ok(user.clone())
    }

    pub async fn set_default_payment_method(
        &self,
        user_id: &str,
        method_id: &str,
    ) -> LedgerResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("user {}", user_id)))?;

        if !user.payment_methods.iter().any(|m| m.id == method_id) {
            return Err(LedgerError::NotFound(format!("payment method {}", method_id)));
        }
        for method in user.payment_methods.iter_mut() {
            method.is_default = method.id == method_id;
        }

        Ok(user.clone())
    }

    /// Bumps the user's ride count. Returns false for unknown users.
    pub async fn record_completed_ride(&self, user_id: &str) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.total_rides = user.total_rides.saturating_add(1);
                true
            }
            None => false,
        }
    }
}
