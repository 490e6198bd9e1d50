//! SwiftRide scooter rental backend
//!
//! The ride core ([`ledger::RideLedger`]) owns scooters and rides, enforces
//! the one-open-ride-per-scooter rule and computes fares. Everything else here
//! is the surface around it: accounts, payment and device collaborators, the
//! rider session flow and the HTTP routes.

pub mod accounts;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod routes;
pub mod seed;
pub mod session;

pub use accounts::AccountBook;
pub use error::{ApiError, LedgerError, LedgerResult};
pub use ledger::RideLedger;
pub use model::{Coordinate, Ride, RideStatus, Scooter};
