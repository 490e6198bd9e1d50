pub mod location;
pub mod payment;
pub mod ride;
pub mod scooter;
pub mod user;

pub use location::Coordinate;
pub use payment::{Payment, PaymentMethod, PaymentStatus, PaymentType};
pub use ride::{Ride, RideFilter, RideId, RideStatus, RideSummary};
pub use scooter::{Scooter, ScooterId};
pub use user::{User, UserId};
