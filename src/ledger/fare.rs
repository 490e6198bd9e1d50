//! Fare computation. Fares are strictly time based: rate per minute times
//! elapsed minutes, rounded half-up to the cent. There is no minimum fare,
//! unlock fee or cancellation fee.

use chrono::Duration;
use rust_decimal::{Decimal, RoundingStrategy};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Rounds to two decimal places, halves away from zero.
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Fare for a ride of the given length. Negative durations bill as zero.
///
/// Multiplies before dividing so an exact half cent stays exact and rounds up.
pub fn ride_fare(rate_per_minute: Decimal, elapsed: Duration) -> Decimal {
    let millis = elapsed.num_milliseconds().max(0);
    round_to_cents(rate_per_minute * Decimal::from(millis) / Decimal::from(MILLIS_PER_MINUTE))
}

/// Up-front estimate for a planned ride of `minutes` minutes.
pub fn quote(rate_per_minute: Decimal, minutes: u32) -> Decimal {
    round_to_cents(rate_per_minute * Decimal::from(minutes))
}
