//! Booking cost

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{DomainError, DomainResult, TimeWindow};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// `round(hours * price_per_hour, 2)`, midpoint away from zero.
///
/// Computed in decimal so `2h * 10.0` is exactly `20.00`.
pub fn booking_cost(window: &TimeWindow, price_per_hour: f64) -> DomainResult<f64> {
    if !price_per_hour.is_finite() || price_per_hour < 0.0 {
        return Err(DomainError::Validation(format!(
            "station price {} is not a valid hourly rate",
            price_per_hour
        )));
    }

    let price = Decimal::try_from(price_per_hour)
        .map_err(|e| DomainError::Validation(format!("station price: {}", e)))?;
    let hours = Decimal::from(window.duration().num_milliseconds()) / Decimal::from(MILLIS_PER_HOUR);

    let cost = hours
        .checked_mul(price)
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "cost of {} hours at {} per hour is out of range",
                hours, price
            ))
        })?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cost.to_f64()
        .ok_or_else(|| DomainError::Validation(format!("cost {} is out of range", cost)))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn window(minutes: i64) -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::minutes(minutes)).unwrap()
    }

    #[test]
    fn two_hours_at_ten() {
        assert_eq!(booking_cost(&window(120), 10.0).unwrap(), 20.00);
    }

    #[test]
    fn fractional_hours_round_to_cents() {
        // 20 min at 10.0 = 3.333.. -> 3.33
        assert_eq!(booking_cost(&window(20), 10.0).unwrap(), 3.33);
        // 40 min at 10.0 = 6.666.. -> 6.67
        assert_eq!(booking_cost(&window(40), 10.0).unwrap(), 6.67);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        // 1.5 min at 1.0/h = 0.025 -> 0.03
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let w = TimeWindow::new(start, start + Duration::seconds(90)).unwrap();
        assert_eq!(booking_cost(&w, 1.0).unwrap(), 0.03);
    }

    #[test]
    fn free_station_costs_nothing() {
        assert_eq!(booking_cost(&window(60), 0.0).unwrap(), 0.0);
    }

    #[test]
    fn rejects_non_finite_price() {
        assert!(matches!(
            booking_cost(&window(60), f64::NAN),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn extreme_price_overflow_is_a_validation_error() {
        // one day at 1e28/h exceeds the decimal range
        assert!(matches!(
            booking_cost(&window(24 * 60), 1e28),
            Err(DomainError::Validation(_))
        ));
    }
}
