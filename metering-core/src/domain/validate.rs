use std::collections::BTreeMap;

use super::month::Month;
use super::profile::Profile;
use super::reading::{Connection, MeterReading, MeterRecord, RawReading};

/// Flat tolerance added above the fraction-derived floor: 25% of the floor.
const TOLERANCE: f64 = 0.25;

/// Connection-scoped validation outcomes. These are recorded per connection
/// in the batch status list and never abort the batch as a whole.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Readings Insufficient ie., not all months data found")]
    InsufficientData,
    #[error("Readings Invalid ie., not in ascending Order")]
    OrderInvalid,
    #[error(
        "consumption: {consumption}, allowedConsumption: {allowed_from} to {allowed_till}, \
         ie., AllowedMeterReadingRange for {month}: {reading_from} to {reading_till}, \
         totalyearconsumption: {annual_total}"
    )]
    ConsumptionOutOfRange {
        month: Month,
        consumption: i64,
        allowed_from: i64,
        allowed_till: i64,
        /// Bounds translated back onto the cumulative-reading axis.
        reading_from: i64,
        reading_till: i64,
        annual_total: i64,
    },
}

/// Validates one connection's submitted readings against its profile.
///
/// Pure function over the immutable inputs: completeness, calendar ordering,
/// monotonicity of the cumulative sequence, then the per-month consumption
/// check against the fraction-derived tolerance band. Fails fast on the first
/// bad month; acceptance is all-or-nothing per connection.
pub fn validate_connection(
    connection: Connection,
    readings: &[RawReading],
    profile: &Profile,
) -> Result<MeterReading, ValidationFailure> {
    // Completeness: exactly 12 records covering 12 distinct months.
    if readings.len() != 12 {
        return Err(ValidationFailure::InsufficientData);
    }
    let by_month: BTreeMap<Month, i64> =
        readings.iter().map(|r| (r.month, r.reading)).collect();
    if by_month.len() != 12 {
        return Err(ValidationFailure::InsufficientData);
    }

    // BTreeMap iteration is calendar order, so this is the ordered
    // cumulative-reading sequence.
    let ordered: Vec<i64> = by_month.values().copied().collect();
    if ordered.windows(2).any(|w| w[1] < w[0]) {
        return Err(ValidationFailure::OrderInvalid);
    }

    // December's cumulative reading is the year's total consumption; each
    // year's counter is assumed to restart from an implicit baseline of 0.
    let annual_total = ordered[11];

    let mut meter_records = Vec::with_capacity(12);
    let mut prev_reading: i64 = 0;
    for (&month, &reading) in &by_month {
        let consumption = reading - prev_reading;
        let allowed_from = (profile.fraction(month) * annual_total as f64) as i64;
        let allowed_till = allowed_from + (allowed_from as f64 * TOLERANCE) as i64;

        if consumption < allowed_from || consumption > allowed_till {
            return Err(ValidationFailure::ConsumptionOutOfRange {
                month,
                consumption,
                allowed_from,
                allowed_till,
                reading_from: prev_reading + allowed_from,
                reading_till: prev_reading + allowed_till,
                annual_total,
            });
        }

        meter_records.push(MeterRecord { month, reading });
        prev_reading = reading;
    }

    Ok(MeterReading {
        connection,
        meter_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Fraction, ProfileBuilder};

    fn profile(fractions: &[(Month, f64)]) -> Profile {
        let mut builder = ProfileBuilder::new("A");
        for &(month, value) in fractions {
            builder.add_fraction(Fraction::new(month, value));
        }
        builder.build().unwrap()
    }

    fn raw(month: Month, reading: i64) -> RawReading {
        RawReading {
            profile_name: "A".to_string(),
            connection_id: "0001".to_string(),
            month,
            reading,
        }
    }

    fn conn() -> Connection {
        Connection::new("A", "0001")
    }

    #[test]
    fn eleven_readings_fail_with_insufficient_data() {
        let profile = profile(&[(Month::Jan, 1.0)]);
        let readings: Vec<RawReading> = Month::ALL[..11]
            .iter()
            .enumerate()
            .map(|(i, &m)| raw(m, (i as i64 + 1) * 10))
            .collect();

        let res = validate_connection(conn(), &readings, &profile);
        assert_eq!(res.unwrap_err(), ValidationFailure::InsufficientData);
    }

    #[test]
    fn duplicated_month_fails_with_insufficient_data() {
        let profile = profile(&[(Month::Jan, 1.0)]);
        let mut readings: Vec<RawReading> = Month::ALL
            .iter()
            .enumerate()
            .map(|(i, &m)| raw(m, (i as i64 + 1) * 10))
            .collect();
        // Still 12 records, but only 11 distinct months.
        readings[11] = raw(Month::Jan, 500);

        let res = validate_connection(conn(), &readings, &profile);
        assert_eq!(res.unwrap_err(), ValidationFailure::InsufficientData);
    }

    #[test]
    fn descending_reading_fails_before_consumption_check() {
        // JAN=0.0 would immediately fail the consumption check if reached;
        // the order check must fire first.
        let profile = profile(&[(Month::Dec, 1.0)]);
        let mut readings: Vec<RawReading> = Month::ALL
            .iter()
            .enumerate()
            .map(|(i, &m)| raw(m, (i as i64 + 1) * 10))
            .collect();
        readings[5].reading = 1; // JUN drops below MAY

        let res = validate_connection(conn(), &readings, &profile);
        assert_eq!(res.unwrap_err(), ValidationFailure::OrderInvalid);
    }

    #[test]
    fn out_of_range_january_reports_bounds_and_annual_total() {
        // JAN carries the whole year; readings climb by 10 each month to 130.
        // Allowed January consumption is [130, 162]; actual is 10.
        let profile = profile(&[(Month::Jan, 1.0)]);
        let readings: Vec<RawReading> = Month::ALL
            .iter()
            .enumerate()
            .map(|(i, &m)| raw(m, (i as i64 + 1) * 10))
            .collect();

        let err = validate_connection(conn(), &readings, &profile).unwrap_err();
        match err {
            ValidationFailure::ConsumptionOutOfRange {
                month,
                consumption,
                allowed_from,
                allowed_till,
                reading_from,
                reading_till,
                annual_total,
            } => {
                assert_eq!(month, Month::Jan);
                assert_eq!(consumption, 10);
                assert_eq!(allowed_from, 130);
                assert_eq!(allowed_till, 162);
                assert_eq!(reading_from, 130);
                assert_eq!(reading_till, 162);
                assert_eq!(annual_total, 130);
            }
            other => panic!("expected ConsumptionOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_message_cites_bounds() {
        let profile = profile(&[(Month::Jan, 1.0)]);
        let readings: Vec<RawReading> = Month::ALL
            .iter()
            .enumerate()
            .map(|(i, &m)| raw(m, (i as i64 + 1) * 10))
            .collect();

        let msg = validate_connection(conn(), &readings, &profile)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("allowedConsumption: 130 to 162"), "{msg}");
        assert!(msg.contains("JAN"), "{msg}");
        assert!(msg.contains("totalyearconsumption: 130"), "{msg}");
    }

    #[test]
    fn uniform_profile_accepts_uniform_consumption() {
        // 1/12 per month; readings climb by 12 each month, annual total 144.
        // Per-month floor is (144/12)=12, band [12, 15]; consumption is 12.
        let fractions: Vec<(Month, f64)> =
            Month::ALL.iter().map(|&m| (m, 1.0 / 12.0)).collect();
        let profile = profile(&fractions);
        let readings: Vec<RawReading> = Month::ALL
            .iter()
            .enumerate()
            .map(|(i, &m)| raw(m, (i as i64 + 1) * 12))
            .collect();

        let meter_reading = validate_connection(conn(), &readings, &profile).unwrap();
        assert_eq!(meter_reading.connection, conn());
        assert_eq!(meter_reading.meter_records.len(), 12);
        assert_eq!(meter_reading.meter_records[0].month, Month::Jan);
        assert_eq!(meter_reading.meter_records[11].reading, 144);
    }

    #[test]
    fn consumption_above_tolerance_band_fails() {
        // Same uniform profile, but February jumps by 20 (> 15 allowed).
        let fractions: Vec<(Month, f64)> =
            Month::ALL.iter().map(|&m| (m, 1.0 / 12.0)).collect();
        let profile = profile(&fractions);
        let mut readings: Vec<RawReading> = Vec::new();
        let mut cumulative = 0;
        for (i, &m) in Month::ALL.iter().enumerate() {
            cumulative += if i == 1 { 20 } else { 12 };
            readings.push(raw(m, cumulative));
        }
        // Keep December at a total that still yields a 12-per-month floor.
        // cumulative = 11*12 + 20 = 152, floor(152/12) = 12, band [12, 15].
        let err = validate_connection(conn(), &readings, &profile).unwrap_err();
        match err {
            ValidationFailure::ConsumptionOutOfRange { month, consumption, .. } => {
                assert_eq!(month, Month::Feb);
                assert_eq!(consumption, 20);
            }
            other => panic!("expected ConsumptionOutOfRange, got {other:?}"),
        }
    }
}
