//! Indicator arithmetic
//!
//! A measurement always becomes the indicator's current value. Status,
//! trend and the period baseline only move once the measurement period for
//! the indicator's frequency has elapsed.

use crate::error::{QualityError, QualityResult};
use crate::models::{Frequency, Indicator, IndicatorStatus, IndicatorSummary, Trend};
use chrono::{Datelike, NaiveDate};

/// Average month length used to convert days into months
pub const DAYS_PER_MONTH: f64 = 30.44;

impl Frequency {
    pub fn months(&self) -> f64 {
        match self {
            Frequency::Mensual => 1.0,
            Frequency::Trimestral => 3.0,
            Frequency::Semestral => 6.0,
            Frequency::Anual => 12.0,
        }
    }
}

/// `(a / b) * 100`, or `0` when `b` is zero
pub fn compute_result(a: f64, b: f64) -> f64 {
    if b != 0.0 {
        (a / b) * 100.0
    } else {
        0.0
    }
}

pub fn months_elapsed(start: NaiveDate, today: NaiveDate) -> f64 {
    (today - start).num_days() as f64 / DAYS_PER_MONTH
}

/// Trend of `current` against the previous period's value
pub fn trend_between(previous: f64, current: f64) -> Trend {
    if current > previous {
        Trend::Up
    } else if current < previous {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Field values an indicator takes after a measurement
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementOutcome {
    pub result: f64,
    pub current_value: f64,
    pub status: IndicatorStatus,
    pub trend: Trend,
    pub last_period_value: Option<f64>,
    pub period_start_date: NaiveDate,
    pub last_update: NaiveDate,
    pub period_closed: bool,
}

impl MeasurementOutcome {
    pub fn apply_to(&self, indicator: &mut Indicator) {
        indicator.current_value = self.current_value;
        indicator.status = self.status;
        indicator.trend = self.trend;
        indicator.last_period_value = self.last_period_value;
        indicator.period_start_date = Some(self.period_start_date);
        indicator.last_update = Some(self.last_update);
    }
}

pub fn apply_measurement(indicator: &Indicator, a: f64, b: f64, today: NaiveDate) -> MeasurementOutcome {
    let result = compute_result(a, b);
    let period_start = indicator.period_start_date.unwrap_or(today);

    if months_elapsed(period_start, today) >= indicator.frequency.months() {
        let status = if result >= indicator.target_value {
            IndicatorStatus::Cumple
        } else {
            IndicatorStatus::NoCumple
        };
        let trend = indicator
            .last_period_value
            .map(|previous| trend_between(previous, result))
            .unwrap_or(indicator.trend);

        MeasurementOutcome {
            result,
            current_value: result,
            status,
            trend,
            last_period_value: Some(result),
            period_start_date: today,
            last_update: today,
            period_closed: true,
        }
    } else {
        MeasurementOutcome {
            result,
            current_value: result,
            status: indicator.status,
            trend: indicator.trend,
            last_period_value: indicator.last_period_value,
            period_start_date: period_start,
            last_update: today,
            period_closed: false,
        }
    }
}

/// `YYYY-MM` to the first day of that month; empty input means today
pub fn parse_period(period: &str, today: NaiveDate) -> QualityResult<NaiveDate> {
    let period = period.trim();
    if period.is_empty() {
        return Ok(today);
    }

    let invalid = || QualityError::validation(format!("Periodo inválido: '{}' (formato AAAA-MM)", period));
    let (year, month) = period.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

/// Progress towards the target, 0..=100
///
/// Indicators measured in `horas` are lower-is-better.
pub fn progress(current: f64, target: f64, unit: &str) -> f64 {
    let target = if target == 0.0 { 1.0 } else { target };
    if unit.trim().eq_ignore_ascii_case("horas") {
        (((target - current) / target) * 100.0 + 50.0).clamp(0.0, 100.0)
    } else {
        ((current / target) * 100.0).min(100.0)
    }
}

pub fn summarize(indicators: &[Indicator]) -> IndicatorSummary {
    indicators.iter().fold(
        IndicatorSummary {
            total: indicators.len(),
            ..Default::default()
        },
        |mut summary, indicator| {
            match indicator.status {
                IndicatorStatus::Cumple => summary.on_target += 1,
                IndicatorStatus::NoCumple => summary.off_target += 1,
                IndicatorStatus::EnProceso => summary.in_progress += 1,
            }
            summary
        },
    )
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn indicator(frequency: Frequency, start: Option<NaiveDate>, target: f64) -> Indicator {
        Indicator {
            id: 1,
            name: "Satisfacción del cliente".to_string(),
            process_id: Some(1),
            process: "Comercial".to_string(),
            objective: String::new(),
            target_value: target,
            current_value: 0.0,
            unit: "%".to_string(),
            input_1: "Encuestas positivas".to_string(),
            input_2: "Encuestas totales".to_string(),
            formula: "A/B*100".to_string(),
            calculation_info: String::new(),
            frequency,
            responsible: String::new(),
            status: IndicatorStatus::EnProceso,
            trend: Trend::Stable,
            last_period_value: None,
            period_start_date: start,
            last_update: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compute_result() {
        assert_eq!(compute_result(45.0, 50.0), 90.0);
        assert_eq!(compute_result(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_frequency_months() {
        assert_eq!(Frequency::Mensual.months(), 1.0);
        assert_eq!(Frequency::Trimestral.months(), 3.0);
        assert_eq!(Frequency::Semestral.months(), 6.0);
        assert_eq!(Frequency::Anual.months(), 12.0);
    }

    #[test]
    fn test_measurement_within_period_keeps_status() {
        let ind = indicator(Frequency::Trimestral, Some(date(2024, 1, 1)), 80.0);
        let outcome = apply_measurement(&ind, 9.0, 10.0, date(2024, 2, 1));

        assert!(!outcome.period_closed);
        assert_eq!(outcome.current_value, 90.0);
        assert_eq!(outcome.status, IndicatorStatus::EnProceso);
        assert_eq!(outcome.trend, Trend::Stable);
        assert_eq!(outcome.last_period_value, None);
        assert_eq!(outcome.period_start_date, date(2024, 1, 1));
        assert_eq!(outcome.last_update, date(2024, 2, 1));
    }

    #[test]
    fn test_measurement_closes_elapsed_period() {
        let mut ind = indicator(Frequency::Mensual, Some(date(2024, 1, 1)), 80.0);
        ind.last_period_value = Some(95.0);
        let outcome = apply_measurement(&ind, 7.0, 10.0, date(2024, 2, 15));

        assert!(outcome.period_closed);
        assert_eq!(outcome.status, IndicatorStatus::NoCumple);
        assert_eq!(outcome.trend, Trend::Down);
        assert_eq!(outcome.last_period_value, Some(70.0));
        assert_eq!(outcome.period_start_date, date(2024, 2, 15));
    }

    #[test]
    fn test_first_closed_period_keeps_trend() {
        let mut ind = indicator(Frequency::Mensual, Some(date(2024, 1, 1)), 50.0);
        ind.trend = Trend::Up;
        let outcome = apply_measurement(&ind, 1.0, 1.0, date(2024, 3, 1));

        assert_eq!(outcome.status, IndicatorStatus::Cumple);
        assert_eq!(outcome.trend, Trend::Up);
    }

    #[test]
    fn test_missing_period_start_starts_today() {
        let ind = indicator(Frequency::Mensual, None, 50.0);
        let today = date(2024, 5, 10);
        let outcome = apply_measurement(&ind, 1.0, 2.0, today);

        assert!(!outcome.period_closed);
        assert_eq!(outcome.period_start_date, today);
    }

    #[test]
    fn test_parse_period() {
        let today = date(2024, 6, 18);
        assert_eq!(parse_period("2024-03", today).unwrap(), date(2024, 3, 1));
        assert_eq!(parse_period("", today).unwrap(), today);
        assert!(parse_period("2024-13", today).is_err());
        assert!(parse_period("03/2024", today).is_err());
    }

    #[test]
    fn test_progress_by_unit() {
        assert_eq!(progress(45.0, 90.0, "%"), 50.0);
        assert_eq!(progress(200.0, 100.0, "%"), 100.0);
        assert_eq!(progress(5.0, 0.0, "%"), 100.0);
        // lower is better
        assert_eq!(progress(10.0, 10.0, "horas"), 50.0);
        assert_eq!(progress(0.0, 10.0, "horas"), 100.0);
        assert_eq!(progress(30.0, 10.0, "Horas"), 0.0);
    }

    #[test]
    fn test_summarize() {
        let mut a = indicator(Frequency::Mensual, None, 1.0);
        a.status = IndicatorStatus::Cumple;
        let mut b = indicator(Frequency::Mensual, None, 1.0);
        b.status = IndicatorStatus::NoCumple;
        let c = indicator(Frequency::Mensual, None, 1.0);

        let summary = summarize(&[a, b, c]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.on_target, 1);
        assert_eq!(summary.off_target, 1);
        assert_eq!(summary.in_progress, 1);
    }

    proptest! {
        #[test]
        fn prop_compute_result_is_finite(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
            let result = compute_result(a, b);
            prop_assert!(result.is_finite());
            if b == 0.0 {
                prop_assert_eq!(result, 0.0);
            }
        }

        #[test]
        fn prop_progress_is_bounded(current in 0.0f64..1.0e4, target in 0.0f64..1.0e4, hours in any::<bool>()) {
            let unit = if hours { "horas" } else { "%" };
            let value = progress(current, target, unit);
            prop_assert!(value <= 100.0);
            if hours {
                prop_assert!(value >= 0.0);
            }
        }

        #[test]
        fn prop_current_value_is_always_result(a in 0.0f64..1000.0, b in 0.1f64..1000.0, days in 0i64..800) {
            let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
            let today = start + chrono::Duration::days(days);
            let ind = indicator(Frequency::Trimestral, Some(start), 80.0);
            let outcome = apply_measurement(&ind, a, b, today);
            prop_assert_eq!(outcome.current_value, compute_result(a, b));
            prop_assert_eq!(outcome.last_update, today);
            prop_assert_eq!(outcome.period_closed, days as f64 / DAYS_PER_MONTH >= 3.0);
        }
    }
}
