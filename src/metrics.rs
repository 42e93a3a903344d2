//! Metrics derivation
//!
//! Reduces a daily commit series to the derived per-day series and four
//! scalar indicators:
//! - pulse: recency-weighted mean of daily counts
//! - activity heat: mean of the EMA-smoothed daily counts
//! - strikes: variability of log-compressed gaps between active days
//! - consistency score: bounded score rewarding small mean gaps

use tracing::debug;

use crate::error::ComputeError;
use crate::series::DailySeries;
use crate::types::MetricsBundle;

/// Decay rate applied per active-day position in `commit_speed`
pub const SPEED_DECAY_RATE: f64 = 0.1;

/// EMA span used for `commit_energy`
pub const ENERGY_SPAN: f64 = 7.0;

/// Gap assigned to the first active day, which has no predecessor
pub const FIRST_GAP_DAYS: i64 = 1;

/// Compute all derived series and scalars for a daily series.
///
/// Fails with `EmptySeries` when there are no active days. A single active
/// day still yields a bundle, with `strikes` left undefined.
pub fn compute_metrics(series: &DailySeries) -> Result<MetricsBundle, ComputeError> {
    if series.is_empty() {
        return Err(ComputeError::EmptySeries);
    }
    series.validate()?;

    let counts: Vec<f64> = series.counts().map(f64::from).collect();

    let commit_speed = compute_commit_speed(&counts);
    let commit_energy = compute_commit_energy(&counts, ENERGY_SPAN);
    let time_gaps = compute_time_gaps(series);

    let pulse = mean(&commit_speed);
    let activity_heat = mean(&commit_energy);
    let strikes = compute_strikes(&time_gaps);
    let consistency_score = compute_consistency_score(&time_gaps);

    debug!(
        active_days = series.len(),
        pulse,
        activity_heat,
        ?strikes,
        consistency_score,
        "computed activity metrics"
    );

    Ok(MetricsBundle {
        series: series.clone(),
        commit_speed,
        commit_energy,
        time_gaps,
        pulse,
        activity_heat,
        strikes,
        consistency_score,
    })
}

/// Weight each day's count by `exp(-rate * i)`, where `i` is the position
/// among active days rather than elapsed calendar days
fn compute_commit_speed(counts: &[f64]) -> Vec<f64> {
    counts
        .iter()
        .enumerate()
        .map(|(i, count)| count * (-SPEED_DECAY_RATE * i as f64).exp())
        .collect()
}

/// Exponentially weighted moving average
///
/// Formula: `e[0] = x[0]`, `e[i] = alpha * x[i] + (1 - alpha) * e[i-1]`
/// with `alpha = 2 / (span + 1)`
fn compute_commit_energy(counts: &[f64], span: f64) -> Vec<f64> {
    let alpha = 2.0 / (span + 1.0);
    let mut energy = Vec::with_capacity(counts.len());
    let mut previous: Option<f64> = None;

    for &count in counts {
        let value = match previous {
            Some(prev) => alpha * count + (1.0 - alpha) * prev,
            None => count,
        };
        energy.push(value);
        previous = Some(value);
    }

    energy
}

/// Calendar days between consecutive active days
fn compute_time_gaps(series: &DailySeries) -> Vec<i64> {
    let dates: Vec<_> = series.dates().collect();
    let mut gaps = Vec::with_capacity(dates.len());

    if !dates.is_empty() {
        gaps.push(FIRST_GAP_DAYS);
    }
    gaps.extend(
        dates
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days()),
    );

    gaps
}

/// Sample standard deviation of `ln(1 + gap)`
fn compute_strikes(time_gaps: &[i64]) -> Option<f64> {
    let log_gaps: Vec<f64> = time_gaps.iter().map(|&g| (g as f64).ln_1p()).collect();
    sample_std(&log_gaps)
}

/// Formula: `100 / (exp(mean_gap) + 1)`
///
/// Evaluated as `100 * exp(-m) / (1 + exp(-m))` so that very long gaps
/// underflow toward zero instead of overflowing `exp`. The result is clamped
/// to `f64::MIN_POSITIVE` to stay strictly positive.
fn compute_consistency_score(time_gaps: &[i64]) -> f64 {
    let gaps: Vec<f64> = time_gaps.iter().map(|&g| g as f64).collect();
    let decay = (-mean(&gaps)).exp();
    (100.0 * decay / (1.0 + decay)).max(f64::MIN_POSITIVE)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `n - 1` degrees of freedom; undefined below two samples
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::build_daily_series;
    use crate::types::CommitEvent;
    use chrono::NaiveDate;

    const EPS: f64 = 1e-9;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(entries: &[(u32, u32)]) -> DailySeries {
        DailySeries::from_entries(entries.iter().map(|&(d, c)| (day(d), c)).collect()).unwrap()
    }

    #[test]
    fn test_hand_computed_reference() {
        // Jan 3 is missing on purpose
        let bundle = compute_metrics(&series(&[(1, 2), (2, 1), (4, 3)])).unwrap();

        assert_eq!(bundle.time_gaps, vec![1, 1, 2]);

        let speed = [2.0, (-0.1f64).exp(), 3.0 * (-0.2f64).exp()];
        for (actual, expected) in bundle.commit_speed.iter().zip(speed.iter()) {
            assert!((actual - expected).abs() < EPS);
        }

        // alpha = 0.25: 2, 0.25*1 + 0.75*2, 0.25*3 + 0.75*1.75
        let energy = [2.0, 1.75, 2.0625];
        for (actual, expected) in bundle.commit_energy.iter().zip(energy.iter()) {
            assert!((actual - expected).abs() < EPS);
        }

        let expected_pulse = speed.iter().sum::<f64>() / 3.0;
        assert!((bundle.pulse - expected_pulse).abs() < EPS);
        assert!((bundle.activity_heat - 5.8125 / 3.0).abs() < EPS);

        let logs = [2f64.ln(), 2f64.ln(), 3f64.ln()];
        let m = logs.iter().sum::<f64>() / 3.0;
        let expected_strikes =
            (logs.iter().map(|v| (v - m).powi(2)).sum::<f64>() / 2.0).sqrt();
        assert!((bundle.strikes.unwrap() - expected_strikes).abs() < EPS);

        let expected_consistency = 100.0 / ((4.0f64 / 3.0).exp() + 1.0);
        assert!((bundle.consistency_score - expected_consistency).abs() < EPS);
    }

    #[test]
    fn test_series_lengths_match() {
        let s = series(&[(1, 4), (5, 1), (6, 2), (20, 7), (28, 1)]);
        let bundle = compute_metrics(&s).unwrap();

        assert_eq!(bundle.commit_speed.len(), s.len());
        assert_eq!(bundle.commit_energy.len(), s.len());
        assert_eq!(bundle.time_gaps.len(), s.len());
        assert_eq!(bundle.daily_points().len(), s.len());
    }

    #[test]
    fn test_first_gap_is_sentinel() {
        for start in [1, 9, 27] {
            let bundle = compute_metrics(&series(&[(start, 1), (start + 3, 1)])).unwrap();
            assert_eq!(bundle.time_gaps[0], 1);
            assert_eq!(bundle.time_gaps[1], 3);
        }
    }

    #[test]
    fn test_decay_uses_active_day_position() {
        // Same counts, different calendar spacing: speed must be identical
        let dense = compute_metrics(&series(&[(1, 5), (2, 5)])).unwrap();
        let sparse = compute_metrics(&series(&[(1, 5), (30, 5)])).unwrap();
        assert_eq!(dense.commit_speed, sparse.commit_speed);
        assert!((sparse.commit_speed[1] - 5.0 * (-0.1f64).exp()).abs() < EPS);
    }

    #[test]
    fn test_energy_converges_to_constant_count() {
        let entries: Vec<(u32, u32)> = (1..=31).map(|d| (d, 4)).collect();
        let bundle = compute_metrics(&series(&entries)).unwrap();

        let last = *bundle.commit_energy.last().unwrap();
        assert!((last - 4.0).abs() < EPS);
        assert!((bundle.activity_heat - 4.0).abs() < EPS);
    }

    #[test]
    fn test_energy_converges_from_below() {
        let mut entries = vec![(1, 1)];
        entries.extend((2..=31).map(|d| (d, 6)));
        let bundle = compute_metrics(&series(&entries)).unwrap();

        let errors: Vec<f64> = bundle
            .commit_energy
            .iter()
            .map(|e| (6.0 - e).abs())
            .collect();
        assert!(errors.windows(2).all(|w| w[1] <= w[0]));
        assert!(errors.last().unwrap() < &0.01);
    }

    #[test]
    fn test_consecutive_days_more_consistent_than_spread() {
        let consecutive = compute_metrics(&series(&[(1, 2), (2, 2), (3, 2)])).unwrap();
        let spread = compute_metrics(&series(&[(1, 2), (3, 2), (5, 2)])).unwrap();
        assert!(consecutive.consistency_score > spread.consistency_score);
    }

    #[test]
    fn test_consistency_score_bounds() {
        let cases: Vec<Vec<(u32, u32)>> = vec![
            vec![(1, 1)],
            vec![(1, 1), (2, 1), (3, 1)],
            vec![(1, 9), (15, 1), (31, 2)],
            (1..=31).map(|d| (d, d)).collect(),
        ];

        for entries in cases {
            let bundle = compute_metrics(&series(&entries)).unwrap();
            assert!(bundle.consistency_score > 0.0);
            assert!(bundle.consistency_score <= 50.0);
        }
    }

    #[test]
    fn test_consistency_score_stays_positive_for_multi_year_gap() {
        let s = DailySeries::from_entries(vec![
            (NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(), 1),
            (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 1),
        ])
        .unwrap();

        let bundle = compute_metrics(&s).unwrap();
        assert_eq!(bundle.time_gaps, vec![1, 1827]);
        assert!(bundle.consistency_score > 0.0);
        assert!(bundle.consistency_score.is_finite());
        assert!(bundle.consistency_score <= 50.0);
    }

    #[test]
    fn test_empty_events_raise_empty_series() {
        let s = build_daily_series(&Vec::<CommitEvent>::new());
        assert!(matches!(compute_metrics(&s), Err(ComputeError::EmptySeries)));
    }

    #[test]
    fn test_single_day_leaves_strikes_undefined() {
        let bundle = compute_metrics(&series(&[(1, 5)])).unwrap();

        assert!(bundle.strikes.is_none());
        assert!(matches!(
            bundle.require_strikes(),
            Err(ComputeError::InsufficientData {
                required: 2,
                actual: 1
            })
        ));

        assert!((bundle.pulse - 5.0).abs() < EPS);
        assert!((bundle.activity_heat - 5.0).abs() < EPS);
        let expected_consistency = 100.0 / (1f64.exp() + 1.0);
        assert!((bundle.consistency_score - expected_consistency).abs() < EPS);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let s = series(&[(2, 3), (3, 8), (9, 1), (10, 4)]);
        let first = compute_metrics(&s).unwrap();
        let second = compute_metrics(&s).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.pulse.to_bits(), second.pulse.to_bits());
        assert_eq!(
            first.strikes.map(f64::to_bits),
            second.strikes.map(f64::to_bits)
        );
    }

    #[test]
    fn test_rejects_non_increasing_series() {
        let s = DailySeries::from_entries_unchecked(vec![(day(5), 1), (day(2), 1)]);
        assert!(matches!(
            compute_metrics(&s),
            Err(ComputeError::NonIncreasingDates { .. })
        ));
    }
}
