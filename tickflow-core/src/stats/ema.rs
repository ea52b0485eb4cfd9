//! Interval-gated exponential moving average.

use chrono::{DateTime, TimeDelta, Utc};

/// EMA state. Value and last-update instant only exist together, so a torn
/// "initialized but no timestamp" observation is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EmaState {
    Uninitialized,
    Initialized {
        value: f64,
        last_update: DateTime<Utc>,
    },
}

/// Exponential moving average that only accepts samples at a fixed cadence.
///
/// The first sample initializes the average to itself. After that, a sample
/// is applied only when at least one interval has elapsed since the last
/// accepted sample; earlier samples are ignored and the current value is
/// returned unchanged. The smoothing factor is the standard
/// `alpha = 2 / (interval_seconds + 1)`.
#[derive(Debug, Clone)]
pub struct GatedEma {
    interval: TimeDelta,
    alpha: f64,
    state: EmaState,
}

impl GatedEma {
    /// Create an EMA gated on a whole-second interval.
    pub fn from_interval_secs(interval_secs: u32) -> Self {
        GatedEma {
            interval: TimeDelta::seconds(i64::from(interval_secs)),
            alpha: 2.0 / (f64::from(interval_secs) + 1.0),
            state: EmaState::Uninitialized,
        }
    }

    /// Apply a sample observed at `now`, returning the current value.
    ///
    /// Returns the (possibly unchanged) average: unchanged when the sample
    /// arrived inside the gate interval, updated otherwise.
    pub fn update(&mut self, sample: f64, now: DateTime<Utc>) -> f64 {
        match self.state {
            EmaState::Uninitialized => {
                self.state = EmaState::Initialized {
                    value: sample,
                    last_update: now,
                };
                sample
            }
            EmaState::Initialized { value, last_update } => {
                if now - last_update < self.interval {
                    return value;
                }
                let next = self.alpha * sample + (1.0 - self.alpha) * value;
                self.state = EmaState::Initialized {
                    value: next,
                    last_update: now,
                };
                next
            }
        }
    }

    /// Current value, `None` until the first sample has been applied.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self.state {
            EmaState::Uninitialized => None,
            EmaState::Initialized { value, .. } => Some(value),
        }
    }

    /// Instant of the last accepted sample.
    #[inline]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        match self.state {
            EmaState::Uninitialized => None,
            EmaState::Initialized { last_update, .. } => Some(last_update),
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, EmaState::Initialized { .. })
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Clear back to the uninitialized state.
    pub fn reset(&mut self) {
        self.state = EmaState::Uninitialized;
    }
}

/// The two averages tracked per product: last-trade price and mid-price.
/// Both share the same interval and smoothing factor but gate independently.
#[derive(Debug, Clone)]
pub struct EmaEngine {
    price: GatedEma,
    mid_price: GatedEma,
}

impl EmaEngine {
    pub fn from_interval_secs(interval_secs: u32) -> Self {
        EmaEngine {
            price: GatedEma::from_interval_secs(interval_secs),
            mid_price: GatedEma::from_interval_secs(interval_secs),
        }
    }

    /// Apply a trade-price sample, returning the current price EMA.
    pub fn update_price(&mut self, sample: f64, now: DateTime<Utc>) -> f64 {
        self.price.update(sample, now)
    }

    /// Apply a mid-price sample, returning the current mid-price EMA.
    pub fn update_mid_price(&mut self, sample: f64, now: DateTime<Utc>) -> f64 {
        self.mid_price.update(sample, now)
    }

    /// Price EMA as logged: `0.0` until the first sample.
    #[inline]
    pub fn price_or_zero(&self) -> f64 {
        self.price.value().unwrap_or(0.0)
    }

    /// Mid-price EMA as logged: `0.0` until the first sample.
    #[inline]
    pub fn mid_price_or_zero(&self) -> f64 {
        self.mid_price.value().unwrap_or(0.0)
    }

    #[inline]
    pub fn price(&self) -> &GatedEma {
        &self.price
    }

    #[inline]
    pub fn mid_price(&self) -> &GatedEma {
        &self.mid_price
    }

    pub fn reset(&mut self) {
        self.price.reset();
        self.mid_price.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_sample_initializes() {
        let mut ema = GatedEma::from_interval_secs(5);
        assert!(!ema.is_initialized());
        assert_eq!(ema.value(), None);

        let v = ema.update(100.0, at(0));
        assert_eq!(v, 100.0);
        assert!(ema.is_initialized());
        assert_eq!(ema.value(), Some(100.0));
        assert_eq!(ema.last_update(), Some(at(0)));
        assert_eq!(ema.interval(), TimeDelta::seconds(5));
    }

    #[test]
    fn test_gate_rejects_early_sample() {
        let mut ema = GatedEma::from_interval_secs(5);
        ema.update(100.0, at(0));

        // 100ms later: inside the gate, value and timestamp untouched.
        let early = at(0) + TimeDelta::milliseconds(100);
        let v = ema.update(200.0, early);
        assert_eq!(v, 100.0);
        assert_eq!(ema.value(), Some(100.0));
        assert_eq!(ema.last_update(), Some(at(0)));
    }

    #[test]
    fn test_gate_passes_at_exact_interval() {
        let mut ema = GatedEma::from_interval_secs(5);
        ema.update(100.0, at(0));
        let v = ema.update(200.0, at(5));
        assert!(v > 100.0);
        assert_eq!(ema.last_update(), Some(at(5)));
    }

    #[test]
    fn test_recurrence() {
        // alpha = 2 / (5 + 1) = 1/3
        let mut ema = GatedEma::from_interval_secs(5);
        assert!((ema.alpha() - 1.0 / 3.0).abs() < 1e-12);

        ema.update(100.0, at(0));
        let v = ema.update(200.0, at(6));
        let expected = (1.0 / 3.0) * 200.0 + (2.0 / 3.0) * 100.0;
        assert!((v - expected).abs() < 1e-9);
        assert!((v - 133.333_333_33).abs() < 1e-6);
    }

    #[test]
    fn test_gated_samples_do_not_advance_the_clock() {
        let mut ema = GatedEma::from_interval_secs(5);
        ema.update(100.0, at(0));
        // A burst inside the gate: none applied, none moves last_update.
        for ms in [100, 500, 900, 4900] {
            ema.update(999.0, at(0) + TimeDelta::milliseconds(ms));
        }
        assert_eq!(ema.value(), Some(100.0));
        // The next sample past the original gate applies.
        let v = ema.update(200.0, at(5));
        assert!((v - (200.0 / 3.0 + 200.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut ema = GatedEma::from_interval_secs(5);
        ema.update(100.0, at(0));
        assert!(ema.is_initialized());

        ema.reset();
        assert!(!ema.is_initialized());
        assert_eq!(ema.value(), None);
        assert_eq!(ema.last_update(), None);

        // First sample after reset initializes again.
        assert_eq!(ema.update(50.0, at(100)), 50.0);
    }

    #[test]
    fn test_engine_exposes_both_averages() {
        let mut engine = EmaEngine::from_interval_secs(5);
        assert_eq!(engine.price().interval(), TimeDelta::seconds(5));
        assert_eq!(engine.mid_price().interval(), TimeDelta::seconds(5));
        assert!(!engine.price().is_initialized());
        assert!(!engine.mid_price().is_initialized());

        engine.update_price(100.0, at(0));
        assert_eq!(engine.price().value(), Some(100.0));
        assert_eq!(engine.price().last_update(), Some(at(0)));
        // The mid-price stream has not seen a sample yet.
        assert!(!engine.mid_price().is_initialized());
    }

    #[test]
    fn test_engine_tracks_two_independent_averages() {
        let mut engine = EmaEngine::from_interval_secs(5);
        assert_eq!(engine.price_or_zero(), 0.0);
        assert_eq!(engine.mid_price_or_zero(), 0.0);

        engine.update_price(100.0, at(0));
        // Mid-price stream starts later; its gate is independent.
        engine.update_mid_price(50.0, at(3));

        engine.update_price(200.0, at(6));
        let mid = engine.update_mid_price(60.0, at(6));

        // Price gate passed (6s >= 5s), mid gate did not (3s < 5s).
        assert!((engine.price_or_zero() - 400.0 / 3.0).abs() < 1e-9);
        assert_eq!(mid, 50.0);
    }
}
