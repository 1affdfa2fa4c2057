//! Indicator math over close prices.
//!
//! Small, dependency-free implementations over `Decimal` closes. Inputs are
//! oldest-first, as the venue returns klines.

use rust_decimal::Decimal;

/// Exponential moving average of the full series with the given period.
/// Returns `None` when the series is shorter than the period.
#[must_use]
pub fn ema(closes: &[Decimal], period: usize) -> Option<Decimal> {
    ema_series(closes, period)?.last().copied()
}

fn ema_series(closes: &[Decimal], period: usize) -> Option<Vec<Decimal>> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let period_dec = Decimal::from(period as u64);
    let multiplier = Decimal::TWO / (period_dec + Decimal::ONE);

    // Seed with the SMA of the first `period` closes.
    let seed: Decimal = closes[..period].iter().copied().sum::<Decimal>() / period_dec;
    let mut series = Vec::with_capacity(closes.len() - period + 1);
    series.push(seed);
    let mut current = seed;
    for close in &closes[period..] {
        current = (*close - current) * multiplier + current;
        series.push(current);
    }
    Some(series)
}

/// Relative strength index over the last `period` deltas.
#[must_use]
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() <= period {
        return None;
    }

    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    let start = closes.len() - period - 1;
    for window in closes[start..].windows(2) {
        let delta = window[1] - window[0];
        if delta >= Decimal::ZERO {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    if losses.is_zero() {
        return Some(Decimal::ONE_HUNDRED);
    }
    let rs = gains / losses;
    Some(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}

/// MACD line: EMA(12) - EMA(26).
#[must_use]
pub fn macd(closes: &[Decimal]) -> Option<Decimal> {
    Some(ema(closes, 12)? - ema(closes, 26)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn closes(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let series = closes(&[100; 30]);
        assert_eq!(ema(&series, 20).unwrap(), dec!(100));
    }

    #[test]
    fn ema_needs_enough_data() {
        assert!(ema(&closes(&[1, 2, 3]), 20).is_none());
    }

    #[test]
    fn rsi_of_pure_uptrend_is_100() {
        let series = closes(&(1..=20).collect::<Vec<_>>());
        assert_eq!(rsi(&series, 14).unwrap(), dec!(100));
    }

    #[test]
    fn rsi_of_balanced_moves_is_50() {
        // Alternating +1/-1 deltas over the window.
        let mut series = vec![dec!(100)];
        for i in 0..20 {
            let last = *series.last().unwrap();
            series.push(if i % 2 == 0 { last + Decimal::ONE } else { last - Decimal::ONE });
        }
        assert_eq!(rsi(&series, 14).unwrap(), dec!(50));
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let series = closes(&[100; 40]);
        assert_eq!(macd(&series).unwrap(), dec!(0));
    }

    #[test]
    fn macd_needs_26_closes() {
        assert!(macd(&closes(&[100; 25])).is_none());
    }
}
