// ===============================
// src/signal.rs (ETF vs Future divergence)
// ===============================
//
// gap        = mid(ETF) - mid(Future)
// multiplier = |gap| / tick + 1          (always >= 1)
//
// No smoothing: any non-zero gap is a signal.
//

use crate::config::SignalMode;

/// Ratio spread that counts as one unit in the inventory-adjusted rule.
pub const ADJUSTED_SPREAD_UNIT: f64 = 0.003546;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// ETF rich against the Future: sell the ETF.
    Overpriced,
    /// ETF cheap against the Future: buy the ETF.
    Underpriced,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    pub primary_mid: i64,
    pub reference_mid: i64,
    pub gap: i64,
    pub direction: Direction,
    pub multiplier: i64,
}

impl Divergence {
    pub fn compute(primary_mid: i64, reference_mid: i64, tick: i64) -> Self {
        let gap = primary_mid - reference_mid;
        let direction = match gap.signum() {
            1 => Direction::Overpriced,
            -1 => Direction::Underpriced,
            _ => Direction::Balanced,
        };
        Self { primary_mid, reference_mid, gap, direction, multiplier: gap.abs() / tick + 1 }
    }

    /// `(mid_etf / mid_future - 1)` measured in `ADJUSTED_SPREAD_UNIT`s.
    fn ratio_units(&self) -> Option<f64> {
        if self.reference_mid == 0 {
            return None;
        }
        Some((self.primary_mid as f64 / self.reference_mid as f64 - 1.0) / ADJUSTED_SPREAD_UNIT)
    }

    /// `(should_sell, should_buy)` for the configured rule.
    pub fn decide(&self, mode: SignalMode, committed: i64, limit: i64) -> (bool, bool) {
        let sell = self.direction == Direction::Overpriced;
        let buy = self.direction == Direction::Underpriced;
        match mode {
            SignalMode::Simple => (sell, buy),
            SignalMode::InventoryAdjusted => {
                let Some(r) = self.ratio_units() else { return (sell, buy) };
                let c = committed as f64 / limit as f64;
                let long_skew = committed >= 0 && r > 1.0 - c;
                let short_skew = committed < 0 && r < -1.0 - c;
                (sell || long_skew, buy || short_skew)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_grows_with_gap() {
        let d = Divergence::compute(10_100, 10_000, 100);
        assert_eq!(d.direction, Direction::Overpriced);
        assert_eq!(d.gap, 100);
        assert_eq!(d.multiplier, 2);

        let d = Divergence::compute(10_000, 10_099, 100);
        assert_eq!(d.direction, Direction::Underpriced);
        assert_eq!(d.multiplier, 1);

        let d = Divergence::compute(10_000, 10_350, 100);
        assert_eq!(d.multiplier, 4);
    }

    #[test]
    fn equal_midpoints_are_balanced() {
        let d = Divergence::compute(10_000, 10_000, 100);
        assert_eq!(d.direction, Direction::Balanced);
        assert_eq!(d.multiplier, 1);
        assert_eq!(d.decide(SignalMode::Simple, 0, 100), (false, false));
    }

    #[test]
    fn simple_rule_follows_direction() {
        let d = Divergence::compute(10_001, 10_000, 100);
        assert_eq!(d.decide(SignalMode::Simple, 0, 100), (true, false));
        let d = Divergence::compute(9_999, 10_000, 100);
        assert_eq!(d.decide(SignalMode::Simple, 0, 100), (false, true));
    }

    #[test]
    fn adjusted_rule_sells_balanced_book_when_heavily_committed_long() {
        let d = Divergence::compute(10_000, 10_000, 100);
        // ratio 0 > 1 - 150/100
        assert_eq!(d.decide(SignalMode::InventoryAdjusted, 150, 100), (true, false));
        assert_eq!(d.decide(SignalMode::InventoryAdjusted, 50, 100), (false, false));
        // ratio 0 < -1 + 150/100
        assert_eq!(d.decide(SignalMode::InventoryAdjusted, -150, 100), (false, true));
    }
}
