// ===============================
// src/positions.rs (ETF inventory ledger)
// ===============================

use crate::domain::Side;
use crate::metrics::{COMMITTED_EXPOSURE, FEES_TOTAL, POSITION};

/// Realized ETF position plus the volume still working in own orders.
///
/// The Future leg is not tracked: every fill is hedged one-for-one, so the
/// Future position mirrors this one by construction.
#[derive(Debug)]
pub struct PositionLedger {
    limit: i64,
    position: i64,
    committed_buy: i64,
    committed_sell: i64,
    fees: i64,
}

impl PositionLedger {
    pub fn new(limit: i64) -> Self {
        Self { limit, position: 0, committed_buy: 0, committed_sell: 0, fees: 0 }
    }

    pub fn position(&self) -> i64 { self.position }
    pub fn limit(&self) -> i64 { self.limit }
    pub fn fees(&self) -> i64 { self.fees }

    /// Net inventory implied by live orders (long minus short).
    pub fn committed_exposure(&self) -> i64 { self.committed_buy - self.committed_sell }

    pub fn committed(&self, side: Side) -> i64 {
        match side { Side::Buy => self.committed_buy, Side::Sell => self.committed_sell }
    }

    fn committed_mut(&mut self, side: Side) -> &mut i64 {
        match side { Side::Buy => &mut self.committed_buy, Side::Sell => &mut self.committed_sell }
    }

    pub fn commit(&mut self, side: Side, volume: i64) {
        *self.committed_mut(side) += volume;
        self.publish();
    }

    /// Unfilled remainder of an order that went terminal.
    pub fn release(&mut self, side: Side, volume: i64) {
        let c = self.committed_mut(side);
        *c = (*c - volume).max(0);
        self.publish();
    }

    pub fn apply_fill(&mut self, side: Side, volume: i64) {
        self.position += side.sign() * volume;
        let c = self.committed_mut(side);
        *c = (*c - volume).max(0);
        self.publish();
    }

    pub fn record_fees(&mut self, delta: i64) {
        self.fees += delta;
        FEES_TOTAL.set(self.fees);
    }

    /// Distance from the realized position to the limit on `side`.
    pub fn headroom(&self, side: Side) -> i64 {
        let h = match side {
            Side::Buy => self.limit - self.position,
            Side::Sell => self.position + self.limit,
        };
        h.max(0)
    }

    /// Volume that can still be added on `side` with every live same-side
    /// order filling in full and the position staying inside the limit.
    pub fn worst_case_headroom(&self, side: Side) -> i64 {
        let h = match side {
            Side::Buy => self.limit - (self.position + self.committed(Side::Buy)),
            Side::Sell => (self.position - self.committed(Side::Sell)) + self.limit,
        };
        h.max(0)
    }

    fn publish(&self) {
        POSITION.set(self.position);
        COMMITTED_EXPOSURE.set(self.committed_exposure());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_move_position_and_consume_commitment() {
        let mut l = PositionLedger::new(100);
        l.commit(Side::Buy, 20);
        assert_eq!(l.committed_exposure(), 20);

        l.apply_fill(Side::Buy, 5);
        assert_eq!(l.position(), 5);
        assert_eq!(l.committed(Side::Buy), 15);

        l.release(Side::Buy, 15);
        assert_eq!(l.committed_exposure(), 0);
        assert_eq!(l.position(), 5);
    }

    #[test]
    fn sell_fills_go_short() {
        let mut l = PositionLedger::new(100);
        l.commit(Side::Sell, 30);
        l.apply_fill(Side::Sell, 30);
        assert_eq!(l.position(), -30);
        assert_eq!(l.committed_exposure(), 0);
    }

    #[test]
    fn headroom_is_distance_to_limit_when_nothing_is_live() {
        let mut l = PositionLedger::new(100);
        l.apply_fill(Side::Buy, 95);
        assert_eq!(l.headroom(Side::Buy), 5);
        assert_eq!(l.headroom(Side::Sell), 195);
    }

    #[test]
    fn worst_case_headroom_counts_live_same_side_orders() {
        let mut l = PositionLedger::new(100);
        l.apply_fill(Side::Buy, 80);
        l.commit(Side::Buy, 15);
        assert_eq!(l.worst_case_headroom(Side::Buy), 5);
        // realized headroom ignores what is still working
        assert_eq!(l.headroom(Side::Buy), 20);
        l.commit(Side::Buy, 10);
        assert_eq!(l.worst_case_headroom(Side::Buy), 0);
        // the other side is unaffected
        assert_eq!(l.worst_case_headroom(Side::Sell), 180);
    }

    #[test]
    fn fees_accumulate() {
        let mut l = PositionLedger::new(100);
        l.record_fees(3);
        l.record_fees(-5);
        assert_eq!(l.fees(), -2);
    }
}
