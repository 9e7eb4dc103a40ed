// ===============================
// src/hedge.rs (offset every ETF fill in the Future)
// ===============================
use tracing::info;

use crate::config::TraderCfg;
use crate::domain::{Command, OrderId, Side};
use crate::metrics::{FILLS, HEDGES};
use crate::orders::OrderTracker;
use crate::positions::PositionLedger;

/// Hedges are priced at the far end of the allowed range so they cross
/// whatever liquidity rests in the Future book.
#[derive(Debug, Clone)]
pub struct HedgingEngine {
    bid_price: i64,
    ask_price: i64,
}

impl HedgingEngine {
    pub fn new(cfg: &TraderCfg) -> Self {
        Self { bid_price: cfg.hedge_bid_price, ask_price: cfg.hedge_ask_price }
    }

    /// Price that guarantees a fill for a hedge on `side`.
    pub fn aggressive_price(&self, side: Side) -> i64 {
        match side { Side::Sell => self.bid_price, Side::Buy => self.ask_price }
    }

    /// Books the fill and returns the single hedge for it; `None` if the id is not a tracked quote.
    pub fn on_order_filled(
        &self,
        id: OrderId,
        price: i64,
        volume: i64,
        orders: &mut OrderTracker,
        ledger: &mut PositionLedger,
    ) -> Option<Command> {
        let side = orders.on_fill(id, volume)?;
        ledger.apply_fill(side, volume);
        FILLS.with_label_values(&[side_label(side)]).inc();

        let hedge_side = side.opposite();
        let cmd = orders.hedge(hedge_side, self.aggressive_price(hedge_side), volume);
        HEDGES.inc();
        info!(id, price, volume, ?side, position = ledger.position(), ?cmd, "fill hedged");
        Some(cmd)
    }
}

fn side_label(side: Side) -> &'static str {
    match side { Side::Buy => "buy", Side::Sell => "sell" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_ASK_NEAREST_TICK, MIN_BID_NEAREST_TICK};
    use crate::domain::Lifespan;

    fn setup() -> (HedgingEngine, OrderTracker, PositionLedger) {
        (HedgingEngine::new(&TraderCfg::default()), OrderTracker::new(), PositionLedger::new(100))
    }

    #[test]
    fn bid_fill_hedged_with_aggressive_sell() {
        let (h, mut t, mut l) = setup();
        t.place(Side::Buy, 10_000, 20, Lifespan::GoodForDay).unwrap();
        let cmd = h.on_order_filled(1, 10_000, 7, &mut t, &mut l).unwrap();
        assert_eq!(cmd, Command::HedgeOrder { id: 2, side: Side::Sell, price: MIN_BID_NEAREST_TICK, volume: 7 });
        assert_eq!(l.position(), 7);
    }

    #[test]
    fn ask_fill_hedged_with_aggressive_buy() {
        let (h, mut t, mut l) = setup();
        t.place(Side::Sell, 10_100, 10, Lifespan::GoodForDay).unwrap();
        let cmd = h.on_order_filled(1, 10_100, 10, &mut t, &mut l).unwrap();
        assert_eq!(cmd, Command::HedgeOrder { id: 2, side: Side::Buy, price: MAX_ASK_NEAREST_TICK, volume: 10 });
        assert_eq!(l.position(), -10);
    }

    #[test]
    fn one_hedge_per_fill() {
        let (h, mut t, mut l) = setup();
        t.place(Side::Buy, 10_000, 20, Lifespan::GoodForDay).unwrap();
        let a = h.on_order_filled(1, 10_000, 5, &mut t, &mut l).unwrap();
        let b = h.on_order_filled(1, 10_000, 15, &mut t, &mut l).unwrap();
        assert!(matches!(a, Command::HedgeOrder { volume: 5, .. }));
        assert!(matches!(b, Command::HedgeOrder { volume: 15, .. }));
        assert_eq!(l.position(), 20);
    }

    #[test]
    fn unknown_fill_is_ignored() {
        let (h, mut t, mut l) = setup();
        assert_eq!(h.on_order_filled(42, 10_000, 5, &mut t, &mut l), None);
        assert_eq!(l.position(), 0);
    }
}
