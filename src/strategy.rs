// ===============================
// src/strategy.rs (ETF quoting decision)
// ===============================
//
// On every ETF book update, once the Future has reported for the same tick:
//   1) divergence of the two midpoints -> direction + multiplier
//   2) cancel whatever quote rests (reprice = cancel + reinsert, no amend)
//   3) quote one side: sell a rich ETF at the ask, buy a cheap ETF at the bid,
//      LOT * multiplier lots, shrunk to the room left under the limit
//

use tracing::{debug, warn};

use crate::config::{PricingMode, TraderCfg};
use crate::domain::{BookLevels, Command, Instrument, Side};
use crate::metrics::{DEFERRED, MULTIPLIER};
use crate::orders::OrderTracker;
use crate::positions::PositionLedger;
use crate::prices::{PriceHistory, Snapshot};
use crate::risk;
use crate::signal::Divergence;

#[derive(Debug, Clone)]
pub struct QuotingEngine {
    cfg: TraderCfg,
}

impl QuotingEngine {
    pub fn new(cfg: TraderCfg) -> Self { Self { cfg } }

    /// Decision for one ETF update; the update must already be in `prices`.
    pub fn on_book_update(
        &self,
        book: &BookLevels,
        prices: &PriceHistory,
        ledger: &mut PositionLedger,
        orders: &mut OrderTracker,
    ) -> Vec<Command> {
        if book.instrument != Instrument::Etf {
            return Vec::new();
        }
        if !prices.is_synchronized() {
            DEFERRED.with_label_values(&["unsynchronized"]).inc();
            debug!(
                etf = prices.len(Instrument::Etf),
                future = prices.len(Instrument::Future),
                "waiting for both instruments"
            );
            return Vec::new();
        }
        let (Some(etf), Some(fut)) = (prices.latest(Instrument::Etf), prices.latest(Instrument::Future)) else {
            return Vec::new();
        };
        if [etf.bid, etf.ask, fut.bid, fut.ask].contains(&0) {
            DEFERRED.with_label_values(&["empty_book"]).inc();
            debug!(?etf, ?fut, "book side empty, no signal");
            return Vec::new();
        }

        let div = Divergence::compute(etf.midpoint(), fut.midpoint(), self.cfg.tick_size);
        MULTIPLIER.set(div.multiplier);
        let (should_sell, should_buy) =
            div.decide(self.cfg.signal_mode, ledger.committed_exposure(), ledger.limit());

        let mut out = Vec::with_capacity(4);
        out.extend(orders.cancel(Side::Sell));
        out.extend(orders.cancel(Side::Buy));

        if should_sell {
            out.extend(self.quote(Side::Sell, div.multiplier, self.price(Side::Sell, book, etf), ledger, orders));
        }
        if should_buy {
            out.extend(self.quote(Side::Buy, div.multiplier, self.price(Side::Buy, book, etf), ledger, orders));
        }
        debug!(
            gap = div.gap,
            multiplier = div.multiplier,
            direction = ?div.direction,
            bid = ?orders.working(Side::Buy),
            ask = ?orders.working(Side::Sell),
            commands = out.len(),
            "quote decision"
        );
        out
    }

    fn price(&self, side: Side, book: &BookLevels, recorded: Snapshot) -> i64 {
        match (self.cfg.pricing_mode, side) {
            (PricingMode::BestOfBook, Side::Sell) => book.best_ask(),
            (PricingMode::BestOfBook, Side::Buy) => book.best_bid(),
            (PricingMode::LastRecorded, Side::Sell) => recorded.ask,
            (PricingMode::LastRecorded, Side::Buy) => recorded.bid,
        }
    }

    fn quote(
        &self,
        side: Side,
        multiplier: i64,
        price: i64,
        ledger: &mut PositionLedger,
        orders: &mut OrderTracker,
    ) -> Option<Command> {
        let volume = match risk::check(side, multiplier, ledger, &self.cfg) {
            Ok(v) => v,
            Err(e) => {
                debug!(%e, "no quote");
                return None;
            }
        };
        match orders.place(side, price, volume, self.cfg.lifespan) {
            Ok(cmd) => {
                ledger.commit(side, volume);
                Some(cmd)
            }
            Err(e) => {
                warn!(%e, "quote not placed");
                None
            }
        }
    }
}
