// ===============================
// src/feed.rs
// ===============================
//
// Mock market data for the ETF/Future pair:
// - the Future follows a random walk on the tick grid
// - the ETF tracks it with a mean-reverting premium, so midpoints diverge
//   and converge again
// - every tick publishes the Future book first, then the ETF book, with the
//   same sequence number; every `TRADE_TICK_EVERY` ticks a TradeTicks follows
//
// Prices are integer cents on a 100-cent grid.
//

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::TICK_SIZE_IN_CENTS;
use crate::domain::{BookLevels, ExchangeEvent, Instrument};

const TRADE_TICK_EVERY: u64 = 10;
const START_PX: i64 = 10_000;

/// Top of the Future book, read by the mock gateway to price hedge fills.
pub type FutureTop = Option<(i64, i64)>;

pub struct PairWalk {
    rng: StdRng,
    seq: u64,
    future_mid: i64,
    premium: i64,
}

impl PairWalk {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed { Some(s) => StdRng::seed_from_u64(s), None => StdRng::from_entropy() };
        Self { rng, seq: 0, future_mid: START_PX, premium: 0 }
    }

    fn book(&mut self, instrument: Instrument, mid: i64) -> BookLevels {
        let t = TICK_SIZE_IN_CENTS;
        let bid = (mid / t) * t;
        let mut lv = BookLevels::top(instrument, self.seq, bid, bid + t, 0);
        for i in 0..lv.bid_prices.len() {
            let depth = i as i64;
            lv.bid_prices[i] = (bid - depth * t).max(t);
            lv.ask_prices[i] = bid + (depth + 1) * t;
            lv.bid_volumes[i] = self.rng.gen_range(10..=200);
            lv.ask_volumes[i] = self.rng.gen_range(10..=200);
        }
        lv
    }

    /// One tick: `[Future, ETF]` books, plus trade ticks every few ticks.
    pub fn step(&mut self) -> Vec<ExchangeEvent> {
        self.seq += 1;
        let t = TICK_SIZE_IN_CENTS;
        self.future_mid = (self.future_mid + self.rng.gen_range(-1..=1) * t).max(10 * t);
        // premium pulled back towards zero
        self.premium = self.premium * 3 / 4 + self.rng.gen_range(-2..=2) * t / 2;

        let fut = self.book(Instrument::Future, self.future_mid);
        let etf = self.book(Instrument::Etf, self.future_mid + self.premium);
        let mut out = vec![ExchangeEvent::OrderBookUpdate(fut), ExchangeEvent::OrderBookUpdate(etf.clone())];
        if self.seq % TRADE_TICK_EVERY == 0 {
            out.push(ExchangeEvent::TradeTicks(etf));
        }
        out
    }
}

pub async fn run_mock(
    ev_tx: mpsc::Sender<ExchangeEvent>,
    future_tx: watch::Sender<FutureTop>,
    every: Duration,
    seed: Option<u64>,
) {
    let mut walk = PairWalk::new(seed);
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(?every, "feed: mock pair started");
    loop {
        tick.tick().await;
        for ev in walk.step() {
            if let ExchangeEvent::OrderBookUpdate(b) = &ev {
                if b.instrument == Instrument::Future {
                    let _ = future_tx.send(Some((b.best_bid(), b.best_ask())));
                }
            }
            if ev_tx.send(ev).await.is_err() {
                warn!("feed: event channel closed, stopped");
                return;
            }
        }
    }
}
