// ===============================
// src/gateway.rs (mock exchange)
// ===============================
//
// Plays the exchange for the engine:
// - InsertOrder -> status ack (remaining = volume); FAK orders die at once
// - timer       -> each resting order fills with probability p (part or all),
//                  reported as OrderFilled followed by OrderStatus
// - CancelOrder -> final status (remaining 0), or an error if already gone
// - AmendOrder  -> volume reduced, status sent
// - HedgeOrder  -> filled in full against the current Future top
//
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::domain::{Command, ExchangeEvent, Lifespan, OrderId, Side};
use crate::feed::FutureTop;

/// Maker rebate in basis points of notional, reported as negative fees.
const MAKER_REBATE_BPS: i64 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum GatewayCfgError {
    #[error("fill probability must be within [0, 1], got {0}")]
    FillProbability(f64),
    #[error("fill interval must be positive")]
    ZeroInterval,
}

#[derive(Debug, Clone)]
pub struct GatewayCfg {
    fill_probability: f64,
    fill_every: Duration,
    seed: Option<u64>,
}

impl GatewayCfg {
    pub fn new(fill_probability: f64, fill_every: Duration, seed: Option<u64>) -> Result<Self, GatewayCfgError> {
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&fill_probability) {
            return Err(GatewayCfgError::FillProbability(fill_probability));
        }
        if fill_every.is_zero() {
            return Err(GatewayCfgError::ZeroInterval);
        }
        Ok(Self { fill_probability, fill_every, seed })
    }
}

#[derive(Debug)]
struct Resting { price: i64, volume: i64, filled: i64, fees: i64 }
impl Resting {
    fn remaining(&self) -> i64 { self.volume - self.filled }
}

pub struct MockExchange {
    resting: BTreeMap<OrderId, Resting>,
    rng: StdRng,
    fill_probability: f64,
}

impl MockExchange {
    fn new(fill_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed { Some(s) => StdRng::seed_from_u64(s), None => StdRng::from_entropy() };
        Self { resting: BTreeMap::new(), rng, fill_probability }
    }

    pub fn from_cfg(cfg: &GatewayCfg) -> Self { Self::new(cfg.fill_probability, cfg.seed) }

    pub fn resting_count(&self) -> usize { self.resting.len() }

    fn status(id: OrderId, r: &Resting) -> ExchangeEvent {
        ExchangeEvent::OrderStatus { id, filled: r.filled, remaining: r.remaining(), fees: r.fees }
    }

    pub fn on_command(&mut self, cmd: Command, future_top: FutureTop) -> Vec<ExchangeEvent> {
        match cmd {
            Command::InsertOrder { id, price, volume, lifespan, .. } => {
                if volume <= 0 || price <= 0 || self.resting.contains_key(&id) {
                    return vec![ExchangeEvent::Error { id, message: "invalid order".into() }];
                }
                let r = Resting { price, volume, filled: 0, fees: 0 };
                let mut out = vec![Self::status(id, &r)];
                if lifespan == Lifespan::FillAndKill {
                    out.push(ExchangeEvent::OrderStatus { id, filled: 0, remaining: 0, fees: 0 });
                } else {
                    self.resting.insert(id, r);
                }
                out
            }
            Command::CancelOrder { id } => match self.resting.remove(&id) {
                Some(r) => vec![ExchangeEvent::OrderStatus { id, filled: r.filled, remaining: 0, fees: r.fees }],
                None => vec![ExchangeEvent::Error { id, message: "out-of-date order".into() }],
            },
            Command::AmendOrder { id, volume } => {
                let Some(r) = self.resting.get_mut(&id) else {
                    return vec![ExchangeEvent::Error { id, message: "out-of-date order".into() }];
                };
                if volume > r.volume || volume < r.filled {
                    return vec![ExchangeEvent::Error { id, message: "invalid amend".into() }];
                }
                r.volume = volume;
                let ev = Self::status(id, r);
                if r.remaining() == 0 {
                    self.resting.remove(&id);
                }
                vec![ev]
            }
            Command::HedgeOrder { id, side, price, volume } => {
                // crosses the Future book; falls back to the limit when no book yet
                let px = match (side, future_top) {
                    (Side::Buy, Some((_, ask))) => ask,
                    (Side::Sell, Some((bid, _))) => bid,
                    (_, None) => price,
                };
                vec![ExchangeEvent::HedgeFilled { id, price: px, volume }]
            }
        }
    }

    /// Random fills for resting orders.
    pub fn on_timer(&mut self) -> Vec<ExchangeEvent> {
        let mut out = Vec::new();
        let mut done = Vec::new();
        for (&id, r) in self.resting.iter_mut() {
            if !self.rng.gen_bool(self.fill_probability) {
                continue;
            }
            let qty = self.rng.gen_range(1..=r.remaining());
            r.filled += qty;
            r.fees -= r.price * qty * MAKER_REBATE_BPS / 10_000;
            out.push(ExchangeEvent::OrderFilled { id, price: r.price, volume: qty });
            out.push(Self::status(id, r));
            if r.remaining() == 0 {
                done.push(id);
            }
        }
        for id in done {
            self.resting.remove(&id);
        }
        out
    }
}

pub async fn run_mock(
    mut cmd_rx: mpsc::Receiver<Command>,
    ev_tx: mpsc::Sender<ExchangeEvent>,
    future_rx: watch::Receiver<FutureTop>,
    cfg: GatewayCfg,
) {
    let mut exch = MockExchange::from_cfg(&cfg);
    let mut tick = interval(cfg.fill_every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(p = cfg.fill_probability, every = ?cfg.fill_every, "gateway: mock exchange started");

    loop {
        let events = tokio::select! {
            maybe_cmd = cmd_rx.recv() => match maybe_cmd {
                Some(cmd) => {
                    let top = *future_rx.borrow();
                    exch.on_command(cmd, top)
                }
                None => {
                    info!(resting = exch.resting_count(), "gateway: command channel closed, stopped");
                    return;
                }
            },
            _ = tick.tick() => exch.on_timer(),
        };
        for ev in events {
            if ev_tx.send(ev).await.is_err() {
                warn!("gateway: event channel closed, stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(id: OrderId, side: Side, volume: i64) -> Command {
        Command::InsertOrder { id, side, price: 10_000, volume, lifespan: Lifespan::GoodForDay }
    }

    #[test]
    fn cfg_rejects_probabilities_outside_unit_range() {
        let every = Duration::from_millis(250);
        assert!(GatewayCfg::new(0.2, every, None).is_ok());
        assert!(GatewayCfg::new(1.0, every, Some(1)).is_ok());
        assert!(matches!(GatewayCfg::new(f64::NAN, every, None), Err(GatewayCfgError::FillProbability(p)) if p.is_nan()));
        assert_eq!(GatewayCfg::new(1.5, every, None).unwrap_err(), GatewayCfgError::FillProbability(1.5));
        assert_eq!(GatewayCfg::new(-0.1, every, None).unwrap_err(), GatewayCfgError::FillProbability(-0.1));
        assert_eq!(GatewayCfg::new(0.5, Duration::ZERO, None).unwrap_err(), GatewayCfgError::ZeroInterval);
    }

    #[test]
    fn cfg_drives_the_exchange() {
        let cfg = GatewayCfg::new(1.0, Duration::from_millis(10), Some(2)).unwrap();
        let mut x = MockExchange::from_cfg(&cfg);
        x.on_command(insert(1, Side::Buy, 10), None);
        assert!(!x.on_timer().is_empty());
    }

    #[test]
    fn insert_is_acknowledged() {
        let mut x = MockExchange::new(0.0, Some(1));
        let out = x.on_command(insert(1, Side::Buy, 10), None);
        assert_eq!(out, vec![ExchangeEvent::OrderStatus { id: 1, filled: 0, remaining: 10, fees: 0 }]);
        assert_eq!(x.resting_count(), 1);
        assert!(x.on_timer().is_empty());
    }

    #[test]
    fn cancel_confirms_or_errors() {
        let mut x = MockExchange::new(0.0, Some(1));
        x.on_command(insert(1, Side::Sell, 10), None);
        assert_eq!(
            x.on_command(Command::CancelOrder { id: 1 }, None),
            vec![ExchangeEvent::OrderStatus { id: 1, filled: 0, remaining: 0, fees: 0 }]
        );
        assert!(matches!(
            x.on_command(Command::CancelOrder { id: 1 }, None)[..],
            [ExchangeEvent::Error { id: 1, .. }]
        ));
    }

    #[test]
    fn certain_fills_drain_the_book() {
        let mut x = MockExchange::new(1.0, Some(5));
        x.on_command(insert(1, Side::Buy, 30), None);
        let mut filled = 0;
        for _ in 0..100 {
            for ev in x.on_timer() {
                if let ExchangeEvent::OrderFilled { volume, .. } = ev {
                    filled += volume;
                }
            }
        }
        assert_eq!(filled, 30);
        assert_eq!(x.resting_count(), 0);
    }

    #[test]
    fn fill_and_kill_never_rests() {
        let mut x = MockExchange::new(1.0, Some(1));
        let out = x.on_command(
            Command::InsertOrder { id: 3, side: Side::Buy, price: 100, volume: 5, lifespan: Lifespan::FillAndKill },
            None,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(x.resting_count(), 0);
    }

    #[test]
    fn hedge_fills_against_future_top() {
        let mut x = MockExchange::new(0.0, Some(1));
        let out = x.on_command(Command::HedgeOrder { id: 9, side: Side::Sell, price: 100, volume: 7 }, Some((9_900, 10_000)));
        assert_eq!(out, vec![ExchangeEvent::HedgeFilled { id: 9, price: 9_900, volume: 7 }]);
    }

    #[test]
    fn amend_reduces_volume() {
        let mut x = MockExchange::new(0.0, Some(1));
        x.on_command(insert(1, Side::Buy, 20), None);
        assert_eq!(
            x.on_command(Command::AmendOrder { id: 1, volume: 5 }, None),
            vec![ExchangeEvent::OrderStatus { id: 1, filled: 0, remaining: 5, fees: 0 }]
        );
        assert!(matches!(x.on_command(Command::AmendOrder { id: 1, volume: 50 }, None)[..], [ExchangeEvent::Error { .. }]));
    }
}
