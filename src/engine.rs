// ===============================
// src/engine.rs (trader state + serial event loop)
// ===============================
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::TraderCfg;
use crate::domain::{BookLevels, Command, Event, ExchangeEvent, OrderId};
use crate::hedge::HedgingEngine;
use crate::metrics::{BOOK_UPDATES, COMMANDS, ERRORS, EVENTS, HANDLE_US, HEDGE_FILLS, TRADE_TICKS};
use crate::orders::{OrderError, OrderTracker, StatusUpdate};
use crate::positions::PositionLedger;
use crate::prices::PriceHistory;
use crate::strategy::QuotingEngine;

/// All mutable trading state. Events must be fed one at a time.
#[derive(Debug)]
pub struct AutoTrader {
    prices: PriceHistory,
    ledger: PositionLedger,
    orders: OrderTracker,
    quoting: QuotingEngine,
    hedging: HedgingEngine,
}

impl AutoTrader {
    pub fn new(cfg: TraderCfg) -> Self {
        Self {
            prices: PriceHistory::new(),
            ledger: PositionLedger::new(cfg.position_limit),
            orders: OrderTracker::new(),
            hedging: HedgingEngine::new(&cfg),
            quoting: QuotingEngine::new(cfg),
        }
    }

    pub fn ledger(&self) -> &PositionLedger { &self.ledger }
    pub fn orders(&self) -> &OrderTracker { &self.orders }
    pub fn prices(&self) -> &PriceHistory { &self.prices }

    pub fn handle(&mut self, ev: &ExchangeEvent) -> Vec<Command> {
        match ev {
            ExchangeEvent::OrderBookUpdate(book) => self.on_order_book_update(book),
            ExchangeEvent::TradeTicks(book) => {
                TRADE_TICKS.with_label_values(&[book.instrument.label()]).inc();
                debug!(instrument = book.instrument.label(), seq = book.seq, "trade ticks");
                Vec::new()
            }
            ExchangeEvent::OrderFilled { id, price, volume } => self.on_order_filled(*id, *price, *volume),
            ExchangeEvent::OrderStatus { id, filled, remaining, fees } => {
                self.on_order_status(*id, *filled, *remaining, *fees);
                Vec::new()
            }
            ExchangeEvent::Error { id, message } => {
                self.on_error(*id, message);
                Vec::new()
            }
            ExchangeEvent::HedgeFilled { id, price, volume } => {
                HEDGE_FILLS.inc();
                if !self.orders.on_hedge_filled(*id, *volume) {
                    warn!(id, "hedge fill for unknown id");
                }
                info!(id, price, volume, in_flight = self.orders.hedge_count(), "hedge filled");
                Vec::new()
            }
        }
    }

    /// Shrinks a live quote; the volume taken off leaves committed exposure at once.
    #[allow(dead_code)]
    pub fn amend(&mut self, id: OrderId, volume: i64) -> Result<Command, OrderError> {
        let (cmd, up) = self.orders.amend(id, volume)?;
        self.settle(up);
        Ok(cmd)
    }

    fn on_order_book_update(&mut self, book: &BookLevels) -> Vec<Command> {
        BOOK_UPDATES.with_label_values(&[book.instrument.label()]).inc();
        if !self.prices.record_snapshot(book.instrument, book.seq, book.best_bid(), book.best_ask()) {
            return Vec::new();
        }
        debug!(
            instrument = book.instrument.label(),
            seq = book.seq,
            mid = ?self.prices.latest_midpoint(book.instrument),
            "book"
        );
        self.quoting.on_book_update(book, &self.prices, &mut self.ledger, &mut self.orders)
    }

    fn on_order_filled(&mut self, id: OrderId, price: i64, volume: i64) -> Vec<Command> {
        debug!(id, price, volume, limit = ?self.orders.get(id).map(|o| o.price), "order filled");
        match self.hedging.on_order_filled(id, price, volume, &mut self.orders, &mut self.ledger) {
            Some(cmd) => vec![cmd],
            None => {
                debug!(id, volume, "fill for untracked order");
                Vec::new()
            }
        }
    }

    fn on_order_status(&mut self, id: OrderId, filled: i64, remaining: i64, fees: i64) {
        // late or repeated status for a settled id lands here as None
        let Some(up) = self.orders.on_status(id, filled, remaining, fees) else { return };
        self.settle(up);
    }

    fn on_error(&mut self, id: OrderId, message: &str) {
        if id == 0 {
            ERRORS.with_label_values(&["general"]).inc();
            warn!(%message, "exchange error");
            return;
        }
        ERRORS.with_label_values(&["order"]).inc();
        warn!(id, %message, "order error");
        if let Some(up) = self.orders.on_error(id) {
            self.settle(up);
        }
    }

    fn settle(&mut self, up: StatusUpdate) {
        self.ledger.record_fees(up.fee_delta);
        if up.released > 0 {
            self.ledger.release(up.side, up.released);
        }
        if up.status.is_terminal() {
            info!(
                id = up.id,
                side = ?up.side,
                status = ?up.status,
                released = up.released,
                live = self.orders.live_count(up.side),
                position = self.ledger.position(),
                committed = self.ledger.committed_exposure(),
                "order closed"
            );
        }
    }
}

/// Single consumer of the event queue; nothing else touches the trader.
pub async fn run(
    mut events_rx: mpsc::Receiver<ExchangeEvent>,
    cmd_tx: mpsc::Sender<Command>,
    rec_tx: Option<mpsc::Sender<Event>>,
    mut trader: AutoTrader,
) -> AutoTrader {
    info!("engine: started");
    if let Some(rec) = &rec_tx {
        let _ = rec.try_send(Event::Note("engine started".into()));
    }
    while let Some(ev) = events_rx.recv().await {
        EVENTS.inc();
        let started = Instant::now();
        let cmds = trader.handle(&ev);
        HANDLE_US.observe(started.elapsed().as_secs_f64() * 1e6);

        if let Some(rec) = &rec_tx {
            let _ = rec.try_send(Event::In(ev));
        }
        for cmd in cmds {
            COMMANDS.with_label_values(&[cmd.kind()]).inc();
            if let Some(rec) = &rec_tx {
                let _ = rec.try_send(Event::Out(cmd.clone()));
            }
            if let Err(e) = cmd_tx.send(cmd).await {
                error!(?e, "command channel closed");
                return trader;
            }
        }
    }
    info!(position = trader.ledger.position(), "engine: event channel closed, stopped");
    trader
}
