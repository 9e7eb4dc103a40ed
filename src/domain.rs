// ===============================
// src/domain.rs
// ===============================
use serde::{Deserialize, Serialize};

pub type OrderId = u64;

/// Depth reported per side in book and trade-tick messages.
pub const TOP_LEVELS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side { Buy, Sell }
impl Side {
    pub fn sign(&self) -> i64 { match self { Side::Buy => 1, Side::Sell => -1 } }
    pub fn opposite(&self) -> Side { match self { Side::Buy => Side::Sell, Side::Sell => Side::Buy } }
}

/// The ETF is quoted; the Future is the reference leg and the hedge venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument { Future, Etf }
impl Instrument {
    pub fn label(&self) -> &'static str { match self { Instrument::Future => "future", Instrument::Etf => "etf" } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifespan { FillAndKill, GoodForDay }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevels {
    pub instrument: Instrument,
    pub seq: u64,
    pub ask_prices: [i64; TOP_LEVELS],
    pub ask_volumes: [i64; TOP_LEVELS],
    pub bid_prices: [i64; TOP_LEVELS],
    pub bid_volumes: [i64; TOP_LEVELS],
}
impl BookLevels {
    /// Book with a single populated level; deeper levels are zero like an exchange reports them.
    pub fn top(instrument: Instrument, seq: u64, bid: i64, ask: i64, volume: i64) -> Self {
        let mut lv = Self {
            instrument,
            seq,
            ask_prices: [0; TOP_LEVELS],
            ask_volumes: [0; TOP_LEVELS],
            bid_prices: [0; TOP_LEVELS],
            bid_volumes: [0; TOP_LEVELS],
        };
        lv.ask_prices[0] = ask;
        lv.ask_volumes[0] = volume;
        lv.bid_prices[0] = bid;
        lv.bid_volumes[0] = volume;
        lv
    }
    pub fn best_bid(&self) -> i64 { self.bid_prices[0] }
    pub fn best_ask(&self) -> i64 { self.ask_prices[0] }
}

/// Everything the exchange side can tell the trader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    OrderFilled { id: OrderId, price: i64, volume: i64 },
    OrderStatus { id: OrderId, filled: i64, remaining: i64, fees: i64 },
    /// `id == 0` when the error is not tied to an order.
    Error { id: OrderId, message: String },
    TradeTicks(BookLevels),
    OrderBookUpdate(BookLevels),
    HedgeFilled { id: OrderId, price: i64, volume: i64 },
}

/// Everything the trader can ask of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    InsertOrder { id: OrderId, side: Side, price: i64, volume: i64, lifespan: Lifespan },
    CancelOrder { id: OrderId },
    HedgeOrder { id: OrderId, side: Side, price: i64, volume: i64 },
    AmendOrder { id: OrderId, volume: i64 },
}
impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::InsertOrder { .. } => "insert",
            Command::CancelOrder { .. } => "cancel",
            Command::HedgeOrder { .. } => "hedge",
            Command::AmendOrder { .. } => "amend",
        }
    }
}

/// Recorder line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event { In(ExchangeEvent), Out(Command), Note(String) }
