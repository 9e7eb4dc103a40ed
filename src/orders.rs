// ===============================
// src/orders.rs (own-order tracker)
// ===============================
//
// One quote slot per side:
//
//   Empty --place--> Working(id) --cancel--> CancelPending(id) --status(rem=0)--> Empty
//                        |                                 \
//                        +------------status(rem=0)---------+--> Empty
//
// A new quote may be placed while the previous one is still CancelPending;
// the old id stays in its side-set so a late fill is still attributed.
//

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use thiserror::Error;

use crate::domain::{Command, Lifespan, OrderId, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Working,
    PartiallyFilled,
    CancelPending,
    Filled,
    Cancelled,
    Errored,
}
impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Errored)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: i64,
    pub volume: i64,
    pub filled: i64,
    pub remaining: i64,
    pub fees: i64,
    pub lifespan: Lifespan,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Empty,
    Working(OrderId),
    CancelPending(OrderId),
}

/// What a status (or error) message did to a tracked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: OrderId,
    pub side: Side,
    pub status: OrderStatus,
    /// Change in the order's cumulative fees.
    pub fee_delta: i64,
    /// Volume no longer able to fill: the unfilled remainder of a terminal
    /// order, or what an amend took off a live one.
    pub released: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("{0:?} slot already holds working order {1}")]
    SlotBusy(Side, OrderId),
    #[error("volume must be positive, got {0}")]
    BadVolume(i64),
    #[error("order {0} is not tracked")]
    Unknown(OrderId),
    #[error("amend of order {id} to {volume} lots not allowed (volume {current}, filled {filled})")]
    BadAmend { id: OrderId, volume: i64, current: i64, filled: i64 },
}

#[derive(Debug)]
pub struct OrderTracker {
    next_id: OrderId,
    bid_slot: Slot,
    ask_slot: Slot,
    orders: HashMap<OrderId, Order>,
    bids: HashSet<OrderId>,
    asks: HashSet<OrderId>,
    /// Hedge id -> volume still expected to fill.
    hedges: HashMap<OrderId, i64>,
}

impl Default for OrderTracker {
    fn default() -> Self { Self::new() }
}

impl OrderTracker {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            bid_slot: Slot::Empty,
            ask_slot: Slot::Empty,
            orders: HashMap::new(),
            bids: HashSet::new(),
            asks: HashSet::new(),
            hedges: HashMap::new(),
        }
    }

    /// Ids are shared by quotes and hedges and never reused.
    pub fn next_id(&mut self) -> OrderId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn slot(&self, side: Side) -> Slot {
        match side { Side::Buy => self.bid_slot, Side::Sell => self.ask_slot }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side { Side::Buy => &mut self.bid_slot, Side::Sell => &mut self.ask_slot }
    }

    fn side_set(&mut self, side: Side) -> &mut HashSet<OrderId> {
        match side { Side::Buy => &mut self.bids, Side::Sell => &mut self.asks }
    }

    pub fn working(&self, side: Side) -> Option<OrderId> {
        match self.slot(side) { Slot::Working(id) => Some(id), _ => None }
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> { self.orders.get(&id) }

    pub fn side_of(&self, id: OrderId) -> Option<Side> {
        if id == 0 {
            None
        } else if self.bids.contains(&id) {
            Some(Side::Buy)
        } else if self.asks.contains(&id) {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// Orders on `side` that can still trade (working or cancel-pending).
    pub fn live_count(&self, side: Side) -> usize {
        match side { Side::Buy => self.bids.len(), Side::Sell => self.asks.len() }
    }

    pub fn place(&mut self, side: Side, price: i64, volume: i64, lifespan: Lifespan) -> Result<Command, OrderError> {
        if let Slot::Working(id) = self.slot(side) {
            return Err(OrderError::SlotBusy(side, id));
        }
        if volume <= 0 {
            return Err(OrderError::BadVolume(volume));
        }
        let id = self.next_id();
        self.orders.insert(id, Order {
            id,
            side,
            price,
            volume,
            filled: 0,
            remaining: volume,
            fees: 0,
            lifespan,
            status: OrderStatus::Working,
        });
        self.side_set(side).insert(id);
        *self.slot_mut(side) = Slot::Working(id);
        Ok(Command::InsertOrder { id, side, price, volume, lifespan })
    }

    /// Local state is only cleared when the exchange confirms.
    pub fn cancel(&mut self, side: Side) -> Option<Command> {
        let Slot::Working(id) = self.slot(side) else { return None };
        if let Some(o) = self.orders.get_mut(&id) {
            o.status = OrderStatus::CancelPending;
        }
        *self.slot_mut(side) = Slot::CancelPending(id);
        Some(Command::CancelOrder { id })
    }

    /// Only reductions are accepted, and never below what already traded.
    /// The returned update carries the volume taken off the order so the
    /// caller can release it from committed exposure.
    pub fn amend(&mut self, id: OrderId, volume: i64) -> Result<(Command, StatusUpdate), OrderError> {
        let o = self.orders.get_mut(&id).ok_or(OrderError::Unknown(id))?;
        if volume > o.volume || volume < o.filled || o.status == OrderStatus::CancelPending {
            return Err(OrderError::BadAmend { id, volume, current: o.volume, filled: o.filled });
        }
        let released = o.volume - volume;
        o.volume = volume;
        o.remaining = volume - o.filled;
        let up = StatusUpdate { id, side: o.side, status: o.status, fee_delta: 0, released };
        Ok((Command::AmendOrder { id, volume }, up))
    }

    pub fn on_fill(&mut self, id: OrderId, volume: i64) -> Option<Side> {
        let side = self.side_of(id)?;
        if let Some(o) = self.orders.get_mut(&id) {
            o.filled += volume;
            o.remaining = (o.volume - o.filled).max(0);
            if o.status == OrderStatus::Working {
                o.status = OrderStatus::PartiallyFilled;
            }
        }
        Some(side)
    }

    pub fn on_status(&mut self, id: OrderId, filled: i64, remaining: i64, fees: i64) -> Option<StatusUpdate> {
        self.side_of(id)?;
        self.settle(id, filled, remaining, fees, None)
    }

    /// An error on a tracked order means the order is dead, whatever traded.
    pub fn on_error(&mut self, id: OrderId) -> Option<StatusUpdate> {
        self.side_of(id)?;
        let (filled, fees) = self.orders.get(&id).map(|o| (o.filled, o.fees)).unwrap_or((0, 0));
        self.settle(id, filled, 0, fees, Some(OrderStatus::Errored))
    }

    fn settle(
        &mut self,
        id: OrderId,
        filled: i64,
        remaining: i64,
        fees: i64,
        forced: Option<OrderStatus>,
    ) -> Option<StatusUpdate> {
        let o = self.orders.get_mut(&id)?;
        let fee_delta = fees - o.fees;
        o.fees = fees;
        o.filled = o.filled.max(filled);

        if remaining > 0 {
            o.remaining = remaining;
            if o.status == OrderStatus::Working && o.filled > 0 {
                o.status = OrderStatus::PartiallyFilled;
            }
            return Some(StatusUpdate { id, side: o.side, status: o.status, fee_delta, released: 0 });
        }

        let status = forced.unwrap_or(if o.filled >= o.volume { OrderStatus::Filled } else { OrderStatus::Cancelled });
        let released = (o.volume - o.filled).max(0);
        let side = o.side;
        self.orders.remove(&id);

        let slot = self.slot_mut(side);
        if matches!(*slot, Slot::Working(s) | Slot::CancelPending(s) if s == id) {
            *slot = Slot::Empty;
        }
        self.side_set(side).remove(&id);

        Some(StatusUpdate { id, side, status, fee_delta, released })
    }

    pub fn hedge(&mut self, side: Side, price: i64, volume: i64) -> Command {
        let id = self.next_id();
        self.hedges.insert(id, volume);
        Command::HedgeOrder { id, side, price, volume }
    }

    pub fn is_hedge(&self, id: OrderId) -> bool { self.hedges.contains_key(&id) }

    /// Hedges in flight.
    pub fn hedge_count(&self) -> usize { self.hedges.len() }

    /// Returns whether the id is one of ours; the hedge is forgotten once fully filled.
    pub fn on_hedge_filled(&mut self, id: OrderId, volume: i64) -> bool {
        let Some(left) = self.hedges.get_mut(&id) else { return false };
        *left -= volume;
        if *left <= 0 {
            self.hedges.remove(&id);
        }
        true
    }
}
