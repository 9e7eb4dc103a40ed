// ===============================
// src/prices.rs (best bid/ask history per instrument)
// ===============================
use tracing::warn;

use crate::domain::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot { pub bid: i64, pub ask: i64 }
impl Snapshot {
    pub fn midpoint(&self) -> i64 { (self.bid + self.ask).div_euclid(2) }
}

#[derive(Debug, Default)]
struct Series {
    latest: Option<Snapshot>,
    count: usize,
    last_seq: Option<u64>,
}

/// Best-of-book history for the ETF and the Future.
///
/// Only the latest entry and the number of entries are ever consulted, so
/// that is all that is kept: a decision is made only once both instruments
/// reported for the same tick.
#[derive(Debug, Default)]
pub struct PriceHistory {
    etf: Series,
    future: Series,
}

impl PriceHistory {
    pub fn new() -> Self { Self::default() }

    fn series(&self, instrument: Instrument) -> &Series {
        match instrument { Instrument::Etf => &self.etf, Instrument::Future => &self.future }
    }

    /// Returns false when `seq` is not newer than the last accepted update.
    pub fn record_snapshot(&mut self, instrument: Instrument, seq: u64, bid: i64, ask: i64) -> bool {
        let s = match instrument { Instrument::Etf => &mut self.etf, Instrument::Future => &mut self.future };
        if let Some(last) = s.last_seq {
            if seq <= last {
                warn!(instrument = instrument.label(), seq, last, "stale book update ignored");
                return false;
            }
        }
        s.last_seq = Some(seq);
        s.latest = Some(Snapshot { bid, ask });
        s.count += 1;
        true
    }

    pub fn len(&self, instrument: Instrument) -> usize { self.series(instrument).count }

    pub fn latest(&self, instrument: Instrument) -> Option<Snapshot> { self.series(instrument).latest }

    pub fn latest_midpoint(&self, instrument: Instrument) -> Option<i64> {
        self.latest(instrument).map(|s| s.midpoint())
    }

    pub fn is_synchronized(&self) -> bool {
        let n = self.etf.count;
        n > 0 && n == self.future.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_floors() {
        assert_eq!(Snapshot { bid: 10_000, ask: 10_101 }.midpoint(), 10_050);
        assert_eq!(Snapshot { bid: 0, ask: 0 }.midpoint(), 0);
    }

    #[test]
    fn synchronized_only_with_equal_counts() {
        let mut h = PriceHistory::new();
        assert!(!h.is_synchronized());

        h.record_snapshot(Instrument::Future, 1, 9_900, 10_100);
        assert!(!h.is_synchronized());
        h.record_snapshot(Instrument::Etf, 1, 10_000, 10_200);
        assert!(h.is_synchronized());

        h.record_snapshot(Instrument::Etf, 2, 10_100, 10_300);
        assert!(!h.is_synchronized());
        assert_eq!(h.latest_midpoint(Instrument::Etf), Some(10_200));
        assert_eq!(h.latest_midpoint(Instrument::Future), Some(10_000));

        h.record_snapshot(Instrument::Future, 2, 9_900, 10_100);
        assert!(h.is_synchronized());
    }

    #[test]
    fn keeps_count_and_latest_only() {
        let mut h = PriceHistory::new();
        for seq in 1..=1_000u64 {
            h.record_snapshot(Instrument::Future, seq, seq as i64, seq as i64 + 100);
        }
        assert_eq!(h.len(Instrument::Future), 1_000);
        assert_eq!(h.latest(Instrument::Future), Some(Snapshot { bid: 1_000, ask: 1_100 }));
        assert_eq!(h.len(Instrument::Etf), 0);
        assert_eq!(h.latest(Instrument::Etf), None);
    }

    #[test]
    fn stale_sequence_is_not_recorded() {
        let mut h = PriceHistory::new();
        assert!(h.record_snapshot(Instrument::Etf, 5, 100, 200));
        assert!(!h.record_snapshot(Instrument::Etf, 5, 300, 400));
        assert!(!h.record_snapshot(Instrument::Etf, 3, 300, 400));
        assert_eq!(h.len(Instrument::Etf), 1);
        assert_eq!(h.latest(Instrument::Etf), Some(Snapshot { bid: 100, ask: 200 }));
    }
}
