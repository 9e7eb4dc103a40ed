// ===============================
// src/risk.rs (quote sizing against the position limit)
// ===============================
use thiserror::Error;

use crate::config::{ExposureMode, TraderCfg};
use crate::domain::Side;
use crate::positions::PositionLedger;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RiskError {
    #[error("{side:?} blocked: exposure {exposure} within one lot of the limit")]
    NearLimit { side: Side, exposure: i64 },
    #[error("{0:?} blocked: no headroom left")]
    NoHeadroom(Side),
}

/// `min(lot * multiplier, headroom)`; the quote shrinks to reach the limit exactly.
pub fn clamp_volume(lot: i64, multiplier: i64, headroom: i64) -> i64 {
    (lot * multiplier).min(headroom.max(0))
}

/// Pre-trade check: is there at least one lot of room on `side`, and how much to quote.
pub fn check(side: Side, multiplier: i64, ledger: &PositionLedger, cfg: &TraderCfg) -> Result<i64, RiskError> {
    let exposure = match cfg.exposure_mode {
        ExposureMode::Realized => ledger.position(),
        ExposureMode::Committed => ledger.position() + ledger.committed_exposure(),
    };
    let limit = ledger.limit();
    let inside = match side {
        Side::Sell => exposure > -limit + cfg.lot_size,
        Side::Buy => exposure < limit - cfg.lot_size,
    };
    if !inside {
        return Err(RiskError::NearLimit { side, exposure });
    }

    let headroom = match cfg.exposure_mode {
        ExposureMode::Realized => ledger.headroom(side),
        ExposureMode::Committed => ledger.worst_case_headroom(side),
    };
    let volume = clamp_volume(cfg.lot_size, multiplier, headroom);
    if volume <= 0 {
        return Err(RiskError::NoHeadroom(side));
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_at(position: i64) -> PositionLedger {
        let mut l = PositionLedger::new(100);
        if position > 0 {
            l.apply_fill(Side::Buy, position);
        } else if position < 0 {
            l.apply_fill(Side::Sell, -position);
        }
        l
    }

    #[test]
    fn sizing_law() {
        // min(LOT * multiplier, max(0, LIMIT - position))
        assert_eq!(clamp_volume(10, 2, 100), 20);
        assert_eq!(clamp_volume(10, 3, 5), 5);
        assert_eq!(clamp_volume(10, 3, -4), 0);
    }

    #[test]
    fn flat_book_sells_full_multiple() {
        let cfg = TraderCfg::default();
        assert_eq!(check(Side::Sell, 2, &ledger_at(0), &cfg), Ok(20));
    }

    #[test]
    fn buy_near_limit_clamps_to_distance() {
        let cfg = TraderCfg::default();
        let l = ledger_at(85);
        assert_eq!(check(Side::Buy, 3, &l, &cfg), Ok(15));
        // position 95: only 5 lots left to the limit
        assert_eq!(clamp_volume(cfg.lot_size, 3, ledger_at(95).headroom(Side::Buy)), 5);
    }

    #[test]
    fn within_one_lot_of_limit_is_blocked() {
        let cfg = TraderCfg::default();
        assert_eq!(
            check(Side::Buy, 1, &ledger_at(95), &cfg),
            Err(RiskError::NearLimit { side: Side::Buy, exposure: 95 })
        );
        assert_eq!(
            check(Side::Sell, 1, &ledger_at(-90), &cfg),
            Err(RiskError::NearLimit { side: Side::Sell, exposure: -90 })
        );
        assert_eq!(check(Side::Sell, 5, &ledger_at(-85), &cfg), Ok(15));
    }

    #[test]
    fn live_orders_eat_headroom_only_in_committed_mode() {
        let mut l = ledger_at(60);
        l.commit(Side::Sell, 40);
        l.commit(Side::Buy, 40);
        // net committed is flat, so the gate passes; the same-side 40 fills the room
        let committed = TraderCfg { exposure_mode: ExposureMode::Committed, ..TraderCfg::default() };
        assert_eq!(check(Side::Buy, 1, &l, &committed), Err(RiskError::NoHeadroom(Side::Buy)));

        assert_eq!(check(Side::Buy, 1, &l, &TraderCfg::default()), Ok(10));
    }

    #[test]
    fn committed_mode_gates_on_net_exposure() {
        let cfg = TraderCfg { exposure_mode: ExposureMode::Committed, ..TraderCfg::default() };
        let mut l = ledger_at(50);
        l.commit(Side::Buy, 45);
        assert_eq!(
            check(Side::Buy, 1, &l, &cfg),
            Err(RiskError::NearLimit { side: Side::Buy, exposure: 95 })
        );

        let realized = TraderCfg::default();
        assert_eq!(check(Side::Buy, 1, &l, &realized), Ok(10));
    }
}
