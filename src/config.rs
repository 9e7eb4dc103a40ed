// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : pair_quoter — ETF/Future divergence quoting engine in Rust
Module  : config.rs
Version : 0.5.0
License : MIT (see LICENSE)

Summary : Quotes the ETF against the Future midpoint, sizes quotes by the
          divergence, keeps inventory inside a hard limit and hedges every
          fill in the Future. Ships a mock feed and exchange, Prometheus
          metrics and a JSONL event recorder.
=============================================================================
*/
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;

use crate::domain::Lifespan;

// ===== Trading constants (fixed, not runtime-configurable) =====
pub const LOT_SIZE: i64 = 10;
pub const POSITION_LIMIT: i64 = 100;
pub const TICK_SIZE_IN_CENTS: i64 = 100;
pub const MINIMUM_BID: i64 = 1;
pub const MAXIMUM_ASK: i64 = 2_147_483_647;
pub const MIN_BID_NEAREST_TICK: i64 =
    (MINIMUM_BID + TICK_SIZE_IN_CENTS) / TICK_SIZE_IN_CENTS * TICK_SIZE_IN_CENTS;
pub const MAX_ASK_NEAREST_TICK: i64 = MAXIMUM_ASK / TICK_SIZE_IN_CENTS * TICK_SIZE_IN_CENTS;

/// Where the quote price comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PricingMode {
    /// Best level of the book update being handled.
    BestOfBook,
    /// Latest ETF snapshot held in the price history.
    LastRecorded,
}

/// What inventory the quote gate looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExposureMode {
    /// Realized position only.
    Realized,
    /// Realized position plus the net volume of live orders.
    Committed,
}

/// Which divergence rule turns into buy/sell decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SignalMode {
    Simple,
    /// Experimental: also trade when the ratio spread beats a threshold shifted by committed exposure.
    InventoryAdjusted,
}

#[derive(Clone, Debug)]
pub struct TraderCfg {
    pub lot_size: i64,
    pub position_limit: i64,
    pub tick_size: i64,
    pub hedge_bid_price: i64,
    pub hedge_ask_price: i64,
    pub lifespan: Lifespan,
    pub pricing_mode: PricingMode,
    pub exposure_mode: ExposureMode,
    pub signal_mode: SignalMode,
}

impl Default for TraderCfg {
    fn default() -> Self {
        Self {
            lot_size: LOT_SIZE,
            position_limit: POSITION_LIMIT,
            tick_size: TICK_SIZE_IN_CENTS,
            hedge_bid_price: MIN_BID_NEAREST_TICK,
            hedge_ask_price: MAX_ASK_NEAREST_TICK,
            lifespan: Lifespan::GoodForDay,
            pricing_mode: PricingMode::LastRecorded,
            exposure_mode: ExposureMode::Realized,
            signal_mode: SignalMode::Simple,
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(name = "pair_quoter", version, about = "ETF/Future divergence quoting engine")]
pub struct Args {
    // strategy variant
    #[arg(long, env = "PRICING_MODE", value_enum, default_value_t = PricingMode::LastRecorded)]
    pub pricing_mode: PricingMode,
    #[arg(long, env = "EXPOSURE_MODE", value_enum, default_value_t = ExposureMode::Realized)]
    pub exposure_mode: ExposureMode,
    #[arg(long, env = "SIGNAL_MODE", value_enum, default_value_t = SignalMode::Simple)]
    pub signal_mode: SignalMode,

    // files/metrics
    #[arg(long, env = "RECORD_FILE")]
    pub record_file: Option<String>,
    #[arg(long, env = "METRICS_PORT", default_value_t = 9898)]
    pub metrics_port: u16,

    // simulation harness
    #[arg(long, env = "FEED_INTERVAL_MS", default_value_t = 250)]
    pub feed_interval_ms: u64,
    #[arg(long, env = "FILL_PROBABILITY", default_value_t = 0.2)]
    pub fill_probability: f64,
    #[arg(long, env = "SIM_SEED")]
    pub seed: Option<u64>,
}

impl Args {
    pub fn trader_cfg(&self) -> TraderCfg {
        TraderCfg {
            pricing_mode: self.pricing_mode,
            exposure_mode: self.exposure_mode,
            signal_mode: self.signal_mode,
            ..TraderCfg::default()
        }
    }
}

pub fn load() -> Args {
    // .env first so clap's env fallbacks see it
    let _ = dotenv();
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extreme_hedge_prices_sit_on_the_tick_grid() {
        assert_eq!(MIN_BID_NEAREST_TICK, 100);
        assert_eq!(MAX_ASK_NEAREST_TICK, 2_147_483_600);
        assert_eq!(MAX_ASK_NEAREST_TICK % TICK_SIZE_IN_CENTS, 0);
    }

    #[test]
    fn cli_overrides_modes() {
        let args = Args::try_parse_from([
            "pair_quoter",
            "--pricing-mode",
            "best-of-book",
            "--exposure-mode",
            "committed",
            "--signal-mode",
            "inventory-adjusted",
        ])
        .unwrap();
        let cfg = args.trader_cfg();
        assert_eq!(cfg.pricing_mode, PricingMode::BestOfBook);
        assert_eq!(cfg.exposure_mode, ExposureMode::Committed);
        assert_eq!(cfg.signal_mode, SignalMode::InventoryAdjusted);
        assert_eq!(cfg.lot_size, LOT_SIZE);
    }
}
