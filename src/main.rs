// ===============================
// src/main.rs
// ===============================
/*
 cargo run -- --pricing-mode best-of-book --exposure-mode committed

 # active strategy variant
 curl -s localhost:9898/metrics | grep '^config_mode'

 # inventory & flow
 curl -s localhost:9898/metrics | egrep '^(etf_position|committed_exposure|hedges_total|commands_total)'
*/
/*
=============================================================================
Project : pair_quoter — ETF/Future divergence quoting engine in Rust
Module  : main.rs
Version : 0.5.0
License : MIT (see LICENSE)

Summary : Quotes the ETF against the Future midpoint, sizes quotes by the
          divergence, keeps inventory inside a hard limit and hedges every
          fill in the Future. Ships a mock feed and exchange, Prometheus
          metrics and a JSONL event recorder.
=============================================================================
*/
mod domain;
mod config;
mod metrics;
mod recorder;
mod feed;
mod prices;
mod signal;
mod positions;
mod orders;
mod risk;
mod strategy;
mod hedge;
mod engine;
mod gateway;          // mock exchange (ack, random fills, cancel confirms)
mod posttrade;

use tokio::{
    select,
    sync::{mpsc, watch},
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::domain::{Command, Event, ExchangeEvent, Instrument, Side};
use crate::feed::FutureTop;

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---- Load config ----
    let args = config::load();
    let cfg = args.trader_cfg();
    // mock exchange settings are checked before anything starts
    let gw_cfg = match gateway::GatewayCfg::new(
        args.fill_probability,
        Duration::from_millis(args.feed_interval_ms),
        args.seed.map(|s| s.wrapping_add(1)),
    ) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(%e, "invalid gateway config");
            std::process::exit(2);
        }
    };

    // ---- Metrics ----
    metrics::init();
    metrics::serve_metrics(args.metrics_port);

    info!(
        pricing = ?cfg.pricing_mode,
        exposure = ?cfg.exposure_mode,
        signal = ?cfg.signal_mode,
        lot = cfg.lot_size,
        limit = cfg.position_limit,
        tick = cfg.tick_size,
        record_file = ?args.record_file,
        "startup config"
    );
    for (setting, value) in [
        ("pricing", format!("{:?}", cfg.pricing_mode)),
        ("exposure", format!("{:?}", cfg.exposure_mode)),
        ("signal", format!("{:?}", cfg.signal_mode)),
    ] {
        crate::metrics::CONFIG_MODE.with_label_values(&[setting, &value]).set(1);
    }

    // ---- Buses ----
    // feed + gateway -> central -> (engine, posttrade)
    let (central_tx, central_rx) = mpsc::channel::<ExchangeEvent>(4096);
    let (engine_tx, engine_rx) = mpsc::channel::<ExchangeEvent>(4096);
    let (post_tx, post_rx) = mpsc::channel::<ExchangeEvent>(4096);
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(1024);
    let (future_tx, future_rx) = watch::channel::<FutureTop>(None);

    tokio::spawn(async move {
        let mut rx = central_rx;
        while let Some(ev) = rx.recv().await {
            let is_md = matches!(ev, ExchangeEvent::OrderBookUpdate(_) | ExchangeEvent::TradeTicks(_));
            if !is_md {
                let _ = post_tx.send(ev.clone()).await;
            }
            if engine_tx.send(ev).await.is_err() {
                break;
            }
        }
    });

    // ---- Recorder (optional) ----
    let rec_tx = match args.record_file.clone() {
        Some(path) => {
            let (tx, rx) = mpsc::channel::<Event>(8192);
            tokio::spawn(recorder::run(rx, path));
            Some(tx)
        }
        None => None,
    };

    // ---- Engine (single consumer of all events) ----
    let trader = engine::AutoTrader::new(cfg);
    let engine_task = tokio::spawn(engine::run(engine_rx, cmd_tx, rec_tx, trader));

    // ---- Mock exchange + feed ----
    let gateway_task = tokio::spawn(gateway::run_mock(cmd_rx, central_tx.clone(), future_rx, gw_cfg));
    let feed_task = tokio::spawn(feed::run_mock(
        central_tx,
        future_tx,
        Duration::from_millis(args.feed_interval_ms),
        args.seed,
    ));

    // ---- Post-Trade ----
    tokio::spawn(posttrade::run(post_rx));

    // ---- Heartbeat ----
    let mut last_events = 0;
    loop {
        select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c, shutting down");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                let events = metrics::EVENTS.get();
                info!(
                    events = events - last_events,
                    position = metrics::POSITION.get(),
                    committed = metrics::COMMITTED_EXPOSURE.get(),
                    hedges = metrics::HEDGES.get(),
                    "heartbeat"
                );
                last_events = events;
            }
        }
    }

    // dropping the producers closes the central bus, which stops the engine
    feed_task.abort();
    gateway_task.abort();
    match engine_task.await {
        Ok(trader) => info!(
            position = trader.ledger().position(),
            committed = trader.ledger().committed_exposure(),
            fees = trader.ledger().fees(),
            live_bids = trader.orders().live_count(Side::Buy),
            live_asks = trader.orders().live_count(Side::Sell),
            etf_snapshots = trader.prices().len(Instrument::Etf),
            future_snapshots = trader.prices().len(Instrument::Future),
            "final state"
        ),
        Err(e) => tracing::error!(?e, "engine task failed"),
    }
}
