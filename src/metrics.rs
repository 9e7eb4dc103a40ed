// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Inbound --------
pub static EVENTS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("events_total", "exchange events handled").unwrap());

pub static BOOK_UPDATES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("book_updates_total", "order book updates per instrument"),
        &["instrument"],
    )
    .unwrap()
});

pub static TRADE_TICKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trade_ticks_total", "trade tick messages per instrument"),
        &["instrument"],
    )
    .unwrap()
});

pub static ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("exchange_errors_total", "error messages (scope: order|general)"),
        &["scope"],
    )
    .unwrap()
});

pub static DEFERRED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quote_deferred_total", "ETF updates with no decision, by reason"),
        &["reason"],
    )
    .unwrap()
});

// -------- Outbound --------
pub static COMMANDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("commands_total", "commands sent (kind: insert|cancel|hedge|amend)"),
        &["kind"],
    )
    .unwrap()
});

pub static FILLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("quote_fills_total", "fills on own quotes"), &["side"]).unwrap()
});

pub static HEDGES: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("hedges_total", "hedge orders emitted").unwrap());

pub static HEDGE_FILLS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("hedge_fills_total", "hedge fill messages").unwrap());

// Time spent inside one event handler (microseconds)
pub static HANDLE_US: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("event_handle_us", "event handling time (us)")
            .buckets(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]),
    )
    .unwrap()
});

// -------- Inventory --------
pub static POSITION: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("etf_position", "realized ETF position (lots)").unwrap());

pub static COMMITTED_EXPOSURE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("committed_exposure", "net lots still working in own orders").unwrap()
});

pub static FEES_TOTAL: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("fees_total", "cumulative order fees (cents)").unwrap());

pub static MULTIPLIER: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("divergence_multiplier", "last lot multiplier").unwrap());

// ---- Config visibility ----
pub static CONFIG_MODE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("config_mode", "strategy variant (labels: setting, value)"),
        &["setting", "value"],
    )
    .unwrap()
});

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(EVENTS.clone())),
        REGISTRY.register(Box::new(BOOK_UPDATES.clone())),
        REGISTRY.register(Box::new(TRADE_TICKS.clone())),
        REGISTRY.register(Box::new(ERRORS.clone())),
        REGISTRY.register(Box::new(DEFERRED.clone())),
        REGISTRY.register(Box::new(COMMANDS.clone())),
        REGISTRY.register(Box::new(FILLS.clone())),
        REGISTRY.register(Box::new(HEDGES.clone())),
        REGISTRY.register(Box::new(HEDGE_FILLS.clone())),
        REGISTRY.register(Box::new(HANDLE_US.clone())),
        REGISTRY.register(Box::new(POSITION.clone())),
        REGISTRY.register(Box::new(COMMITTED_EXPOSURE.clone())),
        REGISTRY.register(Box::new(FEES_TOTAL.clone())),
        REGISTRY.register(Box::new(MULTIPLIER.clone())),
        REGISTRY.register(Box::new(CONFIG_MODE.clone())),
    ] {
        if let Err(e) = m {
            tracing::warn!(?e, "metric registration failed");
        }
    }
}

// Encode all metrics in Prometheus text format
fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Serve one HTTP request (GET / or /metrics) with a minimal HTTP 1.1 reply
fn handle_client(mut stream: TcpStream) {
    // Consume headers, no parsing
    let mut _req_buf = [0u8; 1024];
    let _ = stream.read(&mut _req_buf);

    let body = encode_metrics();
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

// Metrics server on a dedicated OS thread, away from the Tokio runtime
pub fn serve_metrics(port: u16) {
    thread::spawn(move || {
        let addr = format!("0.0.0.0:{port}");
        let listener = match TcpListener::bind(&addr) {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(%addr, ?e, "metrics bind failed");
                return;
            }
        };
        tracing::info!(%addr, "metrics listening (/ and /metrics)");

        for conn in listener.incoming() {
            match conn {
                Ok(stream) => handle_client(stream),
                Err(e) => tracing::warn!(?e, "metrics accept error"),
            }
        }
    });
}
