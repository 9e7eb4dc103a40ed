// ===============================
// src/posttrade.rs
// ===============================
use tokio::sync::mpsc;
use tracing::{info, warn};
use crate::domain::ExchangeEvent;


/// Execution audit trail; market data is skipped.
pub async fn run(mut exec_rx: mpsc::Receiver<ExchangeEvent>) {
    while let Some(ev) = exec_rx.recv().await {
        match &ev {
            ExchangeEvent::OrderFilled { id, price, volume } => info!(id, volume, price, "FILLED"),
            ExchangeEvent::OrderStatus { id, filled, remaining, fees } if *remaining == 0 => {
                info!(id, filled, fees, "DONE")
            }
            ExchangeEvent::OrderStatus { id, filled, remaining, .. } => info!(id, filled, remaining, "STATUS"),
            ExchangeEvent::HedgeFilled { id, price, volume } => info!(id, volume, price, "HEDGE FILLED"),
            ExchangeEvent::Error { id, message } => warn!(id, reason = %message, "ERROR"),
            ExchangeEvent::OrderBookUpdate(_) | ExchangeEvent::TradeTicks(_) => {}
        }
    }
}
