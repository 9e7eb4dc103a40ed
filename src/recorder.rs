// ===============================
// src/recorder.rs
// ===============================
//
// JSONL recorder:
// - every inbound event and outbound command becomes one line (append),
//   stamped with the UTC wall clock: {"ts":"...","ev":{...}}
// - BufWriter, flushed every 1s and every 1000 events
// - parent directory created when missing
// - on write failure the file is reopened once, then the line is dropped
//
// ENV: `RECORD_FILE=/path/to/events.jsonl` enables it (see main.rs).
//
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{error, info};

use crate::domain::Event;

const FLUSH_EVERY_N_EVENTS: u32 = 1000;

#[derive(Serialize)]
struct Line<'a> {
    ts: String,
    ev: &'a Event,
}

async fn open_writer(path: &str) -> std::io::Result<BufWriter<fs::File>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

async fn write_line(writer: &mut BufWriter<fs::File>, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}

pub async fn run(mut rx: mpsc::Receiver<Event>, path: String) {
    info!(%path, "recorder: started");
    let mut writer = match open_writer(&path).await {
        Ok(w) => w,
        Err(e) => {
            error!(?e, %path, "recorder: open failed, recording disabled");
            return;
        }
    };

    let mut tick = interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut since_last_flush: u32 = 0;

    loop {
        tokio::select! {
            maybe_ev = rx.recv() => {
                let Some(ev) = maybe_ev else {
                    let _ = writer.flush().await;
                    info!("recorder: channel closed, stopped");
                    break;
                };
                let stamped = Line { ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true), ev: &ev };
                let line = match serde_json::to_string(&stamped) {
                    Ok(s) => s,
                    Err(e) => {
                        error!(?e, "recorder: serialize error, skip event");
                        continue;
                    }
                };

                if let Err(e) = write_line(&mut writer, &line).await {
                    error!(?e, "recorder: write failed, attempting reopen");
                    match open_writer(&path).await {
                        Ok(w) => writer = w,
                        Err(e2) => {
                            error!(?e2, "recorder: reopen failed, drop event");
                            continue;
                        }
                    }
                    if let Err(e2) = write_line(&mut writer, &line).await {
                        error!(?e2, "recorder: write failed again after reopen, drop event");
                        continue;
                    }
                }

                since_last_flush += 1;
                if since_last_flush >= FLUSH_EVERY_N_EVENTS {
                    let _ = writer.flush().await;
                    since_last_flush = 0;
                }
            }

            _ = tick.tick() => {
                let _ = writer.flush().await;
                since_last_flush = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Command, ExchangeEvent};

    #[tokio::test]
    async fn writes_one_json_line_per_event() {
        let dir = std::env::temp_dir().join(format!("pair_quoter_rec_{}", std::process::id()));
        let path = dir.join("events.jsonl").to_string_lossy().into_owned();
        let _ = tokio::fs::remove_dir_all(&dir).await;

        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(run(rx, path.clone()));
        tx.send(Event::In(ExchangeEvent::Error { id: 0, message: "hello".into() })).await.unwrap();
        tx.send(Event::Out(Command::CancelOrder { id: 7 })).await.unwrap();
        drop(tx);
        task.await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(v["ts"].as_str().unwrap().ends_with('Z'));
        let back: Event = serde_json::from_value(v["ev"].clone()).unwrap();
        assert!(matches!(back, Event::Out(Command::CancelOrder { id: 7 })));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
