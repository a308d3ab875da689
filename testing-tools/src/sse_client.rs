use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Payload of the first event every subscriber receives.
pub const WELCOME_PAYLOAD: &str = r#"{"message": "Connected"}"#;

#[derive(Debug, Clone)]
pub struct Event {
    pub data: String,
    pub timestamp: Instant,
}

pub struct Connection {
    pub label: String,
    event_rx: mpsc::UnboundedReceiver<Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub async fn establish(base_url: &str, label: String) -> Result<Self> {
        let url = format!("{}/events", base_url);
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(&url)?.build();

        let stream_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        let event = Event {
                            data: event.data,
                            timestamp: Instant::now(),
                        };

                        if tx.send(event).is_err() {
                            debug!("SSE receiver dropped for {}", stream_label);
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Comments (keep-alive) carry no data
                    }
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {}", stream_label, e);
                    }
                    None => {
                        debug!("SSE stream ended for {}", stream_label);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            label,
            event_rx: rx,
            _handle: handle,
        })
    }

    /// Waits for the next event whose data satisfies `matches`, skipping others.
    pub async fn wait_for_event<F>(&mut self, matches: F, timeout: Duration) -> Result<Event>
    where
        F: Fn(&str) -> bool,
    {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for event on {}", self.label);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) if matches(&event.data) => {
                    return Ok(event);
                }
                Ok(Some(_)) => {
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("SSE connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for event on {}", self.label);
                }
            }
        }
    }

    pub async fn wait_for_welcome(&mut self, timeout: Duration) -> Result<Event> {
        self.wait_for_event(|data| data == WELCOME_PAYLOAD, timeout)
            .await
    }
}
