//! Upstream-to-caller byte relay
//!
//! A spawned producer pulls chunks off the upstream response and pushes them
//! into a bounded channel; the response body drains that channel. At most
//! `buffer_chunks` chunks are in flight, so a slow caller slows the upstream
//! read instead of growing memory. The producer owns the upstream response
//! and drops it on every exit: end of body, upstream error, idle timeout, or
//! the caller going away (receiver dropped).

use axum::body::Body;
use bytes::Bytes;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::error_chain;

type Chunk = io::Result<Bytes>;

/// Build a response body that relays `upstream` chunk by chunk.
pub fn relay_body(
    upstream: reqwest::Response,
    buffer_chunks: usize,
    idle_timeout: Duration,
) -> Body {
    let (tx, rx) = mpsc::channel::<Chunk>(buffer_chunks.max(1));
    tokio::spawn(pump(upstream, tx, idle_timeout));

    let chunks = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    Body::from_stream(chunks)
}

async fn pump(mut upstream: reqwest::Response, tx: mpsc::Sender<Chunk>, idle_timeout: Duration) {
    let url = upstream.url().clone();
    let mut forwarded: u64 = 0;

    loop {
        let next = tokio::select! {
            _ = tx.closed() => {
                debug!("Caller disconnected from {} after {} bytes", url, forwarded);
                return;
            }
            next = tokio::time::timeout(idle_timeout, upstream.chunk()) => next,
        };

        let chunk = match next {
            Ok(Ok(Some(chunk))) => chunk,
            Ok(Ok(None)) => {
                debug!("Finished relaying {} ({} bytes)", url, forwarded);
                return;
            }
            Ok(Err(e)) => {
                let reason = error_chain(&e);
                warn!("Upstream {} failed after {} bytes: {}", url, forwarded, reason);
                let _ = tx.send(Err(io::Error::other(reason))).await;
                return;
            }
            Err(_) => {
                warn!(
                    "Upstream {} idle for {:?} after {} bytes",
                    url, idle_timeout, forwarded
                );
                let _ = tx
                    .send(Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "upstream stalled",
                    )))
                    .await;
                return;
            }
        };

        forwarded += chunk.len() as u64;
        // Waits for channel capacity; fails once the caller is gone.
        if tx.send(Ok(chunk)).await.is_err() {
            debug!("Caller disconnected from {} after {} bytes", url, forwarded);
            return;
        }
    }
}
