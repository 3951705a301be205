//! An in-process server simulation.

use crate::config::SimulatedRemoteConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteStub;
use async_trait::async_trait;
use parking_lot::Mutex;
use quotesync_core::{Clock, Quote, QuoteSource, SystemClock};
use quotesync_sync_protocol::{FetchResponse, PushRequest, PushResponse, WireMessage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A remote that keeps its quote list in memory.
///
/// Every request and response goes through its JSON wire encoding. Pushed
/// quotes are upserted by id and stamped with server time, unless the server
/// already holds a newer copy, in which case the push is rejected. Calls fail
/// transiently at the configured rate, drawn from a seeded RNG so runs are
/// reproducible.
pub struct SimulatedRemote {
    config: SimulatedRemoteConfig,
    clock: Arc<dyn Clock>,
    server: Mutex<ServerState>,
    fetch_calls: AtomicU64,
    push_calls: AtomicU64,
}

struct ServerState {
    quotes: Vec<Quote>,
    rng: StdRng,
}

impl SimulatedRemote {
    /// Creates an empty remote using the system clock.
    pub fn new(config: SimulatedRemoteConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty remote with an explicit clock for server time.
    pub fn with_clock(config: SimulatedRemoteConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            clock,
            server: Mutex::new(ServerState {
                quotes: Vec::new(),
                rng,
            }),
            fetch_calls: AtomicU64::new(0),
            push_calls: AtomicU64::new(0),
        }
    }

    /// Upserts a quote directly on the server, as another client would.
    pub fn upsert(&self, quote: Quote) {
        let mut server = self.server.lock();
        let quote = quote.with_source(QuoteSource::Server);
        match server.quotes.iter_mut().find(|q| q.id == quote.id) {
            Some(existing) => *existing = quote,
            None => server.quotes.push(quote),
        }
    }

    /// The server's current quote list.
    pub fn quotes(&self) -> Vec<Quote> {
        self.server.lock().quotes.clone()
    }

    /// Number of fetch calls seen.
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of push calls seen.
    pub fn push_calls(&self) -> u64 {
        self.push_calls.load(Ordering::SeqCst)
    }

    async fn round_trip_delay(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    fn roll_failure(&self, server: &mut ServerState, call: &str) -> SyncResult<()> {
        if self.config.failure_rate > 0.0 && server.rng.gen_bool(self.config.failure_rate) {
            tracing::debug!(call, "simulated transient failure");
            return Err(SyncError::network(format!("simulated {call} failure")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SimulatedRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedRemote")
            .field("config", &self.config)
            .field("quotes", &self.server.lock().quotes.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteStub for SimulatedRemote {
    async fn fetch(&self) -> SyncResult<FetchResponse> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.round_trip_delay().await;

        let body = {
            let mut server = self.server.lock();
            self.roll_failure(&mut server, "fetch")?;
            FetchResponse::new(server.quotes.clone()).encode()?
        };
        Ok(FetchResponse::decode(&body)?)
    }

    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        let body = request.encode()?;
        self.round_trip_delay().await;

        let reply = {
            let mut server = self.server.lock();
            self.roll_failure(&mut server, "push")?;

            let request = PushRequest::decode(&body)?;
            let now = self.clock.now_millis();
            let mut accepted = 0;
            let mut rejected = Vec::new();
            for quote in request.quotes {
                let position = server.quotes.iter().position(|q| q.id == quote.id);
                if let Some(index) = position {
                    // Last write wins: keep the newer server copy
                    if quote.timestamp < server.quotes[index].timestamp {
                        tracing::debug!(id = %quote.id, "rejecting stale push");
                        rejected.push(quote.id);
                        continue;
                    }
                }

                let stamped = Quote {
                    timestamp: now.max(quote.timestamp),
                    source: QuoteSource::Server,
                    last_synced: None,
                    ..quote
                };
                match position {
                    Some(index) => server.quotes[index] = stamped,
                    None => server.quotes.push(stamped),
                }
                accepted += 1;
            }
            PushResponse::with_rejected(accepted, rejected).encode()?
        };
        Ok(PushResponse::decode(&reply)?)
    }
}
