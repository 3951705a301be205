//! Remote boundary for sync operations.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use quotesync_sync_protocol::{FetchResponse, PushRequest, PushResponse};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// The remote peer a sync engine talks to.
///
/// Both calls are opaque RPCs that may fail transiently. The engine treats
/// every failure as a network error.
#[async_trait]
pub trait RemoteStub: Send + Sync {
    /// Fetches the remote's current quote list.
    async fn fetch(&self) -> SyncResult<FetchResponse>;

    /// Pushes local changes to the remote.
    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse>;
}

/// A scripted remote for testing.
///
/// Fetches return the scripted response, or an empty list if none is set.
/// Pushes accept every quote unless a response is scripted.
#[derive(Debug)]
pub struct MockRemote {
    connected: AtomicBool,
    fail_push: AtomicBool,
    fetch_response: Mutex<Option<FetchResponse>>,
    push_response: Mutex<Option<PushResponse>>,
    fetch_delay: Mutex<Duration>,
    pushed: Mutex<Vec<PushRequest>>,
    fetch_calls: AtomicU64,
    push_calls: AtomicU64,
}

impl MockRemote {
    /// Creates a connected mock remote.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            fail_push: AtomicBool::new(false),
            fetch_response: Mutex::new(None),
            push_response: Mutex::new(None),
            fetch_delay: Mutex::new(Duration::ZERO),
            pushed: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
            push_calls: AtomicU64::new(0),
        }
    }

    /// Sets the fetch response.
    pub fn set_fetch_response(&self, response: FetchResponse) {
        *self.fetch_response.lock() = Some(response);
    }

    /// Sets the push response.
    pub fn set_push_response(&self, response: PushResponse) {
        *self.push_response.lock() = Some(response);
    }

    /// Sets the connected state. A disconnected remote fails every call.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Makes pushes fail while fetches keep working.
    pub fn set_fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    /// Delays every fetch by `delay`.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = delay;
    }

    /// Number of fetch calls seen.
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of push calls seen.
    pub fn push_calls(&self) -> u64 {
        self.push_calls.load(Ordering::SeqCst)
    }

    /// Every push request received, including failed ones.
    pub fn pushed(&self) -> Vec<PushRequest> {
        self.pushed.lock().clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStub for MockRemote {
    async fn fetch(&self) -> SyncResult<FetchResponse> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !self.is_connected() {
            return Err(SyncError::network("not connected"));
        }
        Ok(self.fetch_response.lock().clone().unwrap_or_default())
    }

    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        let accepted = request.quotes.len();
        self.pushed.lock().push(request);

        if !self.is_connected() {
            return Err(SyncError::network("not connected"));
        }
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(SyncError::network("push rejected"));
        }
        let scripted = self.push_response.lock().clone();
        Ok(scripted.unwrap_or_else(|| PushResponse::new(accepted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotesync_core::{Quote, QuoteId};

    #[tokio::test]
    async fn defaults_to_empty_fetch_and_full_accept() {
        let remote = MockRemote::new();
        assert!(remote.fetch().await.unwrap().quotes.is_empty());

        let request = PushRequest::new(vec![Quote::new(QuoteId::new("1"), "T", "A", "C", 1)]);
        assert_eq!(remote.push(request).await.unwrap().accepted, 1);
        assert_eq!(remote.fetch_calls(), 1);
        assert_eq!(remote.push_calls(), 1);
    }

    #[tokio::test]
    async fn disconnected_remote_fails() {
        let remote = MockRemote::new();
        remote.set_connected(false);

        assert!(remote.fetch().await.unwrap_err().is_network());
        assert!(remote.push(PushRequest::default()).await.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn push_failure_switch() {
        let remote = MockRemote::new();
        remote.set_fail_push(true);

        assert!(remote.push(PushRequest::default()).await.is_err());
        assert!(remote.fetch().await.is_ok());
        assert_eq!(remote.pushed().len(), 1);
    }
}
