//! Shared test helpers: a scripted in-process transport and a failing store.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fetch_cache::{
    CacheEntry, CacheError, HttpRequest, HttpResponse, InvalidatePattern, PersistentStore,
    Result, StoreOutcome, Transport,
};
use serde_json::Value;

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

// == Scripted Transport ==
/// Answers requests from per-URL queues of replies.
///
/// The last queued reply for a URL repeats once the queue is drained.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Queues a JSON reply.
    pub fn respond(&self, url: &str, status: u16, body: Value) {
        self.push(url, Reply::Respond(HttpResponse::json_body(status, &body)));
    }

    pub fn respond_with(&self, url: &str, response: HttpResponse) {
        self.push(url, Reply::Respond(response));
    }

    /// Queues a network failure.
    pub fn fail(&self, url: &str, message: &str) {
        self.push(url, Reply::Fail(message.to_string()));
    }

    /// Makes every request take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.calls.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply(&url) {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(CacheError::Network(message)),
            None => Err(CacheError::Network(format!("no reply scripted for {}", url))),
        }
    }
}

/// Coerces the scripted transport for the manager builder.
pub fn as_transport(transport: &Arc<ScriptedTransport>) -> Arc<dyn Transport> {
    transport.clone()
}

// == Failing Store ==
/// Persistent store whose backing storage is entirely unavailable.
#[derive(Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl PersistentStore for UnavailableStore {
    async fn get(&self, _key: &str) -> StoreOutcome<CacheEntry> {
        StoreOutcome::Unavailable("storage disabled".to_string())
    }

    async fn put(&self, _entry: &CacheEntry) -> Result<()> {
        Err(CacheError::Storage("storage disabled".to_string()))
    }

    async fn remove_matching(&self, _pattern: &InvalidatePattern) -> Result<usize> {
        Err(CacheError::Storage("storage disabled".to_string()))
    }

    async fn clear(&self) -> Result<()> {
        Err(CacheError::Storage("storage disabled".to_string()))
    }
}
