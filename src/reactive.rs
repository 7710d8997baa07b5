//! Reactive fetch adapter
//!
//! Exposes `{ data, loading, error, revalidate }` over a [`CacheManager`]
//! for view code that re-renders on state changes.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::watch;
use tracing::warn;

use crate::error::CacheError;
use crate::manager::CacheManager;
use crate::strategy::FetchOptions;

/// Observable state of one cached fetch.
///
/// `data` and `error` are never both set.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<Arc<CacheError>>,
}

type InFlight = Shared<BoxFuture<'static, ()>>;

struct AdapterInner {
    manager: CacheManager,
    url: String,
    options: FetchOptions,
    state: watch::Sender<FetchState>,
    in_flight: Mutex<Option<InFlight>>,
}

/// Handle to a fetch whose result is published through a watch channel.
#[derive(Clone)]
pub struct CachedFetch {
    inner: Arc<AdapterInner>,
}

/// Starts fetching `url` through `manager` with its default config.
///
/// Must be called from within a Tokio runtime.
pub fn use_cached_fetch(manager: &CacheManager, url: impl Into<String>) -> CachedFetch {
    CachedFetch::spawn(manager.clone(), url)
}

impl CachedFetch {
    pub fn spawn(manager: CacheManager, url: impl Into<String>) -> Self {
        Self::with_options(manager, url, FetchOptions::get())
    }

    pub fn with_options(manager: CacheManager, url: impl Into<String>, options: FetchOptions) -> Self {
        let (state, _) = watch::channel(FetchState {
            loading: true,
            ..FetchState::default()
        });

        let adapter = Self {
            inner: Arc::new(AdapterInner {
                manager,
                url: url.into(),
                options,
                state,
                in_flight: Mutex::new(None),
            }),
        };
        drop(adapter.start());
        adapter
    }

    /// Starts a fetch unless one is already running, returning a future
    /// that resolves when the running fetch has published its result.
    fn start(&self) -> InFlight {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(running) = in_flight.as_ref() {
            if self.inner.state.borrow().loading {
                return running.clone();
            }
        }

        self.inner.state.send_modify(|s| s.loading = true);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = inner.manager.fetch(&inner.url, inner.options.clone()).await;
            inner.state.send_modify(|s| {
                s.loading = false;
                match result {
                    Ok(data) => {
                        s.data = Some(data);
                        s.error = None;
                    }
                    Err(err) => {
                        s.data = None;
                        s.error = Some(Arc::new(err));
                    }
                }
            });
        });

        let url = self.inner.url.clone();
        let fut = async move {
            if let Err(err) = handle.await {
                warn!(url = %url, error = %err, "cached fetch task aborted");
            }
        }
        .boxed()
        .shared();

        *in_flight = Some(fut.clone());
        fut
    }

    /// Re-runs the fetch; joins the running one instead if still loading.
    pub async fn revalidate(&self) -> FetchState {
        self.start().await;
        self.state()
    }

    pub fn state(&self) -> FetchState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.inner.state.subscribe()
    }

    /// Waits until `loading` is false and returns that state.
    pub async fn settled(&self) -> FetchState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }
}
