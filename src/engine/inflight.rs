//! In-flight request deduplication
//!
//! Concurrent identical reads (same `method:params` key) share a single
//! underlying request. Entries are dropped as soon as the request completes,
//! so nothing is cached beyond the lifetime of the call.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

type SharedCall<T> = Shared<BoxFuture<'static, Result<T, Arc<AppError>>>>;

/// Single in-flight map keyed by method and params
pub struct InFlight<T: Clone> {
    pending: Mutex<HashMap<String, SharedCall<T>>>,
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Build the dedup key for an RPC method and its params
    pub fn key(method: &str, params: &str) -> String {
        format!("{}:{}", method, params)
    }

    /// Run `call` unless an identical one is already in flight, in which case
    /// join it
    pub async fn run<F>(&self, key: String, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock();
            match pending.get(&key) {
                Some(existing) => {
                    tracing::trace!(key = %key, "Joining in-flight request");
                    existing.clone()
                }
                None => {
                    let fresh = call.map(|r| r.map_err(Arc::new)).boxed().shared();
                    pending.insert(key.clone(), fresh.clone());
                    fresh
                }
            }
        };

        let result = shared.clone().await;

        {
            let mut pending = self.pending.lock();
            if pending
                .get(&key)
                .map(|current| current.ptr_eq(&shared))
                .unwrap_or(false)
            {
                pending.remove(&key);
            }
        }

        result.map_err(|e| rebuild(&e))
    }

    /// Number of requests currently in flight
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

/// Owned copy of a shared error, keeping its variant and message
fn rebuild(error: &AppError) -> AppError {
    match error {
        AppError::Validation(msg) => AppError::Validation(msg.clone()),
        AppError::InsufficientBalance {
            required,
            available,
        } => AppError::InsufficientBalance {
            required: *required,
            available: *available,
        },
        AppError::Http(msg) => AppError::Http(msg.clone()),
        AppError::Parse(msg) => AppError::Parse(msg.clone()),
        AppError::Rpc(msg) => AppError::Rpc(msg.clone()),
        AppError::Simulation(msg) => AppError::Simulation(msg.clone()),
        AppError::Confirmation(msg) => AppError::Confirmation(msg.clone()),
        AppError::Timeout(msg) => AppError::Timeout(msg.clone()),
        AppError::Io(e) => AppError::Io(std::io::Error::new(e.kind(), e.to_string())),
        AppError::Config(e) => AppError::Internal(e.to_string()),
        AppError::Internal(msg) => AppError::Internal(msg.clone()),
    }
}

impl<T> Default for InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
