use crate::errors::AppResult;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CachedEntry<T> {
    value: Arc<T>,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<T> {
    slot: Mutex<Option<CachedEntry<T>>>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn get_or_try_load<F>(&self, force: bool, loader: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> AppResult<T>,
    {
        self.get_or_try_load_at(Instant::now(), force, loader)
    }

    pub fn get_or_try_load_at<F>(&self, now: Instant, force: bool, loader: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> AppResult<T>,
    {
        let mut slot = self.lock_slot();

        if !force {
            if let Some(entry) = slot.as_ref() {
                if now.saturating_duration_since(entry.stored_at) < self.ttl {
                    tracing::debug!("load cache hit");
                    return Ok(entry.value.clone());
                }
            }
        }

        tracing::debug!(force, "load cache miss");
        *slot = None;
        let value = Arc::new(loader()?);
        *slot = Some(CachedEntry {
            value: value.clone(),
            stored_at: now,
        });
        Ok(value)
    }

    pub fn invalidate(&self) {
        *self.lock_slot() = None;
        tracing::info!("load cache invalidated");
    }

    pub fn is_fresh(&self) -> bool {
        self.lock_slot()
            .as_ref()
            .is_some_and(|entry| entry.stored_at.elapsed() < self.ttl)
    }

    // The slot is cleared before every load; a panicking loader leaves it empty.
    fn lock_slot(&self) -> MutexGuard<'_, Option<CachedEntry<T>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
