use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Single-slot response cache. The first response produced is served until
/// it is older than `max_age`.
#[derive(Debug)]
pub struct ResponseCache<T> {
    max_age: Duration,
    entry: Mutex<Option<(Instant, T)>>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entry: Mutex::new(None),
        }
    }

    /// Value for a `Cache-Control` header matching this cache.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.max_age.as_secs())
    }

    /// Return the cached value, or build and store a new one. The flag is
    /// true on a hit.
    pub fn get_or_insert_with(&self, make: impl FnOnce() -> T) -> (T, bool) {
        let mut entry = self.entry.lock();
        if let Some((stored_at, value)) = entry.as_ref() {
            if stored_at.elapsed() < self.max_age {
                return (value.clone(), true);
            }
        }

        let value = make();
        *entry = Some((Instant::now(), value.clone()));
        (value, false)
    }
}
