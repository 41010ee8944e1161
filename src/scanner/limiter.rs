//! Fixed-capacity concurrency limiter for in-flight probes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Caps the number of probes holding a permit at once.
///
/// Waiters are served in arrival order (tokio's semaphore is fair). A permit
/// goes back to the pool when its [`PermitToken`] is dropped, whatever path
/// the probe took to finish, including task abort.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<Counters>,
}

/// One unit of capacity, held by exactly one in-flight probe
#[derive(Debug)]
pub struct PermitToken {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for PermitToken {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Wait until a permit is free and take it
    pub async fn acquire(&self) -> crate::Result<PermitToken> {
        let permit = self.semaphore.clone().acquire_owned().await?;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        Ok(PermitToken {
            _permit: permit,
            counters: self.counters.clone(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits held at once since construction or the
    /// last [`reset_peak`](Self::reset_peak)
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Restart peak tracking from the current in-flight count
    pub fn reset_peak(&self) {
        let now = self.counters.in_flight.load(Ordering::SeqCst);
        self.counters.peak.store(now, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(2);

        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);
        assert_eq!(limiter.in_flight(), 2);

        drop(a);
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert_eq!(limiter.available(), 2);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_when_saturated() {
        let limiter = ConcurrencyLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        let waiting =
            tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(waiting.is_err());

        drop(held);
        let token =
            tokio::time::timeout(Duration::from_millis(500), limiter.acquire()).await;
        assert!(token.is_ok());
    }

    #[tokio::test]
    async fn test_aborted_task_returns_permit() {
        let limiter = ConcurrencyLimiter::new(3);
        let token = limiter.acquire().await.unwrap();

        let handle = tokio::spawn(async move {
            let _token = token;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tokio::task::yield_now().await;
        assert_eq!(limiter.available(), 2);

        handle.abort();
        let _ = handle.await;
        assert_eq!(limiter.available(), 3);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_peak_never_exceeds_capacity() {
        let limiter = ConcurrencyLimiter::new(4);
        let mut handles = Vec::new();

        for _ in 0..32 {
            let token = limiter.acquire().await.unwrap();
            assert!(limiter.in_flight() <= 4);
            handles.push(tokio::spawn(async move {
                let _token = token;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(limiter.peak_in_flight() <= 4);
        assert_eq!(limiter.available(), limiter.capacity());
    }

    #[tokio::test]
    async fn test_reset_peak() {
        let limiter = ConcurrencyLimiter::new(5);
        let held: Vec<_> = hold(&limiter, 3).await;
        assert_eq!(limiter.peak_in_flight(), 3);

        drop(held);
        limiter.reset_peak();
        assert_eq!(limiter.peak_in_flight(), 0);

        let _one = limiter.acquire().await.unwrap();
        assert_eq!(limiter.peak_in_flight(), 1);
    }

    async fn hold(limiter: &ConcurrencyLimiter, n: usize) -> Vec<PermitToken> {
        let mut tokens = Vec::with_capacity(n);
        for _ in 0..n {
            tokens.push(limiter.acquire().await.unwrap());
        }
        tokens
    }
}
