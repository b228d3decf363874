//! Single-flight fetch coordination.
//!
//! One [`SingleFlight`] exists per logical resource (for example the public
//! announcements feed) and is shared by reference. While a fetch is in
//! flight, other callers of [`SingleFlight::run`] wait for it and share its
//! result instead of issuing a duplicate request.
//!
//! The in-flight flag is advisory and short-lived: it is released when the
//! fetch settles, when its [`FlightGuard`] is released or dropped, or once
//! `release_after` has elapsed, whichever comes first. A caller that finds
//! an expired flag takes over as the new leader.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ErrorCode;

/// Errors from single-flight coordination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlightError {
    #[error("{}: {resource} fetch already in flight for {elapsed:?}", ErrorCode::FetchInFlight.code())]
    InFlight { resource: String, elapsed: Duration },
    #[error("{}: {resource} fetch failed: {message}", ErrorCode::FetchFailed.code())]
    Failed { resource: String, message: String },
}

impl FlightError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InFlight { .. } => ErrorCode::FetchInFlight,
            Self::Failed { .. } => ErrorCode::FetchFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

type Outcome<T> = Result<Arc<T>, String>;

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    started: Option<Instant>,
    settled: Option<(u64, Outcome<T>)>,
}

/// Coordinator for one logical resource.
#[derive(Debug)]
pub struct SingleFlight<T> {
    resource: String,
    release_after: Duration,
    slot: Mutex<Slot<T>>,
    changed: Condvar,
}

impl<T> SingleFlight<T> {
    #[must_use]
    pub fn new(resource: impl Into<String>, release_after: Duration) -> Self {
        Self {
            resource: resource.into(),
            release_after,
            slot: Mutex::new(Slot {
                generation: 0,
                started: None,
                settled: None,
            }),
            changed: Condvar::new(),
        }
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_held(&self, slot: &Slot<T>) -> bool {
        slot.started
            .is_some_and(|started| started.elapsed() < self.release_after)
    }

    /// Whether a fetch currently holds the flag.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        let slot = self.lock();
        self.is_held(&slot)
    }

    /// Take the in-flight flag without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::InFlight`] while another fetch holds the flag.
    pub fn try_begin(&self) -> Result<FlightGuard<'_, T>, FlightError> {
        let mut slot = self.lock();
        if let Some(started) = slot.started {
            if self.is_held(&slot) {
                return Err(FlightError::InFlight {
                    resource: self.resource.clone(),
                    elapsed: started.elapsed(),
                });
            }
            warn!(
                resource = self.resource.as_str(),
                held_for = ?started.elapsed(),
                "in-flight flag expired, taking over"
            );
        }
        slot.generation += 1;
        slot.started = Some(Instant::now());
        Ok(FlightGuard {
            flight: self,
            generation: slot.generation,
            done: false,
        })
    }

    /// Fetch through the coordinator.
    ///
    /// The first caller runs `fetch`; callers arriving while it runs wait
    /// and receive the same result. If the leader's flag expires before it
    /// settles, the next waiter becomes leader and fetches again.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::Failed`] when the fetch this caller ran or
    /// waited on failed.
    pub fn run<F>(&self, fetch: F) -> Result<Arc<T>, FlightError>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        let mut fetch = Some(fetch);
        loop {
            match self.try_begin() {
                Ok(guard) => {
                    let Some(fetch) = fetch.take() else {
                        return Err(self.failed("fetch closure already consumed"));
                    };
                    return match fetch() {
                        Ok(value) => Ok(guard.complete(value)),
                        Err(err) => {
                            let message = format!("{err:#}");
                            guard.fail(&message);
                            Err(self.failed(&message))
                        }
                    };
                }
                Err(FlightError::InFlight { .. }) => {
                    if let Some(outcome) = self.wait_for_leader() {
                        debug!(resource = self.resource.as_str(), "joined in-flight fetch");
                        return outcome.map_err(|message| self.failed(&message));
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Block until the current leader settles (`Some`) or its flag is
    /// released without a result (`None`).
    fn wait_for_leader(&self) -> Option<Outcome<T>> {
        let mut slot = self.lock();
        let awaited = slot.generation;
        loop {
            if let Some((generation, outcome)) = &slot.settled {
                if *generation == awaited {
                    return Some(outcome.clone());
                }
            }
            if slot.generation != awaited || !self.is_held(&slot) {
                return None;
            }
            let remaining = slot
                .started
                .map_or(Duration::ZERO, |started| {
                    self.release_after.saturating_sub(started.elapsed())
                })
                .max(Duration::from_millis(1));
            slot = self
                .changed
                .wait_timeout(slot, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn failed(&self, message: &str) -> FlightError {
        FlightError::Failed {
            resource: self.resource.clone(),
            message: message.to_string(),
        }
    }

    fn settle(&self, generation: u64, outcome: Option<Outcome<T>>) {
        let mut slot = self.lock();
        if slot.generation != generation {
            debug!(
                resource = self.resource.as_str(),
                generation, "superseded fetch settled late, result dropped"
            );
            return;
        }
        slot.started = None;
        if let Some(outcome) = outcome {
            slot.settled = Some((generation, outcome));
        }
        drop(slot);
        self.changed.notify_all();
    }
}

/// Holder of the in-flight flag. Releases on drop.
#[derive(Debug)]
pub struct FlightGuard<'a, T> {
    flight: &'a SingleFlight<T>,
    generation: u64,
    done: bool,
}

impl<T> FlightGuard<'_, T> {
    /// Publish the fetched value to waiters and release the flag.
    pub fn complete(mut self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.done = true;
        self.flight
            .settle(self.generation, Some(Ok(Arc::clone(&value))));
        value
    }

    /// Publish a failure to waiters and release the flag.
    pub fn fail(mut self, message: &str) {
        self.done = true;
        self.flight
            .settle(self.generation, Some(Err(message.to_string())));
    }

    /// Release the flag without a result; waiters retry on their own.
    pub fn release(mut self) {
        self.done = true;
        self.flight.settle(self.generation, None);
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.done {
            self.flight.settle(self.generation, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FlightError, SingleFlight};
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn leader_result_is_returned() {
        let flight = SingleFlight::new("announcements", Duration::from_secs(1));
        let value = flight.run(|| Ok(vec!["Road closure"])).unwrap();
        assert_eq!(value.as_slice(), ["Road closure"]);
        assert!(!flight.is_in_flight());
    }

    #[test]
    fn concurrent_callers_share_one_fetch() {
        let flight = Arc::new(SingleFlight::new("announcements", Duration::from_secs(5)));
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Barrier::new(2));

        let leader = {
            let flight = Arc::clone(&flight);
            let calls = Arc::clone(&calls);
            let started = Arc::clone(&started);
            thread::spawn(move || {
                flight
                    .run(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        started.wait();
                        thread::sleep(Duration::from_millis(50));
                        Ok(42_u32)
                    })
                    .unwrap()
            })
        };

        started.wait();
        assert!(flight.is_in_flight());
        let follower = flight
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7_u32)
            })
            .unwrap();
        let leader = leader.join().unwrap();

        assert_eq!(*follower, 42);
        assert!(Arc::ptr_eq(&leader, &follower));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn try_begin_refuses_while_held() {
        let flight: SingleFlight<u32> = SingleFlight::new("stats", Duration::from_secs(5));
        let guard = flight.try_begin().unwrap();
        let err = flight.try_begin().unwrap_err();
        assert!(matches!(err, FlightError::InFlight { .. }));
        assert_eq!(err.code(), ErrorCode::FetchInFlight);
        assert!(err.hint().is_some());
        guard.release();
        assert!(flight.try_begin().is_ok());
    }

    #[test]
    fn configured_release_window_holds_the_flag() {
        let cfg = crate::config::FlightConfig::default();
        let flight: SingleFlight<u32> = SingleFlight::new("residents", cfg.release_after());
        let _guard = flight.try_begin().unwrap();
        assert!(matches!(
            flight.try_begin(),
            Err(FlightError::InFlight { .. })
        ));
    }

    #[test]
    fn dropping_guard_releases_flag() {
        let flight: SingleFlight<u32> = SingleFlight::new("stats", Duration::from_secs(5));
        {
            let _guard = flight.try_begin().unwrap();
            assert!(flight.is_in_flight());
        }
        assert!(!flight.is_in_flight());
    }

    #[test]
    fn expired_flag_is_taken_over() {
        let flight: SingleFlight<u32> = SingleFlight::new("stats", Duration::from_millis(20));
        let stale = flight.try_begin().unwrap();
        thread::sleep(Duration::from_millis(40));

        let fresh = flight.try_begin().unwrap();
        drop(stale);
        assert!(flight.is_in_flight(), "stale guard must not clear the new flag");
        assert_eq!(*fresh.complete(5), 5);
        assert!(!flight.is_in_flight());
    }

    #[test]
    fn failures_are_reported_and_release_the_flag() {
        let flight: SingleFlight<u32> = SingleFlight::new("residents", Duration::from_secs(1));
        let err = flight
            .run(|| Err(anyhow::anyhow!("503 Service Unavailable")))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FetchFailed);
        assert!(err.to_string().contains("503"));
        assert_eq!(*flight.run(|| Ok(1)).unwrap(), 1);
    }
}
