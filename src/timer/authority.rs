//! Timer Authority: the single owner of canonical timer state
//!
//! All commands funnel through one mutex so no two mutations race, and every
//! run carries an epoch so a tick loop left over from a replaced run cannot
//! act after a new run has begun. Persistence writes and broadcasts are
//! fire-and-forget; the in-memory state stays authoritative for the running
//! process even when the store is unreachable.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::timer_state::{now_ms, TimerState};
use crate::store::{TimerStore, TIMER_KEY, TIMER_TTL};
use crate::timer::events::{TimerEvent, TimerStateReply};

/// Capacity of the event fan-out channel. An observer that falls further
/// behind than this skips ahead to the newest event.
const EVENT_CAPACITY: usize = 256;

/// Owner of the process-wide shared timer.
///
/// Constructed once at startup; handlers and the WebSocket layer hold it
/// behind an [`Arc`] and interact with it only through the command methods.
pub struct TimerAuthority {
    inner: Mutex<Inner>,
    store: Arc<dyn TimerStore>,
    events: broadcast::Sender<TimerEvent>,
    default_duration_ms: i64,
    tick_interval: Duration,
}

#[derive(Default)]
struct Inner {
    /// Canonical timer state; `None` while idle
    timer: Option<TimerState>,
    /// Run epoch, bumped on every start/stop/reset so a stale tick loop
    /// can detect it has been superseded
    epoch: u64,
    /// Handle of the current tick loop, aborted on cancel-and-replace
    ticker: Option<JoinHandle<()>>,
}

impl TimerAuthority {
    /// Create an idle authority backed by `store`
    pub fn new(
        store: Arc<dyn TimerStore>,
        default_duration_ms: i64,
        tick_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            store,
            events,
            default_duration_ms,
            tick_interval,
        }
    }

    /// Subscribe to the broadcast event stream
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    /// Number of currently attached observers
    pub fn observer_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Start a new run, replacing any run already in flight.
    ///
    /// A non-positive or absent `duration` falls back to the configured
    /// default. Always succeeds: replacement is last-writer-wins, with no
    /// error and no merge.
    pub fn start(self: &Arc<Self>, duration: Option<i64>) -> Result<TimerState, String> {
        let duration = duration
            .filter(|d| *d > 0)
            .unwrap_or(self.default_duration_ms);
        let timer = TimerState::started(now_ms(), duration);

        {
            let mut inner = self.lock_inner()?;
            inner.epoch += 1;
            if let Some(ticker) = inner.ticker.take() {
                ticker.abort();
            }
            inner.timer = Some(timer.clone());
            inner.ticker = Some(self.spawn_ticker(inner.epoch));
        }

        info!(
            "Timer started: duration={}ms, end_time={}",
            timer.duration, timer.end_time
        );
        self.persist(timer.clone());
        self.broadcast(TimerEvent::TimerStarted {
            start_time: timer.start_time,
            end_time: timer.end_time,
            duration: timer.duration,
        });
        Ok(timer)
    }

    /// Stop the running timer. Returns `false` (silently) when idle.
    pub fn stop(&self) -> Result<bool, String> {
        let stopped = {
            let mut inner = self.lock_inner()?;
            match inner.timer.take() {
                Some(mut timer) => {
                    inner.epoch += 1;
                    if let Some(ticker) = inner.ticker.take() {
                        ticker.abort();
                    }
                    timer.is_active = false;
                    Some(timer)
                }
                None => None,
            }
        };

        let Some(timer) = stopped else {
            debug!("Stop requested with no timer running");
            return Ok(false);
        };

        info!("Timer stopped");
        self.broadcast(TimerEvent::TimerStopped);

        // Record the inactive snapshot, then clear the entry. One task, so
        // the put cannot land after the delete.
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match serde_json::to_string(&timer) {
                Ok(json) => {
                    if let Err(e) = store.put(TIMER_KEY, json, TIMER_TTL).await {
                        warn!("Failed to persist stopped timer: {}", e);
                    }
                }
                Err(e) => warn!("Failed to serialize stopped timer: {}", e),
            }
            if let Err(e) = store.delete(TIMER_KEY).await {
                warn!("Failed to clear persisted timer: {}", e);
            }
        });
        Ok(true)
    }

    /// Clear the timer unconditionally. Unlike [`stop`](Self::stop) the
    /// `TIMER_RESET` broadcast goes out even when already idle.
    pub fn reset(&self) -> Result<(), String> {
        {
            let mut inner = self.lock_inner()?;
            inner.epoch += 1;
            if let Some(ticker) = inner.ticker.take() {
                ticker.abort();
            }
            inner.timer = None;
        }

        info!("Timer reset");
        self.clear_persisted();
        self.broadcast(TimerEvent::TimerReset);
        Ok(())
    }

    /// Current timer state for a single requesting observer.
    ///
    /// Hydrates canonical state from the store when absent (the path that
    /// serves the first query after a restart of a non-recovered process).
    /// A hydrated or canonical run whose time already ran out is flipped
    /// inactive and the flipped copy persisted. This never starts the tick
    /// loop; only [`start`](Self::start) and recovery do.
    pub async fn query(&self) -> Result<TimerStateReply, String> {
        let needs_hydration = self.lock_inner()?.timer.is_none();
        if needs_hydration {
            if let Some(recovered) = self.load_persisted().await {
                let mut inner = self.lock_inner()?;
                // another command may have won the race while we were reading
                if inner.timer.is_none() {
                    inner.timer = Some(recovered);
                }
            }
        }

        let now = now_ms();
        let (reply, expired) = {
            let mut inner = self.lock_inner()?;
            match inner.timer.as_mut() {
                Some(timer) if timer.is_active => {
                    let time_left = timer.time_left(now);
                    if time_left > 0 {
                        (
                            TimerStateReply::active(time_left, timer.start_time, timer.end_time),
                            None,
                        )
                    } else {
                        timer.is_active = false;
                        (TimerStateReply::inactive(), Some(timer.clone()))
                    }
                }
                _ => (TimerStateReply::inactive(), None),
            }
        };

        if let Some(timer) = expired {
            debug!("Query found an expired run, flipping inactive");
            self.persist(timer);
        }
        Ok(reply)
    }

    /// Restore persisted state after a process restart.
    ///
    /// Called once at boot, before any observer connects; nothing is
    /// broadcast from here. An unexpired active run resumes its tick loop
    /// without re-emitting `TIMER_STARTED`; anything else is dead weight and
    /// the store entry is cleared.
    pub async fn recover(self: &Arc<Self>) -> Result<(), String> {
        let Some(timer) = self.load_persisted().await else {
            return Ok(());
        };

        let now = now_ms();
        if timer.is_active && !timer.is_expired(now) {
            info!("Recovered running timer: {}ms left", timer.time_left(now));
            let mut inner = self.lock_inner()?;
            inner.epoch += 1;
            inner.timer = Some(timer);
            inner.ticker = Some(self.spawn_ticker(inner.epoch));
        } else {
            info!("Persisted timer already over, clearing");
            self.clear_persisted();
        }
        Ok(())
    }

    /// Spawn the periodic broadcast loop for the run identified by `epoch`
    fn spawn_ticker(self: &Arc<Self>, epoch: u64) -> JoinHandle<()> {
        let authority = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(authority.tick_interval);
            // the first interval tick completes immediately; updates should
            // begin one full period after start
            interval.tick().await;
            loop {
                interval.tick().await;
                if !authority.tick(epoch) {
                    break;
                }
            }
        })
    }

    /// One tick of the periodic loop. Returns `false` once this loop has
    /// been superseded or the run is over.
    fn tick(&self, epoch: u64) -> bool {
        let now = now_ms();
        let (update, terminal) = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    warn!("Failed to lock timer state in tick: {}", e);
                    return false;
                }
            };
            if inner.epoch != epoch {
                // a newer run replaced this one between scheduling and firing
                return false;
            }
            let Some(timer) = inner.timer.as_ref() else {
                return false;
            };

            let time_left = timer.time_left(now);
            let update = TimerEvent::TimerUpdate {
                is_active: timer.is_active,
                time_left,
                start_time: timer.start_time,
                end_time: timer.end_time,
            };

            if time_left <= 0 {
                // terminal transition happens under the same lock that
                // decides it, so TIMER_ENDED can fire at most once
                let ended = timer.is_active;
                inner.timer = None;
                inner.ticker = None;
                (update, Some(ended))
            } else {
                (update, None)
            }
        };

        self.broadcast(update);
        match terminal {
            Some(ended) => {
                if ended {
                    info!("Timer ended");
                    self.broadcast(TimerEvent::TimerEnded);
                }
                self.clear_persisted();
                false
            }
            None => true,
        }
    }

    /// Read and deserialize the persisted timer; malformed payloads fail
    /// closed (logged, entry cleared, treated as absent)
    async fn load_persisted(&self) -> Option<TimerState> {
        match self.store.get(TIMER_KEY).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(timer) => Some(timer),
                Err(e) => {
                    warn!("Malformed persisted timer, discarding: {}", e);
                    self.clear_persisted();
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read persisted timer: {}", e);
                None
            }
        }
    }

    /// Write-through persistence, detached from the caller's response path
    fn persist(&self, timer: TimerState) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match serde_json::to_string(&timer) {
                Ok(json) => {
                    if let Err(e) = store.put(TIMER_KEY, json, TIMER_TTL).await {
                        warn!("Failed to persist timer state: {}", e);
                    }
                }
                Err(e) => warn!("Failed to serialize timer state: {}", e),
            }
        });
    }

    /// Remove the persisted entry, detached from the caller's response path
    fn clear_persisted(&self) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.delete(TIMER_KEY).await {
                warn!("Failed to clear persisted timer: {}", e);
            }
        });
    }

    fn broadcast(&self, event: TimerEvent) {
        // send fails only when no observer is connected
        let _ = self.events.send(event);
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner>, String> {
        self.inner
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }
}
