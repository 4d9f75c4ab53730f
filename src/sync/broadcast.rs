//! Broadcast
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::errors::{Error, Result};

use super::condition::Condition;
use super::{Dispatch, WaitGroup};

#[derive(Debug, Default)]
struct Event {
    fired: bool,
    // Registered, but not yet parked
    pending: usize,
    parked: usize,
    subscribed: usize,
    last_id: usize,
}

impl Event {
    fn register(&mut self) -> usize {
        self.pending += 1;
        self.subscribed += 1;
        self.last_id += 1;
        self.last_id
    }

    // Undo `register` for an observer that never started
    fn cancel(&mut self, id: usize) {
        self.pending -= 1;
        self.subscribed -= 1;
        if self.last_id == id {
            self.last_id -= 1;
        }
    }
}

struct Shared {
    event: Condition<Event>,
    panicked: AtomicUsize,
}

// -----------------------------------------------------------------------------
//              - Broadcast registry -
//              one event, many observers, fired once
// -----------------------------------------------------------------------------
/// Run any number of handlers once a single event fires.
///
/// Every subscriber gets its own observer thread parked on the event.
/// [`subscribe`] only returns once that thread is parked, so firing
/// right after subscribing never misses an observer.
///
/// The event is single-shot: once fired the registry is spent and
/// neither [`fire`] nor [`subscribe`] can be called again.
///
/// ```
/// # use std::sync::Arc;
/// # use std::sync::atomic::{AtomicUsize, Ordering};
/// use tether::sync::broadcast::BroadcastRegistry;
///
/// let clicks = Arc::new(AtomicUsize::new(0));
/// let button = BroadcastRegistry::new();
///
/// for _ in 0..3 {
///     let clicks = clicks.clone();
///     button
///         .subscribe(move || {
///             clicks.fetch_add(1, Ordering::SeqCst);
///         })
///         .unwrap();
/// }
///
/// assert_eq!(button.fire_and_join().unwrap(), 3);
/// assert_eq!(clicks.load(Ordering::SeqCst), 3);
/// ```
///
/// Dropping the registry without firing it leaves the observer threads
/// parked until the process exits.
///
/// [`subscribe`]: struct.BroadcastRegistry.html#method.subscribe
/// [`fire`]: struct.BroadcastRegistry.html#method.fire
pub struct BroadcastRegistry {
    shared: Arc<Shared>,
    done: WaitGroup,
    dispatch: Dispatch,
}

impl BroadcastRegistry {
    /// Create a registry running handlers with `Dispatch::Parallel`
    pub fn new() -> Self {
        Self::with_dispatch(Dispatch::default())
    }

    /// Create a registry with a specific dispatch
    pub fn with_dispatch(dispatch: Dispatch) -> Self {
        Self {
            shared: Arc::new(Shared {
                event: Condition::new(Event::default()),
                panicked: AtomicUsize::new(0),
            }),
            done: WaitGroup::new(),
            dispatch,
        }
    }

    /// How handlers are run
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Register a handler to run once when the event fires.
    ///
    /// Blocks until the observer thread running `handler` is parked
    /// on the event, and returns the observer's id.
    ///
    /// Returns `Error::Spent` if the event already fired.
    pub fn subscribe<F>(&self, handler: F) -> Result<usize>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = {
            let mut event = self.shared.event.lock();
            if event.fired {
                error!("subscribe after the event fired");
                return Err(Error::Spent);
            }
            event.register()
        };

        let parked = WaitGroup::new();
        let handshake = parked.clone();
        let done = self.done.clone();
        let shared = self.shared.clone();
        let dispatch = self.dispatch;

        let spawned = thread::Builder::new()
            .name(format!("observer-{}", id))
            .spawn(move || {
                observe(&shared, dispatch, id, handshake, handler);
                drop(done);
            });

        if let Err(e) = spawned {
            error!("failed to spawn observer {}: {}", id, e);
            self.shared.event.lock().cancel(id);
            return Err(e.into());
        }

        parked.wait();
        debug!("observer {} parked", id);
        Ok(id)
    }

    /// Fire the event, waking every parked observer.
    ///
    /// Returns the number of observers that were parked on the event.
    /// Returns `Error::AlreadyFired` if called more than once.
    pub fn fire(&self) -> Result<usize> {
        let mut event = self.shared.event.lock();
        if event.fired {
            error!("event fired twice");
            return Err(Error::AlreadyFired);
        }

        event.fired = true;
        let parked = event.parked;
        let woken = self.shared.event.broadcast();
        debug!("event fired: parked = {}, woken = {}, pending = {}", parked, woken, event.pending);
        Ok(parked)
    }

    /// Wait for every handler to finish.
    ///
    /// Handlers only run once the event fired, so joining an unfired
    /// registry returns `Error::NotFired` instead of blocking forever.
    /// Returns `Error::TaskPanicked` if any handler panicked.
    pub fn join(self) -> Result<()> {
        if !self.is_fired() {
            error!("join before the event fired");
            return Err(Error::NotFired);
        }

        let BroadcastRegistry { shared, done, .. } = self;
        done.wait();

        match shared.panicked.load(Ordering::SeqCst) {
            0 => Ok(()),
            n => Err(Error::TaskPanicked(n)),
        }
    }

    /// Fire the event and wait for every handler to finish.
    /// Returns the number of observers that were parked.
    pub fn fire_and_join(self) -> Result<usize> {
        let parked = self.fire()?;
        self.join()?;
        Ok(parked)
    }

    /// `true` once the event fired
    pub fn is_fired(&self) -> bool {
        self.shared.event.lock().fired
    }

    /// Number of observers currently parked on the event
    pub fn parked(&self) -> usize {
        self.shared.event.lock().parked
    }

    /// Number of observers registered but not yet parked
    pub fn pending(&self) -> usize {
        self.shared.event.lock().pending
    }

    /// Total number of subscribers
    pub fn subscribed(&self) -> usize {
        self.shared.event.lock().subscribed
    }
}

impl Default for BroadcastRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BroadcastRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BroadcastRegistry")
            .field("event", &self.shared.event)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

// Body of an observer thread
fn observe<F: FnOnce()>(shared: &Shared, dispatch: Dispatch, id: usize, handshake: WaitGroup, handler: F) {
    let mut event = shared.event.lock();
    event.pending -= 1;
    event.parked += 1;

    // Still holding the lock: `fire` can not broadcast until `wait`
    // below has released it, by which point this thread is parked.
    drop(handshake);
    shared.event.wait_while(&mut event, |event| !event.fired);
    event.parked -= 1;
    trace!("observer {} woke", id);

    let outcome = match dispatch {
        Dispatch::Parallel => {
            drop(event);
            panic::catch_unwind(AssertUnwindSafe(handler))
        }
        Dispatch::Serialized => {
            let outcome = panic::catch_unwind(AssertUnwindSafe(handler));
            drop(event);
            outcome
        }
    };

    if outcome.is_err() {
        error!("observer {} handler panicked", id);
        shared.panicked.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_returns_parked() -> Result<()> {
        let registry = BroadcastRegistry::new();
        for n in 1..=3 {
            assert_eq!(registry.subscribe(|| {})?, n);
            assert_eq!(registry.parked(), n);
            assert_eq!(registry.pending(), 0);
        }
        assert_eq!(registry.fire_and_join()?, 3);
        Ok(())
    }

    #[test]
    fn cancelled_registration_is_forgotten() {
        let mut event = Event::default();
        assert_eq!(event.register(), 1);
        assert_eq!(event.register(), 2);

        event.cancel(2);
        assert_eq!(event.subscribed, 1);
        assert_eq!(event.pending, 1);
        assert_eq!(event.register(), 2);

        // Ids handed out after the cancelled one are never reused
        event.cancel(1);
        assert_eq!(event.subscribed, 1);
        assert_eq!(event.register(), 3);
    }

    #[test]
    fn spurious_wakeup_does_not_run_handlers() -> Result<()> {
        let registry = BroadcastRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let runs = runs.clone();
            registry.subscribe(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            })?;
        }

        // Wake every observer without firing
        let woken = {
            let _event = registry.shared.event.lock();
            registry.shared.event.broadcast()
        };
        assert_eq!(woken, 2);

        thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(registry.parked(), 2);
        assert!(!registry.is_fired());

        assert_eq!(registry.fire_and_join()?, 2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn fire_without_subscribers() -> Result<()> {
        let registry = BroadcastRegistry::new();
        assert_eq!(registry.fire()?, 0);
        assert!(registry.is_fired());
        registry.join()
    }

    #[test]
    fn join_unfired() {
        let registry = BroadcastRegistry::new();
        match registry.join() {
            Err(Error::NotFired) => {}
            other => panic!("expected NotFired, got {:?}", other),
        }
    }
}
