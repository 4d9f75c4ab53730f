//! A mutex and the condition variable bound to it.
use std::fmt::{self, Debug};

use parking_lot::{Condvar, Mutex, MutexGuard};

// -----------------------------------------------------------------------------
//              - Condition -
// -----------------------------------------------------------------------------
/// A value guarded by a mutex, together with a condition variable
/// that waiters on that value park on.
///
/// [`wait`] atomically releases the lock and parks the calling thread,
/// and reacquires the lock before returning.
/// [`signal`] wakes at most one parked thread and [`broadcast`] wakes all of them.
/// Neither is remembered: notifying a condition nobody waits on does nothing.
///
/// ```
/// # use std::thread;
/// # use std::sync::Arc;
/// use tether::sync::condition::Condition;
///
/// let ready = Arc::new(Condition::new(false));
/// let r = ready.clone();
///
/// let handle = thread::spawn(move || {
///     *r.lock() = true;
///     r.signal();
/// });
///
/// let mut guard = ready.lock();
/// ready.wait_while(&mut guard, |ready| !*ready);
/// assert!(*guard);
/// # drop(guard);
/// # handle.join().unwrap();
/// ```
///
/// [`wait`]: struct.Condition.html#method.wait
/// [`signal`]: struct.Condition.html#method.signal
/// [`broadcast`]: struct.Condition.html#method.broadcast
pub struct Condition<T> {
    lock: Mutex<T>,
    cond: Condvar,
}

impl<T> Condition<T> {
    /// Create a new condition guarding `value`
    pub fn new(value: T) -> Self {
        Self {
            lock: Mutex::new(value),
            cond: Condvar::new(),
        }
    }

    /// Acquire the lock
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.lock.lock()
    }

    /// Park until signalled.
    ///
    /// The guard has to come from this condition's [`lock`].
    /// Returning does not mean the state changed: always
    /// recheck whatever predicate the wait was for (or use [`wait_while`]).
    ///
    /// [`lock`]: struct.Condition.html#method.lock
    /// [`wait_while`]: struct.Condition.html#method.wait_while
    pub fn wait(&self, guard: &mut MutexGuard<'_, T>) {
        trace!("parking on condition");
        self.cond.wait(guard);
        trace!("woke on condition");
    }

    /// Park for as long as `predicate` holds, rechecking it after
    /// every wakeup.
    /// Returns the number of times the thread woke up before the
    /// predicate turned false.
    pub fn wait_while<F>(&self, guard: &mut MutexGuard<'_, T>, mut predicate: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut wakeups = 0;
        while predicate(&mut **guard) {
            self.wait(guard);
            wakeups += 1;
        }
        wakeups
    }

    /// Wake at most one parked thread.
    /// Returns `true` if a thread was woken.
    pub fn signal(&self) -> bool {
        self.cond.notify_one()
    }

    /// Wake every parked thread.
    /// Returns the number of threads woken.
    pub fn broadcast(&self) -> usize {
        self.cond.notify_all()
    }

    /// Consume the condition, returning the guarded value
    pub fn into_inner(self) -> T {
        self.lock.into_inner()
    }
}

impl<T: Default> Default for Condition<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Debug> Debug for Condition<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Condition")
            .field("lock", &self.lock)
            .finish()
    }
}
