//! Bounded producer / consumer queue
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;

use crate::errors::{Error, Result};

use super::condition::Condition;

// -----------------------------------------------------------------------------
// 		- Produce stats -
// -----------------------------------------------------------------------------
/// What happened during [`BoundedQueue::produce`].
///
/// [`BoundedQueue::produce`]: struct.BoundedQueue.html#method.produce
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProduceStats {
    /// Number of items produced
    pub rounds: usize,
    /// Number of rounds that found the queue full and had to wait for room
    pub waits: usize,
    /// Total number of wakeups while waiting for room
    pub wakeups: usize,
    /// Largest number of items observed in the queue
    pub peak: usize,
    /// Number of items removed by the scheduled consumers
    pub removed: usize,
    /// When each round's item was added to the queue
    pub accepted: Vec<Instant>,
}

// -----------------------------------------------------------------------------
// 		- Bounded queue -
// -----------------------------------------------------------------------------
/// A FIFO queue with a fixed capacity.
///
/// Producers wait for room on a condition variable and every removal
/// signals that condition, waking at most one waiting producer.
/// A woken producer always rechecks the queue before adding to it.
///
/// ```
/// # use std::time::Duration;
/// use tether::sync::queue::BoundedQueue;
///
/// let queue = BoundedQueue::new(2);
/// let stats = queue.produce(4, Duration::from_millis(10), |round| round).unwrap();
///
/// assert_eq!(stats.removed, 4);
/// assert!(stats.peak <= 2);
/// assert!(queue.is_empty());
/// ```
pub struct BoundedQueue<T> {
    items: Condition<VecDeque<T>>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be > 0");
        Self {
            items: Condition::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// The fixed capacity of the queue
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently in the queue
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// `true` if the queue holds no items
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// `true` if there is no room left in the queue
    pub fn is_full(&self) -> bool {
        self.items.lock().len() >= self.capacity
    }

    /// Append a token without waiting for room.
    ///
    /// Capacity is only enforced by producers waiting for room
    /// ([`put`] and [`produce`]), so mixing those with `enqueue`
    /// is up to the caller.
    ///
    /// [`put`]: struct.BoundedQueue.html#method.put
    /// [`produce`]: struct.BoundedQueue.html#method.produce
    pub fn enqueue(&self, token: T) {
        let mut items = self.items.lock();
        items.push_back(token);
        if items.len() > self.capacity {
            warn!("enqueue past capacity: len = {}, capacity = {}", items.len(), self.capacity);
        }
    }

    /// Sleep for `after`, then remove the oldest item and signal
    /// one producer waiting for room.
    ///
    /// The sleep is a plain delay and the lock is not held while sleeping.
    /// Returns `Error::EmptyQueue` if there is nothing to remove.
    pub fn dequeue(&self, after: Duration) -> Result<T> {
        thread::sleep(after);

        let mut items = self.items.lock();
        let token = match items.pop_front() {
            Some(token) => token,
            None => {
                error!("dequeue on an empty queue");
                return Err(Error::EmptyQueue);
            }
        };

        // Signal after the removal and while still holding the lock
        let woke = self.items.signal();
        debug!("removed from queue: len = {}, woke producer = {}", items.len(), woke);
        Ok(token)
    }

    /// Wait for room, then append a token.
    ///
    /// Returns the number of times the producer was woken
    /// before there was room.
    pub fn put(&self, token: T) -> usize {
        let (mut items, wakeups) = self.wait_for_room();
        items.push_back(token);
        trace!("put: len = {}", items.len());
        wakeups
    }

    fn wait_for_room(&self) -> (MutexGuard<'_, VecDeque<T>>, usize) {
        let capacity = self.capacity;
        let mut items = self.items.lock();
        let wakeups = self.items.wait_while(&mut items, |items| {
            let full = items.len() >= capacity;
            if full {
                debug!("waiting for room: len = {}", items.len());
            }
            full
        });
        (items, wakeups)
    }
}

impl<T: Send> BoundedQueue<T> {
    /// Run `rounds` producer rounds.
    ///
    /// Each round creates `token(round)`, waits for room, appends the token
    /// and schedules a consumer that removes an item after `delay`.
    /// `token` runs before the queue is locked, so it may use the queue.
    /// Returns once every scheduled consumer has finished.
    ///
    /// The first error a consumer runs into is returned, otherwise
    /// `Error::TaskPanicked` if any consumer panicked.
    pub fn produce<F>(&self, rounds: usize, delay: Duration, mut token: F) -> Result<ProduceStats>
    where
        F: FnMut(usize) -> T,
    {
        let outcome = crossbeam::scope(|scope| -> Result<ProduceStats> {
            let mut stats = ProduceStats::default();
            let mut consumers = Vec::with_capacity(rounds);

            for round in 0..rounds {
                let item = token(round);
                let (mut items, wakeups) = self.wait_for_room();
                if wakeups > 0 {
                    stats.waits += 1;
                    stats.wakeups += wakeups;
                }

                items.push_back(item);
                stats.accepted.push(Instant::now());
                stats.rounds += 1;
                stats.peak = stats.peak.max(items.len());
                debug!("round {}: item added, len = {}", round, items.len());

                let consumer = scope
                    .builder()
                    .name(format!("consumer-{}", round))
                    .spawn(move |_| self.dequeue(delay))?;
                consumers.push(consumer);
                trace!("round {}: consumer scheduled", round);
            }

            let mut failure = None;
            let mut panicked = 0;
            for consumer in consumers {
                match consumer.join() {
                    Ok(Ok(_)) => stats.removed += 1,
                    Ok(Err(e)) => {
                        if failure.is_none() {
                            failure = Some(e);
                        }
                    }
                    Err(_) => panicked += 1,
                }
            }

            match failure {
                Some(e) => Err(e),
                None if panicked > 0 => Err(Error::TaskPanicked(panicked)),
                None => Ok(stats),
            }
        });

        outcome.map_err(|_| Error::TaskPanicked(1))?
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn fifo_order() -> Result<()> {
        let queue = BoundedQueue::new(3);
        queue.enqueue("a");
        queue.enqueue("b");
        queue.enqueue("c");
        assert!(queue.is_full());
        assert_eq!(queue.dequeue(Duration::ZERO)?, "a");
        assert_eq!(queue.dequeue(Duration::ZERO)?, "b");
        assert_eq!(queue.dequeue(Duration::ZERO)?, "c");
        assert!(queue.is_empty());
        Ok(())
    }

    #[test]
    fn dequeue_empty() {
        let queue = BoundedQueue::<u8>::new(1);
        match queue.dequeue(Duration::ZERO) {
            Err(Error::EmptyQueue) => {}
            other => panic!("expected EmptyQueue, got {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "queue capacity must be > 0")]
    fn zero_capacity() {
        let _ = BoundedQueue::<u8>::new(0);
    }

    #[test]
    fn put_with_room_does_not_wait() {
        let queue = BoundedQueue::new(2);
        assert_eq!(queue.put(1), 0);
        assert_eq!(queue.put(2), 0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn token_fn_can_use_the_queue() -> Result<()> {
        let queue = Arc::new(BoundedQueue::new(2));
        let (tx, rx) = crossbeam::channel::unbounded();

        let q = queue.clone();
        thread::spawn(move || {
            let stats = q.produce(3, Duration::from_millis(10), |round| {
                assert!(q.len() <= 2);
                round
            });
            let _ = tx.send(stats);
        });

        let stats = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("produce never returned")?;
        assert_eq!(stats.rounds, 3);
        assert_eq!(stats.removed, 3);
        assert_eq!(stats.accepted.len(), 3);
        Ok(())
    }

    #[test]
    fn woken_producer_rechecks_for_room() -> Result<()> {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.enqueue(1);

        let done = Arc::new(AtomicBool::new(false));
        let (q, d) = (queue.clone(), done.clone());
        let producer = thread::spawn(move || {
            let wakeups = q.put(2);
            d.store(true, Ordering::SeqCst);
            wakeups
        });

        // Wake the producer without making any room
        while !queue.items.signal() {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.dequeue(Duration::ZERO)?, 1);
        let wakeups = producer.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert!(wakeups >= 2);
        assert_eq!(queue.dequeue(Duration::ZERO)?, 2);
        Ok(())
    }
}
