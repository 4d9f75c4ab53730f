//! Fixed size fan-out, joined on a counting barrier.
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::errors::{Error, Result};
use crate::sync::WaitGroup;

/// Run `work` on `n` threads and block until every one of them is done.
///
/// Each thread receives its id, `1..=n`.
/// Panics inside `work` are caught, the remaining threads still run to
/// completion and the number of panicked threads is returned as
/// `Error::TaskPanicked`.
///
/// ```
/// # use std::sync::atomic::{AtomicUsize, Ordering};
/// # use std::sync::Arc;
/// use tether::fanout::fan_out;
///
/// let greeted = Arc::new(AtomicUsize::new(0));
/// let g = greeted.clone();
/// fan_out(5, move |_id| { g.fetch_add(1, Ordering::SeqCst); }).unwrap();
/// assert_eq!(greeted.load(Ordering::SeqCst), 5);
/// ```
pub fn fan_out<F>(n: usize, work: F) -> Result<()>
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let panicked = Arc::new(AtomicUsize::new(0));
    let finished = WaitGroup::new();

    let mut spawn_err = None;
    for id in 1..=n {
        let work = work.clone();
        let panicked = panicked.clone();
        let done = finished.clone();

        let spawned = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                if panic::catch_unwind(AssertUnwindSafe(|| work(id))).is_err() {
                    error!("worker {} panicked", id);
                    panicked.fetch_add(1, Ordering::SeqCst);
                }
                drop(done);
            });

        if let Err(e) = spawned {
            error!("failed to spawn worker {}: {}", id, e);
            spawn_err = Some(e);
            break;
        }
    }

    // Join whatever was spawned, even when spawning failed part way
    finished.wait();
    debug!("fan-out of {} joined", n);

    if let Some(e) = spawn_err {
        return Err(e.into());
    }

    match panicked.load(Ordering::SeqCst) {
        0 => Ok(()),
        count => Err(Error::TaskPanicked(count)),
    }
}
