#![deny(missing_docs)]
//! # Tether
//!
//! Coordination built on a mutex guarded condition variable:
//!
//! * [`BoundedQueue`]: producers wait for room, every removal signals one of them.
//! * [`BroadcastRegistry`]: observers park on a single event and are all
//! released when it fires.
//! * [`fan_out`]: run a fixed number of threads and join them on a counting barrier.
//!
//! [`BoundedQueue`]: sync/queue/struct.BoundedQueue.html
//! [`BroadcastRegistry`]: sync/broadcast/struct.BroadcastRegistry.html
//! [`fan_out`]: fanout/fn.fan_out.html
#[macro_use] extern crate log;

pub mod sync;
pub mod fanout;
pub mod errors;

// Pub uses
pub use sync::queue::{BoundedQueue, ProduceStats};
pub use sync::broadcast::BroadcastRegistry;
pub use sync::condition::Condition;
pub use sync::{Dispatch, WaitGroup};
pub use fanout::fan_out;
