use std::time::Duration;

use log::info;
use tether::errors::Result;
use tether::sync::queue::BoundedQueue;

// -----------------------------------------------------------------------------
// 		- Queue -
// 		Ten items through a queue with room for two,
// 		each item is removed a second after it was added
// -----------------------------------------------------------------------------
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let queue = BoundedQueue::new(2);
    let stats = queue.produce(10, Duration::from_secs(1), |round| {
        info!("adding {} to queue", round);
        round
    })?;

    info!("{:?}", stats);
    Ok(())
}
