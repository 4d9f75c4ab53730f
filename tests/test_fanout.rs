use std::sync::Arc;

use crossbeam::channel::unbounded;
use parking_lot::Mutex;

use tether::errors::{Error, Result};
use tether::fanout::fan_out;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn greeters() -> Result<()> {
    init_logger();
    let (tx, rx) = unbounded();

    fan_out(5, move |id| {
        let _ = tx.send(format!("Hello from {}", id));
    })?;

    // Every worker is done once fan_out returns
    let mut greetings: Vec<String> = rx.try_iter().collect();
    greetings.sort();
    assert_eq!(
        greetings,
        (1..=5).map(|id| format!("Hello from {}", id)).collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn nothing_to_do() -> Result<()> {
    fan_out(0, |_| panic!("no workers"))
}

#[test]
fn panicking_worker_still_joins_the_rest() {
    init_logger();
    let done = Arc::new(Mutex::new(Vec::new()));
    let d = done.clone();

    let result = fan_out(4, move |id| {
        if id == 3 {
            panic!("worker {} failed", id);
        }
        d.lock().push(id);
    });

    match result {
        Err(Error::TaskPanicked(1)) => {}
        other => panic!("expected TaskPanicked(1), got {:?}", other),
    }
    let mut done = done.lock().clone();
    done.sort();
    assert_eq!(done, vec![1, 2, 4]);
}
