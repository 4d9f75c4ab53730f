//! Tether default `Error`
use std::fmt;

/// Result type: `std::result::Error<T, Error>`
pub type Result<T> = std::result::Result<T, Error>;


/// Wrapping error type.
#[derive(Debug)]
pub enum Error {
    /// std::io::Error, raised when a thread could not be spawned
    Io(std::io::Error),

    /// A dequeue was attempted on an empty queue.
    /// Consumers are only ever scheduled after an item was added,
    /// so this means the scheduling upstream is broken.
    EmptyQueue,

    /// The event was already fired.
    /// An event fires once and can not be re-armed
    AlreadyFired,

    /// The registry has fired and no longer accepts subscribers
    Spent,

    /// Joined the handlers of an event that never fired
    NotFired,

    /// One or more spawned tasks panicked
    TaskPanicked(usize),
}

impl Error {
    /// `true` if the error is the result of breaking one of the
    /// invariants of the queue or the event, rather than an
    /// environmental failure.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Error::EmptyQueue | Error::AlreadyFired | Error::Spent | Error::NotFired => true,
            Error::Io(_) | Error::TaskPanicked(_) => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::EmptyQueue => write!(f, "invariant violation: dequeue on an empty queue"),
            Error::AlreadyFired => write!(f, "invariant violation: event already fired"),
            Error::Spent => write!(f, "invariant violation: subscribe after the event fired"),
            Error::NotFired => write!(f, "invariant violation: join before the event fired"),
            Error::TaskPanicked(n) => write!(f, "{} task(s) panicked", n),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}


// -----------------------------------------------------------------------------
// 		- IO error -
// -----------------------------------------------------------------------------
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_violations() {
        assert!(Error::EmptyQueue.is_invariant_violation());
        assert!(Error::AlreadyFired.is_invariant_violation());
        assert!(Error::Spent.is_invariant_violation());
        assert!(Error::NotFired.is_invariant_violation());
        assert!(!Error::TaskPanicked(1).is_invariant_violation());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads");
        assert!(!Error::from(io).is_invariant_violation());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::TaskPanicked(2).to_string(),
            "2 task(s) panicked"
        );
        assert!(Error::EmptyQueue.to_string().starts_with("invariant violation"));
    }
}
