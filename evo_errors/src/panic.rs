//! Bridge between `Result` returns and panics.
//!
//! [`check`], [`get`] and [`run`] promote an `Err` to a panic whose payload is
//! an [`Error`], for call sites that prefer to short-circuit. [`catch`] is the
//! way back: it recovers such a panic, but only when the payload matches a
//! given error, and lets every other panic keep unwinding.
//!
//! [`run_set`] is the non-panicking sibling for cleanup sequences: failures
//! are joined into a slot instead of aborting the sequence.

use std::panic::{self, UnwindSafe};

use tracing::{debug, trace};

use crate::chain::is;
use crate::error::Error;

/// Panic with the error if `result` is `Err`, otherwise do nothing.
///
/// The panic payload is the [`Error`] itself (the same identity when `E` is
/// already [`Error`]), so [`catch`] and `catch_unwind` can recover it.
#[track_caller]
pub fn check<E>(result: Result<(), E>)
where
    Error: From<E>,
{
    if let Err(error) = result {
        panic::panic_any(Error::from(error));
    }
}

/// Unwrap `result`, panicking with its error as in [`check`].
#[track_caller]
pub fn get<T, E>(result: Result<T, E>) -> T
where
    Error: From<E>,
{
    match result {
        Ok(value) => value,
        Err(error) => panic::panic_any(Error::from(error)),
    }
}

/// Call `f` and [`check`] what it returns.
#[track_caller]
pub fn run<F, E>(f: F)
where
    F: FnOnce() -> Result<(), E>,
    Error: From<E>,
{
    check(f());
}

/// Call `f`; if it fails, join its error into `slot`.
///
/// Never panics. Errors accumulate across calls: an empty slot becomes a
/// one-member join, and further failures are appended to that join, so every
/// failure is a direct member of [`crate::unwraps`] on the final value.
///
/// Only joins started by `run_set` are appended to. A slot seeded with any
/// other error, a [`crate::join`] result included, keeps that error intact
/// as the first member.
#[track_caller]
pub fn run_set<F, E>(f: F, slot: &mut Option<Error>)
where
    F: FnOnce() -> Result<(), E>,
    Error: From<E>,
{
    if let Err(error) = f() {
        let error = Error::from(error);
        *slot = Some(match slot.take() {
            Some(previous) => previous.accumulate_with(error),
            None => Error::accumulate(error),
        });
    }
}

/// Run `body`, recovering a panic only if it carries `target`.
///
/// - `body` returns normally: `Some(value)`.
/// - `body` panics with a payload that is not an [`Error`], or with an
///   [`Error`] that does not contain `target` (see [`crate::is`]): the
///   original panic is resumed unchanged.
/// - `body` panics with a matching [`Error`]: `handler` receives it. If the
///   handler returns `Ok(())` the panic is absorbed and `catch` returns
///   `None`; if it returns `Err(new)`, `new` is raised as a fresh panic.
///
/// ```rust
/// use evo_errors::{catch, check, Error};
///
/// let not_found = Error::msg("not found");
/// let sentinel = not_found.clone();
/// let out = catch(&not_found, move || check(Err(sentinel)), |_| Ok(()));
/// assert!(out.is_none());
/// ```
#[track_caller]
pub fn catch<T, F, H>(target: &Error, body: F, handler: H) -> Option<T>
where
    F: FnOnce() -> T + UnwindSafe,
    H: FnOnce(Error) -> Result<(), Error>,
{
    let payload = match panic::catch_unwind(body) {
        Ok(value) => return Some(value),
        Err(payload) => payload,
    };

    let error = match payload.downcast::<Error>() {
        Ok(error) => *error,
        Err(payload) => {
            trace!("resuming panic without an error payload");
            panic::resume_unwind(payload);
        }
    };

    if !is(&error, target) {
        trace!(%error, "resuming panic that does not match the catch target");
        panic::resume_unwind(Box::new(error));
    }

    match handler(error) {
        Ok(()) => {
            debug!(catch_target = %target, "absorbed panic");
            None
        }
        Err(replacement) => {
            debug!(catch_target = %target, %replacement, "replacing caught panic");
            panic::panic_any(replacement)
        }
    }
}
