//! Run-on-failure rollback guard.

use std::cell::Cell;
use std::fmt;

use static_assertions::assert_not_impl_any;
use tracing::debug;

/// Guard returned by [`on_fail`].
///
/// Dropping the guard runs the rollback unless [`OnFail::succeed`] was called
/// first. Drop also happens while unwinding, so a panic between creation and
/// `succeed` still rolls back.
///
/// The success flag is a plain [`Cell`]: the guard is `!Sync` and belongs to
/// one sequential scope.
#[must_use = "the rollback runs when the guard is dropped; binding it to `_` drops it immediately"]
pub struct OnFail<F: FnOnce()> {
    rollback: Option<F>,
    succeeded: Cell<bool>,
}

assert_not_impl_any!(OnFail<fn()>: Sync);

/// Arm `rollback` to run at scope exit unless the scope reports success.
///
/// ```rust
/// use evo_errors::on_fail;
///
/// fn provision(fail: bool, log: &mut Vec<&'static str>) -> Result<(), &'static str> {
///     log.push("create");
///     {
///         let guard = on_fail(|| log.push("delete"));
///         if fail {
///             return Err("configure failed");
///         }
///         guard.succeed();
///     }
///     Ok(())
/// }
///
/// let mut log = Vec::new();
/// assert!(provision(true, &mut log).is_err());
/// assert_eq!(log, ["create", "delete"]);
/// ```
pub fn on_fail<F: FnOnce()>(rollback: F) -> OnFail<F> {
    OnFail {
        rollback: Some(rollback),
        succeeded: Cell::new(false),
    }
}

impl<F: FnOnce()> OnFail<F> {
    /// Mark the scope as successful. Idempotent; the flag never resets.
    pub fn succeed(&self) {
        self.succeeded.set(true);
    }

    /// Whether [`OnFail::succeed`] has been called.
    pub fn succeeded(&self) -> bool {
        self.succeeded.get()
    }
}

impl<F: FnOnce()> Drop for OnFail<F> {
    fn drop(&mut self) {
        if self.succeeded.get() {
            return;
        }
        if let Some(rollback) = self.rollback.take() {
            debug!("scope did not succeed, running rollback");
            rollback();
        }
    }
}

impl<F: FnOnce()> fmt::Debug for OnFail<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnFail")
            .field("succeeded", &self.succeeded.get())
            .finish_non_exhaustive()
    }
}
