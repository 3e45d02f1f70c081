//! Prelude module for common re-exports.
//!
//! ```rust
//! use evo_errors::prelude::*;
//! ```

// ─── Construction ───────────────────────────────────────────────────
pub use crate::err;
pub use crate::error::Error;

// ─── Introspection ──────────────────────────────────────────────────
pub use crate::chain::{MultiError, is, join, to, unwrap, unwraps};

// ─── Panic Bridge ───────────────────────────────────────────────────
pub use crate::panic::{catch, check, get, run, run_set};

// ─── Rollback ───────────────────────────────────────────────────────
pub use crate::rollback::{OnFail, on_fail};
