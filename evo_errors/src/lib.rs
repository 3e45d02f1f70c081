//! EVO Error Utilities
//!
//! Small helpers on top of Rust's error handling, shared by the EVO
//! workspace crates.
//!
//! # Module Structure
//!
//! - [`error`] - The composite [`Error`] value, [`err!`] and [`new`]
//! - [`chain`] - Introspection: [`unwrap`], [`unwraps`], [`is`], [`to`], [`join`]
//! - [`panic`] - Result/panic bridge: [`check`], [`get`], [`run`], [`run_set`], [`catch`]
//! - [`rollback`] - [`on_fail`] guard for undoing partial work
//! - [`hook`] - Panic hook rendering [`Error`] payloads
//! - [`config`] - Hook configuration loaded from TOML
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use evo_errors::prelude::*;
//! use std::sync::LazyLock;
//!
//! static ZERO_STEP: LazyLock<Error> = LazyLock::new(|| evo_errors::new("zero step"));
//!
//! fn step(n: u32) -> Result<u32, Error> {
//!     if n == 0 {
//!         return Err(ZERO_STEP.clone());
//!     }
//!     Ok(n * 2)
//! }
//!
//! let e = err!("pipeline stage {} failed: {}", 3, step(0).unwrap_err());
//! assert_eq!(e.to_string(), "pipeline stage 3 failed: zero step");
//! assert!(is(&e, &ZERO_STEP));
//!
//! // Short-circuit with a panic, recover only that error.
//! let out = catch(&ZERO_STEP, || get(step(0)), |_| Ok(()));
//! assert_eq!(out, None);
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod hook;
pub mod panic;
pub mod prelude;
pub mod rollback;

pub use chain::{MultiError, is, join, to, unwrap, unwraps};
pub use error::{Error, new};
pub use hook::install_hook;
pub use panic::{catch, check, get, run, run_set};
pub use rollback::{OnFail, on_fail};

#[doc(hidden)]
pub use error::__private;
