//! The composite [`Error`] value and its constructors.
//!
//! An [`Error`] carries a message, an ordered list of causes and the source
//! location it was built at. It is immutable and reference counted: cloning
//! an error yields the *same* error, and identity comparisons ([`PartialEq`],
//! [`crate::is`]) compare allocations rather than text.
//!
//! Two construction forms live side by side:
//!
//! - [`Error::msg`] / [`crate::new`] build an error from plain text. No
//!   formatting, no causes, no provenance.
//! - [`crate::err!`] formats a message, collects every error argument as a
//!   cause and records the caller's file and line.

use std::error::Error as StdError;
use std::fmt;
use std::panic::{Location, RefUnwindSafe, UnwindSafe};
use std::sync::Arc;

use static_assertions::{assert_impl_all, const_assert_eq};

use crate::chain::MultiError;

/// Trait object for foreign errors held by an [`Error`].
pub(crate) type DynError = dyn StdError + Send + Sync + 'static;

/// Composite error value.
///
/// `Error` deliberately does not implement [`std::error::Error`]; this keeps
/// the blanket `From<E: std::error::Error>` conversion coherent, so `?` works
/// on any foreign error. Use [`Error::as_std`] or `AsRef` where a
/// `&dyn std::error::Error` is required.
#[derive(Clone)]
pub struct Error {
    pub(crate) inner: Arc<ErrorImpl>,
}

// One pointer wide; usable as a panic payload.
const_assert_eq!(std::mem::size_of::<Error>(), std::mem::size_of::<usize>());
assert_impl_all!(Error: Send, Sync, UnwindSafe, RefUnwindSafe);

pub(crate) struct ErrorImpl {
    pub(crate) kind: Kind,
    pub(crate) location: Option<&'static Location<'static>>,
}

pub(crate) enum Kind {
    /// Text plus causes, from [`Error::msg`] or [`crate::err!`].
    Message { text: String, causes: Vec<Error> },
    /// Several errors merged by [`crate::join`] or [`crate::run_set`].
    /// `accumulating` marks joins built by `run_set`, the only ones it
    /// appends to.
    Joined {
        errors: Vec<Error>,
        accumulating: bool,
    },
    /// A foreign error with at most one cause (its `source()`).
    Foreign(Box<DynError>),
    /// A foreign error exposing several causes.
    Multi(Box<dyn MultiObject>),
}

/// Object-safe face of [`MultiError`], so the stored value can be viewed both
/// as its causes and as a plain `dyn std::error::Error`.
pub(crate) trait MultiObject: Send + Sync + 'static {
    fn as_std(&self) -> &DynError;
    fn errors(&self) -> &[Error];
}

impl<M: MultiError> MultiObject for M {
    fn as_std(&self) -> &DynError {
        self
    }

    fn errors(&self) -> &[Error] {
        MultiError::errors(self)
    }
}

impl Error {
    /// Plain error from text. The message is kept verbatim; there are no
    /// causes and no recorded location.
    pub fn msg(text: impl Into<String>) -> Self {
        Self::from_kind(
            Kind::Message {
                text: text.into(),
                causes: Vec::new(),
            },
            None,
        )
    }

    /// Wrap a foreign error, recording the caller's location.
    ///
    /// The wrapped value stays reachable through [`crate::to`], and its own
    /// `source()` chain is walked by [`crate::is`] and [`crate::to`].
    #[track_caller]
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_kind(Kind::Foreign(Box::new(error)), Some(Location::caller()))
    }

    /// Wrap a foreign error that exposes several causes.
    #[track_caller]
    pub fn from_multi<M: MultiError>(error: M) -> Self {
        Self::from_kind(Kind::Multi(Box::new(error)), Some(Location::caller()))
    }

    /// Backs [`crate::err!`]. Not part of the public API.
    #[doc(hidden)]
    #[track_caller]
    pub fn __formatted(text: String, causes: Vec<Error>) -> Self {
        Self::from_kind(Kind::Message { text, causes }, Some(Location::caller()))
    }

    pub(crate) fn joined(errors: Vec<Error>) -> Self {
        Self::from_kind(
            Kind::Joined {
                errors,
                accumulating: false,
            },
            None,
        )
    }

    fn accumulated(errors: Vec<Error>) -> Self {
        Self::from_kind(
            Kind::Joined {
                errors,
                accumulating: true,
            },
            None,
        )
    }

    fn from_kind(kind: Kind, location: Option<&'static Location<'static>>) -> Self {
        Self {
            inner: Arc::new(ErrorImpl { kind, location }),
        }
    }

    /// Where this error was constructed, if that was recorded.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.inner.location
    }

    /// Direct causes of this error, in the order they were attached.
    ///
    /// Empty for plain and single-cause errors; see [`crate::unwraps`].
    pub fn causes(&self) -> &[Error] {
        self.inner.causes()
    }

    /// View this error as a standard library error.
    ///
    /// For wrapped foreign errors this is the foreign value itself, so
    /// `downcast_ref` behaves as it would on the original.
    pub fn as_std(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_std()
    }

    /// True when both handles refer to the same error.
    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Start an accumulating join holding only `first`.
    pub(crate) fn accumulate(first: Error) -> Error {
        Error::accumulated(vec![first])
    }

    /// Append `other` to an accumulating join built by [`Error::accumulate`].
    /// Any other error, including a join from [`crate::join`], becomes the
    /// first member of a new accumulating join and keeps its own members.
    pub(crate) fn accumulate_with(self, other: Error) -> Error {
        let mut members = match &self.inner.kind {
            Kind::Joined {
                errors,
                accumulating: true,
            } => errors.clone(),
            _ => vec![self],
        };
        members.push(other);
        Error::accumulated(members)
    }
}

/// Plain error from text, the same as [`Error::msg`].
///
/// Use [`crate::err!`] when the message needs formatting or causes.
pub fn new(text: impl Into<String>) -> Error {
    Error::msg(text)
}

impl ErrorImpl {
    pub(crate) fn causes(&self) -> &[Error] {
        match &self.kind {
            Kind::Message { causes, .. } | Kind::Joined { errors: causes, .. } => causes,
            Kind::Multi(multi) => multi.errors(),
            Kind::Foreign(_) => &[],
        }
    }

    pub(crate) fn as_std(&self) -> &DynError {
        match &self.kind {
            Kind::Foreign(error) => &**error,
            Kind::Multi(multi) => multi.as_std(),
            Kind::Message { .. } | Kind::Joined { .. } => self,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Error {}

// Immutable once built, so observing one mid-unwind is always consistent.
impl UnwindSafe for Error {}
impl RefUnwindSafe for Error {}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    #[track_caller]
    fn from(error: E) -> Self {
        Error::new(error)
    }
}

impl AsRef<dyn StdError + Send + Sync> for Error {
    fn as_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.as_std()
    }
}

impl AsRef<dyn StdError> for Error {
    fn as_ref(&self) -> &(dyn StdError + 'static) {
        self.as_std()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

// `{}` renders the message only. `{:#}` appends every cause, transitively,
// one per line.
impl fmt::Display for ErrorImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Message { text, causes } => {
                f.write_str(text)?;
                if f.alternate() {
                    for cause in causes {
                        write!(f, "\n{cause:#}")?;
                    }
                }
                Ok(())
            }
            Kind::Joined { errors, .. } => {
                for (i, error) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    fmt::Display::fmt(error, f)?;
                }
                Ok(())
            }
            Kind::Foreign(error) => {
                write!(f, "{error}")?;
                if f.alternate() {
                    let mut source = error.source();
                    while let Some(cause) = source {
                        write!(f, "\n{cause}")?;
                        source = cause.source();
                    }
                }
                Ok(())
            }
            Kind::Multi(multi) => {
                write!(f, "{}", multi.as_std())?;
                if f.alternate() {
                    for cause in multi.errors() {
                        write!(f, "\n{cause:#}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ErrorImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;
        if let Some(location) = self.location {
            write!(f, "\n    at {}:{}", location.file(), location.line())?;
        }

        let mut causes: Vec<String> = self.causes().iter().map(ToString::to_string).collect();
        if let Kind::Foreign(error) = &self.kind {
            let mut source = error.source();
            while let Some(cause) = source {
                causes.push(cause.to_string());
                source = cause.source();
            }
        }

        if !causes.is_empty() {
            f.write_str("\n\nCaused by:")?;
            for (i, cause) in causes.iter().enumerate() {
                write!(f, "\n    {i}: {cause}")?;
            }
        }
        Ok(())
    }
}

impl StdError for ErrorImpl {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.causes()
            .first()
            .map(|cause| cause.as_std() as &(dyn StdError + 'static))
    }
}

/// Adapter handing an [`Error`] to code that wants an owned
/// `Box<dyn std::error::Error>`.
struct StdAdapter(Error);

impl fmt::Display for StdAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for StdAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl StdError for StdAdapter {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.as_std().source()
    }
}

impl From<Error> for Box<dyn StdError + Send + Sync + 'static> {
    fn from(error: Error) -> Self {
        Box::new(StdAdapter(error))
    }
}

impl From<Error> for Box<dyn StdError + 'static> {
    fn from(error: Error) -> Self {
        Box::new(StdAdapter(error))
    }
}

/// Build an [`Error`] from a format string.
///
/// - With a single literal, the literal is formatted as by [`format!`].
/// - With a single non-literal expression, its `Display` text is used
///   verbatim.
/// - With arguments, the message is the substitution, and every argument that
///   is an error is also attached as a cause, in argument order:
///   - an [`Error`] (or `&Error`) is attached as is;
///   - a foreign `std::error::Error + Send + Sync + 'static` passed by value
///     is moved into [`Error::new`] first, so [`crate::to`] still finds it.
///     A borrowed foreign error is rejected; pass it by value or render it
///     with `to_string()`.
///
///   Other arguments only contribute text. Named arguments (`x = value`)
///   are collected like positional ones.
///
/// Inline captures (`"{cause}"`) are resolved by [`format!`] itself and
/// never become causes. Name the argument instead: `err!("{cause}", cause =
/// cause)`.
///
/// Each argument is evaluated exactly once. The macro call site is recorded
/// as the error's location.
///
/// ```rust
/// use evo_errors::{err, to, unwraps};
/// use std::io;
///
/// let io = evo_errors::new("disk full");
/// let e = err!("{} failed: {}", "flush", io);
/// assert_eq!(e.to_string(), "flush failed: disk full");
/// assert_eq!(unwraps(&e), [io]);
///
/// let e = err!("read failed: {source}", source = io::Error::other("bus timeout"));
/// assert_eq!(e.to_string(), "read failed: bus timeout");
/// assert!(to::<io::Error>(&e).is_some());
/// ```
#[macro_export]
macro_rules! err {
    (@args [$causes:ident] $fmt:literal; [$($done:tt)*];) => {{
        let mut $causes = ::std::vec::Vec::new();
        let text = $crate::err!(@format [$causes] $fmt; $($done)*);
        $crate::Error::__formatted(text, $causes)
    }};
    (@args [$causes:ident] $fmt:literal; [$($done:tt)*]; $name:ident = $value:expr $(, $($rest:tt)*)?) => {
        $crate::err!(@args [$causes] $fmt; [$($done)* $name = ($value),]; $($($rest)*)?)
    };
    (@args [$causes:ident] $fmt:literal; [$($done:tt)*]; $value:expr $(, $($rest:tt)*)?) => {
        $crate::err!(@args [$causes] $fmt; [$($done)* ($value),]; $($($rest)*)?)
    };
    (@format [$causes:ident] $fmt:literal; $($($name:ident =)? ($value:expr),)*) => {{
        #[allow(unused_imports)]
        use $crate::__private::{BorrowedArg as _, CauseArg as _, OwnedArg as _, PlainArg as _};
        ::std::format!(
            $fmt,
            $($($name =)? (&$value.__cause_arg()).capture(&mut $causes)),*
        )
    }};
    ($msg:literal $(,)?) => {
        $crate::Error::__formatted(::std::format!($msg), ::std::vec::Vec::new())
    };
    ($msg:expr $(,)?) => {
        $crate::Error::__formatted(
            ::std::string::ToString::to_string(&$msg),
            ::std::vec::Vec::new(),
        )
    };
    ($fmt:literal, $($args:tt)+) => {
        $crate::err!(@args [causes] $fmt; []; $($args)+)
    };
}

/// Support code for [`err!`](crate::err). Not part of the public API.
///
/// Every argument goes through two method-resolution steps:
///
/// 1. `arg.__cause_arg()` resolves to [`OwnedArg`] (by value) when the
///    argument is an owned foreign error, which is then moved into an
///    [`Adopted`] error, and to [`BorrowedArg`] (after auto-ref) for
///    everything else, which only borrows it into a [`Probe`].
/// 2. `(&probe).capture(..)` resolves to [`CauseArg`] when the borrowed value
///    is an [`Error`] (method found on `Probe` by value) and falls back to
///    [`PlainArg`] (found only after auto-ref) for everything else.
#[doc(hidden)]
pub mod __private {
    use super::{DynError, Error};
    use std::fmt;

    pub struct Probe<'a, T: ?Sized>(pub &'a T);

    /// A foreign error argument, already wrapped as a cause.
    pub struct Adopted(Error);

    impl Adopted {
        pub fn capture(&self, causes: &mut Vec<Error>) -> &Self {
            causes.push(self.0.clone());
            self
        }

        fn foreign(&self) -> &DynError {
            self.0.as_std()
        }
    }

    impl fmt::Display for Adopted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Display::fmt(self.foreign(), f)
        }
    }

    impl fmt::Debug for Adopted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(self.foreign(), f)
        }
    }

    pub trait OwnedArg: Sized {
        fn __cause_arg(self) -> Adopted;
    }

    impl<E> OwnedArg for E
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        #[track_caller]
        fn __cause_arg(self) -> Adopted {
            Adopted(Error::new(self))
        }
    }

    pub trait BorrowedArg {
        fn __cause_arg(&self) -> Probe<'_, Self>;
    }

    impl<T: ?Sized> BorrowedArg for T {
        fn __cause_arg(&self) -> Probe<'_, Self> {
            Probe(self)
        }
    }

    pub trait AsCause {
        fn as_cause(&self) -> Error;
    }

    impl AsCause for Error {
        fn as_cause(&self) -> Error {
            self.clone()
        }
    }

    impl<T: AsCause + ?Sized> AsCause for &T {
        fn as_cause(&self) -> Error {
            (**self).as_cause()
        }
    }

    pub trait CauseArg {
        type Out;
        fn capture(&self, causes: &mut Vec<Error>) -> Self::Out;
    }

    impl<'a, T: AsCause + ?Sized> CauseArg for Probe<'a, T> {
        type Out = &'a T;

        fn capture(&self, causes: &mut Vec<Error>) -> &'a T {
            causes.push(self.0.as_cause());
            self.0
        }
    }

    pub trait PlainArg {
        type Out;
        fn capture(&self, causes: &mut Vec<Error>) -> Self::Out;
    }

    impl<'a, T: ?Sized> PlainArg for &Probe<'a, T> {
        type Out = &'a T;

        fn capture(&self, _causes: &mut Vec<Error>) -> &'a T {
            self.0
        }
    }
}
