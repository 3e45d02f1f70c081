//! Error introspection: single and multiple unwrapping, identity matching,
//! typed lookup and joining.
//!
//! ## Cause tree
//!
//! Every [`Error`] is the root of a tree. Its children are:
//!
//! - the attached causes of formatted errors and joins,
//! - the [`MultiError::errors`] of a wrapped multi-cause error,
//! - the `source()` of a wrapped foreign error (and of each error below it).
//!
//! [`is`] and [`to`] walk that tree depth-first, in pre-order, stopping at
//! the first match.

use std::error::Error as StdError;
use std::ptr;

use crate::error::{Error, ErrorImpl, Kind};

/// Capability of a foreign error that wraps several causes at once.
///
/// Implement it on your own error type and wrap the value with
/// [`Error::from_multi`] to make [`unwraps`], [`is`] and [`to`] see its
/// causes.
pub trait MultiError: StdError + Send + Sync + 'static {
    /// The wrapped causes, in order.
    fn errors(&self) -> &[Error];
}

#[derive(Clone, Copy)]
enum Node<'a> {
    Ours(&'a ErrorImpl),
    Std(&'a (dyn StdError + 'static)),
}

impl<'a> Node<'a> {
    fn from_std(error: &'a (dyn StdError + 'static)) -> Self {
        match error.downcast_ref::<ErrorImpl>() {
            Some(inner) => Node::Ours(inner),
            None => Node::Std(error),
        }
    }

    fn as_std(self) -> &'a (dyn StdError + 'static) {
        match self {
            Node::Ours(inner) => inner.as_std(),
            Node::Std(error) => error,
        }
    }
}

fn walk<'a, R>(node: Node<'a>, visit: &mut dyn FnMut(Node<'a>) -> Option<R>) -> Option<R> {
    if let Some(found) = visit(node) {
        return Some(found);
    }

    let source = match node {
        Node::Ours(inner) => match &inner.kind {
            Kind::Foreign(error) => error.source(),
            _ => {
                for cause in inner.causes() {
                    if let Some(found) = walk(Node::Ours(&cause.inner), visit) {
                        return Some(found);
                    }
                }
                return None;
            }
        },
        Node::Std(error) => error.source(),
    };

    source.and_then(|next| walk(Node::from_std(next), visit))
}

/// Single-cause unwrap.
///
/// Returns the `source()` of a wrapped foreign error. Errors with several
/// causes (formatted errors, joins) return `None`; use [`unwraps`] for those.
pub fn unwrap(err: &Error) -> Option<&(dyn StdError + 'static)> {
    match &err.inner.kind {
        Kind::Foreign(error) => error.source(),
        _ => None,
    }
}

/// Multi-cause unwrap.
///
/// Returns the causes of `err` if it exposes several of them, otherwise an
/// empty slice. Does not fall back to single-cause unwrapping.
pub fn unwraps(err: &Error) -> &[Error] {
    err.causes()
}

/// True when `target` is `err` itself or any error in its cause tree.
///
/// Matching is by identity: clones of `target` match, an unrelated error
/// with the same text does not.
pub fn is(err: &Error, target: &Error) -> bool {
    let wanted: &ErrorImpl = &target.inner;
    walk(Node::Ours(&err.inner), &mut |node| match node {
        Node::Ours(inner) if ptr::eq(inner, wanted) => Some(()),
        _ => None,
    })
    .is_some()
}

/// First error of type `E` in the cause tree of `err`, including `err`
/// itself when it wraps an `E`.
///
/// ```rust
/// use evo_errors::{err, to, Error};
/// use std::fmt;
///
/// #[derive(Debug)]
/// struct Timeout(u32);
///
/// impl fmt::Display for Timeout {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "timed out after {}ms", self.0)
///     }
/// }
///
/// impl std::error::Error for Timeout {}
///
/// let e = err!("request failed: {}", Error::new(Timeout(250)));
/// assert_eq!(to::<Timeout>(&e).map(|t| t.0), Some(250));
/// assert!(to::<std::io::Error>(&e).is_none());
/// ```
pub fn to<E>(err: &Error) -> Option<&E>
where
    E: StdError + 'static,
{
    walk(Node::Ours(&err.inner), &mut |node| {
        node.as_std().downcast_ref::<E>()
    })
}

/// Join several errors into one.
///
/// Returns `None` when `errors` is empty. The joined error renders its
/// members' messages separated by newlines and exposes them through
/// [`unwraps`].
pub fn join<I>(errors: I) -> Option<Error>
where
    I: IntoIterator<Item = Error>,
{
    let errors: Vec<Error> = errors.into_iter().collect();
    if errors.is_empty() {
        None
    } else {
        Some(Error::joined(errors))
    }
}
