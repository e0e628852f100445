use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, TargetFailure};

/// A named callable unit of behaviour.
///
/// An operation takes its arguments by reference and produces one result or
/// fails. Wrappers are operations too, so they can be wrapped again.
///
/// Argument shapes are up to the implementor: a tuple such as `(i64, i64)`
/// for fixed positional arguments, or [`Args`](crate::Args) for a variadic
/// bundle with named values.
pub trait Operation<A> {
    /// The result type.
    type Output;

    /// Returns the operation's name.
    fn name(&self) -> &str;

    /// Invokes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Target`] when the operation itself fails. Wrappers may
    /// also return [`Error::InvalidInput`] or [`Error::InvalidOutput`].
    fn invoke(&self, args: &A) -> Result<Self::Output, Error>;
}

impl<A, T: Operation<A> + ?Sized> Operation<A> for &T {
    type Output = T::Output;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&self, args: &A) -> Result<Self::Output, Error> {
        (**self).invoke(args)
    }
}

impl<A, T: Operation<A> + ?Sized> Operation<A> for Arc<T> {
    type Output = T::Output;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&self, args: &A) -> Result<Self::Output, Error> {
        (**self).invoke(args)
    }
}

impl<A, T: Operation<A> + ?Sized> Operation<A> for Box<T> {
    type Output = T::Output;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&self, args: &A) -> Result<Self::Output, Error> {
        (**self).invoke(args)
    }
}

/// An operation backed by a closure.
///
/// Created with [`operation`] or [`infallible`].
pub struct FnOperation<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<A, R, E, F> Operation<A> for FnOperation<F>
where
    F: Fn(&A) -> Result<R, E>,
    E: StdError + Send + Sync + 'static,
{
    type Output = R;

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, args: &A) -> Result<R, Error> {
        (self.f)(args).map_err(|e| Error::Target(TargetFailure::new(self.name.as_str(), e)))
    }
}

/// Creates a named operation from a fallible closure.
///
/// Errors returned by the closure surface as [`Error::Target`] with the
/// original error as the source.
///
/// # Examples
///
/// ```
/// use wrap_core::{operation, ErrorKind, Operation};
///
/// let parse = operation("parse", |s: &String| s.trim().parse::<i64>());
///
/// assert_eq!(parse.invoke(&" 42 ".to_string()).unwrap(), 42);
/// assert_eq!(
///     parse.invoke(&"forty".to_string()).unwrap_err().kind(),
///     ErrorKind::Target
/// );
/// ```
pub fn operation<A, R, E, F>(name: impl Into<String>, f: F) -> FnOperation<F>
where
    F: Fn(&A) -> Result<R, E>,
    E: StdError + Send + Sync + 'static,
{
    FnOperation {
        name: name.into(),
        f,
    }
}

/// Creates a named operation from a closure that cannot fail.
///
/// # Examples
///
/// ```
/// use wrap_core::{infallible, Operation};
///
/// let square = infallible("square", |n: &i64| n * n);
///
/// assert_eq!(square.name(), "square");
/// assert_eq!(square.invoke(&5).unwrap(), 25);
/// ```
pub fn infallible<A, R, F>(
    name: impl Into<String>,
    f: F,
) -> FnOperation<impl Fn(&A) -> Result<R, Infallible>>
where
    F: Fn(&A) -> R,
{
    operation(name, move |args: &A| Ok::<R, Infallible>(f(args)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::num::ParseIntError;

    #[test]
    fn fn_operation_returns_closure_result() {
        let double = infallible("double", |n: &i32| n * 2);
        assert_eq!(double.invoke(&21).unwrap(), 42);
    }

    #[test]
    fn fn_operation_wraps_closure_error() {
        let parse = operation("parse", |s: &&str| s.parse::<u8>());
        let err = parse.invoke(&"300").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Target);
        let failure = err.target_failure().expect("target failure");
        assert_eq!(failure.operation(), "parse");
        assert!(failure.downcast_ref::<ParseIntError>().is_some());
    }

    #[test]
    fn references_and_smart_pointers_delegate() {
        let op = infallible("negate", |n: &i64| -n);

        assert_eq!((&op).invoke(&3).unwrap(), -3);
        assert_eq!((&op).name(), "negate");

        let shared = Arc::new(infallible("negate", |n: &i64| -n));
        assert_eq!(shared.invoke(&4).unwrap(), -4);

        let boxed: Box<dyn Operation<i64, Output = i64>> =
            Box::new(infallible("negate", |n: &i64| -n));
        assert_eq!(boxed.invoke(&5).unwrap(), -5);
        assert_eq!(boxed.name(), "negate");
    }

    #[test]
    fn debug_shows_name_only() {
        let op = infallible("noop", |_: &()| ());
        assert_eq!(format!("{:?}", op), "FnOperation { name: \"noop\", .. }");
    }
}
