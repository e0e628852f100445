use std::fmt;
use std::sync::Arc;

use crate::error::Rejection;
use crate::sink::{CallSink, TimingSink};

/// A check run against an operation's arguments before the target is called.
///
/// Implementations must be pure: they either accept the arguments or return a
/// [`Rejection`] naming the offending argument.
pub trait InputCheck<A> {
    /// Accepts or rejects the arguments.
    ///
    /// # Errors
    ///
    /// Returns a `Rejection` describing the first offending argument.
    fn check(&self, args: &A) -> Result<(), Rejection>;
}

/// A check run against an operation's result after the target returns.
pub trait OutputCheck<R> {
    /// Accepts or rejects the result.
    ///
    /// # Errors
    ///
    /// Returns a `Rejection` describing the result.
    fn check(&self, output: &R) -> Result<(), Rejection>;
}

/// A labelled boolean predicate usable as an input or output check.
///
/// On failure the whole value is rendered with `Debug` into the rejection.
///
/// # Examples
///
/// ```
/// use wrap_core::{InputCheck, Predicate};
///
/// let nonzero_divisor = Predicate::new("y != 0", |&(_, y): &(i64, i64)| y != 0);
///
/// assert!(nonzero_divisor.check(&(8, 2)).is_ok());
/// let rejection = nonzero_divisor.check(&(8, 0)).unwrap_err();
/// assert_eq!(rejection.value(), "(8, 0)");
/// ```
pub struct Predicate<F> {
    label: String,
    f: F,
}

impl<F> Predicate<F> {
    /// Creates a predicate check with a label used in rejections.
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }

    /// Returns the check's label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<A: fmt::Debug, F: Fn(&A) -> bool> InputCheck<A> for Predicate<F> {
    fn check(&self, args: &A) -> Result<(), Rejection> {
        if (self.f)(args) {
            Ok(())
        } else {
            Err(Rejection::new(self.label.as_str(), format!("{:?}", args)))
        }
    }
}

impl<R: fmt::Debug, F: Fn(&R) -> bool> OutputCheck<R> for Predicate<F> {
    fn check(&self, output: &R) -> Result<(), Rejection> {
        if (self.f)(output) {
            Ok(())
        } else {
            Err(Rejection::new(self.label.as_str(), format!("{:?}", output)))
        }
    }
}

type BoxedInputCheck<A> = Box<dyn InputCheck<A> + Send + Sync>;
type BoxedOutputCheck<R> = Box<dyn OutputCheck<R> + Send + Sync>;
type BoxedInputTransform<A> = Box<dyn Fn(&A) -> A + Send + Sync>;
type BoxedTransform<R> = Box<dyn Fn(R) -> R + Send + Sync>;

/// A cross-cutting behaviour applied around a target's invocation.
///
/// Policies are evaluated by a [`Wrapper`](crate::Wrapper) in the order they
/// were declared, grouped by the phase they belong to:
/// input checks, input transforms, timing, output transforms, output checks,
/// then logging.
pub enum Policy<A, R> {
    /// Rejects arguments before the target runs.
    ValidateInputs(BoxedInputCheck<A>),
    /// Rewrites the arguments after input checks and before the target runs.
    TransformInputs(BoxedInputTransform<A>),
    /// Rejects the result after the target returns.
    ValidateOutput(BoxedOutputCheck<R>),
    /// Rewrites the result before output checks and logging.
    TransformOutput(BoxedTransform<R>),
    /// Delivers the target's elapsed time to a sink.
    MeasureTime(Arc<dyn TimingSink + Send + Sync>),
    /// Delivers the operation name, arguments and result to a sink.
    LogCall(Arc<dyn CallSink<A, R> + Send + Sync>),
}

impl<A, R> Policy<A, R> {
    /// Input validation with a labelled predicate.
    pub fn validate_inputs<F>(label: impl Into<String>, f: F) -> Self
    where
        A: fmt::Debug,
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Policy::ValidateInputs(Box::new(Predicate::new(label, f)))
    }

    /// Input validation with a custom check.
    pub fn check_inputs<C>(check: C) -> Self
    where
        C: InputCheck<A> + Send + Sync + 'static,
    {
        Policy::ValidateInputs(Box::new(check))
    }

    /// Output validation with a labelled predicate.
    pub fn validate_output<F>(label: impl Into<String>, f: F) -> Self
    where
        R: fmt::Debug,
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Policy::ValidateOutput(Box::new(Predicate::new(label, f)))
    }

    /// Output validation with a custom check.
    pub fn check_output<C>(check: C) -> Self
    where
        C: OutputCheck<R> + Send + Sync + 'static,
    {
        Policy::ValidateOutput(Box::new(check))
    }

    /// Argument rewriting.
    ///
    /// The target and every call sink see the rewritten arguments.
    pub fn transform_inputs<F>(f: F) -> Self
    where
        F: Fn(&A) -> A + Send + Sync + 'static,
    {
        Policy::TransformInputs(Box::new(f))
    }

    /// Output rewriting.
    pub fn transform_output<F>(f: F) -> Self
    where
        F: Fn(R) -> R + Send + Sync + 'static,
    {
        Policy::TransformOutput(Box::new(f))
    }

    /// Timing delivered to `sink`.
    pub fn measure_time<S>(sink: Arc<S>) -> Self
    where
        S: TimingSink + Send + Sync + 'static,
    {
        Policy::MeasureTime(sink)
    }

    /// Call logging delivered to `sink`.
    pub fn log_call<S>(sink: Arc<S>) -> Self
    where
        S: CallSink<A, R> + Send + Sync + 'static,
    {
        Policy::LogCall(sink)
    }

    /// Returns the kind of this policy.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::ValidateInputs(_) => PolicyKind::ValidateInputs,
            Policy::TransformInputs(_) => PolicyKind::TransformInputs,
            Policy::ValidateOutput(_) => PolicyKind::ValidateOutput,
            Policy::TransformOutput(_) => PolicyKind::TransformOutput,
            Policy::MeasureTime(_) => PolicyKind::MeasureTime,
            Policy::LogCall(_) => PolicyKind::LogCall,
        }
    }
}

impl<A, R> fmt::Debug for Policy<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy::{:?}", self.kind())
    }
}

/// The kind of a [`Policy`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// See [`Policy::ValidateInputs`].
    ValidateInputs,
    /// See [`Policy::TransformInputs`].
    TransformInputs,
    /// See [`Policy::ValidateOutput`].
    ValidateOutput,
    /// See [`Policy::TransformOutput`].
    TransformOutput,
    /// See [`Policy::MeasureTime`].
    MeasureTime,
    /// See [`Policy::LogCall`].
    LogCall,
}
