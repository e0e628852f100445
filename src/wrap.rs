use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::Error,
    operation::Operation,
    policy::{InputCheck, OutputCheck, Policy, PolicyKind},
    sink::{CallRecord, CallSink, TimingSink},
};

/// An operation composed from a target and an ordered list of policies.
///
/// `Wrapper` is produced by [`Wrap::build`] or [`wrap`]. It owns its target
/// and reports the target's name as its own, so nesting wrappers keeps the
/// innermost name.
///
/// # Invocation order
///
/// For each call with arguments `args`:
///
/// 1. Every input check, in declared order. The first rejection returns
///    [`Error::InvalidInput`] and the target is not called.
/// 2. Every input transform, in declared order. Each one receives the
///    previous one's arguments; the target and call sinks see the last.
/// 3. A start instant is taken if any timing policy is present.
/// 4. The target is invoked once. Its errors are returned unchanged.
/// 5. The elapsed time goes to every timing sink, in declared order.
/// 6. Every output transform, in declared order.
/// 7. Every output check, in declared order. The first rejection returns
///    [`Error::InvalidOutput`].
/// 8. Every call sink receives the name, arguments and result.
///
/// # Examples
///
/// ```
/// use wrap_core::{operation, ErrorKind, Operation, Wrap};
///
/// #[derive(Debug)]
/// struct DivideByZero;
///
/// impl std::fmt::Display for DivideByZero {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("division by zero")
///     }
/// }
///
/// impl std::error::Error for DivideByZero {}
///
/// let divide = Wrap::new(operation("divide", |&(x, y): &(i64, i64)| {
///     x.checked_div(y).ok_or(DivideByZero)
/// }))
/// .validate_inputs("y != 0", |&(_, y): &(i64, i64)| y != 0)
/// .build();
///
/// assert_eq!(divide.invoke(&(8, 2)).unwrap(), 4);
/// assert_eq!(divide.invoke(&(8, 0)).unwrap_err().kind(), ErrorKind::InvalidInput);
/// ```
pub struct Wrapper<T, A, R> {
    target: T,
    policies: Vec<Policy<A, R>>,
    timed: bool,
}

impl<T, A, R> Wrapper<T, A, R> {
    fn new(target: T, policies: Vec<Policy<A, R>>) -> Self {
        let timed = policies
            .iter()
            .any(|p| p.kind() == PolicyKind::MeasureTime);
        Self {
            target,
            policies,
            timed,
        }
    }

    /// Returns the wrapped target.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Returns the policies in declared order.
    pub fn policies(&self) -> &[Policy<A, R>] {
        &self.policies
    }

    /// Consumes the wrapper and returns its target.
    pub fn into_target(self) -> T {
        self.target
    }

    fn input_checks(
        &self,
    ) -> impl Iterator<Item = &(dyn InputCheck<A> + Send + Sync + 'static)> {
        self.policies.iter().filter_map(|p| match p {
            Policy::ValidateInputs(check) => Some(&**check),
            _ => None,
        })
    }

    fn output_checks(
        &self,
    ) -> impl Iterator<Item = &(dyn OutputCheck<R> + Send + Sync + 'static)> {
        self.policies.iter().filter_map(|p| match p {
            Policy::ValidateOutput(check) => Some(&**check),
            _ => None,
        })
    }

    fn timing_sinks(
        &self,
    ) -> impl Iterator<Item = &(dyn TimingSink + Send + Sync + 'static)> {
        self.policies.iter().filter_map(|p| match p {
            Policy::MeasureTime(sink) => Some(&**sink),
            _ => None,
        })
    }

    fn call_sinks(
        &self,
    ) -> impl Iterator<Item = &(dyn CallSink<A, R> + Send + Sync + 'static)> {
        self.policies.iter().filter_map(|p| match p {
            Policy::LogCall(sink) => Some(&**sink),
            _ => None,
        })
    }
}

impl<T, A, R> Operation<A> for Wrapper<T, A, R>
where
    T: Operation<A, Output = R>,
{
    type Output = R;

    fn name(&self) -> &str {
        self.target.name()
    }

    fn invoke(&self, args: &A) -> Result<R, Error> {
        let name = self.target.name();

        for check in self.input_checks() {
            if let Err(rejection) = check.check(args) {
                let rejection = rejection.for_operation(name);
                tracing::debug!(
                    operation = %name,
                    check = %rejection.check(),
                    "input rejected"
                );
                return Err(Error::InvalidInput(rejection));
            }
        }

        let mut transformed: Option<A> = None;
        for policy in &self.policies {
            if let Policy::TransformInputs(transform) = policy {
                let next = transform(transformed.as_ref().unwrap_or(args));
                transformed = Some(next);
            }
        }
        let args = transformed.as_ref().unwrap_or(args);

        let started = self.timed.then(Instant::now);

        let mut output = match self.target.invoke(args) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(operation = %name, kind = %e.kind(), "target failed");
                return Err(e);
            }
        };

        if let Some(started) = started {
            let elapsed = started.elapsed();
            for sink in self.timing_sinks() {
                sink.record_timing(name, elapsed);
            }
        }

        for policy in &self.policies {
            if let Policy::TransformOutput(transform) = policy {
                output = transform(output);
            }
        }

        for check in self.output_checks() {
            if let Err(rejection) = check.check(&output) {
                let rejection = rejection.for_operation(name);
                tracing::debug!(
                    operation = %name,
                    check = %rejection.check(),
                    "output rejected"
                );
                return Err(Error::InvalidOutput(rejection));
            }
        }

        for sink in self.call_sinks() {
            sink.record_call(CallRecord {
                operation: name,
                args,
                output: &output,
            });
        }

        Ok(output)
    }
}

impl<T: Operation<A>, A, R> fmt::Debug for Wrapper<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("name", &self.target.name())
            .field("policies", &self.policies)
            .finish()
    }
}

/// Builder for a [`Wrapper`].
///
/// Each method appends one policy; policies of the same kind run in the
/// order they were added.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wrap_core::{infallible, ErrorKind, Operation, TimingLog, Wrap};
///
/// let timings = Arc::new(TimingLog::new());
/// let square = Wrap::new(infallible("square", |n: &i64| n * n))
///     .validate_inputs("n >= 0", |n: &i64| *n >= 0)
///     .measure_time(timings.clone())
///     .build();
///
/// assert_eq!(square.invoke(&5).unwrap(), 25);
/// assert_eq!(square.invoke(&-3).unwrap_err().kind(), ErrorKind::InvalidInput);
/// assert_eq!(timings.len(), 1);
/// ```
pub struct Wrap<T, A, R> {
    target: T,
    policies: Vec<Policy<A, R>>,
}

impl<T, A, R> Wrap<T, A, R>
where
    T: Operation<A, Output = R>,
{
    /// Starts a builder around `target` with no policies.
    pub fn new(target: T) -> Self {
        Self {
            target,
            policies: Vec::new(),
        }
    }

    /// Appends an already constructed policy.
    pub fn policy(mut self, policy: Policy<A, R>) -> Self {
        self.policies.push(policy);
        self
    }

    /// Appends input validation with a labelled predicate.
    pub fn validate_inputs<F>(self, label: impl Into<String>, f: F) -> Self
    where
        A: fmt::Debug,
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.policy(Policy::validate_inputs(label, f))
    }

    /// Appends input validation with a custom check.
    pub fn check_inputs<C>(self, check: C) -> Self
    where
        C: InputCheck<A> + Send + Sync + 'static,
    {
        self.policy(Policy::check_inputs(check))
    }

    /// Appends output validation with a labelled predicate.
    pub fn validate_output<F>(self, label: impl Into<String>, f: F) -> Self
    where
        R: fmt::Debug,
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.policy(Policy::validate_output(label, f))
    }

    /// Appends output validation with a custom check.
    pub fn check_output<C>(self, check: C) -> Self
    where
        C: OutputCheck<R> + Send + Sync + 'static,
    {
        self.policy(Policy::check_output(check))
    }

    /// Appends an input transform.
    pub fn transform_inputs<F>(self, f: F) -> Self
    where
        F: Fn(&A) -> A + Send + Sync + 'static,
    {
        self.policy(Policy::transform_inputs(f))
    }

    /// Appends an output transform.
    pub fn transform_output<F>(self, f: F) -> Self
    where
        F: Fn(R) -> R + Send + Sync + 'static,
    {
        self.policy(Policy::transform_output(f))
    }

    /// Appends timing delivered to `sink`.
    pub fn measure_time<S>(self, sink: Arc<S>) -> Self
    where
        S: TimingSink + Send + Sync + 'static,
    {
        self.policy(Policy::measure_time(sink))
    }

    /// Appends call logging delivered to `sink`.
    pub fn log_call<S>(self, sink: Arc<S>) -> Self
    where
        S: CallSink<A, R> + Send + Sync + 'static,
    {
        self.policy(Policy::log_call(sink))
    }

    /// Finishes the builder.
    pub fn build(self) -> Wrapper<T, A, R> {
        Wrapper::new(self.target, self.policies)
    }
}

/// Wraps `target` with `policies` in the given order.
///
/// Equivalent to adding each policy to a [`Wrap`] builder.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wrap_core::{infallible, wrap, CallLog, Operation, Policy};
///
/// let log = Arc::new(CallLog::new());
/// let add = wrap(
///     infallible("add", |&(a, b): &(i64, i64)| a + b),
///     [
///         Policy::validate_output("non-negative", |n: &i64| *n >= 0),
///         Policy::log_call(log.clone()),
///     ],
/// );
///
/// assert_eq!(add.invoke(&(3, 5)).unwrap(), 8);
/// assert!(add.invoke(&(3, -5)).is_err());
/// assert_eq!(log.len(), 1);
/// ```
pub fn wrap<T, A, R, I>(target: T, policies: I) -> Wrapper<T, A, R>
where
    T: Operation<A, Output = R>,
    I: IntoIterator<Item = Policy<A, R>>,
{
    Wrapper::new(target, policies.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operation::{infallible, operation};
    use crate::sink::{CallLog, TimingLog};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug)]
    struct DivideByZero;

    impl fmt::Display for DivideByZero {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("division by zero")
        }
    }

    impl std::error::Error for DivideByZero {}

    fn counted_square(calls: Arc<AtomicUsize>) -> impl Operation<i64, Output = i64> {
        infallible("square", move |n: &i64| {
            calls.fetch_add(1, Ordering::SeqCst);
            n * n
        })
    }

    /// Timing sink that appends a marker to a shared trace.
    struct TraceTiming(Arc<Mutex<Vec<String>>>, &'static str);

    impl TimingSink for TraceTiming {
        fn record_timing(&self, _operation: &str, _elapsed: Duration) {
            self.0.lock().unwrap().push(self.1.to_string());
        }
    }

    /// Call sink that appends a marker to a shared trace.
    struct TraceCall(Arc<Mutex<Vec<String>>>, &'static str);

    impl<A, R> CallSink<A, R> for TraceCall {
        fn record_call(&self, _call: CallRecord<'_, A, R>) {
            self.0.lock().unwrap().push(self.1.to_string());
        }
    }

    fn traced_check(
        trace: &Arc<Mutex<Vec<String>>>,
        marker: &'static str,
        pass: bool,
    ) -> impl Fn(&i64) -> bool + Send + Sync + 'static {
        let trace = Arc::clone(trace);
        move |_: &i64| {
            trace.lock().unwrap().push(marker.to_string());
            pass
        }
    }

    #[test]
    fn rejected_input_never_reaches_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let square = Wrap::new(counted_square(calls.clone()))
            .validate_inputs("n >= 0", |n: &i64| *n >= 0)
            .build();

        let err = square.invoke(&-3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let rejection = err.rejection().expect("rejection");
        assert_eq!(rejection.operation(), "square");
        assert_eq!(rejection.check(), "n >= 0");
        assert_eq!(rejection.value(), "-3");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(square.invoke(&5).unwrap(), 25);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn divide_rejects_zero_before_arithmetic() {
        let divide = Wrap::new(operation("divide", |&(x, y): &(i64, i64)| {
            x.checked_div(y).ok_or(DivideByZero)
        }))
        .validate_inputs("y != 0", |&(_, y): &(i64, i64)| y != 0)
        .build();

        let err = divide.invoke(&(8, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.rejection().unwrap().value(), "(8, 0)");
        assert_eq!(divide.invoke(&(8, 2)).unwrap(), 4);
    }

    #[test]
    fn target_failure_is_propagated_unchanged() {
        let timings = Arc::new(TimingLog::new());
        let log = Arc::new(CallLog::new());
        let divide = Wrap::new(operation("divide", |&(x, y): &(i64, i64)| {
            x.checked_div(y).ok_or(DivideByZero)
        }))
        .measure_time(timings.clone())
        .log_call(log.clone())
        .build();

        let err = divide.invoke(&(1, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Target);
        let failure = err.target_failure().expect("target failure");
        assert_eq!(failure.operation(), "divide");
        assert!(failure.downcast_ref::<DivideByZero>().is_some());

        assert!(timings.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn first_failing_input_check_wins() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let op = Wrap::new(infallible("id", |n: &i64| *n))
            .validate_inputs("first", traced_check(&trace, "first", true))
            .validate_inputs("second", traced_check(&trace, "second", false))
            .validate_inputs("third", traced_check(&trace, "third", false))
            .build();

        let err = op.invoke(&1).unwrap_err();
        assert_eq!(err.rejection().unwrap().check(), "second");
        assert_eq!(*trace.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn phases_run_in_fixed_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let op = Wrap::new(infallible("id", |n: &i64| *n))
            .log_call(Arc::new(TraceCall(trace.clone(), "log-a")))
            .validate_output("out-a", traced_check(&trace, "out-a", true))
            .measure_time(Arc::new(TraceTiming(trace.clone(), "time-a")))
            .validate_inputs("in-a", traced_check(&trace, "in-a", true))
            .log_call(Arc::new(TraceCall(trace.clone(), "log-b")))
            .measure_time(Arc::new(TraceTiming(trace.clone(), "time-b")))
            .validate_output("out-b", traced_check(&trace, "out-b", true))
            .validate_inputs("in-b", traced_check(&trace, "in-b", true))
            .build();

        op.invoke(&7).unwrap();
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["in-a", "in-b", "time-a", "time-b", "out-a", "out-b", "log-a", "log-b"]
        );
    }

    #[test]
    fn input_transforms_run_after_checks_and_before_timing() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let transform_trace = Arc::clone(&trace);
        let target_trace = Arc::clone(&trace);
        let op = Wrap::new(infallible("id", move |n: &i64| {
            target_trace.lock().unwrap().push(format!("target {}", n));
            *n
        }))
        .measure_time(Arc::new(TraceTiming(trace.clone(), "time")))
        .transform_inputs(move |n: &i64| {
            transform_trace.lock().unwrap().push(format!("transform {}", n));
            n + 1
        })
        .validate_inputs("in", traced_check(&trace, "in", true))
        .build();

        assert_eq!(op.invoke(&7).unwrap(), 8);
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["in", "transform 7", "target 8", "time"]
        );
    }

    #[test]
    fn input_transforms_chain_and_reach_call_sinks() {
        let log = Arc::new(CallLog::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let square = Wrap::new(counted_square(calls.clone()))
            .validate_inputs("n >= 0", |n: &i64| *n >= 0)
            .transform_inputs(|n: &i64| n * 10)
            .transform_inputs(|n: &i64| n - 1)
            .log_call(log.clone())
            .build();

        assert_eq!(square.invoke(&2).unwrap(), 361);
        assert_eq!(*log.calls()[0].args(), 19);

        // Checks see the caller's arguments, not the rewritten ones.
        assert_eq!(square.invoke(&-1).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn output_rejection_skips_logging() {
        let log = Arc::new(CallLog::new());
        let timings = Arc::new(TimingLog::new());
        let add = Wrap::new(infallible("add", |&(a, b): &(i64, i64)| a + b))
            .measure_time(timings.clone())
            .validate_output("non-negative", |n: &i64| *n >= 0)
            .log_call(log.clone())
            .build();

        let err = add.invoke(&(3, -5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOutput);
        assert_eq!(err.rejection().unwrap().value(), "-2");
        assert!(log.is_empty());
        assert_eq!(timings.len(), 1);
    }

    #[test]
    fn transforms_apply_before_checks_and_logging() {
        let log = Arc::new(CallLog::new());
        let prettify = Wrap::new(infallible("ugly", |_: &()| {
            "deVUelVO aLgO FeO".to_string()
        }))
        .transform_output(|s: String| s.to_lowercase())
        .transform_output(|s: String| s.replace("feo", "bonito"))
        .validate_output("lowercase", |s: &String| !s.chars().any(char::is_uppercase))
        .log_call(log.clone())
        .build();

        assert_eq!(prettify.invoke(&()).unwrap(), "devuelvo algo bonito");
        assert_eq!(log.calls()[0].output(), "devuelvo algo bonito");
    }

    #[test]
    fn timing_only_wrapper_returns_target_result() {
        let timings = Arc::new(TimingLog::new());
        let bare = infallible("cube", |n: &i64| n * n * n);
        let timed = Wrap::new(infallible("cube", |n: &i64| n * n * n))
            .measure_time(timings.clone())
            .build();

        for n in [-2, 0, 3] {
            assert_eq!(timed.invoke(&n).unwrap(), bare.invoke(&n).unwrap());
        }
        let recorded = timings.timings();
        assert_eq!(recorded.len(), 3);
        assert!(recorded.iter().all(|t| t.operation() == "cube"));
    }

    #[test]
    fn nested_wrappers_log_inside_before_outer_validation() {
        let inner_log = Arc::new(CallLog::new());
        let inner = Wrap::new(infallible("triple", |n: &i64| n * 3))
            .log_call(inner_log.clone())
            .build();
        let outer = Wrap::new(inner)
            .validate_output("< 10", |n: &i64| *n < 10)
            .build();

        assert_eq!(outer.name(), "triple");
        assert_eq!(outer.invoke(&2).unwrap(), 6);

        let err = outer.invoke(&5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOutput);
        assert_eq!(err.rejection().unwrap().operation(), "triple");

        let outputs: Vec<i64> = inner_log.calls().iter().map(|c| *c.output()).collect();
        assert_eq!(outputs, vec![6, 15]);
    }

    #[test]
    fn inner_rejection_passes_through_outer_wrapper() {
        let outer_log = Arc::new(CallLog::new());
        let inner = Wrap::new(infallible("sqrt", |x: &f64| x.sqrt()))
            .validate_inputs("x >= 0", |x: &f64| *x >= 0.0)
            .build();
        let outer = Wrap::new(inner).log_call(outer_log.clone()).build();

        let err = outer.invoke(&-1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(outer_log.is_empty());
    }

    #[test]
    fn wrap_fn_matches_builder() {
        let log = Arc::new(CallLog::new());
        let built = wrap(
            infallible("volume", |&(a, b, c): &(i64, i64, i64)| a * b * c),
            vec![
                Policy::validate_inputs("positive", |&(a, b, c): &(i64, i64, i64)| {
                    a >= 0 && b >= 0 && c >= 0
                }),
                Policy::log_call(log.clone()),
            ],
        );

        assert_eq!(built.policies().len(), 2);
        assert_eq!(built.invoke(&(2, 3, 12)).unwrap(), 72);

        let calls = log.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(*calls[0].args(), (2, 3, 12));
        assert_eq!(*calls[0].output(), 72);
    }

    #[test]
    fn wrapper_is_shareable_across_threads() {
        let log = Arc::new(CallLog::new());
        let square = Arc::new(
            Wrap::new(infallible("square", |n: &i64| n * n))
                .log_call(log.clone())
                .build(),
        );

        let handles: Vec<_> = (0..4i64)
            .map(|t| {
                let square = Arc::clone(&square);
                std::thread::spawn(move || square.invoke(&t).unwrap())
            })
            .collect();
        let mut results: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        results.sort_unstable();

        assert_eq!(results, vec![0, 1, 4, 9]);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn target_accessors_return_wrapped_operation() {
        let wrapped = Wrap::new(infallible("double", |n: &i64| n * 2))
            .validate_inputs("any", |_: &i64| true)
            .build();

        assert_eq!(wrapped.target().name(), "double");
        assert_eq!(wrapped.target().invoke(&4).unwrap(), 8);

        let target = wrapped.into_target();
        assert_eq!(target.invoke(&-3).unwrap(), -6);
    }

    #[test]
    fn debug_lists_policies() {
        let op = Wrap::new(infallible("id", |n: &i64| *n))
            .validate_inputs("any", |_: &i64| true)
            .build();
        let debug = format!("{:?}", op);
        assert!(debug.contains("\"id\""));
        assert!(debug.contains("Policy::ValidateInputs"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a rejecting input check means zero target calls
            #[test]
            fn proptest_rejection_prevents_target_call(n in -1_000i64..1_000) {
                let calls = Arc::new(AtomicUsize::new(0));
                let square = Wrap::new(counted_square(calls.clone()))
                    .validate_inputs("n >= 0", |n: &i64| *n >= 0)
                    .build();

                let result = square.invoke(&n);
                if n < 0 {
                    prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
                    prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
                } else {
                    prop_assert_eq!(result.unwrap(), n * n);
                    prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
                }
            }

            /// Property: timing never changes the result and records once per call
            #[test]
            fn proptest_timing_is_transparent(values in prop::collection::vec(-100i64..100, 1..20)) {
                let timings = Arc::new(TimingLog::new());
                let timed = Wrap::new(infallible("double", |n: &i64| n * 2))
                    .measure_time(timings.clone())
                    .build();

                for n in &values {
                    prop_assert_eq!(timed.invoke(n).unwrap(), n * 2);
                }
                prop_assert_eq!(timings.len(), values.len());
            }
        }
    }
}
