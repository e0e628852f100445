//! Receivers for timing and call-log data.
//!
//! A wrapper delivers measurements to a [`TimingSink`] and call records to a
//! [`CallSink`]. Sinks are the only place a wrapper has side effects, so they
//! serialise their own writes: a single wrapper may be invoked from several
//! threads at once.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One completed call, as delivered to a [`CallSink`].
#[derive(Debug, Clone, Copy)]
pub struct CallRecord<'a, A, R> {
    /// Name of the wrapped target.
    pub operation: &'a str,
    /// Arguments the target was called with.
    pub args: &'a A,
    /// Result the caller will receive.
    pub output: &'a R,
}

/// Receives a record for every successful call of a wrapped operation.
pub trait CallSink<A, R> {
    /// Records one call.
    fn record_call(&self, call: CallRecord<'_, A, R>);
}

/// Receives the elapsed time of every successful target invocation.
pub trait TimingSink {
    /// Records one measurement.
    fn record_timing(&self, operation: &str, elapsed: Duration);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic in another recorder leaves the data consistent: every write is a single push.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call captured by [`CallLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedCall<A, R> {
    seq: u64,
    operation: String,
    args: A,
    output: R,
}

impl<A, R> LoggedCall<A, R> {
    /// Returns the call's position in the log, starting at 1.
    ///
    /// Sequence numbers keep increasing across [`CallLog::clear`].
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the name of the operation that was called.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the call's arguments.
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Returns the call's result.
    pub fn output(&self) -> &R {
        &self.output
    }
}

impl<A: fmt::Debug, R: fmt::Debug> fmt::Display for LoggedCall<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} args={:?} result={:?}",
            self.seq, self.operation, self.args, self.output
        )
    }
}

struct CallLogInner<A, R> {
    calls: Vec<LoggedCall<A, R>>,
    next_seq: u64,
}

/// In-memory, append-only call log.
///
/// Clones the arguments and result of every call it receives and numbers the
/// calls in arrival order.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wrap_core::{infallible, CallLog, Operation, Wrap};
///
/// let log = Arc::new(CallLog::new());
/// let volume = Wrap::new(infallible("volume", |&(a, b, c): &(i64, i64, i64)| a * b * c))
///     .log_call(log.clone())
///     .build();
///
/// assert_eq!(volume.invoke(&(2, 3, 12)).unwrap(), 72);
///
/// let calls = log.calls();
/// assert_eq!(calls.len(), 1);
/// assert_eq!(calls[0].operation(), "volume");
/// assert_eq!(*calls[0].args(), (2, 3, 12));
/// assert_eq!(*calls[0].output(), 72);
/// ```
pub struct CallLog<A, R> {
    inner: Mutex<CallLogInner<A, R>>,
}

impl<A, R> CallLog<A, R> {
    /// Creates an empty call log.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CallLogInner {
                calls: Vec::new(),
                next_seq: 1,
            }),
        }
    }

    /// Returns the number of calls currently held.
    pub fn len(&self) -> usize {
        lock(&self.inner).calls.len()
    }

    /// Returns true if no calls are held.
    pub fn is_empty(&self) -> bool {
        lock(&self.inner).calls.is_empty()
    }

    /// Returns the total number of calls ever recorded, including cleared ones.
    pub fn total_recorded(&self) -> u64 {
        lock(&self.inner).next_seq - 1
    }

    /// Drops every held call. Sequence numbering continues.
    pub fn clear(&self) {
        lock(&self.inner).calls.clear();
    }
}

impl<A: Clone, R: Clone> CallLog<A, R> {
    /// Returns a snapshot of the held calls.
    pub fn calls(&self) -> Vec<LoggedCall<A, R>> {
        lock(&self.inner).calls.clone()
    }

    /// Runs `f` over a snapshot of the held calls.
    ///
    /// The log is unlocked while `f` runs, so `f` may invoke operations that
    /// record into this same log. Those calls are not part of the snapshot.
    pub fn with_calls<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&[LoggedCall<A, R>]) -> T,
    {
        let calls = self.calls();
        f(&calls)
    }
}

impl<A, R> Default for CallLog<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for CallLog<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("CallLog")
            .field("len", &inner.calls.len())
            .field("next_seq", &inner.next_seq)
            .finish()
    }
}

impl<A: Clone, R: Clone> CallSink<A, R> for CallLog<A, R> {
    fn record_call(&self, call: CallRecord<'_, A, R>) {
        let mut inner = lock(&self.inner);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.calls.push(LoggedCall {
            seq,
            operation: call.operation.to_string(),
            args: call.args.clone(),
            output: call.output.clone(),
        });
    }
}

/// A measurement captured by [`TimingLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    operation: String,
    elapsed: Duration,
}

impl Timing {
    /// Returns the name of the measured operation.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the measured duration.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// In-memory record of measured durations.
#[derive(Debug, Default)]
pub struct TimingLog {
    timings: Mutex<Vec<Timing>>,
}

impl TimingLog {
    /// Creates an empty timing log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all measurements.
    pub fn timings(&self) -> Vec<Timing> {
        lock(&self.timings).clone()
    }

    /// Returns the number of measurements.
    pub fn len(&self) -> usize {
        lock(&self.timings).len()
    }

    /// Returns true if nothing has been measured.
    pub fn is_empty(&self) -> bool {
        lock(&self.timings).is_empty()
    }

    /// Returns the sum of all measured durations.
    pub fn total(&self) -> Duration {
        lock(&self.timings).iter().map(Timing::elapsed).sum()
    }

    /// Drops every measurement.
    pub fn clear(&self) {
        lock(&self.timings).clear();
    }
}

impl TimingSink for TimingLog {
    fn record_timing(&self, operation: &str, elapsed: Duration) {
        lock(&self.timings).push(Timing {
            operation: operation.to_string(),
            elapsed,
        });
    }
}

/// Sink that reports calls and timings as `tracing` events.
///
/// Calls are emitted at `INFO` with the arguments and result rendered through
/// `Debug`; timings at `DEBUG` with the elapsed time in microseconds.
///
/// The `target` field lets callers route wrapper output separately from the
/// rest of their logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl<A: fmt::Debug, R: fmt::Debug> CallSink<A, R> for TracingSink {
    fn record_call(&self, call: CallRecord<'_, A, R>) {
        tracing::info!(
            target: "wrap_core::call",
            operation = %call.operation,
            args = ?call.args,
            output = ?call.output,
            "call completed"
        );
    }
}

impl TimingSink for TracingSink {
    fn record_timing(&self, operation: &str, elapsed: Duration) {
        tracing::debug!(
            target: "wrap_core::timing",
            operation = %operation,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "execution time"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{infallible, Operation};
    use crate::wrap::Wrap;
    use std::sync::Arc;
    use std::thread;

    fn record<A: Clone, R: Clone>(log: &CallLog<A, R>, operation: &str, args: A, output: R) {
        log.record_call(CallRecord {
            operation,
            args: &args,
            output: &output,
        });
    }

    #[test]
    fn call_log_starts_empty() {
        let log: CallLog<i32, i32> = CallLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert_eq!(log.total_recorded(), 0);
    }

    #[test]
    fn call_log_numbers_calls_in_order() {
        let log = CallLog::new();
        record(&log, "square", 3, 9);
        record(&log, "square", 4, 16);

        let calls = log.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].seq(), 1);
        assert_eq!(calls[1].seq(), 2);
        assert_eq!(*calls[1].args(), 4);
        assert_eq!(*calls[1].output(), 16);
    }

    #[test]
    fn call_log_sequence_survives_clear() {
        let log = CallLog::new();
        record(&log, "op", (), ());
        record(&log, "op", (), ());
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.total_recorded(), 2);

        record(&log, "op", (), ());
        assert_eq!(log.calls()[0].seq(), 3);
    }

    #[test]
    fn call_log_with_calls_borrows() {
        let log = CallLog::new();
        record(&log, "concat", ("a".to_string(), "b".to_string()), "ab".to_string());

        let joined = log.with_calls(|calls| calls[0].output().clone());
        assert_eq!(joined, "ab");
    }

    #[test]
    fn call_log_with_calls_allows_recording_into_same_log() {
        let log = Arc::new(CallLog::new());
        let square = Wrap::new(infallible("square", |n: &i64| n * n))
            .log_call(log.clone())
            .build();
        square.invoke(&3).unwrap();

        let seen = log.with_calls(|calls| {
            square.invoke(&2).unwrap();
            calls.len()
        });

        assert_eq!(seen, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(*log.calls()[1].output(), 4);
    }

    #[test]
    fn logged_call_display() {
        let log = CallLog::new();
        record(&log, "volume", (2, 3, 12), 72);

        assert_eq!(
            log.calls()[0].to_string(),
            "#1 volume args=(2, 3, 12) result=72"
        );
    }

    #[test]
    fn call_log_serialises_concurrent_writers() {
        let log = Arc::new(CallLog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..50 {
                        record(&log, "add", (t, i), t + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let calls = log.calls();
        assert_eq!(calls.len(), 400);
        let seqs: Vec<u64> = calls.iter().map(LoggedCall::seq).collect();
        assert_eq!(seqs, (1..=400).collect::<Vec<u64>>());
    }

    #[test]
    fn timing_log_accumulates() {
        let log = TimingLog::new();
        assert!(log.is_empty());

        log.record_timing("sleep", Duration::from_millis(3));
        log.record_timing("sleep", Duration::from_millis(4));

        assert_eq!(log.len(), 2);
        assert_eq!(log.total(), Duration::from_millis(7));
        assert_eq!(log.timings()[0].operation(), "sleep");

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_calls_and_timings() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let sink = TracingSink;
        sink.record_call(CallRecord {
            operation: "greet",
            args: &"Hola",
            output: &"Hola",
        });
        sink.record_timing("greet", Duration::from_micros(12));
        sink.record_timing("forever", Duration::MAX);
    }
}
