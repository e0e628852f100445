//! Explicit function wrapping with ordered validation, timing and logging.
//!
//! This crate composes a target operation with cross-cutting policies:
//! - **Input validation**: reject arguments before the target runs
//! - **Transforms**: rewrite arguments before the target or results after it
//! - **Output validation**: reject results after the target returns
//! - **Timing**: deliver the target's elapsed time to a sink
//! - **Logging**: deliver the name, arguments and result of each call to a sink
//!
//! Composition happens at construction time through [`Wrap`] or [`wrap`].
//! The resulting [`Wrapper`] is itself an [`Operation`] and can be wrapped
//! again.
//!
//! # Core Types
//!
//! - [`Operation`]: A named callable; closures become operations via
//!   [`operation`] and [`infallible`]
//! - [`Policy`]: One cross-cutting behaviour
//! - [`Wrapper`]: A target plus its policies, evaluated in a fixed order
//! - [`CallLog`], [`TimingLog`], [`TracingSink`]: Sinks for calls and timings
//! - [`Args`]: A variadic bundle of positional and named [`Value`]s
//! - [`Error`]: `InvalidInput`, `InvalidOutput` or `Target`
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use wrap_core::{each_arg, infallible, Args, CallLog, ErrorKind, Operation, Value, Wrap};
//!
//! let log = Arc::new(CallLog::new());
//! let volume = Wrap::new(infallible("volume", |args: &Args| {
//!     args.positional().iter().filter_map(Value::as_i64).product::<i64>()
//! }))
//! .check_inputs(each_arg("non-negative number", |v| {
//!     v.as_f64().is_some_and(|x| x >= 0.0)
//! }))
//! .log_call(log.clone())
//! .build();
//!
//! assert_eq!(volume.invoke(&Args::new().arg(2).arg(3).arg(12)).unwrap(), 72);
//!
//! let err = volume.invoke(&Args::new().arg(2).arg(-3)).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidInput);
//! assert_eq!(log.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod args;
mod error;
mod operation;
mod policy;
mod sink;
mod wrap;

#[cfg(test)]
mod test_utils;

pub use args::{arg_kind, each_arg, ArgKind, Args, EachArg, Value, ValueKind};
pub use error::{Error, ErrorKind, Rejection, TargetFailure};
pub use operation::{infallible, operation, FnOperation, Operation};
pub use policy::{InputCheck, OutputCheck, Policy, PolicyKind, Predicate};
pub use sink::{
    CallLog, CallRecord, CallSink, LoggedCall, Timing, TimingLog, TimingSink, TracingSink,
};
pub use wrap::{wrap, Wrap, Wrapper};
