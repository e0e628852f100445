//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

use crate::args::{Args, Value};

/// Generates any `Value`, including negative numbers and non-numeric kinds.
pub(crate) fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1_000i64..1_000).prop_map(Value::Int),
        (-1_000.0f64..1_000.0).prop_map(Value::Float),
        "[a-zA-Z ]{0,12}".prop_map(Value::Str),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// Generates a bundle of up to five positional and three named values.
pub(crate) fn arb_args() -> impl Strategy<Value = Args> {
    (
        prop::collection::vec(arb_value(), 0..5),
        prop::collection::vec(("[a-z]{1,6}", arb_value()), 0..3),
    )
        .prop_map(|(positional, named)| {
            named
                .into_iter()
                .fold(positional.into_iter().collect::<Args>(), |args, (k, v)| {
                    args.named(k, v)
                })
        })
}
