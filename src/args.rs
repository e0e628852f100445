//! A dynamic argument bundle for operations with variadic or named arguments.
//!
//! [`Args`] carries ordered positional [`Value`]s plus named values. A wrapper
//! forwards the bundle unchanged; shape and type checks are expressed as input
//! checks such as [`each_arg`] and [`arg_kind`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Rejection;
use crate::policy::InputCheck;

/// A dynamically typed argument or result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Boolean.
    Bool(bool),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    /// Returns true for `Int` and `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Returns the value as `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// The type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// See [`Value::Int`].
    Int,
    /// See [`Value::Float`].
    Float,
    /// See [`Value::Str`].
    Str,
    /// See [`Value::Bool`].
    Bool,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// Ordered positional values plus named values.
///
/// # Examples
///
/// ```
/// use wrap_core::{Args, Value};
///
/// let args = Args::new().arg(2).arg(3).arg(12).named("unit", "cm");
///
/// assert_eq!(args.len(), 4);
/// assert_eq!(args.get(1), Some(&Value::Int(3)));
/// assert_eq!(args.get_named("unit").and_then(Value::as_str), Some("cm"));
/// assert_eq!(args.to_string(), "(2, 3, 12) {unit: \"cm\"}");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Args {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named value, replacing any previous value with that name.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Returns the positional values in order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Iterates named values in name order.
    pub fn named_values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the positional value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Returns the named value.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// Returns the total number of values, positional and named.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Returns true if the bundle holds no values.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Iterates every value with its position label (`#0`, `#1`, … then names).
    fn labelled(&self) -> impl Iterator<Item = (String, &Value)> {
        self.positional
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("#{}", i), v))
            .chain(self.named.iter().map(|(k, v)| (k.clone(), v)))
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            positional: iter.into_iter().collect(),
            named: BTreeMap::new(),
        }
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.positional.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        f.write_str(")")?;
        if !self.named.is_empty() {
            f.write_str(" {")?;
            for (i, (k, v)) in self.named.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", k, v)?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

/// Check applying a predicate to every value in an [`Args`] bundle.
///
/// Created by [`each_arg`].
pub struct EachArg<F> {
    label: String,
    f: F,
}

/// Rejects the first value, positional then named, that fails `f`.
///
/// The rejection names the argument as `#index = value` or `name = value`.
///
/// # Examples
///
/// ```
/// use wrap_core::{each_arg, Args, InputCheck};
///
/// let positive = each_arg("positive number", |v| v.as_f64().is_some_and(|x| x >= 0.0));
///
/// assert!(positive.check(&Args::new().arg(23).arg(25)).is_ok());
/// let rejection = positive.check(&Args::new().arg(2).arg(-3)).unwrap_err();
/// assert_eq!(rejection.value(), "#1 = -3");
/// ```
pub fn each_arg<F>(label: impl Into<String>, f: F) -> EachArg<F>
where
    F: Fn(&Value) -> bool,
{
    EachArg {
        label: label.into(),
        f,
    }
}

impl<F: Fn(&Value) -> bool> InputCheck<Args> for EachArg<F> {
    fn check(&self, args: &Args) -> Result<(), Rejection> {
        match args.labelled().find(|(_, v)| !(self.f)(*v)) {
            Some((position, value)) => Err(Rejection::new(
                self.label.as_str(),
                format!("{} = {}", position, value),
            )),
            None => Ok(()),
        }
    }
}

/// Check requiring one positional argument to have a given kind.
///
/// Created by [`arg_kind`].
#[derive(Debug, Clone, Copy)]
pub struct ArgKind {
    index: usize,
    kind: ValueKind,
}

/// Requires positional argument `index` to be present and of `kind`.
///
/// # Examples
///
/// ```
/// use wrap_core::{arg_kind, Args, InputCheck, ValueKind};
///
/// let count_is_int = arg_kind(1, ValueKind::Int);
///
/// assert!(count_is_int.check(&Args::new().arg("Hola").arg(3)).is_ok());
/// let rejection = count_is_int.check(&Args::new().arg("Hola").arg("Mundo")).unwrap_err();
/// assert_eq!(rejection.check(), "#1 is int");
/// assert_eq!(rejection.value(), "#1 = \"Mundo\"");
/// ```
pub fn arg_kind(index: usize, kind: ValueKind) -> ArgKind {
    ArgKind { index, kind }
}

impl InputCheck<Args> for ArgKind {
    fn check(&self, args: &Args) -> Result<(), Rejection> {
        let label = format!("#{} is {}", self.index, self.kind);
        match args.get(self.index) {
            Some(v) if v.kind() == self.kind => Ok(()),
            Some(v) => Err(Rejection::new(label, format!("#{} = {}", self.index, v))),
            None => Err(Rejection::new(label, format!("#{} missing", self.index))),
        }
    }
}
