use derive_more::From;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Bits of [`Interval::info`] and [`BoolInterval::info`].
pub mod info {
    /// Defined somewhere in the range.
    pub const DEF_MIN: u8 = 0b001;
    /// Defined everywhere in the range.
    pub const DEF_MAX: u8 = 0b010;
    /// Continuous over the range.
    pub const CONT: u8 = 0b100;
    pub const ALL: u8 = DEF_MIN | DEF_MAX | CONT;
}

/// Range of reals used by interval mode. `info == 0` means undefined everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
    pub info: u8,
}

impl Interval {
    pub const fn new(min: f64, max: f64, info: u8) -> Self {
        Self { min, max, info }
    }

    /// Degenerate interval holding one number; NaN gives the undefined interval.
    pub fn point(x: f64) -> Self {
        if x.is_nan() {
            Self::undefined()
        } else {
            Self::new(x, x, info::ALL)
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::new(min, max, info::ALL)
    }

    pub const fn undefined() -> Self {
        Self::new(0.0, 0.0, 0)
    }

    pub fn is_defined(&self) -> bool {
        self.info != 0
    }

    pub fn def_min(&self) -> bool {
        self.info & info::DEF_MIN != 0
    }

    pub fn def_max(&self) -> bool {
        self.info & info::DEF_MAX != 0
    }

    pub fn cont(&self) -> bool {
        self.info & info::CONT != 0
    }

    pub fn contains(&self, x: f64) -> bool {
        self.is_defined() && self.min <= x && x <= self.max
    }

    pub fn set(&mut self, min: f64, max: f64, info: u8) {
        self.min = min;
        self.max = max;
        self.info = info;
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::new(0.0, 0.0, info::ALL)
    }
}

/// Range of booleans: `{false}`, `{true}` or `{false, true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolInterval {
    pub min: bool,
    pub max: bool,
    pub info: u8,
}

impl BoolInterval {
    pub const TRUE: Self = Self::new(true, true, 0b111);
    pub const FALSE: Self = Self::new(false, false, 0b111);
    pub const INDETERMINATE: Self = Self::new(false, true, 0b111);

    pub const fn new(min: bool, max: bool, info: u8) -> Self {
        Self { min, max, info }
    }

    pub fn point(b: bool) -> Self {
        if b {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    pub const fn undefined() -> Self {
        Self::new(false, false, 0)
    }

    pub fn is_defined(&self) -> bool {
        self.info != 0
    }
}

impl Default for BoolInterval {
    fn default() -> Self {
        Self::FALSE
    }
}

/// A concrete value in some evaluation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Complex(Complex64),
    Interval(Interval),
    BoolInterval(BoolInterval),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Complex(_) => "complex",
            Value::Interval(_) => "interval",
            Value::BoolInterval(_) => "bool interval",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex64> {
        match self {
            Value::Complex(z) => Some(*z),
            _ => None,
        }
    }

    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Value::Interval(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_interval_mut(&mut self) -> Option<&mut Interval> {
        match self {
            Value::Interval(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool_interval(&self) -> Option<&BoolInterval> {
        match self {
            Value::BoolInterval(b) => Some(b),
            _ => None,
        }
    }

    /// Numeric view of int and real values.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    /// Bitwise identity, so that NaN payloads compare equal to themselves.
    pub fn identical(&self, other: &Value) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a.to_bits() == b.to_bits()
        }
        match (self, other) {
            (Value::Real(a), Value::Real(b)) => same(*a, *b),
            (Value::Complex(a), Value::Complex(b)) => same(a.re, b.re) && same(a.im, b.im),
            (Value::Interval(a), Value::Interval(b)) => {
                same(a.min, b.min) && same(a.max, b.max) && a.info == b.info
            }
            _ => self == other,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(x) => write!(f, "{}", x),
            Value::Complex(z) => write!(f, "{}", z),
            Value::Interval(i) if !i.is_defined() => write!(f, "[undefined]"),
            Value::Interval(i) => write!(f, "[{}, {}]", i.min, i.max),
            Value::BoolInterval(b) if !b.is_defined() => write!(f, "[undefined]"),
            Value::BoolInterval(b) => write!(f, "[{}, {}]", b.min, b.max),
        }
    }
}

/// Variable bindings handed to a compiled unit for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    values: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut scope = Scope::new();
        for (name, value) in iter {
            scope.insert(name, value);
        }
        scope
    }
}
