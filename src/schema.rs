// src/schema.rs
//
// Static algorithm metadata and the concrete parameter values bound to it.
// Descriptors are cheap to clone and never change after registration.

use crate::buffer::{GRAY, RGB};
use crate::error::TransformError;
use bitflags::bitflags;
use std::collections::BTreeMap;
use std::fmt;

bitflags! {
    /// Set of channel counts an algorithm accepts as input.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ChannelSet: u8 {
        /// Single-channel (grayscale) input.
        const GRAY = 0b0000_0001;
        /// Three-channel interleaved RGB input.
        const RGB  = 0b0000_0010;
    }
}

impl ChannelSet {
    pub fn accepts(&self, channels: u8) -> bool {
        match channels {
            GRAY => self.contains(ChannelSet::GRAY),
            RGB => self.contains(ChannelSet::RGB),
            _ => false,
        }
    }

    /// Human-readable list such as "1" or "1 or 3".
    pub fn describe(&self) -> String {
        let mut counts = Vec::new();
        if self.contains(ChannelSet::GRAY) {
            counts.push("1");
        }
        if self.contains(ChannelSet::RGB) {
            counts.push("3");
        }
        if counts.is_empty() {
            "nothing".to_string()
        } else {
            counts.join(" or ")
        }
    }
}

/// Channel count of the buffer an algorithm produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputChannels {
    /// Same width, height and channel count as the input.
    SameAsInput,
    /// Same width and height, always one channel.
    Single,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
}

/// A concrete parameter value, usually taken from live slider state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }

    /// Integer payload; floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) => None,
        }
    }

    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u8> for ParamValue {
    fn from(v: u8) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Named single-value constraint beyond min/max/step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// Value must be an odd integer (kernel side lengths).
    Odd,
}

impl Constraint {
    pub fn is_satisfied_by(&self, value: &ParamValue) -> bool {
        match self {
            Constraint::Odd => match value {
                ParamValue::Int(v) => v.rem_euclid(2) == 1,
                ParamValue::Float(v) => v.fract() == 0.0 && (*v as i64).rem_euclid(2) == 1,
            },
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Constraint::Odd => "must be odd",
        }
    }
}

/// Constraint relating two parameters of the same algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossConstraint {
    /// `param >= other`; a violation is reported against `param`.
    AtLeast {
        param: &'static str,
        other: &'static str,
    },
}

impl CrossConstraint {
    /// Parameter a violation is reported against.
    pub fn param(&self) -> &'static str {
        match self {
            CrossConstraint::AtLeast { param, .. } => param,
        }
    }

    pub fn names(&self) -> [&'static str; 2] {
        match self {
            CrossConstraint::AtLeast { param, other } => [param, other],
        }
    }

    /// `Ok(())` when satisfied or when either value is absent.
    pub fn check(&self, binding: &ParameterBinding) -> Result<(), String> {
        match self {
            CrossConstraint::AtLeast { param, other } => {
                match (binding.get(param), binding.get(other)) {
                    (Some(a), Some(b)) if a.as_f64() < b.as_f64() => {
                        Err(format!("must be >= {other}"))
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Schema of one tunable parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub ty: ParamType,
    pub min: f64,
    pub max: f64,
    /// Values must lie on `min + n * step`.
    pub step: f64,
    pub default: ParamValue,
    pub constraint: Option<Constraint>,
}

impl ParameterSpec {
    pub fn int(name: &'static str, label: &'static str, min: i64, max: i64, step: i64, default: i64) -> Self {
        Self {
            name,
            label,
            ty: ParamType::Int,
            min: min as f64,
            max: max as f64,
            step: step as f64,
            default: ParamValue::Int(default),
            constraint: None,
        }
    }

    pub fn float(name: &'static str, label: &'static str, min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            name,
            label,
            ty: ParamType::Float,
            min,
            max,
            step,
            default: ParamValue::Float(default),
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Format a bound the way the parameter type reads (no ".0" on integers).
    pub fn format_bound(&self, value: f64) -> String {
        match self.ty {
            ParamType::Int => format!("{}", value as i64),
            ParamType::Float => format!("{value}"),
        }
    }
}

/// Static metadata describing one transform.
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub summary: &'static str,
    pub accepts: ChannelSet,
    pub output: OutputChannels,
    pub params: Vec<ParameterSpec>,
    pub cross_constraints: Vec<CrossConstraint>,
}

impl AlgorithmDescriptor {
    pub fn new(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            summary: "",
            accepts: ChannelSet::GRAY | ChannelSet::RGB,
            output: OutputChannels::SameAsInput,
            params: Vec::new(),
            cross_constraints: Vec::new(),
        }
    }

    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    pub fn accepts(mut self, accepts: ChannelSet) -> Self {
        self.accepts = accepts;
        self
    }

    pub fn output(mut self, output: OutputChannels) -> Self {
        self.output = output;
        self
    }

    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn cross(mut self, constraint: CrossConstraint) -> Self {
        self.cross_constraints.push(constraint);
        self
    }

    pub fn find_param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    /// Channel count of the output for a given input channel count.
    pub fn output_channels(&self, input_channels: u8) -> u8 {
        match self.output {
            OutputChannels::SameAsInput => input_channels,
            OutputChannels::Single => GRAY,
        }
    }
}

/// Concrete values for a descriptor's parameters for one invocation.
///
/// Backed by an ordered map so iteration and equality are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterBinding {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding holding every parameter's default value.
    pub fn defaults(descriptor: &AlgorithmDescriptor) -> Self {
        descriptor
            .params
            .iter()
            .map(|spec| (spec.name, spec.default))
            .collect()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Integer parameter for use inside a transform.
    pub fn int(&self, name: &str) -> Result<i64, TransformError> {
        match self.values.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(ParamValue::Float(_)) => Err(TransformError::new(format!(
                "parameter '{name}' is not an integer"
            ))),
            None => Err(TransformError::new(format!("parameter '{name}' is not bound"))),
        }
    }

    /// Float parameter for use inside a transform; integers are widened.
    pub fn float(&self, name: &str) -> Result<f64, TransformError> {
        self.values
            .get(name)
            .map(ParamValue::as_f64)
            .ok_or_else(|| TransformError::new(format!("parameter '{name}' is not bound")))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterBinding {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut binding = ParameterBinding::new();
        for (k, v) in iter {
            binding.set(k, v);
        }
        binding
    }
}
