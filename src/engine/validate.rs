// src/engine/validate.rs
//
// Parameter validation against a descriptor's schema.
//
// Per parameter, in declaration order: presence -> type -> range -> named
// constraint -> step alignment. Cross-parameter constraints run last.
// The first violation wins.

use crate::error::{EngineError, Result};
use crate::schema::{AlgorithmDescriptor, ParamType, ParamValue, ParameterBinding, ParameterSpec};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

/// Relative tolerance used for float step alignment.
pub const STEP_TOLERANCE: f64 = 1e-6;

/// Check one value against one spec, returning the normalized value.
///
/// Integers bound to float parameters are widened; floats bound to integer
/// parameters are refused rather than truncated.
pub fn check_value(spec: &ParameterSpec, value: ParamValue) -> std::result::Result<ParamValue, Cow<'static, str>> {
    let value = match (spec.ty, value) {
        (ParamType::Int, ParamValue::Int(v)) => ParamValue::Int(v),
        (ParamType::Int, ParamValue::Float(_)) => return Err(Cow::Borrowed("must be an integer")),
        (ParamType::Float, ParamValue::Int(v)) => ParamValue::Float(v as f64),
        (ParamType::Float, ParamValue::Float(v)) if v.is_finite() => ParamValue::Float(v),
        (ParamType::Float, ParamValue::Float(_)) => return Err(Cow::Borrowed("must be a finite number")),
    };

    let x = value.as_f64();
    if x < spec.min || x > spec.max {
        return Err(Cow::Owned(format!(
            "must be between {} and {}",
            spec.format_bound(spec.min),
            spec.format_bound(spec.max)
        )));
    }

    if let Some(constraint) = spec.constraint {
        if !constraint.is_satisfied_by(&value) {
            return Err(Cow::Borrowed(constraint.reason()));
        }
    }

    if !on_step(spec, x) {
        return Err(Cow::Owned(format!(
            "must be {} plus a multiple of {}",
            spec.format_bound(spec.min),
            spec.format_bound(spec.step)
        )));
    }

    Ok(value)
}

fn on_step(spec: &ParameterSpec, x: f64) -> bool {
    let steps = (x - spec.min) / spec.step;
    (steps - steps.round()).abs() <= STEP_TOLERANCE
}

/// Validate a binding, returning a normalized copy holding exactly the
/// descriptor's parameters.
pub fn validate_binding(descriptor: &AlgorithmDescriptor, binding: &ParameterBinding) -> Result<ParameterBinding> {
    let mut normalized = ParameterBinding::new();
    for spec in &descriptor.params {
        let value = binding
            .get(spec.name)
            .ok_or_else(|| EngineError::invalid_parameter(spec.name, "is required"))?;
        let value = check_value(spec, value).map_err(|reason| EngineError::invalid_parameter(spec.name, reason))?;
        normalized.set(spec.name, value);
    }

    for cross in &descriptor.cross_constraints {
        cross
            .check(&normalized)
            .map_err(|reason| EngineError::invalid_parameter(cross.param(), reason))?;
    }

    for (name, _) in binding.iter() {
        if descriptor.find_param(name).is_none() {
            debug!(target: "transform_lab::validate", algorithm = descriptor.id, param = name, "ignoring unknown parameter");
        }
    }

    Ok(normalized)
}

/// Check a descriptor is internally consistent before registration.
pub(crate) fn check_descriptor(descriptor: &AlgorithmDescriptor) -> Result<()> {
    let id = descriptor.id;
    if id.is_empty() {
        return Err(EngineError::configuration("algorithm id must not be empty"));
    }
    if descriptor.accepts.is_empty() {
        return Err(EngineError::configuration(format!(
            "algorithm '{id}' accepts no channel layout"
        )));
    }

    let mut seen = HashSet::new();
    for spec in &descriptor.params {
        if !seen.insert(spec.name) {
            return Err(EngineError::configuration(format!(
                "algorithm '{id}' declares parameter '{}' twice",
                spec.name
            )));
        }
        if !(spec.min <= spec.max) {
            return Err(EngineError::configuration(format!(
                "parameter '{id}.{}' has min > max",
                spec.name
            )));
        }
        if !(spec.step > 0.0) || !spec.step.is_finite() {
            return Err(EngineError::configuration(format!(
                "parameter '{id}.{}' needs a positive step",
                spec.name
            )));
        }
        if spec.default.param_type() != spec.ty {
            return Err(EngineError::configuration(format!(
                "parameter '{id}.{}' default has the wrong type",
                spec.name
            )));
        }
        check_value(spec, spec.default).map_err(|reason| {
            EngineError::configuration(format!("default of '{id}.{}' {reason}", spec.name))
        })?;
    }

    for cross in &descriptor.cross_constraints {
        for name in cross.names() {
            if descriptor.find_param(name).is_none() {
                return Err(EngineError::configuration(format!(
                    "algorithm '{id}' constrains unknown parameter '{name}'"
                )));
            }
        }
    }

    let defaults = ParameterBinding::defaults(descriptor);
    for cross in &descriptor.cross_constraints {
        cross.check(&defaults).map_err(|reason| {
            EngineError::configuration(format!("defaults of '{id}' violate: {} {reason}", cross.param()))
        })?;
    }
    Ok(())
}
