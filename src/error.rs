use thiserror::Error;

/// Failures raised by the simulation, search and capital engines.
///
/// Every operation fails fast with one of these before computing anything;
/// out-of-range inputs are never clamped or defaulted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Out-of-domain numeric input: non-positive initial value, horizon or
    /// sample count, a rate outside [0, 1], a non-finite number, a negative
    /// capital charge, mismatched sequence lengths.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Retentions summing above 1. Only surfaced for a caller-chosen vector;
    /// the equilibrium search skips such grid points instead.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("unknown shock scenario: {0}")]
    UnknownScenario(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Reject NaN and infinities with a message naming the offending input.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter(format!("{name} must be finite, got {value}")))
    }
}

/// Slice form of [`ensure_finite`]; the error names the first offending index.
pub(crate) fn ensure_all_finite(name: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        None => Ok(()),
        Some(i) => Err(ModelError::InvalidParameter(format!(
            "{name}[{i}] must be finite, got {}",
            values[i]
        ))),
    }
}
