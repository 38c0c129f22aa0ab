use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Slack allowed when comparing retention sums against 1.0. Decimal inputs
/// that add to exactly 1, such as 0.34 + 0.56 + 0.1, land one ulp above 1.0
/// in binary floating point.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// The three primary insurers sharing the quota-share programme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Insurer {
    A,
    B,
    C,
}

impl Insurer {
    /// Canonical order: A, B, C. Every per-insurer loop follows it.
    pub const ALL: [Insurer; 3] = [Insurer::A, Insurer::B, Insurer::C];
}

/// One value per insurer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triple<T> {
    pub a: T,
    pub b: T,
    pub c: T,
}

impl<T> Triple<T> {
    pub fn new(a: T, b: T, c: T) -> Self {
        Triple { a, b, c }
    }

    pub fn from_fn(mut f: impl FnMut(Insurer) -> T) -> Self {
        Triple { a: f(Insurer::A), b: f(Insurer::B), c: f(Insurer::C) }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Triple<U> {
        Triple { a: f(self.a), b: f(self.b), c: f(self.c) }
    }

    pub fn each_ref(&self) -> Triple<&T> {
        Triple { a: &self.a, b: &self.b, c: &self.c }
    }

    pub fn into_array(self) -> [T; 3] {
        [self.a, self.b, self.c]
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.a, &self.b, &self.c].into_iter()
    }
}

impl<T> Index<Insurer> for Triple<T> {
    type Output = T;

    fn index(&self, insurer: Insurer) -> &T {
        match insurer {
            Insurer::A => &self.a,
            Insurer::B => &self.b,
            Insurer::C => &self.c,
        }
    }
}

impl Triple<f64> {
    pub fn sum(&self) -> f64 {
        self.a + self.b + self.c
    }

    pub fn min(&self) -> f64 {
        self.a.min(self.b).min(self.c)
    }
}

/// Retention rates for insurers A, B and C. Each component lies in [0, 1].
///
/// `1 − sum()` is ceded to an outside reinsurer and not modelled further.
/// Construction checks the per-component range only; the sum constraint is
/// checked separately because the equilibrium search skips infeasible points
/// instead of failing on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Triple<f64>", into = "Triple<f64>")]
pub struct RetentionVector(Triple<f64>);

impl TryFrom<Triple<f64>> for RetentionVector {
    type Error = ModelError;

    fn try_from(t: Triple<f64>) -> Result<Self> {
        RetentionVector::new(t.a, t.b, t.c)
    }
}

impl From<RetentionVector> for Triple<f64> {
    fn from(r: RetentionVector) -> Self {
        r.0
    }
}

impl RetentionVector {
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self> {
        for (insurer, r) in Insurer::ALL.into_iter().zip([a, b, c]) {
            check_retention(r).map_err(|_| {
                ModelError::InvalidParameter(format!(
                    "retention for insurer {insurer:?} must be in [0, 1], got {r}"
                ))
            })?;
        }
        Ok(RetentionVector(Triple::new(a, b, c)))
    }

    /// Skips the range check; for compile-time constants only.
    pub(crate) const fn new_unchecked(a: f64, b: f64, c: f64) -> Self {
        RetentionVector(Triple { a, b, c })
    }

    pub fn get(&self, insurer: Insurer) -> f64 {
        self.0[insurer]
    }

    pub fn as_triple(&self) -> Triple<f64> {
        self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    /// Share of the programme ceded to the outside reinsurer.
    pub fn ceded(&self) -> f64 {
        1.0 - self.sum()
    }

    pub fn is_feasible(&self) -> bool {
        self.sum() <= 1.0 + FEASIBILITY_TOLERANCE
    }

    pub fn satisfies_floor(&self, floor: f64) -> bool {
        self.0.iter().all(|&r| r + FEASIBILITY_TOLERANCE >= floor)
    }

    /// Reject a vector whose retentions sum above 1.
    pub fn ensure_feasible(&self) -> Result<()> {
        if self.is_feasible() {
            Ok(())
        } else {
            Err(ModelError::ConstraintViolation(format!(
                "retentions sum to {:.6}, which exceeds 1",
                self.sum()
            )))
        }
    }
}

/// Validate a single retention (or quota) rate.
pub fn check_retention(r: f64) -> Result<()> {
    if r.is_finite() && (0.0..=1.0).contains(&r) {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter(format!("rate must be in [0, 1], got {r}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_out_of_range_is_rejected() {
        assert!(matches!(
            RetentionVector::new(0.2, 1.2, 0.1),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            RetentionVector::new(-0.1, 0.2, 0.1),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(RetentionVector::new(f64::NAN, 0.2, 0.1).is_err());
    }

    #[test]
    fn decimal_sum_just_above_one_is_feasible() {
        // 0.34 + 0.56 + 0.1 evaluates to 1.0000000000000002.
        let r = RetentionVector::new(0.34, 0.56, 0.1).unwrap();
        assert!(r.sum() > 1.0);
        assert!(r.is_feasible());
        assert!(r.ensure_feasible().is_ok());
    }

    #[test]
    fn over_allocated_vector_is_a_constraint_violation() {
        let r = RetentionVector::new(0.5, 0.4, 0.3).unwrap();
        assert!(!r.is_feasible());
        assert!(matches!(r.ensure_feasible(), Err(ModelError::ConstraintViolation(_))));
    }

    #[test]
    fn ceded_share_is_complement_of_sum() {
        let r = RetentionVector::new(0.3, 0.4, 0.2).unwrap();
        assert!((r.ceded() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn floor_check_applies_to_every_component() {
        let r = RetentionVector::new(0.05, 0.5, 0.3).unwrap();
        assert!(r.satisfies_floor(0.05));
        assert!(!r.satisfies_floor(0.1));
    }

    #[test]
    fn triple_indexes_by_insurer() {
        let t = Triple::new(1.0, 2.0, 3.0);
        assert_eq!(t[Insurer::A], 1.0);
        assert_eq!(t[Insurer::C], 3.0);
        assert_eq!(t.sum(), 6.0);
        assert_eq!(t.min(), 1.0);
        assert_eq!(Triple::from_fn(|i| i).into_array(), Insurer::ALL);
    }

    #[test]
    fn deserialization_enforces_the_range_check() {
        let ok: RetentionVector = serde_json::from_str(r#"{"a":0.3,"b":0.3,"c":0.4}"#).unwrap();
        assert_eq!(ok, RetentionVector::new(0.3, 0.3, 0.4).unwrap());
        assert!(serde_json::from_str::<RetentionVector>(r#"{"a":1.5,"b":0.3,"c":0.4}"#).is_err());
        assert!(serde_json::from_str::<RetentionVector>(r#"{"a":-0.1,"b":0.3,"c":0.4}"#).is_err());
    }

    #[test]
    fn serializes_as_plain_triple() {
        let r = RetentionVector::new(0.1, 0.2, 0.3).unwrap();
        assert_eq!(serde_json::to_value(r).unwrap(), serde_json::json!({"a":0.1,"b":0.2,"c":0.3}));
    }
}
