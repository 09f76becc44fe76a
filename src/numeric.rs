//! Numeric canonicalization for emitted literals.

use std::f64::consts::PI;

/// Angles are compared after scaling by this factor and rounding.
const ANGLE_SCALE: f64 = 100_000.0;
const MAX_PI_FACTOR: u32 = 10;
/// Digits beyond this cannot change an `f64`.
pub const MAX_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PiRelation {
    /// Exactly π.
    Unit,
    /// π / n
    Div(u32),
    /// π * n
    Mul(u32),
}

/// A canonical numeric token, rendered by the dialect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Decimal(f64),
    Pi { negative: bool, relation: PiRelation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonicalizer {
    pub precision: u32,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl Canonicalizer {
    /// Precision is clamped to [`MAX_PRECISION`].
    pub fn new(precision: u32) -> Self {
        Self {
            precision: precision.min(MAX_PRECISION),
        }
    }

    /// Round to `precision` decimal digits, ties away from zero. Never
    /// returns negative zero.
    pub fn round(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return x;
        }
        let factor = 10f64.powi(self.precision.min(MAX_PRECISION) as i32);
        let scaled = x.abs() * factor;
        // Already integral at this magnitude.
        if scaled >= 2f64.powi(52) {
            return x;
        }
        let v = (round_half_up(scaled) / factor).copysign(x);
        if v == 0.0 { 0.0 } else { v }
    }

    pub fn value(&self, x: f64) -> Numeric {
        Numeric::Decimal(self.round(x))
    }

    /// Symbolic π form when `x` is π·i or π/i for i in 1..=10, else `value(x)`.
    pub fn angle(&self, x: f64) -> Numeric {
        let scaled = round_half_up(x * ANGLE_SCALE).abs();
        for i in 1..=MAX_PI_FACTOR {
            let factor = f64::from(i);
            let relation = if scaled == round_half_up(PI / factor * ANGLE_SCALE) {
                Some(if i == 1 { PiRelation::Unit } else { PiRelation::Div(i) })
            } else if scaled == round_half_up(PI * factor * ANGLE_SCALE) {
                Some(if i == 1 { PiRelation::Unit } else { PiRelation::Mul(i) })
            } else {
                None
            };
            if let Some(relation) = relation {
                return Numeric::Pi {
                    negative: x < 0.0,
                    relation,
                };
            }
        }
        self.value(x)
    }

    /// Whether `x` rounds to `target` at this precision.
    pub fn rounds_to(&self, x: f64, target: f64) -> bool {
        self.round(x) == self.round(target)
    }
}

/// Ties round toward positive infinity.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Shortest decimal text for an already rounded value.
pub fn format_decimal(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    format!("{v}")
}
