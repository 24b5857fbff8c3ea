use std::fmt;

/// Sentinel for "no value": control changes carrying it leave the scene as is.
pub const MISSING: f64 = f64::NAN;

#[inline]
#[must_use]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("cannot convert {from} ({from_base}) to {to} ({to_base})")]
    Incompatible {
        from: String,
        from_base: String,
        to: String,
        to_base: String,
    },
}

/// An affine unit over a named base dimension.
///
/// `base_value = value * scale + offset`, so seconds, minutes and hours all
/// share the base `"s"`, and Kelvin/Celsius share `"K"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    symbol: String,
    base: String,
    scale: f64,
    offset: f64,
}

impl Unit {
    /// A base unit: converts to itself with scale 1.
    pub fn base(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            base: symbol.clone(),
            symbol,
            scale: 1.0,
            offset: 0.0,
        }
    }

    pub fn scaled(symbol: impl Into<String>, of: &Unit, scale: f64) -> Self {
        Self::affine(symbol, of, scale, 0.0)
    }

    pub fn affine(symbol: impl Into<String>, of: &Unit, scale: f64, offset: f64) -> Self {
        Self {
            symbol: symbol.into(),
            base: of.base.clone(),
            scale: scale * of.scale,
            offset: offset * of.scale + of.offset,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Everything that defines the unit, with floats as bit patterns so it
    /// can be hashed.
    #[must_use]
    pub(crate) fn structural_key(&self) -> (String, String, u64, u64) {
        (
            self.symbol.clone(),
            self.base.clone(),
            self.scale.to_bits(),
            self.offset.to_bits(),
        )
    }

    #[must_use]
    pub fn is_convertible(&self, other: &Unit) -> bool {
        self.base == other.base
    }

    pub fn convert(&self, value: f64, to: &Unit) -> Result<f64, UnitError> {
        if !self.is_convertible(to) {
            return Err(UnitError::Incompatible {
                from: self.symbol.clone(),
                from_base: self.base.clone(),
                to: to.symbol.clone(),
                to_base: to.base.clone(),
            });
        }
        if self == to {
            return Ok(value);
        }
        Ok((value * self.scale + self.offset - to.offset) / to.scale)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// A control value with an optional unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValue {
    pub value: f64,
    pub unit: Option<Unit>,
}

impl ScalarValue {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self { value, unit: None }
    }

    #[must_use]
    pub fn with_unit(value: f64, unit: Unit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    #[must_use]
    pub fn missing() -> Self {
        Self::new(MISSING)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        is_missing(self.value)
    }

    /// Expresses this value in `target`'s coordinates.
    ///
    /// Unitless values (or unitless targets) pass through unchanged.
    pub fn in_unit(&self, target: Option<&Unit>) -> Result<f64, UnitError> {
        match (&self.unit, target) {
            (Some(from), Some(to)) => from.convert(self.value, to),
            _ => Ok(self.value),
        }
    }
}
