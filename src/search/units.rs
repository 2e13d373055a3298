//! Currency magnitude normalization (crore / lakh → rupees).

/// One lakh in rupees.
pub const LAKH: f64 = 100_000.0;

/// One crore in rupees (100 lakh).
pub const CRORE: f64 = 10_000_000.0;

/// Magnitude suffix attached to a number in query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountUnit {
    /// No suffix: the literal is already in rupees.
    Rupee,
    Lakh,
    Crore,
}

impl AmountUnit {
    /// Classify a unit token captured next to a number.
    ///
    /// Any token containing `cr` is crore (`cr`, `crore`, `crores`); any other
    /// token containing `l` is lakh (`l`, `lac`, `lakh`, `lakhs`). Missing or
    /// unrecognised tokens mean rupees.
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(token) = token.map(str::to_ascii_lowercase) else {
            return Self::Rupee;
        };
        if token.contains("cr") {
            Self::Crore
        } else if token.contains('l') {
            Self::Lakh
        } else {
            Self::Rupee
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::Rupee => 1.0,
            Self::Lakh => LAKH,
            Self::Crore => CRORE,
        }
    }
}

/// Convert a magnitude and unit into whole rupees.
///
/// The product is rounded to the nearest rupee so that decimal literals
/// such as `1.15` lakh land on `115000` rather than one rupee short.
pub fn normalize(value: f64, unit: AmountUnit) -> u64 {
    (value * unit.multiplier()).round().max(0.0) as u64
}

/// [`normalize`] for a raw unit token as captured from text.
pub fn normalize_token(value: f64, token: Option<&str>) -> u64 {
    normalize(value, AmountUnit::from_token(token))
}
