use serde::{Deserialize, Serialize};

/// Letter grades accepted by the calculator. Numeric grades are not supported.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[default]
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Base point value on the unweighted 4.0 scale.
    pub fn points(self) -> f64 {
        match self {
            Grade::A => 4.0,
            Grade::B => 3.0,
            Grade::C => 2.0,
            Grade::D => 1.0,
            Grade::F => 0.0,
        }
    }
}

/// Course load used to weight a grade: full-year, semester or quarter.
///
/// Serialized as the bare number (`1.0`, `0.5`, `0.25`); any other number is
/// rejected when the value is deserialized.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum CreditWeight {
    #[default]
    Full,
    Half,
    Quarter,
}

impl CreditWeight {
    pub fn value(self) -> f64 {
        match self {
            CreditWeight::Full => 1.0,
            CreditWeight::Half => 0.5,
            CreditWeight::Quarter => 0.25,
        }
    }
}

impl From<CreditWeight> for f64 {
    fn from(weight: CreditWeight) -> Self {
        weight.value()
    }
}

impl TryFrom<f64> for CreditWeight {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(CreditWeight::Full)
        } else if value == 0.5 {
            Ok(CreditWeight::Half)
        } else if value == 0.25 {
            Ok(CreditWeight::Quarter)
        } else {
            Err(format!(
                "credit weight must be one of 1.0, 0.5 or 0.25 (got {value})"
            ))
        }
    }
}
