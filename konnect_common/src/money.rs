use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

const PAISA_PER_RUPEE: i64 = 100;

//--------------------------------------      Rupees       -----------------------------------------------------------
/// A Nepalese Rupee amount with paisa precision, stored as an integer number of paisa.
///
/// Monetary values never touch floating point. The canonical decimal rendering used on the wire (signatures and
/// gateway status queries) is produced by [`Rupees::to_amount_string`].
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rupees(i64);

op!(binary Rupees, Add, add);
op!(binary Rupees, Sub, sub);
op!(inplace Rupees, SubAssign, sub_assign);
op!(unary Rupees, Neg, neg);

impl Mul<i64> for Rupees {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paisa: {0}")]
pub struct RupeesConversionError(String);

impl From<i64> for Rupees {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Rupees {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rupees {}

impl TryFrom<u64> for Rupees {
    type Error = RupeesConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupeesConversionError(format!("Value {} is too large to convert to Rupees", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Rupees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rs.{}", self.to_amount_string())
    }
}

impl Rupees {
    /// The amount in paisa.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * PAISA_PER_RUPEE)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The canonical decimal rendering of the amount: whole-rupee values carry no decimal part, fractional values
    /// carry exactly two digits. Signer and verifier must agree on this byte sequence, so there is exactly one
    /// rendering per value.
    pub fn to_amount_string(&self) -> String {
        let rupees = self.0 / PAISA_PER_RUPEE;
        let paisa = (self.0 % PAISA_PER_RUPEE).abs();
        if paisa == 0 {
            format!("{rupees}")
        } else {
            format!("{rupees}.{paisa:02}")
        }
    }
}
