//! Contains the [`Value`] type held by each cell of a [`FillingRow`](crate::FillingRow)
//! and the [`Direction`] used to order it.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// The sort direction of a key column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest values first. Fill steps must be positive.
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Largest values first. Fill steps must be negative.
    #[serde(rename = "desc")]
    Descending,
}

impl Direction {
    /// Maps the `descending` flag of Arrow's `SortOptions` to a direction.
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    /// `1` for ascending, `-1` for descending.
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Reorients an ascending comparison result for this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}

/// A single numeric cell of a sort key column.
///
/// Integer-like Arrow types (including dates, times, timestamps and
/// durations) are read as [`Value::Int`] or [`Value::UInt`] depending on
/// their signedness, floating point types as [`Value::Float`].
/// [`Value::Null`] stands for both a SQL NULL and an absent fill bound.
///
/// The derived `PartialEq` is structural, so `Int(1) != UInt(1)`; use
/// [`equals`] for the numeric comparison used when generating rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for [`Value::UInt`].
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt(_))
    }

    /// The integer value widened so that signed and unsigned values share a domain.
    pub(crate) fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::Int(v) => Some(i128::from(v)),
            Self::UInt(v) => Some(i128::from(v)),
            Self::Null | Self::Float(_) => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::UInt(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            Self::Null => None,
        }
    }

    /// `-1`, `0` or `1`, or `None` for null and NaN.
    pub fn signum(&self) -> Option<i8> {
        let ordering = match *self {
            Self::Int(v) => v.cmp(&0),
            Self::UInt(v) => v.cmp(&0),
            Self::Float(v) => v.partial_cmp(&0.0)?,
            Self::Null => return None,
        };
        Some(ordering as i8)
    }

    /// Compares two values in the order given by `direction`.
    ///
    /// Signed and unsigned integers compare numerically, so `Int(-1)`
    /// is less than `UInt(0)`. Returns `None` if either side is null or
    /// a NaN is involved.
    pub fn cmp_directed(&self, other: &Self, direction: Direction) -> Option<Ordering> {
        let ordering = match (*self, *other) {
            (Self::Null, _) | (_, Self::Null) => return None,
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(&b)?,
            (Self::Float(a), b) => a.partial_cmp(&b.as_f64()?)?,
            (a, Self::Float(b)) => a.as_f64()?.partial_cmp(&b)?,
            (a, b) => a.as_i128()?.cmp(&b.as_i128()?),
        };
        Some(direction.apply(ordering))
    }

    /// Adds `step` to this value.
    ///
    /// Integers keep their representation, except that an unsigned value
    /// stepped below zero becomes signed. Returns `None` on overflow, for
    /// a non-finite float result, or if either side is null.
    pub fn checked_add(&self, step: &Self) -> Option<Self> {
        match (*self, *step) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Float(a), s) => finite(a + s.as_f64()?),
            (v, Self::Float(s)) => finite(v.as_f64()? + s),
            (v, s) => {
                let sum = v.as_i128()?.checked_add(s.as_i128()?)?;
                match v {
                    Self::UInt(_) => u64::try_from(sum)
                        .map(Self::UInt)
                        .or_else(|_| i64::try_from(sum).map(Self::Int))
                        .ok(),
                    _ => i64::try_from(sum).map(Self::Int).ok(),
                }
            }
        }
    }
}

fn finite(v: f64) -> Option<Value> {
    v.is_finite().then_some(Value::Float(v))
}

/// True if `lhs` sorts strictly before `rhs` in `direction`. False whenever
/// the two are not comparable.
pub fn less(lhs: &Value, rhs: &Value, direction: Direction) -> bool {
    lhs.cmp_directed(rhs, direction) == Some(Ordering::Less)
}

/// True if both values are non-null and numerically equal.
pub fn equals(lhs: &Value, rhs: &Value) -> bool {
    lhs.cmp_directed(rhs, Direction::Ascending) == Some(Ordering::Equal)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_and_unsigned_compare_numerically() {
        assert!(less(&Value::Int(-1), &Value::UInt(0), Direction::Ascending));
        assert!(less(&Value::UInt(0), &Value::Int(-1), Direction::Descending));
        assert!(equals(&Value::Int(7), &Value::UInt(7)));
        assert!(less(
            &Value::Int(i64::MAX),
            &Value::UInt(u64::MAX),
            Direction::Ascending
        ));
        assert!(equals(&Value::Float(2.0), &Value::Int(2)));
        assert!(less(&Value::Float(1.5), &Value::UInt(2), Direction::Ascending));
    }

    #[test]
    fn null_and_nan_are_not_comparable() {
        assert_eq!(None, Value::Null.cmp_directed(&Value::Int(1), Direction::Ascending));
        assert_eq!(None, Value::Int(1).cmp_directed(&Value::Null, Direction::Descending));
        assert!(!equals(&Value::Null, &Value::Null));
        assert!(!equals(&Value::Float(f64::NAN), &Value::Float(f64::NAN)));
        assert!(!less(&Value::Float(f64::NAN), &Value::Int(0), Direction::Ascending));
    }

    #[test]
    fn unsigned_stepped_below_zero_becomes_signed() {
        assert_eq!(Some(Value::UInt(1)), Value::UInt(3).checked_add(&Value::Int(-2)));
        assert_eq!(Some(Value::Int(-1)), Value::UInt(1).checked_add(&Value::Int(-2)));
        assert_eq!(
            Some(Value::UInt(u64::MAX)),
            Value::UInt(u64::MAX - 1).checked_add(&Value::Int(1))
        );
        assert_eq!(None, Value::UInt(u64::MAX).checked_add(&Value::Int(1)));
    }

    #[test]
    fn checked_add_overflow_and_floats() {
        assert_eq!(None, Value::Int(i64::MAX).checked_add(&Value::Int(1)));
        assert_eq!(Some(Value::Int(-4)), Value::Int(-2).checked_add(&Value::Int(-2)));
        assert_eq!(Some(Value::Float(1.5)), Value::Int(1).checked_add(&Value::Float(0.5)));
        assert_eq!(
            Some(Value::Float(0.25)),
            Value::Float(0.5).checked_add(&Value::Float(-0.25))
        );
        assert_eq!(None, Value::Float(f64::MAX).checked_add(&Value::Float(f64::MAX)));
        assert_eq!(None, Value::Null.checked_add(&Value::Int(1)));
        assert_eq!(None, Value::Int(1).checked_add(&Value::Null));
    }

    #[test]
    fn signum() {
        assert_eq!(Some(-1), Value::Int(-3).signum());
        assert_eq!(Some(0), Value::UInt(0).signum());
        assert_eq!(Some(1), Value::Float(0.1).signum());
        assert_eq!(None, Value::Float(f64::NAN).signum());
        assert_eq!(None, Value::Null.signum());
    }

    #[test]
    fn deserialize_from_json_numbers() {
        let values: Vec<Value> =
            serde_json::from_str("[null, -3, 18446744073709551615, 2.5]").unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Int(-3),
                Value::UInt(u64::MAX),
                Value::Float(2.5)
            ]
        );
    }
}
