//! Rating value type.

use serde::Serialize;

/// Error returned when a rating value is outside the allowed range.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {min} and {max}, got {got}")]
pub struct RatingValueError {
    /// Minimum allowed value.
    pub min: i32,
    /// Maximum allowed value.
    pub max: i32,
    /// The rejected input.
    pub got: i32,
}

/// A star rating in the range 1..=5.
///
/// Input validation happens upstream in the request layer; this type
/// re-checks defensively so an out-of-range value can never reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RatingValue(i32);

impl RatingValue {
    /// Minimum rating.
    pub const MIN: i32 = 1;
    /// Maximum rating.
    pub const MAX: i32 = 5;

    /// Create a `RatingValue`, rejecting values outside 1..=5.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValueError`] if `value` is not in 1..=5.
    pub const fn try_new(value: i32) -> Result<Self, RatingValueError> {
        if value >= Self::MIN && value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(RatingValueError {
                min: Self::MIN,
                max: Self::MAX,
                got: value,
            })
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<RatingValue> for i32 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for RatingValue {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RatingValue {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // The ratings table carries a CHECK constraint, but decode defensively
        Ok(Self::try_new(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for RatingValue {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for v in 1..=5 {
            assert_eq!(RatingValue::try_new(v).unwrap().as_i32(), v);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(RatingValue::try_new(0).is_err());
        assert!(RatingValue::try_new(6).is_err());
        assert!(RatingValue::try_new(-3).is_err());
    }

    #[test]
    fn test_error_carries_bounds() {
        let err = RatingValue::try_new(9).unwrap_err();
        assert_eq!(err.min, 1);
        assert_eq!(err.max, 5);
        assert_eq!(err.got, 9);
    }

    #[test]
    fn test_serialize_transparent() {
        let v = RatingValue::try_new(4).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "4");
    }
}
