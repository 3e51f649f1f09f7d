//! Course aggregate and its value types.
//!
//! A course is a priced offering owned by the user who created it (its
//! teacher). Ownership never changes; only the teacher may mutate or delete
//! the record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::{UserId, Username};

/// Maximum length of a course name.
pub const COURSE_NAME_MAX: usize = 255;

/// Largest representable price: six significant digits, two of them
/// fractional, matching the `price_cents` column check.
const PRICE_MAX_CENTS: i64 = 999_999;

/// Validation errors for course value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseValidationError {
    EmptyName,
    NameTooLong { max: usize },
    EmptyIntroduction,
    PriceNotANumber,
    PriceTooManyDecimals,
    PriceOutOfRange,
    PriceNegative,
}

impl fmt::Display for CourseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::EmptyIntroduction => write!(f, "introduction must not be empty"),
            Self::PriceNotANumber => write!(f, "price must be a decimal number"),
            Self::PriceTooManyDecimals => {
                write!(f, "price must have at most 2 decimal places")
            }
            Self::PriceOutOfRange => write!(f, "price must not exceed 9999.99"),
            Self::PriceNegative => write!(f, "price must not be negative"),
        }
    }
}

impl std::error::Error for CourseValidationError {}

/// Stable course identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(Uuid);

impl CourseId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique course name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseName(String);

impl CourseName {
    /// Validate and construct a [`CourseName`].
    pub fn new(name: impl Into<String>) -> Result<Self, CourseValidationError> {
        Self::from_owned(name.into())
    }

    fn from_owned(name: String) -> Result<Self, CourseValidationError> {
        if name.trim().is_empty() {
            return Err(CourseValidationError::EmptyName);
        }
        if name.chars().count() > COURSE_NAME_MAX {
            return Err(CourseValidationError::NameTooLong {
                max: COURSE_NAME_MAX,
            });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for CourseName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CourseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CourseName> for String {
    fn from(value: CourseName) -> Self {
        value.0
    }
}

impl TryFrom<String> for CourseName {
    type Error = CourseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Free-text course introduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Introduction(String);

impl Introduction {
    /// Validate and construct an [`Introduction`].
    pub fn new(text: impl Into<String>) -> Result<Self, CourseValidationError> {
        Self::from_owned(text.into())
    }

    fn from_owned(text: String) -> Result<Self, CourseValidationError> {
        if text.trim().is_empty() {
            return Err(CourseValidationError::EmptyIntroduction);
        }
        Ok(Self(text))
    }
}

impl AsRef<str> for Introduction {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Introduction> for String {
    fn from(value: Introduction) -> Self {
        value.0
    }
}

impl TryFrom<String> for Introduction {
    type Error = CourseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Course price with exactly two fractional digits.
///
/// ## Invariants
/// - non-negative
/// - at most two decimal places on input
/// - at most 9999.99
///
/// Stored internally at scale 2, so [`Price::minor_units`] is always an
/// exact cent amount and [`fmt::Display`] renders `"9.99"`-style output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    /// Validate and construct a [`Price`] from a decimal value.
    pub fn new(value: Decimal) -> Result<Self, CourseValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CourseValidationError::PriceNegative);
        }
        if value.scale() > 2 && value.normalize().scale() > 2 {
            return Err(CourseValidationError::PriceTooManyDecimals);
        }
        let mut rescaled = value;
        rescaled.rescale(2);
        if rescaled.mantissa() > i128::from(PRICE_MAX_CENTS) {
            return Err(CourseValidationError::PriceOutOfRange);
        }
        Ok(Self(rescaled))
    }

    /// Parse a price from its textual form, e.g. `"9.99"`.
    pub fn parse(raw: &str) -> Result<Self, CourseValidationError> {
        let value =
            Decimal::from_str(raw.trim()).map_err(|_| CourseValidationError::PriceNotANumber)?;
        Self::new(value)
    }

    /// Reconstruct a price from stored minor units (cents).
    pub fn from_minor_units(cents: i64) -> Result<Self, CourseValidationError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Exact cent amount, suitable for integer storage and ordering.
    pub fn minor_units(&self) -> i64 {
        // Mantissa fits i64: bounded by PRICE_MAX_CENTS at construction.
        self.0.mantissa() as i64
    }

    /// Underlying decimal value at scale 2.
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner reference carried inside a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    /// Owning user's identifier, used for the write-permission check.
    pub id: UserId,
    /// Owning user's login name, rendered in serialized courses.
    pub username: Username,
}

/// Course aggregate as returned by the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub name: CourseName,
    pub introduction: Introduction,
    pub teacher: Teacher,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Whether the given user owns this course.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.teacher.id == *user_id
    }
}
