//! Value objects: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one; constructors validate, so a value that exists is valid.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Stock-keeping unit code identifying a product variant.
///
/// Never empty; surrounding whitespace is stripped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkuCode(String);

impl SkuCode {
    pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku code cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for SkuCode {}

impl core::fmt::Display for SkuCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SkuCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SkuCode> for String {
    fn from(value: SkuCode) -> Self {
        value.0
    }
}

/// Non-negative decimal unit price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_is_trimmed_and_non_empty() {
        assert_eq!(SkuCode::parse("  sku1 ").unwrap().as_str(), "sku1");
        assert!(matches!(SkuCode::parse("   "), Err(DomainError::Validation(_))));
    }

    #[test]
    fn price_rejects_negative_amounts() {
        assert!(Price::new(Decimal::new(-1, 2)).is_err());
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert_eq!(Price::new(Decimal::new(1999, 2)).unwrap().to_string(), "19.99");
    }

    #[test]
    fn sku_deserialization_validates() {
        let ok: SkuCode = serde_json::from_str("\"iphone_15\"").unwrap();
        assert_eq!(ok.as_str(), "iphone_15");
        assert!(serde_json::from_str::<SkuCode>("\"\"").is_err());
    }

    #[test]
    fn value_objects_compare_by_value() {
        let a = SkuCode::parse("sku1").unwrap();
        let b = SkuCode::parse("sku1").unwrap();
        assert_eq!(a, b);
    }
}
