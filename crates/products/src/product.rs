use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, Price, ProductId};

/// Validated product attributes (create and update payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    name: String,
    description: String,
    price: Price,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: Decimal) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            name,
            description: description.into(),
            price: Price::new(price)?,
        })
    }
}

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Price,
}

impl Product {
    pub fn create(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Replace every attribute but the id.
    pub fn revise(&mut self, draft: ProductDraft) {
        self.name = draft.name;
        self.description = draft.description;
        self.price = draft.price;
    }

    /// Keyword search: name or description contains `keyword` (case-sensitive).
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.name.contains(keyword) || self.description.contains(keyword)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Inclusive price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    min: Decimal,
    max: Decimal,
}

impl PriceRange {
    pub fn new(min: Decimal, max: Decimal) -> DomainResult<Self> {
        if min > max {
            return Err(DomainError::validation(format!(
                "minPrice ({min}) must not exceed maxPrice ({max})"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, price: Price) -> bool {
        let amount = price.amount();
        amount >= self.min && amount <= self.max
    }
}
