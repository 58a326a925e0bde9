//! Product catalog: CRUD plus price-range and keyword queries.

use rust_decimal::Decimal;
use tracing::info;

use storefront_core::{DomainError, DomainResult, ProductId};
use storefront_products::{PriceRange, Product, ProductDraft};

use crate::record_store::RecordStore;

pub struct ProductCatalog<S> {
    products: S,
}

fn product_not_found(id: ProductId) -> DomainError {
    DomainError::not_found(format!("product with id {id}"))
}

impl<S: RecordStore<Product>> ProductCatalog<S> {
    pub fn new(products: S) -> Self {
        Self { products }
    }

    pub fn create(&self, draft: ProductDraft) -> Product {
        let product = Product::create(ProductId::new(), draft);
        self.products.save(product.clone());
        info!(id = %product.id_typed(), name = product.name(), "product created");
        product
    }

    /// Drafts arrive validated, so either every product is created or none is
    /// (validation happens while building the drafts).
    pub fn create_bulk(&self, drafts: Vec<ProductDraft>) -> Vec<Product> {
        let created: Vec<Product> = drafts.into_iter().map(|draft| self.create(draft)).collect();
        info!(count = created.len(), "products created in bulk");
        created
    }

    pub fn list(&self) -> Vec<Product> {
        self.products.list()
    }

    pub fn get(&self, id: ProductId) -> DomainResult<Product> {
        self.products.get(&id).ok_or_else(|| product_not_found(id))
    }

    pub fn update(&self, id: ProductId, draft: ProductDraft) -> DomainResult<Product> {
        let product = self
            .products
            .update(&id, &mut |product: &mut Product| product.revise(draft.clone()))
            .ok_or_else(|| product_not_found(id))?;
        info!(id = %id, "product updated");
        Ok(product)
    }

    pub fn delete(&self, id: ProductId) -> DomainResult<Product> {
        let removed = self.products.remove(&id).ok_or_else(|| product_not_found(id))?;
        info!(id = %id, "product deleted");
        Ok(removed)
    }

    /// Products priced within `[min, max]`.
    pub fn by_price_range(&self, min: Decimal, max: Decimal) -> DomainResult<Vec<Product>> {
        let range = PriceRange::new(min, max)?;
        Ok(self.products.find_by(&|p: &Product| range.contains(p.price())))
    }

    pub fn search(&self, keyword: &str) -> Vec<Product> {
        self.products.find_by(&|p: &Product| p.matches_keyword(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::InMemoryRecordStore;

    fn catalog() -> ProductCatalog<InMemoryRecordStore<Product>> {
        ProductCatalog::new(InMemoryRecordStore::new())
    }

    fn draft(name: &str, description: &str, price: i64) -> ProductDraft {
        ProductDraft::new(name, description, Decimal::from(price)).unwrap()
    }

    #[test]
    fn create_list_update_delete() {
        let catalog = catalog();
        let phone = catalog.create(draft("iPhone 15", "Apple phone", 999));
        assert_eq!(catalog.list(), vec![phone.clone()]);

        let updated = catalog.update(phone.id_typed(), draft("iPhone 15 Pro", "Apple phone", 1199)).unwrap();
        assert_eq!(updated.id_typed(), phone.id_typed());
        assert_eq!(updated.price().amount(), Decimal::from(1199));
        assert_eq!(catalog.get(phone.id_typed()).unwrap(), updated);

        catalog.delete(phone.id_typed()).unwrap();
        assert!(catalog.list().is_empty());
        assert!(matches!(catalog.delete(phone.id_typed()), Err(DomainError::NotFound(_))));
        assert!(matches!(
            catalog.update(phone.id_typed(), draft("x", "", 1)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn bulk_create_keeps_input_order() {
        let catalog = catalog();
        let created = catalog.create_bulk(vec![draft("a", "", 1), draft("b", "", 2), draft("c", "", 3)]);
        let names: Vec<&str> = created.iter().map(Product::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(catalog.list().len(), 3);
    }

    #[test]
    fn price_range_and_search() {
        let catalog = catalog();
        catalog.create(draft("iPhone 15", "Apple smartphone", 999));
        catalog.create(draft("Pixel 8", "Google smartphone", 699));
        catalog.create(draft("USB cable", "Braided", 15));

        let mid = catalog.by_price_range(Decimal::from(699), Decimal::from(999)).unwrap();
        assert_eq!(mid.len(), 2);
        assert!(catalog.by_price_range(Decimal::from(2000), Decimal::from(3000)).unwrap().is_empty());
        assert!(matches!(
            catalog.by_price_range(Decimal::from(5), Decimal::from(1)),
            Err(DomainError::Validation(_))
        ));

        assert_eq!(catalog.search("smartphone").len(), 2);
        assert_eq!(catalog.search("Braided")[0].name(), "USB cable");
        assert!(catalog.search("SMARTPHONE").is_empty());
    }

    #[test]
    fn update_after_delete_does_not_recreate() {
        let catalog = catalog();
        let phone = catalog.create(draft("iPhone 15", "Apple phone", 999));
        catalog.delete(phone.id_typed()).unwrap();

        assert!(matches!(
            catalog.update(phone.id_typed(), draft("iPhone 15", "Apple phone", 1)),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(catalog.get(phone.id_typed()), Err(DomainError::NotFound(_))));
    }
}
