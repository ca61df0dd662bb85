//! Collection bindings for the workshop records.

use loomworks_expenses::Expense;
use loomworks_production::{PowerloomProduction, ProductionRecord};
use loomworks_products::Product;
use loomworks_reports::{ExportLog, RevenueSetting};
use loomworks_workers::Worker;

use crate::store::Document;

impl Document for Worker {
    const COLLECTION: &'static str = "workers";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Document for Product {
    const COLLECTION: &'static str = "products";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.unique_name().to_string())
    }
}

impl Document for Expense {
    const COLLECTION: &'static str = "expenses";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Document for PowerloomProduction {
    const COLLECTION: &'static str = "powerloom_production";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Document for ProductionRecord {
    const COLLECTION: &'static str = "production";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Document for ExportLog {
    const COLLECTION: &'static str = "export_logs";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Document for RevenueSetting {
    const COLLECTION: &'static str = "settings";

    fn key(&self) -> String {
        self.key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loomworks_core::ProductId;
    use loomworks_products::NewProduct;
    use rust_decimal::Decimal;

    use crate::store::{DocumentStore, InMemoryDocumentStore, StoreError};

    fn product(name: &str) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: name.to_string(),
                worker_salary: Some(Decimal::new(5, 0)),
                owner_salary: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn product_names_are_unique_per_collection() {
        let store = InMemoryDocumentStore::new();
        store.insert(product("Cotton Saree")).await.unwrap();

        let err = store.insert(product("Cotton Saree")).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                collection: "products",
                key: "Cotton Saree".to_string()
            }
        );
        // Case-sensitive.
        assert!(store.insert(product("cotton saree")).await.is_ok());
    }

    #[tokio::test]
    async fn revenue_setting_is_keyed_by_name() {
        let store = InMemoryDocumentStore::new();
        let first = RevenueSetting::total_revenue(Decimal::new(10, 0), Utc::now()).unwrap();
        let second = RevenueSetting::total_revenue(Decimal::new(20, 0), Utc::now()).unwrap();
        store.upsert(first).await.unwrap();
        store.upsert(second).await.unwrap();

        let all: Vec<RevenueSetting> = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, Decimal::new(20, 0));
    }
}
