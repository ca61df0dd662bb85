use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{DomainResult, Entity, FieldErrors, ProductId};

const NAME_MAX: usize = 100;

/// Catalog product.
///
/// `worker_salary` is the currency-per-unit rate applied to produced quantity
/// when deriving a loom operator's pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub worker_salary: Decimal,
    pub owner_salary: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "Product";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub worker_salary: Option<Decimal>,
    pub owner_salary: Option<Decimal>,
}

/// Partial update. `owner_salary: Some(None)` clears the owner rate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub worker_salary: Option<Decimal>,
    pub owner_salary: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

impl Product {
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let name = validate_name(&mut errors, &input.name);
        let worker_salary = match input.worker_salary {
            Some(rate) => {
                errors.amount(rate, "Salary cannot be negative", "Salary is too large");
                rate
            }
            None => {
                errors.push("Worker salary is required");
                Decimal::ZERO
            }
        };
        if let Some(rate) = input.owner_salary {
            errors.amount(rate, "Salary cannot be negative", "Salary is too large");
        }

        errors.into_result()?;

        Ok(Self {
            id,
            name,
            worker_salary,
            owner_salary: input.owner_salary,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. On validation failure the product is left untouched.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        let mut next = self.clone();

        if let Some(name) = patch.name {
            next.name = validate_name(&mut errors, &name);
        }
        if let Some(rate) = patch.worker_salary {
            errors.amount(rate, "Salary cannot be negative", "Salary is too large");
            next.worker_salary = rate;
        }
        if let Some(owner) = patch.owner_salary {
            if let Some(rate) = owner {
                errors.amount(rate, "Salary cannot be negative", "Salary is too large");
            }
            next.owner_salary = owner;
        }
        if let Some(active) = patch.is_active {
            next.is_active = active;
        }

        errors.into_result()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Soft delete: the product disappears from the catalog listing but
    /// historical production entries keep referencing it.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    /// Key the store enforces uniqueness on.
    pub fn unique_name(&self) -> &str {
        &self.name
    }
}

fn validate_name(errors: &mut FieldErrors, raw: &str) -> String {
    errors.required_text(
        raw,
        NAME_MAX,
        "Product name is required",
        "Product name cannot exceed 100 characters",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomworks_core::{DomainError, MAX_AMOUNT};

    fn input(name: &str, rate: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            worker_salary: Some(Decimal::new(rate, 0)),
            owner_salary: None,
        }
    }

    #[test]
    fn create_product_trims_name_and_is_active() {
        let product = Product::create(ProductId::new(), input("  Cotton Saree ", 5), Utc::now()).unwrap();
        assert_eq!(product.name, "Cotton Saree");
        assert_eq!(product.worker_salary, Decimal::new(5, 0));
        assert!(product.is_active);
    }

    #[test]
    fn create_product_requires_worker_salary() {
        let err = Product::create(
            ProductId::new(),
            NewProduct {
                name: "Towel".to_string(),
                ..NewProduct::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::validation("Worker salary is required"));
    }

    #[test]
    fn create_product_rejects_negative_rates_and_empty_name() {
        let err = Product::create(
            ProductId::new(),
            NewProduct {
                name: " ".to_string(),
                worker_salary: Some(Decimal::new(-1, 0)),
                owner_salary: Some(Decimal::new(-2, 0)),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::validation(
                "Product name is required, Salary cannot be negative, Salary cannot be negative"
            )
        );
    }

    #[test]
    fn rates_above_the_cap_are_rejected_on_create_and_patch() {
        let oversized = NewProduct {
            worker_salary: Some(MAX_AMOUNT + Decimal::ONE),
            ..input("Towel", 0)
        };
        let err = Product::create(ProductId::new(), oversized, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("Salary is too large"));

        let mut product = Product::create(ProductId::new(), input("Towel", 5), Utc::now()).unwrap();
        let err = product
            .apply_patch(
                ProductPatch {
                    worker_salary: Some(Decimal::from(10_000_000_000_000_i64)),
                    ..ProductPatch::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, DomainError::validation("Salary is too large"));
        assert_eq!(product.worker_salary, Decimal::new(5, 0));
    }

    #[test]
    fn patch_can_clear_owner_salary() {
        let mut product = Product::create(
            ProductId::new(),
            NewProduct {
                owner_salary: Some(Decimal::new(3, 0)),
                ..input("Bedsheet", 7)
            },
            Utc::now(),
        )
        .unwrap();

        product
            .apply_patch(
                ProductPatch {
                    owner_salary: Some(None),
                    worker_salary: Some(Decimal::new(75, 1)),
                    ..ProductPatch::default()
                },
                Utc::now(),
            )
            .unwrap();

        assert_eq!(product.owner_salary, None);
        assert_eq!(product.worker_salary, Decimal::new(75, 1));
    }

    #[test]
    fn patch_failure_leaves_product_untouched() {
        let mut product = Product::create(ProductId::new(), input("Bedsheet", 7), Utc::now()).unwrap();
        let before = product.clone();
        let err = product.apply_patch(
            ProductPatch {
                name: Some(String::new()),
                ..ProductPatch::default()
            },
            Utc::now(),
        );
        assert!(err.is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn deactivate_keeps_rate() {
        let mut product = Product::create(ProductId::new(), input("Lungi", 4), Utc::now()).unwrap();
        product.deactivate(Utc::now());
        assert!(!product.is_active);
        assert_eq!(product.worker_salary, Decimal::new(4, 0));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any non-negative rate with a sensible name is accepted unchanged.
            #[test]
            fn non_negative_rates_round_trip(
                name in "[A-Za-z][A-Za-z0-9 ]{0,60}",
                cents in 0i64..1_000_000
            ) {
                let rate = Decimal::new(cents, 2);
                let product = Product::create(
                    ProductId::new(),
                    NewProduct { name, worker_salary: Some(rate), owner_salary: None },
                    Utc::now(),
                ).unwrap();
                prop_assert_eq!(product.worker_salary, rate);
            }
        }
    }
}
