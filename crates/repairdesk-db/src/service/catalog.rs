//! # Product/Service Catalog
//!
//! Catalog maintenance. Reads go straight to [`ProductRepository`]; writes
//! take the write lock so the name check and the insert cannot interleave
//! with another writer.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use repairdesk_core::validation::{validate_new_product, validate_product_patch};
use repairdesk_core::{NewProduct, Product, ProductDetailsPatch, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::product::{self, ProductRepository};
use crate::service::Writer;

#[derive(Debug, Clone)]
pub struct Catalog {
    writer: Writer,
}

impl Catalog {
    pub(crate) fn new(writer: Writer) -> Self {
        Catalog { writer }
    }

    fn reads(&self) -> ProductRepository {
        ProductRepository::new(self.writer.pool().clone())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.reads().get_by_id(id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        self.reads().list().await
    }

    /// Name or tag contains `query` (case-insensitive).
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        self.reads().search(query).await
    }

    /// Adds a catalog entry.
    ///
    /// Services always start at stock 0 whatever `opening_stock` says.
    ///
    /// ## Errors
    /// * `Domain(Validation(Duplicate))` - name already used, ignoring case
    pub async fn insert(&self, input: NewProduct) -> DbResult<Product> {
        if let Err(err) = validate_new_product(&input) {
            warn!(name = %input.name, error = %err, "Product rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let name = input.name.trim().to_string();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            stock: if input.kind.tracks_stock() {
                input.opening_stock
            } else {
                0
            },
            name,
            kind: input.kind,
            cost_price_cents: input.cost_price_cents,
            sale_price_cents: input.sale_price_cents,
            has_warranty: input.has_warranty,
            tags: input.tags.iter().map(|t| t.trim().to_string()).collect(),
            created_at: now,
            updated_at: now,
        };

        let mut work = self.writer.begin().await?;
        if product::name_taken(&mut work.tx, &product.name, None).await? {
            warn!(name = %product.name, "Product name already in use");
            return Err(duplicate_name(&product.name));
        }
        product::insert(&mut work.tx, &product).await?;
        work.commit().await?;

        info!(id = %product.id, name = %product.name, kind = ?product.kind, "Product added");
        Ok(product)
    }

    /// Updates name, prices, warranty flag and tags. Stock is untouched.
    pub async fn update_details(&self, id: &str, patch: ProductDetailsPatch) -> DbResult<Product> {
        if let Err(err) = validate_product_patch(&patch) {
            warn!(id = %id, error = %err, "Product update rejected");
            return Err(err.into());
        }

        let mut work = self.writer.begin().await?;
        let mut current = product::fetch_required(&mut work.tx, id).await?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if product::name_taken(&mut work.tx, &name, Some(id)).await? {
                warn!(name = %name, "Product name already in use");
                return Err(duplicate_name(&name));
            }
            current.name = name;
        }
        if let Some(cost) = patch.cost_price_cents {
            current.cost_price_cents = cost;
        }
        if let Some(price) = patch.sale_price_cents {
            current.sale_price_cents = price;
        }
        if let Some(has_warranty) = patch.has_warranty {
            current.has_warranty = has_warranty;
        }
        if let Some(tags) = patch.tags {
            current.tags = tags.iter().map(|t| t.trim().to_string()).collect();
        }
        current.updated_at = Utc::now();

        product::update_details(&mut work.tx, &current).await?;
        work.commit().await?;

        info!(id = %id, "Product updated");
        Ok(current)
    }

    /// Removes a catalog entry no job or purchase refers to.
    ///
    /// ## Errors
    /// * `NotFound` - unknown id
    /// * `Domain(Validation(InUse))` - still on a job or in the purchase history
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut work = self.writer.begin().await?;
        product::fetch_required(&mut work.tx, id).await?;

        let (lines, purchases) = product::reference_counts(&mut work.tx, id).await?;
        let referenced_by = match (lines > 0, purchases > 0) {
            (true, _) => Some("service records"),
            (false, true) => Some("purchases"),
            (false, false) => None,
        };
        if let Some(referenced_by) = referenced_by {
            warn!(id = %id, referenced_by, "Refusing to delete referenced product");
            return Err(ValidationError::InUse {
                entity: "product".to_string(),
                id: id.to_string(),
                referenced_by: referenced_by.to_string(),
            }
            .into());
        }

        product::delete(&mut work.tx, id).await?;
        work.commit().await?;

        info!(id = %id, "Product deleted");
        Ok(())
    }
}

fn duplicate_name(name: &str) -> DbError {
    ValidationError::Duplicate {
        field: "product name".to_string(),
        value: name.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;
    use repairdesk_core::{CoreError, ErrorKind, ProductKind, UsedItemLine};

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = testing::db().await;
        let battery = db
            .products()
            .insert(NewProduct {
                name: "  Battery iPhone 13 ".to_string(),
                kind: ProductKind::Product,
                cost_price_cents: 1500,
                sale_price_cents: 3500,
                opening_stock: 4,
                has_warranty: true,
                tags: vec!["battery".to_string(), "apple".to_string()],
            })
            .await
            .unwrap();

        let loaded = db.products().get_by_id(&battery.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Battery iPhone 13");
        assert_eq!(loaded.stock, 4);
        assert_eq!(loaded.tags, vec!["battery", "apple"]);
        assert_eq!(loaded.kind, ProductKind::Product);
    }

    #[tokio::test]
    async fn test_names_unique_ignoring_case() {
        let db = testing::db().await;
        testing::part(&db, "Screen", 5000, 1).await;

        let err = db
            .products()
            .insert(NewProduct {
                name: "SCREEN".to_string(),
                kind: ProductKind::Product,
                cost_price_cents: 1,
                sale_price_cents: 1,
                opening_stock: 0,
                has_warranty: false,
                tags: Vec::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
        assert_eq!(db.products().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_service_ignores_opening_stock() {
        let db = testing::db().await;
        let labor = db
            .products()
            .insert(NewProduct {
                name: "Diagnostics".to_string(),
                kind: ProductKind::Service,
                cost_price_cents: 0,
                sale_price_cents: 2000,
                opening_stock: 10,
                has_warranty: false,
                tags: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(labor.stock, 0);
    }

    #[tokio::test]
    async fn test_update_details_keeps_stock() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 3).await;
        testing::part(&db, "Battery", 3000, 1).await;

        let updated = db
            .products()
            .update_details(
                &screen.id,
                ProductDetailsPatch {
                    sale_price_cents: Some(5500),
                    tags: Some(vec!["display".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.sale_price_cents, 5500);
        assert_eq!(updated.stock, 3);

        let clash = db
            .products()
            .update_details(
                &screen.id,
                ProductDetailsPatch {
                    name: Some("battery".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(clash.is_err());

        // Renaming to itself with different case is fine.
        let renamed = db
            .products()
            .update_details(
                &screen.id,
                ProductDetailsPatch {
                    name: Some("SCREEN".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "SCREEN");
    }

    #[tokio::test]
    async fn test_search_by_name_and_tag() {
        let db = testing::db().await;
        db.products()
            .insert(NewProduct {
                name: "LCD Assembly".to_string(),
                kind: ProductKind::Product,
                cost_price_cents: 1000,
                sale_price_cents: 4000,
                opening_stock: 1,
                has_warranty: true,
                tags: vec!["Screen".to_string()],
            })
            .await
            .unwrap();
        testing::part(&db, "Screen Protector", 500, 10).await;
        testing::part(&db, "Battery", 3000, 1).await;

        let hits = db.products().search("screen").await.unwrap();
        let names: Vec<_> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["LCD Assembly", "Screen Protector"]);

        assert_eq!(db.products().search("").await.unwrap().len(), 3);
        assert!(db.products().search("100%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_blocked_while_referenced() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 3).await;
        let spare = testing::part(&db, "Spare", 100, 0).await;

        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();
        db.settlement()
            .update_record(
                &job.id,
                repairdesk_core::ServiceRecordPatch {
                    used_items: Some(vec![UsedItemLine::new(&screen.id, 1)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = db.products().delete(&screen.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::InUse { .. }))
        ));
        assert!(db.products().get_by_id(&screen.id).await.unwrap().is_some());

        db.products().delete(&spare.id).await.unwrap();
        assert!(db.products().get_by_id(&spare.id).await.unwrap().is_none());
        assert_eq!(
            db.products().delete(&spare.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 3).await;

        let err = db
            .products()
            .insert(NewProduct {
                name: "Gold Screen".to_string(),
                kind: ProductKind::Product,
                cost_price_cents: 0,
                sale_price_cents: i64::MAX / 2 + 1,
                opening_stock: 1,
                has_warranty: false,
                tags: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let err = db
            .products()
            .update_details(
                &screen.id,
                ProductDetailsPatch {
                    name: Some("  ".to_string()),
                    sale_price_cents: Some(repairdesk_core::MAX_PRICE_CENTS + 1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let products = db.products().list().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Screen");
        assert_eq!(products[0].sale_price_cents, 5000);
    }
}
