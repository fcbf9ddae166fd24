use rust_decimal::Decimal;
use serde_json::json;

use crate::database::models::Product;
use crate::database::{Gateway, GatewayError};
use crate::entities::EntityError;
use crate::validator::Validator;

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub stock: i32,
}

/// Product entity: CRUD, pagination, and search over bound-parameter queries.
pub struct Products {
    gateway: Gateway,
}

impl Products {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>, GatewayError> {
        self.gateway
            .fetch_optional(
                "SELECT * FROM \"products\" WHERE \"id\" = $1",
                &[json!(id)],
            )
            .await
    }

    /// One page of products, newest first, with the unpaged total. The
    /// optional category filter narrows both.
    pub async fn get_page(
        &self,
        page: i64,
        per_page: i64,
        category_id: Option<i64>,
    ) -> Result<(Vec<Product>, i64), GatewayError> {
        let offset = (page.max(1) - 1) * per_page;
        match category_id {
            Some(category_id) => {
                let rows = self
                    .gateway
                    .fetch_all(
                        "SELECT * FROM \"products\" WHERE \"category_id\" = $1 \
                         ORDER BY \"created_at\" DESC, \"id\" DESC LIMIT $2 OFFSET $3",
                        &[json!(category_id), json!(per_page), json!(offset)],
                    )
                    .await?;
                let total = self
                    .gateway
                    .fetch_scalar(
                        "SELECT COUNT(*) FROM \"products\" WHERE \"category_id\" = $1",
                        &[json!(category_id)],
                    )
                    .await?;
                Ok((rows, total))
            }
            None => {
                let rows = self
                    .gateway
                    .fetch_all(
                        "SELECT * FROM \"products\" \
                         ORDER BY \"created_at\" DESC, \"id\" DESC LIMIT $1 OFFSET $2",
                        &[json!(per_page), json!(offset)],
                    )
                    .await?;
                let total = self
                    .gateway
                    .fetch_scalar("SELECT COUNT(*) FROM \"products\"", &[])
                    .await?;
                Ok((rows, total))
            }
        }
    }

    /// Case-insensitive substring search over name and description. The term
    /// reaches the database only as a bound pattern.
    pub async fn search(
        &self,
        term: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Product>, i64), GatewayError> {
        let pattern = format!("%{}%", term);
        let offset = (page.max(1) - 1) * per_page;
        let rows = self
            .gateway
            .fetch_all(
                "SELECT * FROM \"products\" \
                 WHERE \"name\" ILIKE $1 OR \"description\" ILIKE $1 \
                 ORDER BY \"name\" LIMIT $2 OFFSET $3",
                &[json!(pattern), json!(per_page), json!(offset)],
            )
            .await?;
        let total = self
            .gateway
            .fetch_scalar(
                "SELECT COUNT(*) FROM \"products\" \
                 WHERE \"name\" ILIKE $1 OR \"description\" ILIKE $1",
                &[json!(pattern)],
            )
            .await?;
        Ok((rows, total))
    }

    pub async fn count_all(&self) -> Result<i64, GatewayError> {
        self.gateway
            .fetch_scalar("SELECT COUNT(*) FROM \"products\"", &[])
            .await
    }

    pub async fn create(&self, new_product: NewProduct) -> Result<i64, EntityError> {
        validate(&new_product)?;
        let id = self
            .gateway
            .fetch_scalar(
                "INSERT INTO \"products\" \
                 (\"name\", \"description\", \"price\", \"category_id\", \"image\", \"stock\") \
                 VALUES ($1, $2, $3::numeric, $4::bigint, $5, $6) RETURNING \"id\"",
                &[
                    json!(new_product.name),
                    json!(new_product.description),
                    json!(new_product.price.to_string()),
                    new_product.category_id.map(|id| json!(id)).unwrap_or(json!(null)),
                    new_product.image.map(|i| json!(i)).unwrap_or(json!(null)),
                    json!(new_product.stock),
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn update(&self, id: i64, product: NewProduct) -> Result<(), EntityError> {
        validate(&product)?;
        let rows = self
            .gateway
            .execute(
                "UPDATE \"products\" SET \"name\" = $1, \"description\" = $2, \
                 \"price\" = $3::numeric, \"category_id\" = $4::bigint, \"stock\" = $5, \
                 \"updated_at\" = now() WHERE \"id\" = $6",
                &[
                    json!(product.name),
                    json!(product.description),
                    json!(product.price.to_string()),
                    product.category_id.map(|c| json!(c)).unwrap_or(json!(null)),
                    json!(product.stock),
                    json!(id),
                ],
            )
            .await?;
        if rows == 0 {
            return Err(GatewayError::NotFound("Product not found".to_string()).into());
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<u64, GatewayError> {
        self.gateway.delete_by_id("products", id).await
    }
}

fn validate(product: &NewProduct) -> Result<(), EntityError> {
    let mut errors = Vec::new();
    let mut validator = Validator::new();
    if validator.validate_required("Name", &product.name) {
        validator.validate_length("Name", &product.name, 2, 200);
    }
    validator.validate_length("Description", &product.description, 0, 5000);
    errors.extend(validator.into_errors());
    // Checked here rather than in Validator: price and stock are already
    // numeric by the time they reach the entity.
    if product.price < Decimal::ZERO {
        errors.push("Price must not be negative".to_string());
    }
    if product.stock < 0 {
        errors.push("Stock must not be negative".to_string());
    }
    if !errors.is_empty() {
        return Err(EntityError::Validation(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: &str, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: "A fine product".to_string(),
            price: price.parse().unwrap(),
            category_id: None,
            image: None,
            stock,
        }
    }

    #[test]
    fn accepts_well_formed_product() {
        assert!(validate(&product("Mug", "9.99", 3)).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let err = validate(&product("  ", "9.99", 3)).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.iter().any(|e| e.contains("required")));
    }

    #[test]
    fn rejects_negative_price_and_stock() {
        assert!(validate(&product("Mug", "-1.00", 3)).is_err());
        assert!(validate(&product("Mug", "9.99", -1)).is_err());
    }

    #[test]
    fn reports_every_failure_at_once() {
        let err = validate(&product("  ", "-1.00", -1)).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("Name")));
        assert!(errors.iter().any(|e| e.contains("Price")));
        assert!(errors.iter().any(|e| e.contains("Stock")));
    }
}
