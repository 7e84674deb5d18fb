use crate::{
    db::DbPool,
    entities::product::{self, Column as ProductColumn, Entity as Product},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

const EMPTY_ATTRIBUTES: &str = "{}";
/// Prices are stored as DECIMAL(10, 2).
const PRICE_DECIMAL_PLACES: u32 = 2;
const PRICE_INTEGER_DIGITS: u32 = 8;

/// Service for managing the product catalog
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = Product::find()
            .order_by_asc(ProductColumn::ProductId)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing products");
                ServiceError::DatabaseError(e)
            })?;

        Ok(products.into_iter().map(ProductResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<ProductResponse, ServiceError> {
        let product = super::require_product(&*self.db_pool, product_id).await?;
        Ok(product.into())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: ProductInput,
    ) -> Result<ProductResponse, ServiceError> {
        input.validate()?;
        let attributes = input.stored_attributes()?;

        let product = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            category: Set(input.category),
            price: Set(input.price),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            image_url: Set(input.image_url),
            attributes: Set(Some(attributes)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(product_id = product.product_id, "Product created");
        Ok(product.into())
    }

    /// Full replacement; fields left out of the body fall back to their defaults.
    #[instrument(skip(self, input))]
    pub async fn replace_product(
        &self,
        product_id: i32,
        input: ProductInput,
    ) -> Result<ProductResponse, ServiceError> {
        input.validate()?;
        let attributes = input.stored_attributes()?;
        let existing = super::require_product(&*self.db_pool, product_id).await?;

        let mut product: product::ActiveModel = existing.into();
        product.name = Set(input.name);
        product.description = Set(input.description);
        product.category = Set(input.category);
        product.price = Set(input.price);
        product.stock_quantity = Set(input.stock_quantity.unwrap_or(0));
        product.image_url = Set(input.image_url);
        product.attributes = Set(Some(attributes));

        let updated = product.update(&*self.db_pool).await?;
        info!(product_id, "Product replaced");
        Ok(updated.into())
    }

    #[instrument(skip(self, patch))]
    pub async fn patch_product(
        &self,
        product_id: i32,
        patch: ProductPatch,
    ) -> Result<ProductResponse, ServiceError> {
        patch.validate()?;
        let existing = super::require_product(&*self.db_pool, product_id).await?;

        let mut product: product::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            product.name = Set(name);
        }
        if let Some(description) = patch.description {
            product.description = Set(Some(description));
        }
        if let Some(category) = patch.category {
            product.category = Set(category);
        }
        if let Some(price) = patch.price {
            product.price = Set(price);
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            product.stock_quantity = Set(stock_quantity);
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Set(Some(image_url));
        }
        if let Some(attributes) = patch.attributes {
            product.attributes = Set(Some(serialize_attributes(attributes)?));
        }

        let updated = product.update(&*self.db_pool).await?;
        info!(product_id, "Product updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let product = super::require_product(&*self.db_pool, product_id).await?;
        product.delete(&*self.db_pool).await?;
        info!(product_id, "Product deleted");
        Ok(())
    }
}

/// Attributes arrive either as already-serialized text or as a JSON object.
fn serialize_attributes(value: Value) -> Result<String, ServiceError> {
    match value {
        Value::Null => Ok(EMPTY_ATTRIBUTES.to_string()),
        Value::String(text) => Ok(text),
        Value::Object(map) => Ok(serde_json::to_string(&map)?),
        _ => Err(ServiceError::ValidationError(
            "attributes must be a JSON object or a string".to_string(),
        )),
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    let message = if price.is_sign_negative() {
        "Price cannot be negative"
    } else if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        "Price must have at most 2 decimal places"
    } else if price.trunc() >= Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS)) {
        "Price must have at most 8 digits before the decimal point"
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("price");
    err.message = Some(message.into());
    Err(err)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Wireless Headphones",
    "description": "Over-ear, noise cancelling",
    "category": "Electronics",
    "price": "199.99",
    "stock_quantity": 25,
    "image_url": "https://cdn.example.com/headphones.png",
    "attributes": {"brand": "Acme", "tags": ["audio", "wireless"]}
}))]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "199.99")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(url, length(max = 255))]
    pub image_url: Option<String>,
    /// JSON object or its serialized text form
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Value>,
}

impl ProductInput {
    fn stored_attributes(&self) -> Result<String, ServiceError> {
        serialize_attributes(self.attributes.clone().unwrap_or(Value::Null))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductPatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(url, length(max = 255))]
    pub image_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Value>,
}

/// Product representation shared by catalog, cart, order and recommendation payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub product_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[schema(value_type = String, example = "199.99")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    /// Serialized attribute mapping
    #[schema(example = "{\"brand\": \"Acme\"}")]
    pub attributes: String,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            product_id: model.product_id,
            name: model.name,
            description: model.description,
            category: model.category,
            price: model.price,
            stock_quantity: model.stock_quantity,
            image_url: model.image_url,
            attributes: model
                .attributes
                .unwrap_or_else(|| EMPTY_ATTRIBUTES.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn input(price: Decimal) -> ProductInput {
        ProductInput {
            name: "Kettle".into(),
            description: None,
            category: "Kitchen".into(),
            price,
            stock_quantity: None,
            image_url: None,
            attributes: None,
        }
    }

    #[test]
    fn attributes_accept_text_or_object() {
        assert_eq!(
            serialize_attributes(json!({"brand": "Acme"})).unwrap(),
            r#"{"brand":"Acme"}"#
        );
        assert_eq!(
            serialize_attributes(json!("{not json")).unwrap(),
            "{not json"
        );
        assert_eq!(serialize_attributes(Value::Null).unwrap(), "{}");
        assert_matches!(
            serialize_attributes(json!([1, 2])),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[rstest]
    #[case(dec!(-0.01))]
    #[case(dec!(1.999))]
    #[case(dec!(0.001))]
    #[case(dec!(100000000))]
    #[case(dec!(123456789012.00))]
    fn out_of_range_price_is_invalid(#[case] price: Decimal) {
        assert!(input(price).validate().is_err());
        let patch = ProductPatch {
            price: Some(price),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(19.99))]
    #[case(dec!(1.500))]
    #[case(dec!(99999999.99))]
    fn price_within_decimal_10_2_is_valid(#[case] price: Decimal) {
        assert!(input(price).validate().is_ok());
    }

    #[test]
    fn image_url_must_be_a_url() {
        let mut product = input(dec!(5));
        product.image_url = Some("not a url".into());
        assert!(product.validate().is_err());
    }

    #[test]
    fn missing_attributes_read_as_empty_object() {
        let response = ProductResponse::from(product::Model {
            product_id: 1,
            name: "Kettle".into(),
            description: None,
            category: "Kitchen".into(),
            price: dec!(5),
            stock_quantity: 0,
            image_url: None,
            attributes: None,
        });
        assert_eq!(response.attributes, "{}");
    }
}
