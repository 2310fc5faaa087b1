//! # Validation Module
//!
//! Input validation for the back office.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (serde)                                         │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names, SKUs, prices, quantities                                   │
//! │  └── Product attributes against custom field definitions               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (barcode, sku, username, field name)                       │
//! │  └── Foreign keys (batch → product, inventory → batch)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_batch_quantity, validate_sku};
//!
//! validate_sku("TEE-BLK-M").unwrap();
//! validate_batch_quantity(24).unwrap();
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{Field, FieldType};
use crate::MAX_BATCH_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Trims `value` and checks it is non-empty and at most `max` characters.
///
/// ## Returns
/// The trimmed value.
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a product name (1..=200 characters).
///
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Linen Shirt").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name, 200)
}

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, numbers, hyphens, and underscores only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a username: 3..=50 characters, no whitespace.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = validate_name("username", username, 50)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::invalid("username", "must be at least 3 characters"));
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid("username", "must not contain spaces"));
    }

    Ok(username)
}

/// Validates a password before hashing. Only length is enforced.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::invalid("password", "must be at least 8 characters"));
    }
    Ok(())
}

/// Trims a search query; empty means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a location label written onto inventory records.
pub fn validate_location(location: &str) -> ValidationResult<String> {
    validate_name("location", location, 200)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a batch quantity (1..=999 units).
///
/// ```rust
/// use stockroom_core::validation::validate_batch_quantity;
///
/// assert!(validate_batch_quantity(1).is_ok());
/// assert!(validate_batch_quantity(0).is_err());
/// assert!(validate_batch_quantity(1000).is_err());
/// ```
pub fn validate_batch_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_BATCH_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_BATCH_QUANTITY,
        });
    }

    Ok(())
}

/// Batch prices must be strictly positive.
pub fn validate_positive_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Product list prices may be zero (free items) but not negative.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Identifiers
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::invalid("id", "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Custom Fields
// =============================================================================

/// Checks a field definition is self-consistent.
///
/// `select` fields need at least one option; other types must have none.
pub fn validate_field_definition(
    name: &str,
    field_type: FieldType,
    options: &[String],
) -> ValidationResult<String> {
    let name = validate_name("name", name, 100)?;

    match field_type {
        FieldType::Select if options.is_empty() => {
            return Err(ValidationError::invalid("options", "select fields need at least one option"));
        }
        FieldType::Select => {
            if options.iter().any(|o| o.trim().is_empty()) {
                return Err(ValidationError::invalid("options", "options must not be blank"));
            }
        }
        _ if !options.is_empty() => {
            return Err(ValidationError::invalid(
                "options",
                format!("only select fields take options, not {}", field_type.as_str()),
            ));
        }
        _ => {}
    }

    Ok(name)
}

/// Validates product attribute values against the defined custom fields.
///
/// ## Rules
/// - Every key must name a defined field
/// - Every `required` field must be present and non-null
/// - `number` values are JSON numbers, `boolean` values JSON booleans
/// - `text` values are strings; `select` values are one of the field's options
///
/// ## Example
/// ```rust
/// use std::collections::BTreeMap;
/// use stockroom_core::validation::validate_attributes;
///
/// // No fields defined: only an empty attribute map is valid.
/// assert!(validate_attributes(&BTreeMap::new(), &[]).is_ok());
/// ```
pub fn validate_attributes(
    attributes: &BTreeMap<String, Value>,
    fields: &[Field],
) -> ValidationResult<()> {
    for key in attributes.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            return Err(ValidationError::UnknownField(key.clone()));
        }
    }

    for field in fields {
        let value = match attributes.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(ValidationError::required(field.name.clone()));
                }
                continue;
            }
            Some(value) => value,
        };

        let ok = match field.field_type {
            FieldType::Text => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Select => {
                let chosen = value.as_str().unwrap_or_default();
                if value.is_string() && !field.options.iter().any(|o| o == chosen) {
                    return Err(ValidationError::NotAllowed {
                        field: field.name.clone(),
                        allowed: field.options.clone(),
                    });
                }
                value.is_string()
            }
        };

        if !ok {
            return Err(ValidationError::invalid(
                field.name.clone(),
                format!("expected a {} value", field.field_type.as_str()),
            ));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn field(name: &str, field_type: FieldType, options: &[&str], required: bool) -> Field {
        let now = Utc::now();
        Field {
            id: format!("f-{}", name),
            name: name.to_string(),
            field_type,
            options: options.iter().map(|s| s.to_string()).collect(),
            required,
            created_at: now,
            updated_at: now,
        }
    }

    fn attrs(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TEE-BLK-M").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name_trims() {
        assert_eq!(validate_product_name("  Linen Shirt ").unwrap(), "Linen Shirt");
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username(" alice ").unwrap(), "alice");
        assert!(validate_username("al").is_err());
        assert!(validate_username("al ice").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_batch_quantity() {
        assert!(validate_batch_quantity(1).is_ok());
        assert!(validate_batch_quantity(999).is_ok());
        assert!(validate_batch_quantity(0).is_err());
        assert!(validate_batch_quantity(-3).is_err());
        assert!(validate_batch_quantity(1000).is_err());
    }

    #[test]
    fn test_prices() {
        assert!(validate_positive_price("cost_price", 1).is_ok());
        assert!(validate_positive_price("cost_price", 0).is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_field_definition() {
        assert!(validate_field_definition("size", FieldType::Select, &["S".into(), "M".into()]).is_ok());
        assert!(validate_field_definition("size", FieldType::Select, &[]).is_err());
        assert!(validate_field_definition("weight", FieldType::Number, &["1".into()]).is_err());
        assert!(validate_field_definition(" ", FieldType::Text, &[]).is_err());
    }

    #[test]
    fn test_attributes_accept_matching_values() {
        let fields = vec![
            field("color", FieldType::Text, &[], true),
            field("size", FieldType::Select, &["S", "M", "L"], false),
            field("weight", FieldType::Number, &[], false),
            field("organic", FieldType::Boolean, &[], false),
        ];

        let values = attrs(json!({
            "color": "black",
            "size": "M",
            "weight": 0.4,
            "organic": true
        }));
        assert!(validate_attributes(&values, &fields).is_ok());

        // Optional fields may be omitted.
        assert!(validate_attributes(&attrs(json!({"color": "red"})), &fields).is_ok());
    }

    #[test]
    fn test_attributes_reject_bad_values() {
        let fields = vec![
            field("color", FieldType::Text, &[], true),
            field("size", FieldType::Select, &["S", "M"], false),
            field("weight", FieldType::Number, &[], false),
        ];

        let missing = validate_attributes(&attrs(json!({"size": "S"})), &fields);
        assert!(matches!(missing, Err(ValidationError::Required { .. })));

        let unknown = validate_attributes(&attrs(json!({"color": "red", "fit": "slim"})), &fields);
        assert!(matches!(unknown, Err(ValidationError::UnknownField(ref k)) if k == "fit"));

        let not_option = validate_attributes(&attrs(json!({"color": "red", "size": "XL"})), &fields);
        assert!(matches!(not_option, Err(ValidationError::NotAllowed { .. })));

        let wrong_type = validate_attributes(&attrs(json!({"color": "red", "weight": "heavy"})), &fields);
        assert!(matches!(wrong_type, Err(ValidationError::InvalidFormat { .. })));
    }
}
