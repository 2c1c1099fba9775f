//! Fixed output schema for structured expense extraction.
//!
//! The schema is defined once here. The extractor sends [`json_schema`] to the
//! model and runs every response through [`coerce`], so nothing downstream
//! ever sees an unchecked model payload.

use serde_json::{json, Map, Value};

use crate::record::ExpenseRecord;

/// Name the schema is registered under in the model request.
pub const EXPENSE_SCHEMA_NAME: &str = "Expense";

/// Single field definition within the expense schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Key in the JSON object.
    pub name: &'static str,
    /// Short title shown to the model.
    pub title: &'static str,
    /// Instruction shown to the model for this field.
    pub description: &'static str,
}

/// The three extractable fields, each independently nullable.
pub const EXPENSE_FIELDS: [FieldDef; 3] = [
    FieldDef {
        name: "amount",
        title: "expense",
        description: "Expense made on the transaction",
    },
    FieldDef {
        name: "merchant",
        title: "merchant",
        description: "Merchant name where the transaction was made",
    },
    FieldDef {
        name: "currency",
        title: "currency",
        description: "Currency of the transaction",
    },
];

const SCHEMA_DESCRIPTION: &str = "A model representing information about a transaction made on any Card. \
     This includes details like the transaction amount, the merchant, and the currency used.";

/// A model response that cannot be coerced into the expense schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),
    #[error("response root must be an object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("field `{field}` must be a string or null, found {found}")]
    FieldType {
        field: &'static str,
        found: &'static str,
    },
}

/// JSON Schema document describing [`ExpenseRecord`], as sent to the model.
#[must_use]
pub fn json_schema() -> Value {
    let mut properties = Map::new();
    for field in &EXPENSE_FIELDS {
        properties.insert(
            field.name.to_string(),
            json!({
                "title": field.title,
                "description": field.description,
                "type": ["string", "null"],
            }),
        );
    }

    json!({
        "title": EXPENSE_SCHEMA_NAME,
        "description": SCHEMA_DESCRIPTION,
        "type": "object",
        "properties": properties,
        "required": EXPENSE_FIELDS.iter().map(|f| f.name).collect::<Vec<_>>(),
        "additionalProperties": false,
    })
}

/// Parses raw model output text and coerces it into an [`ExpenseRecord`].
///
/// Tolerates a surrounding Markdown code fence, which some models emit even
/// in JSON mode.
///
/// # Errors
///
/// Returns [`SchemaViolation`] if the text is not JSON or fails [`coerce`].
pub fn coerce_str(content: &str) -> Result<ExpenseRecord, SchemaViolation> {
    let body = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(body).map_err(|e| SchemaViolation::NotJson(e.to_string()))?;
    coerce(&value)
}

/// Coerces a JSON value into an [`ExpenseRecord`].
///
/// Rules per field: missing or `null` is `None`; a string is kept unless it is
/// blank; a number becomes its decimal text. Any other type is a violation.
/// Keys outside the schema are ignored.
///
/// # Errors
///
/// Returns [`SchemaViolation`] if the root is not an object or a field has an
/// unsupported type.
pub fn coerce(value: &Value) -> Result<ExpenseRecord, SchemaViolation> {
    let Value::Object(obj) = value else {
        return Err(SchemaViolation::NotAnObject {
            found: type_name(value),
        });
    };

    let [amount, merchant, currency] = EXPENSE_FIELDS;
    Ok(ExpenseRecord::new(
        coerce_field(obj, amount.name)?,
        coerce_field(obj, merchant.name)?,
        coerce_field(obj, currency.name)?,
    ))
}

fn coerce_field(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, SchemaViolation> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(SchemaViolation::FieldType {
            field,
            found: type_name(other),
        }),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
