use serde_json::Value;

use crate::constants::UNIT_HINT_MAX_LENGTH;
use crate::error::ApiError;
use crate::schema::IngredientEntry;

/*
Clients encode the `ingredients` field of a recipe payload in one of three
shapes, depending on the parser the request came through:

    {"ingredient": 1, "count": 2, "visible_type_of_count": "pcs"}
    [{"ingredient": 1, ...}, {"ingredient": 2, ...}]
    "<either of the above, JSON-serialized into a form string>"

Everything is normalized to one canonical sequence here, before any
business logic runs. Unrecognized shapes fail on the `ingredients` field.
*/

pub fn normalize_ingredients(value: Value) -> Result<Vec<IngredientEntry>, ApiError> {
    let value = match value {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|_| ApiError::validation("ingredients", "invalid JSON"))?,
        other => other,
    };

    let items = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items,
        Value::Null => vec![],
        _ => {
            return Err(ApiError::validation(
                "ingredients",
                "expected an object or a list of objects",
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_entry(index, item))
        .collect()
}

fn parse_entry(index: usize, value: Value) -> Result<IngredientEntry, ApiError> {
    let entry: IngredientEntry = serde_json::from_value(value)
        .map_err(|_| ApiError::validation("ingredients", format!("entry {index} is malformed")))?;

    if entry.count <= 0.0 {
        return Err(ApiError::validation(
            "ingredients",
            format!("entry {index}: count must be greater than 0"),
        ));
    }
    if entry.visible_type_of_count.chars().count() > UNIT_HINT_MAX_LENGTH {
        return Err(ApiError::validation(
            "ingredients",
            format!("entry {index}: visible_type_of_count is too long"),
        ));
    }

    Ok(entry)
}
