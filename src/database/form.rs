use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use crate::error::ApiError;
use crate::schema::RecipeDraft;

pub type FormData = HashMap<String, Value>;

/// Loosely-typed form payload, as delivered by multipart/form parsers
/// where every scalar arrives as a string.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| ApiError::validation(key, "invalid type conversion")),
            None => Err(ApiError::validation(key, "missing field")),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => v
                    .parse()
                    .map_err(|_e| ApiError::validation(key, "failed to parse value as a number")),
                None => Err(ApiError::validation(key, "failed to parse value as str")),
            },
            None => Err(ApiError::validation(key, "missing field")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ApiError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(ApiError::validation(key, "failed to parse value as str")),
            },
            None => Err(ApiError::validation(key, "missing field")),
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }
}

/// Assembles a recipe draft from a multipart form. The `ingredients` field
/// is passed through raw (usually a serialized-JSON string) for the
/// normalization step to decode.
pub fn recipe_draft_from_form(form: &Form) -> Result<(RecipeDraft, Option<Value>), ApiError> {
    let draft = RecipeDraft {
        title: form.get_str("title")?,
        description: form.get_str("description").unwrap_or_default(),
        instructions: form.get_str("instructions").unwrap_or_default(),
        cooking_time_minutes: form.get_number("cooking_time_minutes")?,
        servings: form.get_number("servings")?,
        image: form.get_str("image").ok(),
        is_active: true,
        is_private: form
            .get_str("is_private")
            .map(|v| v == "true")
            .unwrap_or(false),
    };

    Ok((draft, form.get_raw("ingredients").cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(entries: &[(&str, Value)]) -> Form {
        Form::from_data(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn numbers_arrive_as_form_strings() {
        let form = form(&[("servings", json!("4"))]);
        let servings: i32 = form.get_number("servings").unwrap();
        assert_eq!(servings, 4);
        assert!(form.get_number::<i32>("cooking_time_minutes").is_err());
    }

    #[test]
    fn a_multipart_form_becomes_a_draft_plus_raw_ingredients() {
        let form = form(&[
            ("title", json!("Omelet")),
            ("description", json!("d")),
            ("instructions", json!("i")),
            ("cooking_time_minutes", json!("10")),
            ("servings", json!("2")),
            (
                "ingredients",
                json!(r#"[{"ingredient": 1, "count": 2, "visible_type_of_count": "pcs"}]"#),
            ),
        ]);

        let (draft, ingredients) = recipe_draft_from_form(&form).unwrap();
        assert_eq!(draft.title, "Omelet");
        assert_eq!(draft.cooking_time_minutes, 10);
        assert_eq!(draft.servings, 2);
        assert!(draft.is_active);
        assert!(!draft.is_private);

        let entries = crate::payload::normalize_ingredients(ingredients.unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ingredient, 1);
    }

    #[test]
    fn typed_values_convert_through_try_from() {
        use crate::schema::SenderType;

        let form_ai = form(&[("sender", json!("ai"))]);
        let sender: SenderType = form_ai.get_value("sender").unwrap();
        assert_eq!(sender, SenderType::Ai);

        let form_bot = form(&[("sender", json!("bot"))]);
        assert!(form_bot.get_value::<SenderType>("sender").is_err());
    }

    #[test]
    fn a_missing_title_is_a_field_error() {
        let form = form(&[("cooking_time_minutes", json!("10")), ("servings", json!("2"))]);
        let err = recipe_draft_from_form(&form).unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field, "title"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
