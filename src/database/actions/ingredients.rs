use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::INGREDIENT_NAME_MAX_LENGTH,
    error::ApiError,
    jwt::SessionData,
    schema::{Id, Ingredient},
};

/// The catalog is globally shared; names are not de-duplicated.
pub async fn create_ingredient(
    name: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    session.authenticate(ActionType::CreateIngredients)?;
    validate_ingredient_name(name)?;

    let id: (Id,) = sqlx::query_as("INSERT INTO ingredients (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok(id.0)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Removing a catalog entry also removes every link and cart row that
/// references it, in one transaction.
pub async fn delete_ingredient(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    session.authenticate(ActionType::ManageIngredients)?;

    if get_ingredient(id, pool).await?.is_none() {
        return Err(ApiError::NotFound("ingredient"));
    }

    let mut tr = pool.begin().await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE ingredient_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM cart_entries WHERE ingredient_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    tr.commit().await?;
    Ok(())
}

fn validate_ingredient_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("name", "name is required"));
    }
    if name.chars().count() > INGREDIENT_NAME_MAX_LENGTH {
        return Err(ApiError::validation("name", "name is too long"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_names_are_bounded() {
        assert!(validate_ingredient_name("Egg").is_ok());
        assert!(validate_ingredient_name(" ").is_err());
        assert!(validate_ingredient_name(&"x".repeat(INGREDIENT_NAME_MAX_LENGTH + 1)).is_err());
    }
}
