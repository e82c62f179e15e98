use sqlx::{Pool, Postgres};

use crate::{
    error::ApiError,
    schema::{CartRow, Id},
};

use super::ingredients::get_ingredient;

/// Puts an ingredient into the caller's cart. Re-adding an ingredient
/// replaces its amount instead of duplicating the row.
pub async fn add_to_cart(
    user_id: Id,
    ingredient_id: Id,
    count_in_grams: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if count_in_grams <= 0 {
        return Err(ApiError::validation(
            "count_in_grams",
            "amount must be greater than 0",
        ));
    }
    if get_ingredient(ingredient_id, pool).await?.is_none() {
        return Err(ApiError::validation(
            "ingredient",
            format!("unknown ingredient id {ingredient_id}"),
        ));
    }

    sqlx::query(
        "
        INSERT INTO cart_entries (user_id, ingredient_id, count_in_grams)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, ingredient_id) DO UPDATE
        SET count_in_grams = EXCLUDED.count_in_grams;
    ",
    )
    .bind(user_id)
    .bind(ingredient_id)
    .bind(count_in_grams)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_cart(user_id: Id, pool: &Pool<Postgres>) -> Result<Vec<CartRow>, ApiError> {
    let rows: Vec<CartRow> = sqlx::query_as(
        "
        SELECT c.id AS id, c.ingredient_id AS ingredient_id, i.name AS name, c.count_in_grams AS count_in_grams, c.created_at AS created_at
        FROM cart_entries c
        INNER JOIN ingredients i ON i.id = c.ingredient_id
        WHERE c.user_id = $1
        ORDER BY c.created_at
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn remove_from_cart(
    user_id: Id,
    ingredient_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM cart_entries WHERE user_id = $1 AND ingredient_id = $2")
        .bind(user_id)
        .bind(ingredient_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("cart entry"));
    }

    Ok(())
}

/// Empties the cart and reports how many rows went away.
pub async fn clear_cart(user_id: Id, pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    let result = sqlx::query("DELETE FROM cart_entries WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
