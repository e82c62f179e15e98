use sqlx::{Pool, Postgres};

use crate::{
    error::ApiError,
    pagination::PageContext,
    schema::{Id, Like, LikeStatus, RecipeRow},
};

use super::recipes::get_recipe;

/// Flips the like for one (user, recipe) pair and reports the direction.
///
/// Both statements run in one transaction. The unique constraint on the
/// pair is the final arbiter under concurrent toggles; the application
/// delete-then-insert is an optimization, so a conflicting insert is
/// simply absorbed by ON CONFLICT instead of surfacing as an error.
pub async fn toggle_like(
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<LikeStatus, ApiError> {
    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(ApiError::NotFound("recipe"));
    }

    let mut tr = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut *tr)
        .await?
        .rows_affected();

    let status = toggle_direction(deleted > 0);
    if status == LikeStatus::Liked {
        sqlx::query(
            "INSERT INTO likes (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut *tr)
        .await?;
    }

    tr.commit().await?;

    Ok(status)
}

pub async fn like_count(recipe_id: Id, pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

pub async fn list_likes(user_id: Id, pool: &Pool<Postgres>) -> Result<Vec<Like>, ApiError> {
    let rows: Vec<Like> =
        sqlx::query_as("SELECT * FROM likes WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

/// The recipes a user has liked, newest like first.
pub async fn list_liked_recipes(
    user_id: Id,
    offset: i64,
    page_size: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM likes l
        INNER JOIN recipes r ON r.id = l.recipe_id
        WHERE l.user_id = $1 AND r.is_active
        ORDER BY l.created_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(PageContext::from_rows(rows, total_count, page_size, offset))
}

/// A pair with an existing like toggles to unliked, a bare pair to liked.
fn toggle_direction(had_like: bool) -> LikeStatus {
    if had_like {
        LikeStatus::Unliked
    } else {
        LikeStatus::Liked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_returns_to_the_original_state() {
        let mut liked = false;

        let first = toggle_direction(liked);
        liked = first == LikeStatus::Liked;
        assert_eq!(first, LikeStatus::Liked);

        let second = toggle_direction(liked);
        assert_eq!(second, LikeStatus::Unliked);

        // The second call is always the inverse of the first.
        assert_ne!(first, second);
    }
}
