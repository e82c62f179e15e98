use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::COMMENT_MAX_LENGTH,
    error::ApiError,
    jwt::SessionData,
    schema::{Comment, Id},
};

use super::recipes::get_recipe;

/// Creates a comment; the author is always the session caller.
pub async fn create_comment(
    recipe_id: Id,
    text: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    session.authenticate(ActionType::ManageOwnComments)?;
    validate_comment_text(text)?;

    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(ApiError::validation(
            "recipe",
            format!("unknown recipe id {recipe_id}"),
        ));
    }

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO comments (recipe_id, author_id, comment_text)
        VALUES ($1, $2, $3)
        RETURNING id
    ",
    )
    .bind(recipe_id)
    .bind(session.user_id)
    .bind(text)
    .fetch_one(pool)
    .await?;

    Ok(id.0)
}

pub async fn list_comments(recipe_id: Id, pool: &Pool<Postgres>) -> Result<Vec<Comment>, ApiError> {
    let rows: Vec<Comment> =
        sqlx::query_as("SELECT * FROM comments WHERE recipe_id = $1 ORDER BY created_at")
            .bind(recipe_id)
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

pub async fn get_comment(id: Id, pool: &Pool<Postgres>) -> Result<Option<Comment>, ApiError> {
    let row: Option<Comment> = sqlx::query_as("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Same ownership contract as recipes: missing is NotFound, foreign is
/// PermissionDenied.
pub async fn get_comment_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Comment, ApiError> {
    session.authenticate(ActionType::ManageOwnComments)?;

    match get_comment(id, pool).await? {
        None => Err(ApiError::NotFound("comment")),
        Some(comment) if session.can_modify(comment.author_id) => Ok(comment),
        Some(_) => Err(ApiError::PermissionDenied),
    }
}

pub async fn update_comment(
    id: Id,
    text: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_comment_mut(id, session, pool).await?;
    validate_comment_text(text)?;

    sqlx::query("UPDATE comments SET comment_text = $1 WHERE id = $2")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_comment(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_comment_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

fn validate_comment_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::validation("comment_text", "comment text is required"));
    }
    if text.chars().count() > COMMENT_MAX_LENGTH {
        return Err(ApiError::validation("comment_text", "comment text is too long"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_text_is_required_and_bounded() {
        assert!(validate_comment_text("").is_err());
        assert!(validate_comment_text("  \n").is_err());
        assert!(validate_comment_text("looks delicious").is_ok());
        assert!(validate_comment_text(&"x".repeat(COMMENT_MAX_LENGTH)).is_ok());
        assert!(validate_comment_text(&"x".repeat(COMMENT_MAX_LENGTH + 1)).is_err());
    }
}
