use sqlx::{Pool, Postgres};

use crate::{
    constants::SEARCH_TEXT_MAX_LENGTH,
    error::ApiError,
    schema::{Id, SearchHistoryEntry},
};

/// Appends a search term to the caller's history unless it repeats their
/// most recent entry. Returns whether a row was appended.
///
/// Best-effort audit log: two identical searches racing each other may
/// both pass the comparison and land as duplicate consecutive rows. That
/// is accepted; the log carries no transactional guarantee.
pub async fn log_search(user_id: Id, text: &str, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    validate_search_text(text)?;

    let last: Option<(String,)> = sqlx::query_as(
        "SELECT text FROM search_history WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if !should_append(last.as_ref().map(|(text,)| text.as_str()), text) {
        return Ok(false);
    }

    sqlx::query("INSERT INTO search_history (user_id, text) VALUES ($1, $2)")
        .bind(user_id)
        .bind(text)
        .execute(pool)
        .await?;

    Ok(true)
}

pub async fn list_search_history(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<SearchHistoryEntry>, ApiError> {
    let rows: Vec<SearchHistoryEntry> =
        sqlx::query_as("SELECT * FROM search_history WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

pub async fn clear_search_history(user_id: Id, pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    let result = sqlx::query("DELETE FROM search_history WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Only consecutive duplicates are dropped; an older identical term
/// further back in the history does not suppress a new row.
fn should_append(last: Option<&str>, incoming: &str) -> bool {
    last != Some(incoming)
}

fn validate_search_text(text: &str) -> Result<(), ApiError> {
    if text.is_empty() {
        return Err(ApiError::validation("search", "search text is required"));
    }
    if text.chars().count() > SEARCH_TEXT_MAX_LENGTH {
        return Err(ApiError::validation("search", "search text is too long"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_first_search_is_always_appended() {
        assert!(should_append(None, "pasta"));
    }

    #[test]
    fn repeating_the_latest_search_is_a_no_op() {
        assert!(!should_append(Some("pasta"), "pasta"));
    }

    #[test]
    fn a_different_search_is_appended() {
        assert!(should_append(Some("pasta"), "omelet"));
        // Case differences count as different terms.
        assert!(should_append(Some("pasta"), "Pasta"));
    }

    #[test]
    fn search_text_is_bounded() {
        assert!(validate_search_text("").is_err());
        assert!(validate_search_text(&"x".repeat(SEARCH_TEXT_MAX_LENGTH)).is_ok());
        assert!(validate_search_text(&"x".repeat(SEARCH_TEXT_MAX_LENGTH + 1)).is_err());
    }
}
