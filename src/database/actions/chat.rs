use sqlx::{Pool, Postgres};

use crate::{
    constants::CHAT_TEXT_MAX_LENGTH,
    error::ApiError,
    schema::{ChatMessage, Id, SenderType},
};

/// Persists one side of an AI-chat exchange. The LLM call itself lives in
/// the consuming server; both the user prompt and the assistant reply are
/// appended here, tagged by sender.
pub async fn append_chat_message(
    user_id: Id,
    text: &str,
    sender: SenderType,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    validate_chat_text(text)?;

    let id: (Id,) = sqlx::query_as(
        "INSERT INTO chat_messages (user_id, text, sender) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(text)
    .bind(sender)
    .fetch_one(pool)
    .await?;

    Ok(id.0)
}

pub async fn list_chat_history(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ChatMessage>, ApiError> {
    let rows: Vec<ChatMessage> =
        sqlx::query_as("SELECT * FROM chat_messages WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

pub async fn list_ai_messages(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ChatMessage>, ApiError> {
    let rows: Vec<ChatMessage> = sqlx::query_as(
        "SELECT * FROM chat_messages WHERE user_id = $1 AND sender = $2 ORDER BY created_at",
    )
    .bind(user_id)
    .bind(SenderType::Ai)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn clear_chat_history(user_id: Id, pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn validate_chat_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::validation("text", "message text is required"));
    }
    if text.chars().count() > CHAT_TEXT_MAX_LENGTH {
        return Err(ApiError::validation("text", "message text is too long"));
    }

    Ok(())
}
