use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography::verify_password, jwt::generate_jwt_session},
    constants::{BIO_MAX_LENGTH, USERNAME_MAX_LENGTH},
    cryptography::hash_password,
    error::ApiError,
    schema::{FollowStatus, Id, ProfilePatch, ProfileView, Recipe, User},
};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a user. The password is argon2-hashed here; the unique indexes
/// on username and email remain the final guard against racing duplicates.
pub async fn register_user(
    username: &str,
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    validate_registration(username, email, password)?;

    let taken: Option<(Id,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = $1 OR email = $2")
            .bind(username)
            .bind(email)
            .fetch_optional(pool)
            .await?;

    if taken.is_some() {
        return Err(ApiError::Conflict(
            "this email or username is already in use".to_string(),
        ));
    }

    let hash = hash_password(password.to_string())
        .map_err(|e| ApiError::Database(format!("password hashing failed: {e}")))?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO users (username, email, password, bio, role)
        VALUES ($1, $2, $3, '', 'user')
        RETURNING id
    ",
    )
    .bind(username)
    .bind(email)
    .bind(hash)
    .fetch_one(pool)
    .await?;

    Ok(id.0)
}

/// Verifies credentials and mints a session token. Unknown username and
/// wrong password are indistinguishable to the caller.
pub async fn login_user(
    username: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = match get_user(pool, username).await? {
        Some(user) => user,
        None => return Err(ApiError::Unauthorized),
    };

    let authenticated =
        verify_password(password, &user.password).map_err(|_e| ApiError::Unauthorized)?;
    if !authenticated {
        return Err(ApiError::Unauthorized);
    }

    Ok(generate_jwt_session(&user))
}

/// Profile read view: public user fields plus the user's recipes. The
/// owner sees their private recipes, everyone else only the public ones.
pub async fn get_profile(
    user_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<ProfileView, ApiError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let recipes: Vec<Recipe> = sqlx::query_as(
        "
        SELECT * FROM recipes
        WHERE author_id = $1 AND is_active AND (NOT is_private OR author_id = $2)
        ORDER BY created_at DESC
    ",
    )
    .bind(user_id)
    .bind(viewer)
    .fetch_all(pool)
    .await?;

    Ok(ProfileView {
        id: user.id,
        username: user.username,
        email: user.email,
        bio: user.bio,
        profile_picture: user.profile_picture,
        recipes,
    })
}

pub async fn get_profile_by_username(
    username: &str,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<ProfileView, ApiError> {
    let user = get_user(pool, username)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    get_profile(user.id, viewer, pool).await
}

/// Partial update of the caller's own profile fields.
pub async fn update_profile(
    user_id: Id,
    patch: ProfilePatch,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    validate_profile_patch(&patch)?;

    sqlx::query(
        "
        UPDATE users SET
        email = COALESCE($1, email),
        bio = COALESCE($2, bio),
        profile_picture = COALESCE($3, profile_picture)
        WHERE id = $4
    ",
    )
    .bind(&patch.email)
    .bind(&patch.bio)
    .bind(&patch.profile_picture)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Follow works like the like toggle: one row per (user, author) pair,
/// the unique constraint arbitrates concurrent toggles.
pub async fn toggle_follow(
    user_id: Id,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<FollowStatus, ApiError> {
    if user_id == author_id {
        return Err(ApiError::validation("author", "cannot follow yourself"));
    }
    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    let mut tr = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM followers WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(&mut *tr)
        .await?
        .rows_affected();

    let status = if deleted > 0 {
        FollowStatus::Unfollowed
    } else {
        sqlx::query(
            "INSERT INTO followers (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&mut *tr)
        .await?;

        FollowStatus::Followed
    };

    tr.commit().await?;

    Ok(status)
}

pub async fn follower_count(author_id: Id, pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM followers WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::validation("username", "username is required"));
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(ApiError::validation("username", "username is too long"));
    }
    if !email.contains('@') {
        return Err(ApiError::validation("email", "invalid email address"));
    }
    if password.chars().count() < 8 {
        return Err(ApiError::validation("password", "password is too short"));
    }

    Ok(())
}

fn validate_profile_patch(patch: &ProfilePatch) -> Result<(), ApiError> {
    if let Some(email) = &patch.email {
        if !email.contains('@') {
            return Err(ApiError::validation("email", "invalid email address"));
        }
    }
    if let Some(bio) = &patch.bio {
        if bio.chars().count() > BIO_MAX_LENGTH {
            return Err(ApiError::validation("bio", "bio is too long"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_fields_are_validated() {
        assert!(validate_registration("maria", "maria@example.com", "longenough").is_ok());
        assert!(validate_registration("", "maria@example.com", "longenough").is_err());
        assert!(validate_registration("maria", "not-an-email", "longenough").is_err());
        assert!(validate_registration("maria", "maria@example.com", "short").is_err());
    }

    #[test]
    fn profile_patch_checks_only_present_fields() {
        assert!(validate_profile_patch(&ProfilePatch::default()).is_ok());

        let patch = ProfilePatch {
            bio: Some("x".repeat(BIO_MAX_LENGTH + 1)),
            ..ProfilePatch::default()
        };
        assert!(validate_profile_patch(&patch).is_err());
    }
}
