use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::MEDIA_BASE_URL;
use crate::error::ApiError;

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "sender_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    User,
    Ai,
}

impl TryFrom<Value> for SenderType {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some("user") => Ok(Self::User),
            Some("ai") => Ok(Self::Ai),
            Some(_) => Err(ApiError::validation("sender", "invalid variant")),
            None => Err(ApiError::validation("sender", "failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub registered_on: DateTime<Utc>,
    pub role: UserRole,
}

/// Public user sub-view embedded in read shapes. The password hash never
/// crosses this boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub profile_picture: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            profile_picture: user.profile_picture,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_private: bool,
}

/// Listing row; `count` carries the window total for pagination.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_private: bool,

    pub count: i64,
}

/// Write shape for a recipe. The author never comes from here; it is
/// injected from the session after validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_private: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub cooking_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub is_private: Option<bool>,
}

/// One ingredient entry of the write payload: a reference by id plus the
/// per-pair attributes of the link.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IngredientEntry {
    pub ingredient: Id,
    pub count: f64,
    pub visible_type_of_count: String,
}

/// One ingredient entry of the read view, joined with the catalog name.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeIngredientRow {
    pub ingredient_id: Id,
    pub name: String,
    pub count: f64,
    pub visible_type_of_count: String,
}

/// Denormalized read view of a recipe. Intentionally asymmetric to
/// [`RecipeDraft`]: writes reference ingredients by id, reads inline them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeView {
    pub id: Id,
    pub author: UserView,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_private: bool,
    pub ingredients: Vec<RecipeIngredientRow>,
}

pub fn resolve_image_url(path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{MEDIA_BASE_URL}{p}"))
}

/// Storage name for an uploaded image; the caller keeps the extension.
pub fn generate_image_name(extension: &str) -> String {
    format!("{}.{}", uuid::Uuid::new_v4(), extension)
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Like {
    pub id: Id,
    pub user_id: Id,
    pub recipe_id: Id,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Id,
    pub recipe_id: Id,
    pub author_id: Id,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct SearchHistoryEntry {
    pub id: Id,
    pub user_id: Id,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Shopping cart row joined with the ingredient name.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartRow {
    pub id: Id,
    pub ingredient_id: Id,
    pub name: String,
    pub count_in_grams: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Id,
    pub user_id: Id,
    pub text: String,
    pub sender: SenderType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    Followed,
    Unfollowed,
}

/// Profile read view: the public user sub-view plus the user's recipes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_urls_resolve_under_the_media_prefix() {
        assert_eq!(
            resolve_image_url(Some("omelet.png")).as_deref(),
            Some("/media/omelet.png")
        );
        assert_eq!(resolve_image_url(None), None);
    }

    #[test]
    fn image_names_are_unique_and_keep_the_extension() {
        let a = generate_image_name("png");
        let b = generate_image_name("png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn sender_type_parses_known_variants_only() {
        assert_eq!(
            SenderType::try_from(Value::String("ai".to_string())).unwrap(),
            SenderType::Ai
        );
        assert!(SenderType::try_from(Value::String("bot".to_string())).is_err());
        assert!(SenderType::try_from(Value::from(3)).is_err());
    }

    #[test]
    fn user_view_drops_the_password_hash() {
        let user = User {
            id: 7,
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "$argon2id$...".to_string(),
            bio: String::new(),
            profile_picture: None,
            registered_on: Utc::now(),
            role: UserRole::User,
        };

        let serialized = serde_json::to_value(&user).unwrap();
        assert!(serialized.get("password").is_none());

        let view = UserView::from(user);
        assert_eq!(view.id, 7);
        assert_eq!(view.username, "maria");
    }
}
