use serde_json::Value;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::{DESCRIPTION_MAX_LENGTH, INSTRUCTIONS_MAX_LENGTH, TITLE_MAX_LENGTH},
    error::ApiError,
    jwt::SessionData,
    pagination::{clamp_page_size, PageContext},
    payload::normalize_ingredients,
    schema::{
        resolve_image_url, Id, Recipe, RecipeDraft, RecipeIngredientRow, RecipePatch, RecipeRow,
        RecipeView, User, UserView,
    },
};

/// Creates a recipe together with its ingredient links, all-or-nothing.
///
/// The author always comes from the session. Every ingredient id is
/// resolved before anything is persisted, so a bad id can never leave an
/// orphan recipe behind. Duplicate ingredient ids inside one payload merge,
/// last entry wins.
pub async fn create_recipe(
    draft: RecipeDraft,
    ingredients: Option<Value>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_draft(&draft)?;

    let entries = match ingredients {
        Some(value) => normalize_ingredients(value)?,
        None => vec![],
    };

    if !entries.is_empty() {
        let requested: Vec<Id> = entries.iter().map(|e| e.ingredient).collect();
        let known: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
            .bind(&requested)
            .fetch_all(pool)
            .await?;

        for entry in &entries {
            if !known.iter().any(|(id,)| *id == entry.ingredient) {
                return Err(ApiError::validation(
                    "ingredients",
                    format!("unknown ingredient id {}", entry.ingredient),
                ));
            }
        }
    }

    let mut tr = pool.begin().await?;

    let recipe: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, title, description, instructions, cooking_time_minutes, servings, image, is_active, is_private)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(&draft.instructions)
    .bind(draft.cooking_time_minutes)
    .bind(draft.servings)
    .bind(&draft.image)
    .bind(draft.is_active)
    .bind(draft.is_private)
    .fetch_one(&mut *tr)
    .await?;

    for entry in &entries {
        sqlx::query(
            "
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, count, visible_type_of_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (recipe_id, ingredient_id) DO UPDATE
            SET count = EXCLUDED.count, visible_type_of_count = EXCLUDED.visible_type_of_count;
        ",
        )
        .bind(recipe.0)
        .bind(entry.ingredient)
        .bind(entry.count)
        .bind(&entry.visible_type_of_count)
        .execute(&mut *tr)
        .await?;
    }

    tr.commit().await?;

    Ok(recipe.0)
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_recipe_ingredients(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, ApiError> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT ri.ingredient_id AS ingredient_id, i.name AS name, ri.count AS count, ri.visible_type_of_count AS visible_type_of_count
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.ingredient_id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Denormalized read view: scalar fields verbatim, author expanded to the
/// public sub-view, ingredients inlined, image resolved to a URL.
pub async fn get_recipe_view(id: Id, pool: &Pool<Postgres>) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;

    let author: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(recipe.author_id)
        .fetch_one(pool)
        .await?;

    let ingredients = list_recipe_ingredients(id, pool).await?;

    Ok(build_recipe_view(recipe, author, ingredients))
}

fn build_recipe_view(recipe: Recipe, author: User, ingredients: Vec<RecipeIngredientRow>) -> RecipeView {
    RecipeView {
        id: recipe.id,
        author: UserView::from(author),
        title: recipe.title,
        description: recipe.description,
        instructions: recipe.instructions,
        cooking_time_minutes: recipe.cooking_time_minutes,
        servings: recipe.servings,
        image: resolve_image_url(recipe.image.as_deref()),
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
        is_active: recipe.is_active,
        is_private: recipe.is_private,
        ingredients,
    }
}

/// Paginated listing. Free-text terms OR-combine across title, description
/// and instructions; private recipes are visible to their author only.
pub async fn fetch_recipes(
    search: Option<&str>,
    author: Option<Id>,
    viewer: Option<Id>,
    offset: i64,
    page_size: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let page_size = clamp_page_size(page_size);
    let patterns = search.and_then(search_patterns);

    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM recipes r
        WHERE r.is_active
          AND (NOT r.is_private OR r.author_id = $1)
          AND ($2::int4 IS NULL OR r.author_id = $2)
          AND ($3::text[] IS NULL
               OR r.title ILIKE ANY($3)
               OR r.description ILIKE ANY($3)
               OR r.instructions ILIKE ANY($3))
        ORDER BY r.created_at DESC
        LIMIT $4 OFFSET $5
    ",
    )
    .bind(viewer)
    .bind(author)
    .bind(&patterns)
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, page_size, offset);
    Ok(page)
}

/// Fetches a recipe for mutation. A missing row is NotFound; an existing
/// row the caller does not own is PermissionDenied, never NotFound.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match get_recipe(id, pool).await? {
        None => Err(ApiError::NotFound("recipe")),
        Some(recipe) if session.can_modify(recipe.author_id) => Ok(recipe),
        Some(_) => Err(ApiError::PermissionDenied),
    }
}

/// Partial update of scalar fields; the author relation is immutable.
pub async fn update_recipe(
    id: Id,
    patch: RecipePatch,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    get_recipe_mut(id, session, pool).await?;
    validate_patch(&patch)?;

    sqlx::query(
        "
        UPDATE recipes SET
        title = COALESCE($1, title),
        description = COALESCE($2, description),
        instructions = COALESCE($3, instructions),
        cooking_time_minutes = COALESCE($4, cooking_time_minutes),
        servings = COALESCE($5, servings),
        image = COALESCE($6, image),
        is_active = COALESCE($7, is_active),
        is_private = COALESCE($8, is_private),
        updated_at = NOW()
        WHERE id = $9
    ",
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(&patch.instructions)
    .bind(patch.cooking_time_minutes)
    .bind(patch.servings)
    .bind(&patch.image)
    .bind(patch.is_active)
    .bind(patch.is_private)
    .bind(id)
    .execute(pool)
    .await?;

    get_recipe_view(id, pool).await
}

/// Deletes a recipe and everything it owns in one transaction.
pub async fn delete_recipe(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_recipe_mut(id, session, pool).await?;

    let mut tr = pool.begin().await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM likes WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM comments WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    tr.commit().await?;
    Ok(())
}

fn validate_draft(draft: &RecipeDraft) -> Result<(), ApiError> {
    if draft.title.trim().is_empty() {
        return Err(ApiError::validation("title", "title is required"));
    }
    if draft.title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ApiError::validation("title", "title is too long"));
    }
    if draft.description.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(ApiError::validation("description", "description is too long"));
    }
    if draft.instructions.chars().count() > INSTRUCTIONS_MAX_LENGTH {
        return Err(ApiError::validation("instructions", "instructions are too long"));
    }
    if draft.cooking_time_minutes <= 0 {
        return Err(ApiError::validation(
            "cooking_time_minutes",
            "cooking time must be greater than 0",
        ));
    }
    if draft.servings <= 0 {
        return Err(ApiError::validation("servings", "servings must be greater than 0"));
    }

    Ok(())
}

fn validate_patch(patch: &RecipePatch) -> Result<(), ApiError> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title", "title is required"));
        }
        if title.chars().count() > TITLE_MAX_LENGTH {
            return Err(ApiError::validation("title", "title is too long"));
        }
    }
    if let Some(description) = &patch.description {
        if description.chars().count() > DESCRIPTION_MAX_LENGTH {
            return Err(ApiError::validation("description", "description is too long"));
        }
    }
    if let Some(instructions) = &patch.instructions {
        if instructions.chars().count() > INSTRUCTIONS_MAX_LENGTH {
            return Err(ApiError::validation("instructions", "instructions are too long"));
        }
    }
    if matches!(patch.cooking_time_minutes, Some(minutes) if minutes <= 0) {
        return Err(ApiError::validation(
            "cooking_time_minutes",
            "cooking time must be greater than 0",
        ));
    }
    if matches!(patch.servings, Some(servings) if servings <= 0) {
        return Err(ApiError::validation("servings", "servings must be greater than 0"));
    }

    Ok(())
}

/// One ILIKE pattern per whitespace-separated term, wildcards escaped.
fn search_patterns(search: &str) -> Option<Vec<String>> {
    let patterns: Vec<String> = search
        .split_whitespace()
        .map(|term| format!("%{}%", escape_like(term)))
        .collect();

    if patterns.is_empty() {
        None
    } else {
        Some(patterns)
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::schema::UserRole;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            title: "Omelet".to_string(),
            description: "d".to_string(),
            instructions: "i".to_string(),
            cooking_time_minutes: 10,
            servings: 2,
            image: None,
            is_active: true,
            is_private: false,
        }
    }

    #[test]
    fn boundary_values_validate_as_specified() {
        let mut d = draft();
        d.cooking_time_minutes = 0;
        assert!(validate_draft(&d).is_err());

        let mut d = draft();
        d.servings = 0;
        assert!(validate_draft(&d).is_err());

        let mut d = draft();
        d.cooking_time_minutes = 1;
        d.servings = 1;
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn title_is_required_and_bounded() {
        let mut d = draft();
        d.title = "  ".to_string();
        assert!(validate_draft(&d).is_err());

        let mut d = draft();
        d.title = "x".repeat(TITLE_MAX_LENGTH);
        assert!(validate_draft(&d).is_ok());

        d.title.push('x');
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn patch_checks_only_present_fields() {
        assert!(validate_patch(&RecipePatch::default()).is_ok());

        let patch = RecipePatch {
            servings: Some(0),
            ..RecipePatch::default()
        };
        assert!(validate_patch(&patch).is_err());

        let patch = RecipePatch {
            title: Some(String::new()),
            ..RecipePatch::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn search_terms_become_escaped_patterns() {
        assert_eq!(
            search_patterns("egg 100%_done"),
            Some(vec!["%egg%".to_string(), "%100\\%\\_done%".to_string()])
        );
        assert_eq!(search_patterns("   "), None);
    }

    #[test]
    fn the_read_view_inlines_author_and_ingredients() {
        let now = Utc::now();
        let recipe = Recipe {
            id: 1,
            author_id: 7,
            title: "Omelet".to_string(),
            description: "d".to_string(),
            instructions: "i".to_string(),
            cooking_time_minutes: 10,
            servings: 2,
            image: Some("omelet.png".to_string()),
            created_at: now,
            updated_at: now,
            is_active: true,
            is_private: false,
        };
        let author = User {
            id: 7,
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "hash".to_string(),
            bio: String::new(),
            profile_picture: None,
            registered_on: now,
            role: UserRole::User,
        };
        let links = vec![RecipeIngredientRow {
            ingredient_id: 1,
            name: "Egg".to_string(),
            count: 2.0,
            visible_type_of_count: "pcs".to_string(),
        }];

        let view = build_recipe_view(recipe, author, links);
        assert_eq!(view.author.id, 7);
        assert_eq!(view.image.as_deref(), Some("/media/omelet.png"));
        assert_eq!(view.ingredients.len(), 1);
        assert_eq!(view.ingredients[0].name, "Egg");
    }
}
