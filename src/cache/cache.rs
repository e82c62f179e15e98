use std::fmt;
use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};

use crate::actions::recipes::get_recipe_view;
use crate::actions::users::get_profile;
use crate::constants::{PROFILE_CACHE_SECONDS, RECIPE_CACHE_SECONDS};
use crate::error::ApiError;
use crate::schema::{Id, ProfileView, RecipeView};

// Caching - keys

#[derive(Clone, Debug)]
pub enum CacheKey {
    Recipe(Id),
    Profile(Id),
    Custom(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe(id) => write!(f, "recipe-{id}"),
            Self::Profile(id) => write!(f, "profile-{id}"),
            Self::Custom(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct CachedValue<T: Serialize + Send + Sync + Clone> {
    pub value: T,
}

// Cache - read-through wrapper

/// Read-through lookup. The cache is advisory: a redis fault on either
/// side is logged and the callback result is served anyway.
pub async fn get_or<T, F, Fut>(
    key: CacheKey,
    ttl_seconds: u64,
    cache: &mut MultiplexedConnection,
    callback: F,
) -> Result<T, ApiError>
where
    T: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match get_cache_value::<String, CachedValue<T>>(key.to_string(), cache).await {
        Ok(Some(cached)) => {
            log::trace!("> Found {key}");
            return Ok(cached.value);
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("> Failed to read cached value for {key}: {e}");
        }
    }

    log::trace!("> Fetching {key}");
    let value = callback().await?;

    if let Err(e) = set_cache_value(
        key.to_string(),
        CachedValue {
            value: value.clone(),
        },
        ttl_seconds,
        cache,
    )
    .await
    {
        log::error!("> Failed to cache value for {key}: {e}");
    }

    Ok(value)
}

pub async fn get_recipe_view_cached(
    id: Id,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<RecipeView, ApiError> {
    get_or(CacheKey::Recipe(id), RECIPE_CACHE_SECONDS, cache, || {
        get_recipe_view(id, pool)
    })
    .await
}

pub async fn get_profile_cached(
    user_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<ProfileView, ApiError> {
    // Only the owner's own view differs, so foreign views share one entry.
    if viewer == Some(user_id) {
        return get_profile(user_id, viewer, pool).await;
    }

    get_or(CacheKey::Profile(user_id), PROFILE_CACHE_SECONDS, cache, || {
        get_profile(user_id, viewer, pool)
    })
    .await
}

/// Drops the cached read view after a mutation; a failure only delays
/// convergence until the TTL runs out, so it is logged and swallowed.
pub async fn invalidate_recipe(id: Id, cache: &mut MultiplexedConnection) {
    if let Err(e) = delete_cache_value(CacheKey::Recipe(id).to_string(), cache).await {
        log::error!("> Failed to invalidate recipe {id}: {e}");
    }
}

pub async fn invalidate_profile(user_id: Id, cache: &mut MultiplexedConnection) {
    if let Err(e) = delete_cache_value(CacheKey::Profile(user_id).to_string(), cache).await {
        log::error!("> Failed to invalidate profile {user_id}: {e}");
    }
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    ttl_seconds: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache.set_ex(key, value, ttl_seconds).await?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, ApiError> {
    let value: Option<V> = cache.get(key).await?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_entity_kind() {
        assert_eq!(CacheKey::Recipe(3).to_string(), "recipe-3");
        assert_eq!(CacheKey::Profile(7).to_string(), "profile-7");
        assert_eq!(
            CacheKey::Custom("recipes-front-page".to_string()).to_string(),
            "recipes-front-page"
        );
    }
}
