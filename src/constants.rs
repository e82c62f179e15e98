pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const COMMENT_COUNT_PER_PAGE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const BIO_MAX_LENGTH: usize = 500;

pub const TITLE_MAX_LENGTH: usize = 100;
pub const DESCRIPTION_MAX_LENGTH: usize = 2000;
pub const INSTRUCTIONS_MAX_LENGTH: usize = 100_000;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 100;
pub const UNIT_HINT_MAX_LENGTH: usize = 25;

pub const COMMENT_MAX_LENGTH: usize = 2000;
pub const SEARCH_TEXT_MAX_LENGTH: usize = 100;
pub const CHAT_TEXT_MAX_LENGTH: usize = 5000;

pub const SESSION_LIFETIME_HOURS: i64 = 1;

/// Prefix uploaded image paths resolve under when rendered in a read view.
pub const MEDIA_BASE_URL: &str = "/media/";

pub const RECIPE_CACHE_SECONDS: u64 = 300;
pub const PROFILE_CACHE_SECONDS: u64 = 120;

pub const SENDER_TYPES: &[(&str, &str)] = &[("user", "User"), ("ai", "AI assistant")];
