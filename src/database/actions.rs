pub mod carts;
pub mod chat;
pub mod comments;
pub mod ingredients;
pub mod likes;
pub mod recipes;
pub mod search_history;
pub mod users;

pub use carts::*;
pub use chat::*;
pub use comments::*;
pub use ingredients::*;
pub use likes::*;
pub use recipes::*;
pub use search_history::*;
pub use users::*;
