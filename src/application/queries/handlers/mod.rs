//! Query Handlers

mod dream_query_handlers;

pub use dream_query_handlers::{GetDreamHandler, GetSceneImageHandler};
