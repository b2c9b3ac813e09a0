//! CQRS Queries - 查询及处理器

mod dream_queries;
pub mod handlers;

pub use dream_queries::{GetDreamQuery, GetSceneImageQuery, GetSceneImageResponse};
