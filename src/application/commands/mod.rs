//! CQRS Commands - 命令及处理器

mod dream_commands;
pub mod handlers;

pub use dream_commands::{TransformDreamCommand, TransformDreamResponse};
