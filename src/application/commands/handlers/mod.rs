//! Command Handlers

mod dream_command_handlers;

pub use dream_command_handlers::TransformDreamHandler;
