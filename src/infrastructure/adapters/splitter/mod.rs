//! Splitter Adapters - 场景拆分适配器

mod chat_splitter;

pub use chat_splitter::{ChatSplitter, ChatSplitterConfig};
