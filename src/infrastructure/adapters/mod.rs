//! Infrastructure Adapters - 出站适配器实现

pub mod image;
pub mod splitter;
pub mod stt;

pub use image::{FakeImageClient, FakeImageClientConfig, GeminiImageClient, GeminiImageClientConfig};
pub use splitter::{ChatSplitter, ChatSplitterConfig};
pub use stt::{FakeTranscriber, FakeTranscriberConfig, WhisperClient, WhisperClientConfig};
