//! STT Adapters - 语音转写适配器

mod fake_transcriber;
mod whisper_client;

pub use fake_transcriber::{FakeTranscriber, FakeTranscriberConfig};
pub use whisper_client::{WhisperClient, WhisperClientConfig};
