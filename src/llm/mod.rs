pub mod media;
pub mod openai;

pub use openai::{ConfigurationError, VisionBackend, VisionClient, VisionReply};
