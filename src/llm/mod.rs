//! LLM 层：文本生成抽象与实现（Ollama / OpenAI 兼容 / Mock）

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use mock::ScriptedGenerator;
pub use ollama::{OllamaGenerator, DEFAULT_OLLAMA_BASE_URL};
pub use openai::OpenAiGenerator;
pub use traits::{GenerationConfig, LlmError, TextGenerator};
