//! 文本生成抽象
//!
//! 所有后端（Ollama / OpenAI 兼容 / Mock）实现 TextGenerator：generate(prompt, config) -> String。
//! 编排循环只依赖该 trait，不关心模型选择、鉴权与重试。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 生成参数：对编排循环不透明，由具体后端解释
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// 其余后端专属参数（如 top_p、top_k）
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// 文本生成失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    ModelNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(String),
}

/// 文本生成 trait：单次 prompt -> 文本
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError>;

    /// 后端名称（如 ollama、openai、mock）
    fn provider_name(&self) -> &str;

    /// 模型名；未配置时为 None
    fn model_name(&self) -> Option<&str> {
        None
    }
}
