//! Mock 生成器（用于测试，无需 API）
//!
//! 按顺序回放预设回复或错误；队列耗尽后重复最后一条。记录每次收到的 prompt，便于断言。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{GenerationConfig, LlmError, TextGenerator};

/// 脚本化生成器：回放 replies，记录 prompts
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    last: Mutex<Option<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次都返回同一段文本
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new().then_reply(reply)
    }

    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    pub fn then_fail(self, err: LlmError) -> Self {
        self.push(Err(err));
        self
    }

    fn push(&self, item: Result<String, LlmError>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(item);
        }
    }

    /// 已收到的全部 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, LlmError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = self
            .last
            .lock()
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        match next {
            Some(item) => {
                *last = Some(item.clone());
                item
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(LlmError::Unavailable("no scripted reply".to_string()))),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> Option<&str> {
        Some("scripted")
    }
}
