//! Ollama 生成器
//!
//! 通过 reqwest 调用本地 Ollama 的 /api/generate（非流式）；
//! 模型不存在时查询 /api/tags 列出已安装模型，给出 `ollama pull` 提示。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use crate::llm::{GenerationConfig, LlmError, TextGenerator};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
/// 模型未找到时最多列出的已安装模型数
const MAX_MODELS_HINT: usize = 5;

/// Ollama 客户端：持有 reqwest Client、base_url 与模型名
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: Option<&str>, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        let base_url = base_url
            .unwrap_or(DEFAULT_OLLAMA_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        tracing::info!(model = %model, base_url = %base_url, "Initialized Ollama provider");
        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
        })
    }

    fn payload(&self, prompt: &str, config: &GenerationConfig) -> Value {
        let mut options = Map::new();
        if let Some(t) = config.temperature {
            options.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = config.max_tokens {
            options.insert("num_predict".to_string(), json!(n));
        }
        for (k, v) in &config.extra {
            options.insert(k.clone(), v.clone());
        }
        let mut payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        if !options.is_empty() {
            payload["options"] = Value::Object(options);
        }
        payload
    }

    async fn installed_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        let Ok(resp) = self.client.get(&url).send().await else {
            return Vec::new();
        };
        if !resp.status().is_success() {
            return Vec::new();
        }
        let Ok(body) = resp.json::<Value>().await else {
            return Vec::new();
        };
        body.get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn model_not_found(&self, error_msg: &str) -> LlmError {
        let available = self.installed_models().await;
        let mut hint = String::new();
        if !available.is_empty() {
            let shown: Vec<&str> = available
                .iter()
                .take(MAX_MODELS_HINT)
                .map(String::as_str)
                .collect();
            hint = format!("\nAvailable models: {}", shown.join(", "));
            if available.len() > MAX_MODELS_HINT {
                hint.push_str(&format!(" (and {} more)", available.len() - MAX_MODELS_HINT));
            }
        }
        LlmError::ModelNotFound(format!(
            "Ollama model '{model}' not found.{hint}\n\
             To install this model, run: ollama pull {model}\n\
             To list all available models: ollama list\n\
             Ollama error: {error_msg}",
            model = self.model,
        ))
    }
}

/// 从 /api/generate 响应体中取文本：优先 response，其次 text，否则原样返回
pub(crate) fn extract_response_text(body: &Value) -> String {
    if let Some(r) = body.get("response") {
        return value_to_text(r);
    }
    if let Some(t) = body.get("text") {
        return value_to_text(t);
    }
    tracing::warn!(response = %body, "Unexpected Ollama response format");
    body.to_string()
}

fn value_to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        tracing::debug!(model = %self.model, prompt_length = prompt.len(), "Generating text with Ollama");

        let resp = self
            .client
            .post(&url)
            .json(&self.payload(prompt, config))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::Unavailable(format!(
                        "cannot reach Ollama at {} ({e}); make sure it is running: ollama serve",
                        self.base_url
                    ))
                } else {
                    LlmError::Request(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<Value>(&text) {
                if let Some(msg) = body.get("error").and_then(|e| e.as_str()) {
                    let lower = msg.to_lowercase();
                    if lower.contains("not found") || lower.contains("model") {
                        return Err(self.model_not_found(msg).await);
                    }
                }
            }
            return Err(LlmError::Http {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(extract_response_text(&body))
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_options() {
        let gen = OllamaGenerator::new(Some("http://host:1/"), "llama2", 5).unwrap();
        let cfg = GenerationConfig::new()
            .with_temperature(0.5)
            .with_max_tokens(64)
            .with_extra("top_k", json!(40));
        let p = gen.payload("hi", &cfg);
        assert_eq!(p["model"], "llama2");
        assert_eq!(p["stream"], false);
        assert_eq!(p["options"]["num_predict"], 64);
        assert_eq!(p["options"]["top_k"], 40);
        assert_eq!(gen.base_url, "http://host:1");
    }

    #[test]
    fn test_payload_without_options() {
        let gen = OllamaGenerator::new(None, "llama2", 5).unwrap();
        let p = gen.payload("hi", &GenerationConfig::default());
        assert!(p.get("options").is_none());
    }

    #[test]
    fn test_extract_response_text() {
        assert_eq!(extract_response_text(&json!({"response": "hello"})), "hello");
        assert_eq!(extract_response_text(&json!({"text": "t"})), "t");
        assert_eq!(extract_response_text(&json!({"other": 1})), r#"{"other":1}"#);
    }
}
