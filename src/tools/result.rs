//! 工具执行结果
//!
//! ToolResult 由 Tool::execute 返回，调用方持有，生成后不再修改。
//! metadata.allow_retry 为显式字段：为 true 时停止启发不再建议模型停止调用工具。

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agentic::serialize::to_json_safe;

fn is_false(b: &bool) -> bool {
    !*b
}

/// 工具附带的元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// 空结果时允许模型换参数重试（不追加停止建议）
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_retry: bool,
    /// 空结果时附加到警告中的建议文本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// 其余元信息（数据源、缓存命中等）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolMetadata {
    pub fn is_empty(&self) -> bool {
        !self.allow_retry && self.suggestion.is_none() && self.extra.is_empty()
    }
}

/// 工具执行结果：success / data / error / metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: ToolMetadata,
}

impl ToolResult {
    /// 成功结果，data 已是 JSON
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: ToolMetadata::default(),
        }
    }

    /// 成功结果，任意可序列化数据（不可序列化时退化为 Debug 文本）
    pub fn ok_with<T: Serialize + Debug + ?Sized>(data: &T) -> Self {
        Self::ok(to_json_safe(data))
    }

    /// 成功但没有数据
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            metadata: ToolMetadata::default(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: ToolMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ToolMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_allow_retry(mut self, allow: bool) -> Self {
        self.metadata.allow_retry = allow;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.metadata.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.extra.insert(key.into(), value);
        self
    }

    pub fn allow_retry(&self) -> bool {
        self.metadata.allow_retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        let r = ToolResult::ok(json!({"price": 1.5}));
        assert!(r.success);
        assert!(r.error.is_none());

        let r = ToolResult::failure("boom");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert!(r.data.is_none());

        let r = ToolResult::empty();
        assert!(r.success && r.data.is_none());
    }

    #[test]
    fn test_ok_with_serializable() {
        #[derive(Debug, Serialize)]
        struct Quote {
            symbol: &'static str,
            price: f64,
        }
        let r = ToolResult::ok_with(&Quote {
            symbol: "AAPL",
            price: 190.5,
        });
        assert_eq!(r.data, Some(json!({"symbol": "AAPL", "price": 190.5})));
    }

    #[test]
    fn test_metadata_flatten_and_empty() {
        assert!(ToolMetadata::default().is_empty());
        let r = ToolResult::empty()
            .with_allow_retry(true)
            .with_suggestion("try another period")
            .with_meta("source", json!("cache"));
        assert!(r.allow_retry());
        let v = serde_json::to_value(&r.metadata).unwrap();
        assert_eq!(
            v,
            json!({"allow_retry": true, "suggestion": "try another period", "source": "cache"})
        );
        assert!(!r.metadata.is_empty());
    }
}
