//! 错误类型
//!
//! AgentError 覆盖配置、工具注册/执行、文本生成等失败；ValidationError 为工具参数校验失败。
//! 编排循环本身不向调用方抛错，所有失败都折叠进 Outcome（见 agentic::loop_）。

use thiserror::Error;

use crate::llm::LlmError;

/// 智能体运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Generation(#[from] LlmError),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 注册表中已有同名工具
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        AgentError::Serialization(e.to_string())
    }
}

/// 工具参数校验失败；文本格式会被结果信封用于判断是否附带 tool_schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Parameter {name} must be one of {allowed}. You provided: {provided}")]
    InvalidEnum {
        name: String,
        allowed: String,
        provided: String,
    },

    #[error("Parameter {name} must be {expected}")]
    InvalidType { name: String, expected: String },
}

impl ValidationError {
    /// 出错的参数名
    pub fn parameter(&self) -> &str {
        match self {
            ValidationError::MissingParameter { name }
            | ValidationError::InvalidEnum { name, .. }
            | ValidationError::InvalidType { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err = ValidationError::MissingParameter {
            name: "symbol".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required parameter: symbol");
        assert_eq!(err.parameter(), "symbol");
    }

    #[test]
    fn test_invalid_enum_message() {
        let err = ValidationError::InvalidEnum {
            name: "period".to_string(),
            allowed: r#"["1d","5d"]"#.to_string(),
            provided: "\"3y\"".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("must be one of"));
        assert!(msg.contains("You provided: \"3y\""));
    }

    #[test]
    fn test_validation_wraps_into_agent_error() {
        let err: AgentError = ValidationError::InvalidType {
            name: "limit".to_string(),
            expected: "an integer".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Parameter limit must be an integer");
    }
}
