//! 工具 Schema：参数描述、结构校验与参数校验；以及工具调用格式的 JSON Schema（schemars 生成）
//!
//! ToolSchema 与 OpenAI/Gemini function calling 的 parameters 结构兼容：
//! `{"type": "object", "properties": {...}, "required": [...]}`。

use std::collections::{BTreeMap, HashMap};

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{AgentError, ValidationError};

/// 参数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            ParamType::String => "a string",
            ParamType::Number => "a number",
            ParamType::Integer => "an integer",
            ParamType::Boolean => "a boolean",
            ParamType::Array => "an array",
            ParamType::Object => "an object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// 单个参数描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            param_type,
            description: description.into(),
            allowed: None,
            default: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParamType::String, description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(ParamType::Integer, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(ParamType::Number, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ParamType::Boolean, description)
    }

    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

fn object_type() -> String {
    "object".to_string()
}

/// parameters 段：properties + required
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            schema_type: object_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// 工具 Schema：名称、描述、参数、返回值描述；由工具持有，不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: ParameterSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Value>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ParameterSchema::default(),
            returns: None,
        }
    }

    /// 追加参数；required 为 true 时同时写入 required 列表
    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec, required: bool) -> Self {
        let name = name.into();
        if required && !self.parameters.required.contains(&name) {
            self.parameters.required.push(name.clone());
        }
        self.parameters.properties.insert(name, spec);
        self
    }

    pub fn returns(mut self, returns: Value) -> Self {
        self.returns = Some(returns);
        self
    }

    /// 结构校验：name 非空，required 为 properties 键的子集
    pub fn check(&self) -> Result<(), AgentError> {
        if self.name.trim().is_empty() {
            return Err(AgentError::ConfigError("tool schema name is empty".to_string()));
        }
        if let Some(missing) = self
            .parameters
            .required
            .iter()
            .find(|r| !self.parameters.properties.contains_key(*r))
        {
            return Err(AgentError::ConfigError(format!(
                "tool '{}' requires undeclared parameter '{}'",
                self.name, missing
            )));
        }
        Ok(())
    }

    /// 参数校验与归一化：先填默认值，再查必填、类型与枚举；未声明的额外参数原样保留
    pub fn validate(&self, args: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let props = &self.parameters.properties;
        let mut validated = Map::new();

        for (name, spec) in props {
            if let Some(default) = &spec.default {
                if !args.contains_key(name) {
                    validated.insert(name.clone(), default.clone());
                }
            }
        }

        for name in &self.parameters.required {
            if !args.contains_key(name) && !validated.contains_key(name) {
                return Err(ValidationError::MissingParameter { name: name.clone() });
            }
        }

        for (name, value) in args {
            let Some(spec) = props.get(name) else {
                validated.insert(name.clone(), value.clone());
                continue;
            };
            if !spec.param_type.accepts(value) {
                return Err(ValidationError::InvalidType {
                    name: name.clone(),
                    expected: spec.param_type.expected().to_string(),
                });
            }
            if let Some(allowed) = &spec.allowed {
                if !allowed.contains(value) {
                    return Err(ValidationError::InvalidEnum {
                        name: name.clone(),
                        allowed: Value::Array(allowed.clone()).to_string(),
                        provided: display_value(value),
                    });
                }
            }
            validated.insert(name.clone(), value.clone());
        }

        Ok(validated)
    }

    /// 参数说明摘要，附在校验失败的结果信封中帮助模型修正参数
    pub fn info(&self) -> ToolSchemaInfo {
        let required = &self.parameters.required;
        ToolSchemaInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self
                .parameters
                .properties
                .iter()
                .map(|(name, spec)| {
                    (
                        name.clone(),
                        ParamInfo {
                            param_type: spec.param_type.as_str().to_string(),
                            description: spec.description.clone(),
                            required: required.contains(name),
                            allowed: spec.allowed.clone(),
                            default: spec.default.clone(),
                        },
                    )
                })
                .collect(),
            required: required.clone(),
        }
    }
}

pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamInfo {
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    pub required: bool,
    #[serde(rename = "enum")]
    pub allowed: Option<Vec<Value>>,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchemaInfo {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParamInfo>,
    pub required: Vec<String>,
}

/// 工具调用请求格式：与解析器接受的 `{"tool": "...", "args": {...}}` 一致（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ToolCallFormat {
    /// 工具名，如 get_stock_quote、get_fundamentals
    pub tool: String,
    /// 工具参数，依工具不同而不同（symbol、period 等）
    pub args: HashMap<String, Value>,
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCallFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}
