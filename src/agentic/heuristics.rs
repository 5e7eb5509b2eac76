//! 结果评估与反馈：空结果 / 无效参数检测、结果信封、停止建议
//!
//! 每次工具执行后向 prompt 追加一段 "Tool execution result" 信封；
//! 成功但结果可疑时附带警告，从第二轮起（且工具未允许重试）再追加停止指令。

use serde::Serialize;
use serde_json::{Map, Value};

use crate::tools::{ToolResult, ToolSchema};

/// 视为无效参数的占位值（大小写不敏感）
pub const INVALID_PARAM_MARKERS: [&str; 5] =
    ["UNKNOWN", "UNKNOWN_COMPANY", "UNKNOWN_SYMBOL", "N/A", "NULL"];

pub const INVALID_PARAMS_WARNING: &str = "Tool was called with invalid parameters (e.g., UNKNOWN_COMPANY_SYMBOL). Please use the correct stock symbol from the original question. ";

pub const EMPTY_RESULT_WARNING: &str =
    "Tool returned empty result. This may indicate invalid parameters or no data available. ";

pub const CONSIDER_STOPPING: &str =
    "Consider stopping and providing a final answer based on available information.";

pub const STOP_INSTRUCTION: &str = "IMPORTANT: Stop making tool calls now. The tool returned empty results or was called with invalid parameters. Provide your final answer based on any data you have received, or explain that you cannot answer the question with the available tools.";

const RESULT_HEADER: &str = "\n\nTool execution result:\n";

/// 失败信息中出现这些片段时，信封附带工具 schema
const SCHEMA_HINT_MARKERS: [&str; 2] = ["must be one of", "Missing required parameter"];

/// 任一字符串参数是占位值
pub fn has_invalid_params(args: &Map<String, Value>) -> bool {
    args.values().any(|v| {
        v.as_str()
            .map(|s| INVALID_PARAM_MARKERS.contains(&s.to_uppercase().as_str()))
            .unwrap_or(false)
    })
}

/// null、0、false、""、[]、{}
pub fn is_empty_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// data 缺失、空容器，或对象的所有值都为空
pub fn is_empty_result(result: &ToolResult) -> bool {
    match &result.data {
        None | Some(Value::Null) => true,
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.values().all(is_empty_like),
        Some(_) => false,
    }
}

/// 一次成功执行的评估结果；失败的执行两项均为 false
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Assessment {
    pub empty_result: bool,
    pub invalid_params: bool,
}

impl Assessment {
    pub fn of(args: &Map<String, Value>, result: &ToolResult) -> Self {
        if !result.success {
            return Self::default();
        }
        Self {
            empty_result: is_empty_result(result),
            invalid_params: has_invalid_params(args),
        }
    }

    pub fn is_suspicious(&self) -> bool {
        self.empty_result || self.invalid_params
    }
}

/// 警告文本：无效参数句、空结果句（附工具建议），最后是停止建议（允许重试时省略）
pub fn compose_warning(assessment: &Assessment, result: &ToolResult) -> Option<String> {
    if !assessment.is_suspicious() {
        return None;
    }
    let mut warning = String::new();
    if assessment.invalid_params {
        warning.push_str(INVALID_PARAMS_WARNING);
    }
    if assessment.empty_result {
        warning.push_str(EMPTY_RESULT_WARNING);
        if let Some(suggestion) = &result.metadata.suggestion {
            warning.push_str(suggestion);
        }
    }
    if !result.allow_retry() {
        warning.push_str(CONSIDER_STOPPING);
    }
    Some(warning)
}

/// 追加到 prompt 的结果信封（字段顺序即序列化顺序）
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    pub tool: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ResultEnvelope {
    /// `\n\nTool execution result:\n` + 缩进 JSON
    pub fn to_prompt_block(&self) -> String {
        let body = serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to render result envelope");
            format!("{{\"tool\": \"{}\", \"success\": {}}}", self.tool, self.success)
        });
        format!("{RESULT_HEADER}{body}")
    }
}

/// 失败信息是否值得附带 schema
pub fn needs_schema_hint(error: &str) -> bool {
    SCHEMA_HINT_MARKERS.iter().any(|m| error.contains(m))
}

/// 构造信封：成功带原始 data，失败带 error（参数类错误时附 schema）
pub fn build_envelope(
    tool_name: &str,
    result: &ToolResult,
    assessment: &Assessment,
    schema: Option<&ToolSchema>,
) -> ResultEnvelope {
    if result.success {
        ResultEnvelope {
            tool: tool_name.to_string(),
            success: true,
            data: Some(result.data.clone().unwrap_or(Value::Null)),
            error: None,
            tool_schema: None,
            warning: compose_warning(assessment, result),
        }
    } else {
        let error = result.error.clone().unwrap_or_default();
        let tool_schema = schema
            .filter(|_| needs_schema_hint(&error))
            .and_then(|s| serde_json::to_value(s.info()).ok());
        ResultEnvelope {
            tool: tool_name.to_string(),
            success: false,
            data: None,
            error: Some(error),
            tool_schema,
            warning: None,
        }
    }
}

/// 第二轮起出现可疑结果且工具未允许重试时，追加停止指令
pub fn should_inject_stop(assessment: &Assessment, iteration: usize, allow_retry: bool) -> bool {
    assessment.is_suspicious() && iteration >= 1 && !allow_retry
}
