//! 工具调用解析：从模型的自由文本中扫描 JSON 对象并提取 ToolCall
//!
//! 对每个 `{` 按括号深度寻找匹配的 `}`（忽略 JSON 字符串内的括号），平衡片段尝试按 JSON 解析；
//! 对象需含工具名字段（tool 或 action）与参数字段（args 或 parameters，且为对象），工具名须已注册。
//! 按左括号出现顺序输出，不去重；纯函数，无隐藏状态。

use serde_json::{Map, Value};

use crate::agentic::ToolCall;

const NAME_KEYS: [&str; 2] = ["tool", "action"];
const ARGS_KEYS: [&str; 2] = ["args", "parameters"];

/// 解析模型输出中的全部工具调用候选
pub fn parse_tool_calls(text: &str, known_tools: &[String]) -> Vec<ToolCall> {
    let mut calls = Vec::new();
    for (start, c) in text.char_indices() {
        if c != '{' {
            continue;
        }
        let Some(end) = matching_brace(text, start) else {
            continue;
        };
        let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text[start..=end]) else {
            continue;
        };
        if let Some(call) = to_tool_call(&obj, known_tools) {
            tracing::debug!(tool = %call.name, "Found tool call in response");
            calls.push(call);
        }
    }
    calls
}

/// 从 start 处的 `{` 开始计数，返回匹配 `}` 的字节下标
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn to_tool_call(obj: &Map<String, Value>, known_tools: &[String]) -> Option<ToolCall> {
    let name = NAME_KEYS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())?;
    let args = ARGS_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_object))?;
    if !known_tools.iter().any(|t| t == name) {
        tracing::debug!(tool = %name, "Dropping call to unregistered tool");
        return None;
    }
    Some(ToolCall::new(name, args.clone()))
}
