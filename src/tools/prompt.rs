//! 工具目录与调用示例：拼入 prompt，告诉模型有哪些工具、参数含义与调用格式

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::tools::schema::{display_value, ParamType};
use crate::tools::Tool;

/// 生成 (工具说明, 调用示例) 两段文本
///
/// 必填参数会出现在示例中：名称含 symbol 的字符串参数用 `symbol`（若提供），其余字符串用 "example"，整数用 5。
pub fn build_tool_descriptions(tools: &[Arc<dyn Tool>], symbol: Option<&str>) -> (String, String) {
    let mut descriptions = Vec::new();
    let mut examples = Vec::new();

    for tool in tools {
        let schema = tool.schema();
        let required = &schema.parameters.required;
        let mut param_lines = Vec::new();
        let mut example_args = Map::new();

        for (name, spec) in &schema.parameters.properties {
            let mut line = format!("{} ({})", name, spec.param_type.as_str());
            if !spec.description.is_empty() {
                line.push_str(&format!(": {}", spec.description));
            }
            if let Some(allowed) = spec.allowed.as_ref().filter(|a| !a.is_empty()) {
                let opts: Vec<String> = allowed.iter().map(display_value).collect();
                line.push_str(&format!(" [Options: {}]", opts.join(", ")));
            }
            if let Some(default) = spec.default.as_ref().filter(|d| !d.is_null()) {
                line.push_str(&format!(" [Default: {}]", display_value(default)));
            }
            let is_required = required.contains(name);
            if is_required {
                line.push_str(" [REQUIRED]");
            }
            param_lines.push(format!("    - {line}"));

            if is_required {
                match spec.param_type {
                    ParamType::String => {
                        let v = match symbol {
                            Some(s) if name.to_lowercase().contains("symbol") => s,
                            _ => "example",
                        };
                        example_args.insert(name.clone(), json!(v));
                    }
                    ParamType::Integer => {
                        example_args.insert(name.clone(), json!(5));
                    }
                    _ => {}
                }
            }
        }

        descriptions.push(format!(
            "  - {}: {}\n    Parameters:\n{}",
            schema.name,
            schema.description,
            param_lines.join("\n")
        ));

        if !example_args.is_empty() {
            examples.push(format!(
                "  {{\"tool\": \"{}\", \"args\": {}}}",
                schema.name,
                Value::Object(example_args)
            ));
        }
    }

    (descriptions.join("\n"), examples.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentError;
    use crate::tools::{ParamSpec, ToolResult, ToolSchema};
    use async_trait::async_trait;

    struct Quote;

    #[async_trait]
    impl Tool for Quote {
        fn name(&self) -> &str {
            "get_quote"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("get_quote", "Latest quote")
                .param("symbol", ParamSpec::string("Ticker"), true)
                .param(
                    "period",
                    ParamSpec::string("Range").with_enum(["1d", "5d"]).with_default("1d"),
                    false,
                )
                .param("limit", ParamSpec::integer("Rows"), true)
        }

        async fn execute(&self, _args: Map<String, Value>) -> Result<ToolResult, AgentError> {
            Ok(ToolResult::empty())
        }
    }

    #[test]
    fn test_descriptions_and_examples() {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(Quote)];
        let (desc, examples) = build_tool_descriptions(&tools, Some("AAPL"));
        assert!(desc.contains("  - get_quote: Latest quote"));
        assert!(desc.contains("period (string): Range [Options: 1d, 5d] [Default: 1d]"));
        assert!(desc.contains("symbol (string): Ticker [REQUIRED]"));
        assert_eq!(
            examples,
            r#"  {"tool": "get_quote", "args": {"limit":5,"symbol":"AAPL"}}"#
        );
    }

    #[test]
    fn test_no_symbol_uses_placeholder() {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(Quote)];
        let (_, examples) = build_tool_descriptions(&tools, None);
        assert!(examples.contains(r#""symbol":"example""#));
    }
}
