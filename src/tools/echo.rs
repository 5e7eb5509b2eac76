//! Echo 工具（测试与离线演示用）

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::core::AgentError;
use crate::tools::{ParamSpec, Tool, ToolResult, ToolSchema};

/// Echo 工具：回显文本
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("echo", "Echo text back (for testing)")
            .param("text", ParamSpec::string("Text to echo"), true)
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, AgentError> {
        let args = self.validate(&args)?;
        let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
        Ok(ToolResult::ok(json!({ "text": text })))
    }
}
