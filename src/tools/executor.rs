//! 工具执行器
//!
//! 持有固定的 ToolRegistry 与可选超时；execute_tool(name, args) 永不返回 Err：
//! 未知工具、工具返回 Err、panic、超时都转为 success=false 的 ToolResult。每次调用输出结构化审计日志（JSON）。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde_json::{Map, Value};
use tokio::time::timeout;

use crate::agentic::serialize::{truncate_chars, PREVIEW_CHARS};
use crate::tools::{Tool, ToolRegistry, ToolResult};

/// 工具执行器：按名分发，把一切失败映射为 ToolResult
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Option<Duration>,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        tracing::info!(tool_count = registry.len(), "Initialized tool executor");
        Self {
            registry,
            timeout: None,
        }
    }

    /// 对每次工具调用施加超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 已注册工具名
    pub fn list_tools(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 执行指定工具；结果总是 ToolResult
    pub async fn execute_tool(&self, tool_name: &str, args: Map<String, Value>) -> ToolResult {
        let Some(tool) = self.registry.get(tool_name) else {
            let available = self.list_tools();
            tracing::error!(tool_name = %tool_name, available_tools = ?available, "Tool not found");
            return ToolResult::failure(format!(
                "unknown tool: {tool_name}. Available tools: {available:?}"
            ));
        };

        let start = Instant::now();
        let preview = args_preview(&args);
        let call = AssertUnwindSafe(tool.execute(args)).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(r) => Some(r),
                Err(_) => None,
            },
            None => Some(call.await),
        };

        let (result, label) = match outcome {
            Some(Ok(Ok(r))) => {
                let label = if r.success { "ok" } else { "failed" };
                (r, label)
            }
            Some(Ok(Err(e))) => (ToolResult::failure(e.to_string()), "error"),
            Some(Err(panic)) => (
                ToolResult::failure(format!("tool panicked: {}", panic_message(&*panic))),
                "panic",
            ),
            None => (ToolResult::failure(format!("tool timed out: {tool_name}")), "timeout"),
        };

        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": result.success,
            "outcome": label,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");
        if let Some(err) = &result.error {
            tracing::warn!(tool_name = %tool_name, error = %err, "Tool execution failed");
        }
        result
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn args_preview(args: &Map<String, Value>) -> String {
    truncate_chars(&Value::Object(args.clone()).to_string(), PREVIEW_CHARS)
}
