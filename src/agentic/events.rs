//! 循环过程事件：供 CLI / 前端实时展示轮次、工具调用与结果

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// 进入第 iteration 轮（从 0 计）
    IterationStarted {
        iteration: usize,
        max_iterations: usize,
    },
    /// 即将执行工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    ToolResult {
        tool: String,
        success: bool,
        preview: String,
    },
    /// 已向 prompt 追加停止指令
    StopSuggested { tool: String },
    /// 检测到重复调用
    LoopDetected { tool: String },
    /// 循环结束
    Finished {
        stop_reason: super::StopReason,
        iterations: usize,
    },
}
