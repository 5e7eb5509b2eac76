//! 编排循环的数据类型：解析出的 ToolCall、每次执行的 IterationRecord、结束原因与最终 Outcome

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 从模型输出中解析出的工具调用（名称已在注册表中，参数尚未校验）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// 单次工具执行记录；按执行顺序追加到 transcript，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub tool: String,
    pub args: Map<String, Value>,
    pub success: bool,
    pub error: Option<String>,
    /// 序列化（超长列表已截断）后的 data；失败或无数据时为 None
    pub response: Option<Value>,
    pub metadata: Option<Value>,
}

/// 循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 模型不再请求工具，视为最终回答
    Completed,
    /// 检测到重复调用，本轮未执行
    LoopDetected,
    /// 达到最大轮数
    MaxIterations,
    /// 文本生成失败（首轮失败时 text 为回退生成的结果）
    ProviderError,
    /// 调用方取消
    Cancelled,
}

/// 循环最终结果
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub text: String,
    pub tool_calls: Vec<IterationRecord>,
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// 文本生成失败时的错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    /// 按执行顺序列出用到的工具名
    pub fn tools_used(&self) -> Vec<&str> {
        self.tool_calls.iter().map(|r| r.tool.as_str()).collect()
    }
}
