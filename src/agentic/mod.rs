//! Agentic 编排：基于文本的工具调用循环
//!
//! - **parser**：从模型输出中扫描 JSON 工具调用
//! - **loop_guard**：最近 3 次调用的签名窗口，拦截重复调用
//! - **serialize**：工具数据转 JSON、超长列表截断
//! - **heuristics**：空结果 / 无效参数检测、结果信封与停止指令
//! - **loop_**：LoopSession 与 run_agentic_loop

pub mod events;
pub mod heuristics;
pub mod loop_;
pub mod loop_guard;
pub mod parser;
pub mod serialize;
pub mod types;

pub use events::LoopEvent;
pub use heuristics::STOP_INSTRUCTION;
pub use loop_::{run_agentic_loop, LoopSession, DEFAULT_MAX_ITERATIONS};
pub use loop_guard::{CallSignature, LoopGuard, LOOP_WINDOW};
pub use parser::parse_tool_calls;
pub use serialize::{to_json_safe, truncate_list, TRUNCATE_LIMIT};
pub use types::{IterationRecord, Outcome, StopReason, ToolCall};
