//! agentloop - 基于文本的 LLM 工具调用编排
//!
//! 模块划分：
//! - **agent**: 无头运行时（按配置组装生成器与工具，处理单条问题）
//! - **agentic**: 工具调用解析、重复检测、结果反馈与主循环
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **llm**: 文本生成抽象与实现（Ollama / OpenAI 兼容 / Mock）
//! - **observability**: tracing 日志初始化
//! - **tools**: 工具 trait、Schema、注册表与执行器

pub mod agent;
pub mod agentic;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod tools;

pub use agentic::{run_agentic_loop, IterationRecord, LoopSession, Outcome, StopReason};
