//! Agentic 循环：生成 -> 解析工具调用 -> 执行 -> 把结果追加到 prompt -> 再生成
//!
//! 单一 prompt 字符串逐轮增长；终止条件：模型不再请求工具、重复调用、达到最大轮数、生成失败或取消。
//! 可选 event_tx：推送 IterationStarted / ToolCall / ToolResult / Finished 等事件。

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::agentic::heuristics::{build_envelope, needs_schema_hint, should_inject_stop, Assessment, STOP_INSTRUCTION};
use crate::agentic::loop_guard::{CallSignature, LoopGuard};
use crate::agentic::parser::parse_tool_calls;
use crate::agentic::serialize::{metadata_payload, response_payload, truncate_chars, PREVIEW_CHARS};
use crate::agentic::{IterationRecord, LoopEvent, Outcome, StopReason, ToolCall};
use crate::llm::{GenerationConfig, TextGenerator};
use crate::tools::ToolExecutor;

/// 默认最大轮数
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// 循环会话配置
pub struct LoopSession<'a> {
    /// 文本生成（必需）
    pub generator: &'a dyn TextGenerator,
    /// 工具执行器（必需）
    pub executor: &'a ToolExecutor,
    /// 取消令牌（必需）
    pub cancel_token: CancellationToken,
    /// 可选：系统提示词，拼在用户 prompt 之前
    pub system_prompt: Option<&'a str>,
    pub max_iterations: usize,
    /// 每次生成使用的参数
    pub generation: GenerationConfig,
    /// 可选：事件推送通道
    pub event_tx: Option<&'a UnboundedSender<LoopEvent>>,
}

impl<'a> LoopSession<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        executor: &'a ToolExecutor,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            generator,
            executor,
            cancel_token,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            generation: GenerationConfig::default(),
            event_tx: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: &'a str) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation = config;
        self
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<LoopEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }
}

fn send_event(tx: &Option<&UnboundedSender<LoopEvent>>, ev: LoopEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}

/// 单次运行的可变状态，结束即丢弃
struct LoopState {
    prompt: String,
    guard: LoopGuard,
    transcript: Vec<IterationRecord>,
}

fn combine_prompt(system_prompt: Option<&str>, prompt: &str) -> String {
    match system_prompt {
        Some(system) if !system.is_empty() => format!("{system}\n\n{prompt}"),
        _ => prompt.to_string(),
    }
}

fn preview(value: &Option<Value>, error: &Option<String>) -> String {
    match (value, error) {
        (Some(v), _) => truncate_chars(&v.to_string(), PREVIEW_CHARS),
        (None, Some(e)) => truncate_chars(e, PREVIEW_CHARS),
        (None, None) => String::new(),
    }
}

/// 执行 agentic 循环
///
/// 不返回 Err：工具失败写入 transcript 并反馈给模型，生成失败以 StopReason::ProviderError 结束。
pub async fn run_agentic_loop(session: &LoopSession<'_>, prompt: &str) -> Outcome {
    let full_prompt = combine_prompt(session.system_prompt, prompt);
    let event_tx = session.event_tx;

    if session.executor.is_empty() {
        tracing::info!("No tools registered, using plain generation");
        let outcome = plain_generation(session, &full_prompt, StopReason::Completed).await;
        send_event(&event_tx, LoopEvent::Finished {
            stop_reason: outcome.stop_reason,
            iterations: outcome.iterations,
        });
        return outcome;
    }

    let known_tools = session.executor.list_tools();
    let mut state = LoopState {
        prompt: full_prompt.clone(),
        guard: LoopGuard::new(),
        transcript: Vec::new(),
    };
    let mut text = String::new();
    let mut error = None;
    let mut iterations = 0usize;

    let stop_reason = loop {
        if iterations >= session.max_iterations {
            tracing::warn!(max_iterations = session.max_iterations, "Reached max iterations");
            break StopReason::MaxIterations;
        }
        if session.cancel_token.is_cancelled() {
            tracing::info!(iterations, "Agentic loop cancelled");
            break StopReason::Cancelled;
        }

        let iteration = iterations;
        iterations += 1;
        tracing::info!(
            iteration = iteration + 1,
            max_iterations = session.max_iterations,
            "Agentic iteration"
        );
        send_event(&event_tx, LoopEvent::IterationStarted {
            iteration,
            max_iterations: session.max_iterations,
        });

        text = match session.generator.generate(&state.prompt, &session.generation).await {
            Ok(t) => t,
            Err(e) if iteration == 0 => {
                tracing::error!(error = %e, "Generation failed on first iteration, falling back to plain generation");
                let outcome = fallback_generation(session, &full_prompt, e.to_string()).await;
                send_event(&event_tx, LoopEvent::Finished {
                    stop_reason: outcome.stop_reason,
                    iterations: outcome.iterations,
                });
                return outcome;
            }
            Err(e) => {
                tracing::error!(error = %e, iteration, "Generation failed");
                error = Some(e.to_string());
                break StopReason::ProviderError;
            }
        };

        let calls = parse_tool_calls(&text, &known_tools);
        if calls.is_empty() {
            tracing::info!(iteration = iteration + 1, "No tool calls found, treating as final answer");
            break StopReason::Completed;
        }

        if let Some(repeat) = state.guard.first_repeat(&calls) {
            tracing::warn!(tool = %repeat.name, args = ?repeat.args, "Detected repeated tool call, stopping loop");
            send_event(&event_tx, LoopEvent::LoopDetected {
                tool: repeat.name.clone(),
            });
            break StopReason::LoopDetected;
        }

        for call in calls {
            execute_call(session, &mut state, call, iteration).await;
        }
    };

    send_event(&event_tx, LoopEvent::Finished {
        stop_reason,
        iterations,
    });
    Outcome {
        text,
        tool_calls: state.transcript,
        iterations,
        stop_reason,
        error,
    }
}

/// 执行一个工具调用并把结果信封追加到 prompt
async fn execute_call(session: &LoopSession<'_>, state: &mut LoopState, call: ToolCall, iteration: usize) {
    let event_tx = session.event_tx;
    tracing::info!(tool_name = %call.name, args = ?call.args, "Executing tool");
    send_event(&event_tx, LoopEvent::ToolCall {
        tool: call.name.clone(),
        args: Value::Object(call.args.clone()),
    });

    let result = session.executor.execute_tool(&call.name, call.args.clone()).await;
    state.guard.record(CallSignature::of(&call));

    let assessment = Assessment::of(&call.args, &result);
    if assessment.invalid_params {
        tracing::warn!(tool_name = %call.name, args = ?call.args, "Tool called with placeholder parameters");
    }

    let record = IterationRecord {
        tool: call.name.clone(),
        args: call.args.clone(),
        success: result.success,
        error: result.error.clone(),
        response: response_payload(&result),
        metadata: metadata_payload(&result),
    };
    send_event(&event_tx, LoopEvent::ToolResult {
        tool: call.name.clone(),
        success: result.success,
        preview: preview(&record.response, &record.error),
    });
    state.transcript.push(record);

    let schema = match &result.error {
        Some(e) if !result.success && needs_schema_hint(e) => {
            session.executor.get_tool(&call.name).map(|t| t.schema())
        }
        _ => None,
    };
    let envelope = build_envelope(&call.name, &result, &assessment, schema.as_ref());
    if let Some(warning) = &envelope.warning {
        tracing::warn!(tool_name = %call.name, warning = %warning, "Tool issue detected");
    }
    state.prompt.push_str(&envelope.to_prompt_block());

    if should_inject_stop(&assessment, iteration, result.allow_retry()) {
        tracing::info!(tool_name = %call.name, iteration = iteration + 1, "Instructing model to stop calling tools");
        state.prompt.push_str("\n\n");
        state.prompt.push_str(STOP_INSTRUCTION);
        send_event(&event_tx, LoopEvent::StopSuggested { tool: call.name });
    }
}

/// 不走循环的单次生成（无可用工具）
async fn plain_generation(session: &LoopSession<'_>, prompt: &str, stop_reason: StopReason) -> Outcome {
    match session.generator.generate(prompt, &session.generation).await {
        Ok(text) => Outcome {
            text,
            tool_calls: Vec::new(),
            iterations: 1,
            stop_reason,
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Plain generation failed");
            Outcome {
                text: String::new(),
                tool_calls: Vec::new(),
                iterations: 1,
                stop_reason: StopReason::ProviderError,
                error: Some(e.to_string()),
            }
        }
    }
}

/// 首轮生成失败：用原始 prompt 再生成一次，结果仍标记为 ProviderError
async fn fallback_generation(session: &LoopSession<'_>, prompt: &str, first_error: String) -> Outcome {
    match session.generator.generate(prompt, &session.generation).await {
        Ok(text) => Outcome {
            text,
            tool_calls: Vec::new(),
            iterations: 1,
            stop_reason: StopReason::ProviderError,
            error: Some(first_error),
        },
        Err(e) => {
            tracing::error!(error = %e, "Fallback generation failed");
            Outcome {
                text: String::new(),
                tool_calls: Vec::new(),
                iterations: 1,
                stop_reason: StopReason::ProviderError,
                error: Some(format!("{first_error}; fallback failed: {e}")),
            }
        }
    }
}
