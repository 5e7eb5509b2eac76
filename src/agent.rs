//! Headless Agent 运行时
//!
//! 供 CLI / HTTP 等前端调用：create_generator_from_config 按配置选择文本生成后端，
//! AgentComponents::from_config 组装生成器、工具执行器与循环参数，
//! process_prompt 对单条问题跑 agentic 循环并返回 Outcome。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agentic::{run_agentic_loop, LoopEvent, LoopSession, Outcome};
use crate::config::AppConfig;
use crate::core::AgentError;
use crate::llm::{GenerationConfig, OllamaGenerator, OpenAiGenerator, ScriptedGenerator, TextGenerator};
use crate::tools::{build_tool_descriptions, tool_call_schema_json, ToolExecutor, ToolRegistry};

const SUPPORTED_PROVIDERS: [&str; 3] = ["ollama", "openai", "mock"];

/// 在系统提示词后附上工具目录、调用示例与调用格式 schema；没有工具时原样返回
pub fn tool_system_prompt(base: Option<&str>, tools: &ToolRegistry) -> Option<String> {
    if tools.is_empty() {
        return base.map(String::from);
    }
    let (descriptions, examples) = build_tool_descriptions(&tools.tools(), None);
    let mut prompt = String::new();
    if let Some(base) = base.filter(|b| !b.is_empty()) {
        prompt.push_str(base);
        prompt.push_str("\n\n");
    }
    prompt.push_str("You have access to these tools:\n");
    prompt.push_str(&descriptions);
    prompt.push_str("\n\nTo call a tool, reply with a JSON object such as:\n");
    prompt.push_str(&examples);
    prompt.push_str("\n\nEach call must match this JSON schema:\n");
    prompt.push_str(&tool_call_schema_json());
    prompt.push_str("\n\nWhen you have enough information, answer in plain text without any JSON.");
    Some(prompt)
}

/// 按 [llm].provider 创建文本生成后端
pub fn create_generator_from_config(cfg: &AppConfig) -> Result<Arc<dyn TextGenerator>, AgentError> {
    let llm = &cfg.llm;
    let provider = llm.provider.to_lowercase();
    let generator: Arc<dyn TextGenerator> = match provider.as_str() {
        "ollama" => Arc::new(OllamaGenerator::new(
            llm.base_url.as_deref(),
            &llm.model,
            llm.request_timeout_secs,
        )?),
        "openai" => Arc::new(OpenAiGenerator::new(
            llm.base_url.as_deref(),
            &llm.model,
            llm.api_key.as_deref(),
        )),
        "mock" => Arc::new(ScriptedGenerator::always("This is a mock response.")),
        other => {
            return Err(AgentError::ConfigError(format!(
                "Unsupported LLM provider: {other}. Supported providers: {}",
                SUPPORTED_PROVIDERS.join(", ")
            )))
        }
    };
    tracing::info!(provider = %generator.provider_name(), model = ?generator.model_name(), "Created text generator");
    Ok(generator)
}

/// 预构建的 Agent 组件：生成器、工具执行器与循环参数，可多次调用共享
pub struct AgentComponents {
    pub generator: Arc<dyn TextGenerator>,
    pub executor: ToolExecutor,
    pub system_prompt: Option<String>,
    pub max_iterations: usize,
    pub generation: GenerationConfig,
}

impl AgentComponents {
    /// 从配置创建组件；工具由调用方注册
    pub fn from_config(cfg: &AppConfig, tools: ToolRegistry) -> Result<Self, AgentError> {
        let generator = create_generator_from_config(cfg)?;
        let system_prompt = tool_system_prompt(cfg.agent.system_prompt.as_deref(), &tools);
        let mut executor = ToolExecutor::new(tools);
        if let Some(timeout) = cfg.tools.timeout() {
            executor = executor.with_timeout(timeout);
        }
        Ok(Self {
            generator,
            executor,
            system_prompt,
            max_iterations: cfg.agent.max_iterations,
            generation: cfg.generation_config(),
        })
    }

    /// 直接指定生成器（测试或嵌入场景）
    pub fn new(generator: Arc<dyn TextGenerator>, executor: ToolExecutor) -> Self {
        Self {
            generator,
            executor,
            system_prompt: None,
            max_iterations: crate::agentic::DEFAULT_MAX_ITERATIONS,
            generation: GenerationConfig::default(),
        }
    }

    fn session(&self, cancel_token: CancellationToken) -> LoopSession<'_> {
        let mut session = LoopSession::new(self.generator.as_ref(), &self.executor, cancel_token)
            .with_max_iterations(self.max_iterations)
            .with_generation_config(self.generation.clone());
        if let Some(prompt) = self.system_prompt.as_deref() {
            session = session.with_system_prompt(prompt);
        }
        session
    }
}

/// 处理单条问题：跑 agentic 循环，返回 Outcome
pub async fn process_prompt(
    components: &AgentComponents,
    prompt: &str,
    cancel_token: CancellationToken,
) -> Outcome {
    let session = components.session(cancel_token);
    run_agentic_loop(&session, prompt).await
}

/// 同 process_prompt，并通过 event_tx 推送过程事件
pub async fn process_prompt_stream(
    components: &AgentComponents,
    prompt: &str,
    cancel_token: CancellationToken,
    event_tx: mpsc::UnboundedSender<LoopEvent>,
) -> Outcome {
    let session = components.session(cancel_token).with_event_tx(&event_tx);
    run_agentic_loop(&session, prompt).await
}
