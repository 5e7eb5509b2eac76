//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `AGENTLOOP__*` 覆盖（双下划线表示嵌套，如 `AGENTLOOP__LLM__PROVIDER=openai`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::agentic::DEFAULT_MAX_ITERATIONS;
use crate::llm::GenerationConfig;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
}

/// [llm] 段：后端选择、模型与生成参数
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：ollama / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// OpenAI 兼容后端的 API Key；未设置时读 OPENAI_API_KEY
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama2".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

fn default_request_timeout() -> u64 {
    300
}

/// [agent] 段：循环轮数与系统提示词
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    pub system_prompt: Option<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: None,
        }
    }
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

/// [tools] 段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）；未设置则不限时
    pub timeout_secs: Option<u64>,
}

impl ToolsSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// 每次生成使用的参数
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            ..GenerationConfig::default()
        }
    }
}

/// 从 config 目录加载配置，环境变量 AGENTLOOP__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 AGENTLOOP__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, ignoring");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("AGENTLOOP")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
