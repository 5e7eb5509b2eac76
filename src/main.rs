//! agentloop 命令行入口
//!
//! 用法：`agentloop "<question>"`。读取配置、注册 echo 工具、跑 agentic 循环，以 JSON 输出 Outcome。
//! 过程事件写入 stderr 日志，stdout 只含结果。

use anyhow::Context;
use agentloop::agent::{process_prompt, AgentComponents};
use agentloop::config::load_config;
use agentloop::tools::{EchoTool, ToolRegistry};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    agentloop::observability::init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        anyhow::bail!("usage: agentloop \"<question>\"");
    }

    let cfg = load_config(None).context("Failed to load config")?;

    let mut tools = ToolRegistry::new();
    tools.register(EchoTool).context("Failed to register tools")?;
    let components = AgentComponents::from_config(&cfg, tools).context("Failed to create agent")?;

    // Ctrl-C 取消：当前轮结束后停止
    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let outcome = process_prompt(&components, &prompt, cancel_token).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );
    Ok(())
}
