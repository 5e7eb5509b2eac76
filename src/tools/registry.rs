//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / schema / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时统一把错误、panic 与超时转为失败的 ToolResult。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::core::{AgentError, ValidationError};
use crate::tools::{ToolResult, ToolSchema};

/// 工具 trait：名称、参数 schema、异步执行（args 为 JSON 对象）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（与模型输出 JSON 中的 "tool" 字段对应，需与 schema().name 一致）
    fn name(&self) -> &str;

    /// 参数 Schema（供模型生成正确的参数，也用于参数校验）
    fn schema(&self) -> ToolSchema;

    /// 按 schema 校验参数并填充默认值；execute 应在做实际工作前调用
    fn validate(&self, args: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        self.schema().validate(args)
    }

    /// 执行工具；返回 Err 时由执行器转为失败结果，不会传到编排循环
    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, AgentError>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，支持 register / unregister / get / tool_names
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从一组工具构建；同名或 schema 不合法时报错
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Result<Self, AgentError> {
        let mut registry = Self::new();
        registry.register_many(tools)?;
        Ok(registry)
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), AgentError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), AgentError> {
        let name = tool.name().to_string();
        let schema = tool.schema();
        schema.check()?;
        if schema.name != name {
            return Err(AgentError::ConfigError(format!(
                "tool '{}' reports schema name '{}'",
                name, schema.name
            )));
        }
        if self.tools.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        tracing::info!(tool_name = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn register_many(&mut self, tools: Vec<Arc<dyn Tool>>) -> Result<(), AgentError> {
        for tool in tools {
            self.register_arc(tool)?;
        }
        Ok(())
    }

    /// 移除工具；存在并移除时返回 true
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.tools.remove(name).is_some();
        if removed {
            tracing::info!(tool_name = %name, "Unregistered tool");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 已注册工具名（排序后返回，便于稳定输出）
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tool_names()
            .iter()
            .filter_map(|n| self.tools.get(n).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools().iter().map(|t| t.schema()).collect()
    }

    /// 全部工具 schema 的 JSON（name / description / parameters）
    pub fn to_schema_json(&self) -> String {
        serde_json::to_string_pretty(&self.schemas()).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{EchoTool, ParamSpec};

    struct Misnamed;

    #[async_trait]
    impl Tool for Misnamed {
        fn name(&self) -> &str {
            "a"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("b", "mismatch").param("x", ParamSpec::string("x"), true)
        }

        async fn execute(&self, _args: Map<String, Value>) -> Result<ToolResult, AgentError> {
            Ok(ToolResult::empty())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool).unwrap();
        assert!(reg.contains("echo"));
        assert!(reg.get("echo").is_some());
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.tool_names(), vec!["echo".to_string()]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool).unwrap();
        let err = reg.register(EchoTool).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(ref n) if n == "echo"));
    }

    #[test]
    fn test_schema_name_must_match() {
        let mut reg = ToolRegistry::new();
        assert!(matches!(reg.register(Misnamed), Err(AgentError::ConfigError(_))));
    }

    #[test]
    fn test_unregister() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool).unwrap();
        assert!(reg.unregister("echo"));
        assert!(!reg.unregister("echo"));
        assert!(reg.is_empty());
        reg.register(EchoTool).unwrap();
        assert!(reg.contains("echo"));
    }

    #[test]
    fn test_schema_json() {
        let reg = ToolRegistry::from_tools(vec![Arc::new(EchoTool)]).unwrap();
        let json = reg.to_schema_json();
        assert!(json.contains("\"echo\""));
        assert!(json.contains("\"properties\""));
    }
}
