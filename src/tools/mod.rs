pub mod echo;
pub mod executor;
pub mod prompt;
pub mod registry;
pub mod result;
pub mod schema;

pub use echo::EchoTool;
pub use executor::ToolExecutor;
pub use prompt::build_tool_descriptions;
pub use registry::{Tool, ToolRegistry};
pub use result::{ToolMetadata, ToolResult};
pub use schema::{
    tool_call_schema_json, ParamInfo, ParamSpec, ParamType, ParameterSchema, ToolSchema,
    ToolSchemaInfo,
};
