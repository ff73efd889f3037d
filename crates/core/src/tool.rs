//! Tool trait — the abstraction over callable operations.
//!
//! Tools are the fixed set of operations the oracle may request: evaluate
//! an expression, fetch a quote, send a message, emit canvas markup.
//! Each declares an ordered list of parameter slots; the slot count is its
//! arity, checked by the registry before any handler runs.

use crate::error::ToolError;
use crate::step::{Invocation, Observation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tool's registration card, rendered into the oracle's instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    /// Ordered parameter slot names. The length is the declared arity.
    pub params: Vec<String>,
}

/// The core Tool trait.
///
/// Arguments arrive as ordered strings, exactly as decoded from the wire;
/// type coercion (string → number) is the handler's job, never the
/// parser's.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_price").
    fn name(&self) -> &str;

    /// A description of what this tool does (rendered to the oracle).
    fn description(&self) -> &str;

    /// Ordered parameter slot names; `params().len()` is the arity.
    fn params(&self) -> &[&str];

    /// Execute the tool with positional arguments.
    ///
    /// Execution failures must surface as `ToolError`, never panic — the
    /// loop captures them and feeds them back as observations.
    async fn invoke(&self, args: &[String]) -> std::result::Result<Observation, ToolError>;

    /// The registration card for this tool.
    fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name().to_string(),
            description: self.description().to_string(),
            params: self.params().iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A registry of available tools.
///
/// Registered at process start, immutable thereafter, and shared read-only
/// across concurrent task executions. The loop runner uses it to:
/// 1. Render tool summaries into the oracle's instructions
/// 2. Resolve and execute tools when the oracle requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> std::result::Result<&dyn Tool, ToolError> {
        self.tools
            .get(name)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Execute an invocation.
    ///
    /// Checks the declared arity before delegating; the handler never runs
    /// for an unknown tool or a mismatched argument count.
    pub async fn invoke(
        &self,
        invocation: &Invocation,
    ) -> std::result::Result<Observation, ToolError> {
        let tool = self.resolve(&invocation.tool)?;
        let expected = tool.params().len();
        if invocation.args.len() != expected {
            return Err(ToolError::ArityMismatch {
                tool: invocation.tool.clone(),
                expected,
                got: invocation.args.len(),
            });
        }
        tool.invoke(&invocation.args).await
    }

    /// Registration cards for all tools, sorted by name for stable prompts.
    pub fn summaries(&self) -> Vec<ToolSummary> {
        let mut summaries: Vec<ToolSummary> =
            self.tools.values().map(|t| t.summary()).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn params(&self) -> &[&str] {
            &["text"]
        }
        async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
            Ok(Observation::Text(args[0].clone()))
        }
    }

    fn registry_with_echo() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        registry
    }

    #[test]
    fn register_and_resolve() {
        let registry = registry_with_echo();
        assert!(registry.resolve("echo").is_ok());
        assert!(matches!(
            registry.resolve("nonexistent"),
            Err(ToolError::Unknown(_))
        ));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = registry_with_echo();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn summaries_carry_params() {
        let registry = registry_with_echo();
        let summaries = registry.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "echo");
        assert_eq!(summaries[0].params, vec!["text"]);
    }

    #[tokio::test]
    async fn invoke_runs_handler() {
        let registry = registry_with_echo();
        let obs = registry
            .invoke(&Invocation::new("echo", vec!["hello world".into()]))
            .await
            .unwrap();
        assert_eq!(obs, Observation::Text("hello world".into()));
    }

    #[tokio::test]
    async fn invoke_unknown_tool_fails() {
        let registry = registry_with_echo();
        let err = registry
            .invoke(&Invocation::new("nonexistent", vec!["x".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unknown(_)));
    }

    #[tokio::test]
    async fn invoke_checks_arity_before_handler() {
        let registry = registry_with_echo();
        let err = registry
            .invoke(&Invocation::new("echo", vec!["a".into(), "b".into()]))
            .await
            .unwrap_err();
        match err {
            ToolError::ArityMismatch {
                expected, got, ..
            } => {
                assert_eq!(expected, 1);
                assert_eq!(got, 2);
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }
    }
}
