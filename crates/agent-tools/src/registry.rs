//! Tool registry for managing available tools

use crate::Tool;
use agent_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered, immutable set of tools
///
/// Built once through [`ToolRegistryBuilder`]; registration order is the
/// order tools are advertised to the model. Lookups go through a name
/// index, iteration through the ordered list.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// Tools in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder for [`ToolRegistry`]
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Append a tool
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Freeze the registry; duplicate names are rejected
    pub fn build(self) -> Result<ToolRegistry> {
        let mut index = HashMap::with_capacity(self.tools.len());
        for (i, tool) in self.tools.iter().enumerate() {
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(Error::InitializationFailed(format!(
                    "duplicate tool name: {}",
                    tool.name()
                )));
            }
        }

        debug!(tools = self.tools.len(), "Tool registry built");
        Ok(ToolRegistry {
            tools: self.tools,
            index,
        })
    }
}
