use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::perception::Heading;

/// One concrete action to hand to the actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ActionInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// What the action is aimed at: the first string argument among the usual names.
    pub fn target(&self) -> Option<&str> {
        ["target", "name", "point", "direction"]
            .iter()
            .find_map(|key| self.argument_str(key))
    }

    /// Case-insensitive match on name and target.
    pub fn same_intent(&self, other: &ActionInvocation) -> bool {
        let target = |inv: &ActionInvocation| inv.target().map(|t| t.trim().to_lowercase());
        self.name.eq_ignore_ascii_case(&other.name) && target(self) == target(other)
    }

    pub fn heading(&self) -> Option<Heading> {
        self.argument_str("direction").and_then(Heading::parse)
    }
}

impl fmt::Display for ActionInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .arguments
            .values()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}
