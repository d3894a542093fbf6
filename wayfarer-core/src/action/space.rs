//! Action definitions supplied by the environment.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::invocation::ActionInvocation;
use crate::error::{Result, WayfarerError};
use crate::perception::Heading;

/// Value type of an action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Name of an observable entity, structure or object
    Target,
    /// Compass heading
    Direction,
    /// Name of a remembered navigation point
    Point,
    /// Inventory item name
    Item,
    Text,
    Integer,
}

impl ParameterKind {
    fn json_type(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            _ => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_required() -> bool {
    true
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check one argument value against the declared kind.
    fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self.kind {
            ParameterKind::Integer => value
                .as_i64()
                .map(|_| ())
                .ok_or_else(|| format!("'{}' must be an integer", self.name)),
            ParameterKind::Direction => value
                .as_str()
                .and_then(Heading::parse)
                .map(|_| ())
                .ok_or_else(|| format!("'{}' must be a compass heading", self.name)),
            _ => match value.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(()),
                _ => Err(format!("'{}' must be a non-empty string", self.name)),
            },
        }
    }
}

/// The precondition family an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionClass {
    Collect,
    Talk,
    MoveToTarget,
    MoveInDirection,
    Navigate,
    #[default]
    Unconstrained,
}

impl PreconditionClass {
    /// Requires the target within the interaction band.
    pub fn is_interaction(&self) -> bool {
        matches!(self, Self::Collect | Self::Talk)
    }

    /// Moves the agent through a heading sector.
    pub fn is_movement(&self) -> bool {
        matches!(self, Self::MoveToTarget | Self::MoveInDirection)
    }
}

/// One callable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub precondition: PreconditionClass,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, precondition: PreconditionClass) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            precondition,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// First parameter of the given kind.
    pub fn parameter_of(&self, kind: ParameterKind) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.kind == kind)
    }

    /// Build an invocation with one argument filled for the first parameter of `kind`.
    pub fn invoke_with(&self, kind: ParameterKind, value: impl Into<String>) -> Option<ActionInvocation> {
        let param = self.parameter_of(kind)?;
        Some(ActionInvocation::new(&self.name).with_argument(&param.name, value.into()))
    }

    /// Required parameters present and every supplied known parameter well-typed.
    pub fn validate(&self, invocation: &ActionInvocation) -> Result<()> {
        let fail = |reason: String| WayfarerError::Precondition {
            action: self.name.clone(),
            reason,
        };

        for param in &self.parameters {
            match invocation.arguments.get(&param.name) {
                Some(Value::Null) | None if param.required => {
                    return Err(fail(format!("missing required parameter '{}'", param.name)));
                }
                Some(Value::Null) | None => {}
                Some(value) => param.check(value).map_err(fail)?,
            }
        }
        Ok(())
    }

    /// JSON-schema style description for oracle prompts.
    pub fn json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                let mut prop = json!({ "type": p.kind.json_type(), "kind": p.kind });
                if let Some(desc) = &p.description {
                    prop["description"] = json!(desc);
                }
                (p.name.clone(), prop)
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// The callable actions for one cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSpace {
    actions: Vec<ActionDefinition>,
}

impl ActionSpace {
    pub fn new(actions: Vec<ActionDefinition>) -> Self {
        Self { actions }
    }

    /// A general-purpose vocabulary covering every precondition class.
    pub fn standard() -> Self {
        use ParameterKind::*;
        use PreconditionClass as P;
        Self::new(vec![
            ActionDefinition::new("talk_to", P::Talk)
                .with_description("Talk to a nearby character")
                .with_parameter(ParameterSpec::required("target", Target))
                .with_parameter(ParameterSpec::optional("content", Text)),
            ActionDefinition::new("collect", P::Collect)
                .with_description("Collect a nearby resource or object")
                .with_parameter(ParameterSpec::required("target", Target))
                .with_parameter(ParameterSpec::optional("amount", Integer)),
            ActionDefinition::new("move_to_target", P::MoveToTarget)
                .with_description("Walk toward a visible target")
                .with_parameter(ParameterSpec::required("target", Target)),
            ActionDefinition::new("move_in_direction", P::MoveInDirection)
                .with_description("Walk a short distance along a heading")
                .with_parameter(ParameterSpec::required("direction", Direction))
                .with_parameter(ParameterSpec::optional("distance", Integer)),
            ActionDefinition::new("navigate_to", P::Navigate)
                .with_description("Travel to a remembered navigation point")
                .with_parameter(ParameterSpec::required("point", Point)),
            ActionDefinition::new("wait", P::Unconstrained)
                .with_description("Stay in place for a moment"),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&ActionDefinition> {
        let name = name.trim();
        self.actions.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// First action of a precondition class.
    pub fn first_of(&self, class: PreconditionClass) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.precondition == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn json_schema(&self) -> Value {
        Value::Array(self.actions.iter().map(|a| a.json_schema()).collect())
    }
}
