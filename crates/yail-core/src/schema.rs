//! TOML component schema.
//!
//! Component types can be declared in a `components.toml` file instead of Rust
//! code. The schema covers the declarative part of a component: typed
//! properties with defaults, events with parameter names, and methods whose
//! behavior is limited to reporting one of the component's events and/or
//! returning a property value.
//!
//! ```toml
//! [[component]]
//! name = "Button"
//!
//! [[component.property]]
//! name = "Text"
//! type = "text"
//!
//! [[component.event]]
//! name = "Click"
//!
//! [[component.method]]
//! name = "PerformClick"
//! fires = "Click"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::coerce::Coercer;
use crate::component::ComponentClass;
use crate::value::{NativeValue, TypeTag, Value};

const BUILTIN_SCHEMA: &str = include_str!("../components.toml");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid schema: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{component}.{property}: default {value:?} is not a valid {kind}")]
    InvalidDefault {
        component: String,
        property: String,
        value: String,
        kind: TypeTag,
    },

    #[error("{component}.{method} refers to undeclared {what} {name}")]
    UnknownReference {
        component: String,
        method: String,
        what: &'static str,
        name: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TypeTag,
    /// Default as text, coerced to the property's kind on load.
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeTag>,
    /// Event reported with the method's arguments.
    #[serde(default)]
    pub fires: Option<String>,
    /// Property whose value the method returns.
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub property: Vec<PropertyDef>,
    #[serde(default)]
    pub event: Vec<EventDef>,
    #[serde(default)]
    pub method: Vec<MethodDef>,
}

/// Root schema containing all component definitions.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSchema {
    #[serde(default)]
    pub component: Vec<ComponentDef>,
}

impl ComponentSchema {
    pub fn parse(contents: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load schema from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// The schema bundled with the crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::parse(BUILTIN_SCHEMA)
    }

    pub fn find(&self, name: &str) -> Option<&ComponentDef> {
        self.component.iter().find(|c| c.name == name)
    }

    /// Turn every definition into a registration table.
    pub fn build_classes(&self, coercer: &Coercer) -> Result<Vec<ComponentClass>, SchemaError> {
        self.component.iter().map(|def| def.build(coercer)).collect()
    }
}

impl ComponentDef {
    fn build(&self, coercer: &Coercer) -> Result<ComponentClass, SchemaError> {
        let mut builder = ComponentClass::builder(&self.name);

        for prop in &self.property {
            let default = match &prop.default {
                Some(text) => coercer
                    .coerce(&Value::Text(text.clone()), prop.kind)
                    .map_err(|_| SchemaError::InvalidDefault {
                        component: self.name.clone(),
                        property: prop.name.clone(),
                        value: text.clone(),
                        kind: prop.kind,
                    })?,
                None => zero_value(prop.kind),
            };
            builder = builder.property(&prop.name, prop.kind, default);
        }

        for event in &self.event {
            let params: Vec<&str> = event.params.iter().map(String::as_str).collect();
            builder = builder.event(&event.name, &params);
        }

        for method in &self.method {
            let unknown = |what, name: &str| SchemaError::UnknownReference {
                component: self.name.clone(),
                method: method.name.clone(),
                what,
                name: name.to_string(),
            };
            if let Some(event) = &method.fires {
                if !self.event.iter().any(|e| &e.name == event) {
                    return Err(unknown("event", event.as_str()));
                }
            }
            let returns = match &method.returns {
                Some(prop) => match self.property.iter().find(|p| &p.name == prop) {
                    Some(def) => def.kind,
                    None => return Err(unknown("property", prop.as_str())),
                },
                None => TypeTag::Any,
            };

            let fires = method.fires.clone();
            let returned = method.returns.clone();
            builder = builder.method(&method.name, &method.params, returns, move |this, args, events| {
                if let Some(event) = &fires {
                    this.report(events, event, args.to_vec())?;
                }
                match &returned {
                    Some(prop) => this.get(prop).cloned(),
                    None => Ok(NativeValue::Unit),
                }
            });
        }

        Ok(builder.build())
    }
}

/// Default for a property declared without one.
fn zero_value(kind: TypeTag) -> NativeValue {
    match kind {
        TypeTag::Boolean => NativeValue::Bool(false),
        TypeTag::Number => NativeValue::Float(0.0),
        TypeTag::Integer => NativeValue::Integer(0),
        TypeTag::Text => NativeValue::Text(String::new()),
        TypeTag::List => NativeValue::Seq(Vec::new()),
        TypeTag::Dictionary => NativeValue::Map(Default::default()),
        TypeTag::Instant | TypeTag::Component | TypeTag::Any => NativeValue::Unit,
    }
}
