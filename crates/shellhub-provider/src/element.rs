//! Submodel element tree and path resolution.
//!
//! Elements are addressed by `/`-separated idShort paths relative to the
//! submodel root, e.g. `TestSubmodelElementCollection/TestSubProperty1`.

use crate::binding::{StoredValue, ValueBinding};
use crate::operation::{Operation, OperationVariable};
use crate::value::ValueType;
use serde::Serialize;
use serde_json::{Map, Value};
use shellhub_kernel::ShellhubError;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Property {
    id_short: String,
    value_type: ValueType,
    binding: Arc<dyn ValueBinding>,
}

impl Property {
    /// A property holding a stored, writable value.
    pub fn new(id_short: impl Into<String>, value_type: ValueType, initial: Value) -> Self {
        Self::with_binding(id_short, value_type, StoredValue::new(initial))
    }

    pub fn with_binding(
        id_short: impl Into<String>,
        value_type: ValueType,
        binding: impl ValueBinding + 'static,
    ) -> Self {
        Self {
            id_short: id_short.into(),
            value_type,
            binding: Arc::new(binding),
        }
    }

    pub fn id_short(&self) -> &str {
        &self.id_short
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn writable(&self) -> bool {
        self.binding.writable()
    }

    pub fn read(&self) -> Result<Value, ShellhubError> {
        let raw = self.binding.read()?;
        self.value_type.coerce(&raw)
    }

    /// Coerce `value` to the declared type, then hand it to the binding.
    pub fn write(&self, value: &Value) -> Result<(), ShellhubError> {
        if !self.binding.writable() {
            return Err(ShellhubError::validation(format!(
                "property `{}` is read-only",
                self.id_short
            )));
        }
        let coerced = self.value_type.coerce(value).map_err(|err| {
            ShellhubError::validation(format!("property `{}`: {}", self.id_short, err.detail()))
        })?;
        self.binding.write(coerced)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id_short", &self.id_short)
            .field("value_type", &self.value_type)
            .field("writable", &self.binding.writable())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Collection {
    id_short: String,
    elements: Vec<SubmodelElement>,
}

impl Collection {
    pub fn new(id_short: impl Into<String>) -> Self {
        Self {
            id_short: id_short.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: impl Into<SubmodelElement>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn id_short(&self) -> &str {
        &self.id_short
    }

    pub fn elements(&self) -> &[SubmodelElement] {
        &self.elements
    }
}

#[derive(Debug, Clone)]
pub enum SubmodelElement {
    Property(Property),
    Operation(Operation),
    Collection(Collection),
}

impl From<Property> for SubmodelElement {
    fn from(value: Property) -> Self {
        Self::Property(value)
    }
}

impl From<Operation> for SubmodelElement {
    fn from(value: Operation) -> Self {
        Self::Operation(value)
    }
}

impl From<Collection> for SubmodelElement {
    fn from(value: Collection) -> Self {
        Self::Collection(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Property,
    Operation,
    Collection,
}

/// Structural view of an element. Never reads property values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    pub id_short: String,
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_variables: Vec<OperationVariable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub in_out_variables: Vec<OperationVariable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_variables: Vec<OperationVariable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSummary>,
}

impl SubmodelElement {
    pub fn id_short(&self) -> &str {
        match self {
            Self::Property(p) => p.id_short(),
            Self::Operation(o) => o.id_short(),
            Self::Collection(c) => c.id_short(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Property(_) => ElementKind::Property,
            Self::Operation(_) => ElementKind::Operation,
            Self::Collection(_) => ElementKind::Collection,
        }
    }

    pub fn summary(&self) -> ElementSummary {
        let mut summary = ElementSummary {
            id_short: self.id_short().to_string(),
            kind: self.kind(),
            value_type: None,
            writable: None,
            input_variables: Vec::new(),
            in_out_variables: Vec::new(),
            output_variables: Vec::new(),
            children: Vec::new(),
        };
        match self {
            Self::Property(p) => {
                summary.value_type = Some(p.value_type());
                summary.writable = Some(p.writable());
            }
            Self::Operation(o) => {
                summary.input_variables = o.input_variables().to_vec();
                summary.in_out_variables = o.in_out_variables().to_vec();
                summary.output_variables = o.output_variables().to_vec();
            }
            Self::Collection(c) => {
                summary.children = c.elements().iter().map(Self::summary).collect();
            }
        }
        summary
    }

    /// Current value: properties read their binding, collections nest,
    /// operations have none.
    pub fn value(&self) -> Result<Option<Value>, ShellhubError> {
        match self {
            Self::Property(p) => p.read().map(Some),
            Self::Operation(_) => Ok(None),
            Self::Collection(c) => values_of(c.elements()).map(Some),
        }
    }
}

/// Read every property under `elements` into a nested JSON object.
pub fn values_of(elements: &[SubmodelElement]) -> Result<Value, ShellhubError> {
    let mut map = Map::new();
    for element in elements {
        if let Some(value) = element.value()? {
            map.insert(element.id_short().to_string(), value);
        }
    }
    Ok(Value::Object(map))
}

/// Walk `path` from `elements` down through collections.
pub fn resolve<'a>(
    elements: &'a [SubmodelElement],
    path: &str,
) -> Result<&'a SubmodelElement, ShellhubError> {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(ShellhubError::validation("element path must not be empty"));
    };

    let mut level = elements;
    for segment in parents {
        match find(level, segment) {
            Some(SubmodelElement::Collection(collection)) => level = collection.elements(),
            Some(_) => {
                return Err(ShellhubError::not_found(format!(
                    "element `{segment}` in `{path}` has no child elements"
                )));
            }
            None => {
                return Err(ShellhubError::not_found(format!(
                    "element `{path}` not found"
                )));
            }
        }
    }

    find(level, last)
        .ok_or_else(|| ShellhubError::not_found(format!("element `{path}` not found")))
}

fn find<'a>(elements: &'a [SubmodelElement], id_short: &str) -> Option<&'a SubmodelElement> {
    elements.iter().find(|e| e.id_short() == id_short)
}
