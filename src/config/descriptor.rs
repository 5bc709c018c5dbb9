//! Schema entities: leaf parameters, embedded groups, and the schema tree.

use std::fmt;
use std::str::FromStr;

use super::list;
use super::value::ValueType;
use super::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionKind {
    #[default]
    None,
    Array,
    List,
    Set,
}

impl CollectionKind {
    pub fn is_collection(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "scalar",
            Self::Array => "array",
            Self::List => "list",
            Self::Set => "set",
        })
    }
}

impl FromStr for CollectionKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "scalar" => Ok(Self::None),
            "array" => Ok(Self::Array),
            "list" => Ok(Self::List),
            "set" => Ok(Self::Set),
            _ => Err(SchemaError::UnknownCollection(s.to_string())),
        }
    }
}

/// Casing applied when a key is inferred from an accessor name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    #[default]
    AsIs,
    SnakeCase,
    KebabCase,
}

impl FromStr for KeyCase {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "as_is" | "asis" => Ok(Self::AsIs),
            "snake_case" | "snake" => Ok(Self::SnakeCase),
            "kebab_case" | "kebab" => Ok(Self::KebabCase),
            _ => Err(SchemaError::UnknownCase(s.to_string())),
        }
    }
}

/// Rules for deriving a key from an accessor name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyNaming {
    pub case: KeyCase,
    pub strip_get: bool,
}

impl KeyNaming {
    pub fn new(case: KeyCase, strip_get: bool) -> Self {
        Self { case, strip_get }
    }

    /// An explicit key always wins over the inferred one.
    pub fn resolve(&self, accessor: &str, explicit: Option<&str>) -> String {
        match explicit {
            Some(key) => key.to_string(),
            None => self.infer(accessor),
        }
    }

    pub fn infer(&self, accessor: &str) -> String {
        let name = if self.strip_get {
            strip_get_prefix(accessor)
        } else {
            accessor.to_string()
        };
        match self.case {
            KeyCase::AsIs => name,
            KeyCase::SnakeCase => split_words(&name, '_'),
            KeyCase::KebabCase => split_words(&name, '-'),
        }
    }
}

/// `getListenPort` becomes `listenPort`; `getaway` is left alone.
fn strip_get_prefix(accessor: &str) -> String {
    match accessor.strip_prefix("get") {
        Some(rest) if rest.starts_with(|c: char| c.is_uppercase()) => {
            let mut chars = rest.chars();
            let first = chars.next().map(|c| c.to_lowercase().to_string());
            first.unwrap_or_default() + chars.as_str()
        }
        _ => accessor.to_string(),
    }
}

/// Lowercases `name`, inserting `sep` at camelCase boundaries and in place of
/// existing `_`/`-` separators.
fn split_words(name: &str, sep: char) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            out.push(sep);
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with(sep) {
                out.push(sep);
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// One leaf configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    key: String,
    value_type: ValueType,
    collection: CollectionKind,
    default_value: Option<String>,
    optional: bool,
    converter: Option<String>,
    list_parser: Option<String>,
}

impl ParameterDescriptor {
    pub fn builder(key: impl Into<String>, value_type: ValueType) -> ParameterBuilder {
        ParameterBuilder {
            key: key.into(),
            value_type,
            collection: CollectionKind::None,
            default_value: None,
            optional: false,
            converter: None,
            list_parser: None,
        }
    }

    /// Starts a descriptor whose key is inferred from `accessor`.
    pub fn accessor(accessor: &str, naming: &KeyNaming, value_type: ValueType) -> ParameterBuilder {
        Self::builder(naming.infer(accessor), value_type)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn collection(&self) -> CollectionKind {
        self.collection
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Whether the logical type is an optional wrapper.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_mandatory(&self) -> bool {
        !self.optional && self.default_value.is_none()
    }

    pub fn converter(&self) -> Option<&str> {
        self.converter.as_deref()
    }

    pub fn list_parser(&self) -> Option<&str> {
        self.list_parser.as_deref()
    }

    /// Type label used in diagnostics, e.g. `?i32` or `string list`.
    pub fn type_label(&self) -> String {
        let marker = if self.optional { "?" } else { "" };
        match self.collection {
            CollectionKind::None => format!("{marker}{}", self.value_type),
            kind => format!("{marker}{} {kind}", self.value_type),
        }
    }
}

#[derive(Debug, Clone)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ParameterBuilder {
    key: String,
    value_type: ValueType,
    collection: CollectionKind,
    default_value: Option<String>,
    optional: bool,
    converter: Option<String>,
    list_parser: Option<String>,
}

impl ParameterBuilder {
    /// Overrides an inferred key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn collection(mut self, kind: CollectionKind) -> Self {
        self.collection = kind;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Marks the logical type as an optional wrapper.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn converter(mut self, id: impl Into<String>) -> Self {
        self.converter = Some(id.into());
        self
    }

    pub fn list_parser(mut self, id: impl Into<String>) -> Self {
        self.list_parser = Some(id.into());
        self
    }

    pub fn build(self) -> Result<ParameterDescriptor, SchemaError> {
        if self.key.is_empty() {
            return Err(SchemaError::EmptyKey);
        }
        if self.optional && self.default_value.is_some() {
            return Err(SchemaError::OptionalWithDefault(self.key));
        }
        Ok(ParameterDescriptor {
            key: self.key,
            value_type: self.value_type,
            collection: self.collection,
            default_value: self.default_value,
            optional: self.optional,
            converter: self.converter,
            list_parser: self.list_parser,
        })
    }
}

pub const DEFAULT_SEPARATOR: &str = ".";

/// A nested schema whose keys live under `key + separator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDescriptor {
    key: String,
    separator: String,
    mandatory: bool,
    schema: Schema,
}

impl EmbeddedDescriptor {
    pub fn builder(key: impl Into<String>, schema: Schema) -> EmbeddedBuilder {
        EmbeddedBuilder {
            key: key.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
            mandatory: false,
            schema,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The raw-key prefix of this group, e.g. `mqtt.`.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.key, self.separator)
    }
}

#[derive(Debug, Clone)]
#[must_use = "builders do nothing until .build() is called"]
pub struct EmbeddedBuilder {
    key: String,
    separator: String,
    mandatory: bool,
    schema: Schema,
}

impl EmbeddedBuilder {
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn build(self) -> Result<EmbeddedDescriptor, SchemaError> {
        if self.key.is_empty() {
            return Err(SchemaError::EmptyKey);
        }
        if self.separator.is_empty() {
            return Err(SchemaError::EmptySeparator(self.key));
        }
        Ok(EmbeddedDescriptor {
            key: self.key,
            separator: self.separator,
            mandatory: self.mandatory,
            schema: self.schema,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    Parameter(ParameterDescriptor),
    Embedded(EmbeddedDescriptor),
}

impl SchemaNode {
    pub fn key(&self) -> &str {
        match self {
            Self::Parameter(p) => p.key(),
            Self::Embedded(e) => e.key(),
        }
    }
}

impl From<ParameterDescriptor> for SchemaNode {
    fn from(p: ParameterDescriptor) -> Self {
        Self::Parameter(p)
    }
}

impl From<EmbeddedDescriptor> for SchemaNode {
    fn from(e: EmbeddedDescriptor) -> Self {
        Self::Embedded(e)
    }
}

/// An ordered, duplicate-free list of schema nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    list_parser: Option<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.nodes.iter().filter_map(|n| match n {
            SchemaNode::Parameter(p) => Some(p),
            SchemaNode::Embedded(_) => None,
        })
    }

    pub fn embedded(&self) -> impl Iterator<Item = &EmbeddedDescriptor> {
        self.nodes.iter().filter_map(|n| match n {
            SchemaNode::Embedded(e) => Some(e),
            SchemaNode::Parameter(_) => None,
        })
    }

    pub fn parameter(&self, key: &str) -> Option<&ParameterDescriptor> {
        self.parameters().find(|p| p.key() == key)
    }

    /// Default list parser id for parameters that name none.
    pub fn list_parser(&self) -> Option<&str> {
        self.list_parser.as_deref()
    }

    /// Every fully prefixed leaf key in the tree, in schema order.
    pub fn flattened_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_keys("", &mut keys);
        keys
    }

    fn collect_keys(&self, prefix: &str, keys: &mut Vec<String>) {
        for node in &self.nodes {
            match node {
                SchemaNode::Parameter(p) => keys.push(format!("{prefix}{}", p.key())),
                SchemaNode::Embedded(e) => {
                    let nested = format!("{prefix}{}", e.prefix());
                    e.schema().collect_keys(&nested, keys);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct SchemaBuilder {
    nodes: Vec<SchemaNode>,
    list_parser: Option<String>,
}

impl SchemaBuilder {
    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.nodes.push(parameter.into());
        self
    }

    pub fn embedded(mut self, embedded: EmbeddedDescriptor) -> Self {
        self.nodes.push(embedded.into());
        self
    }

    pub fn node(mut self, node: SchemaNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Selects the list parser for every parameter that names none.
    pub fn list_parser(mut self, id: impl Into<String>) -> Self {
        self.list_parser = Some(id.into());
        self
    }

    /// Shorthand for `.list_parser("comma")`.
    pub fn comma_separated(self) -> Self {
        self.list_parser(list::COMMA)
    }

    /// Drops identical redeclarations and rejects conflicting ones.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut nodes: Vec<SchemaNode> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            match nodes.iter().find(|existing| existing.key() == node.key()) {
                Some(existing) if *existing == node => {}
                Some(_) => return Err(SchemaError::ConflictingKey(node.key().to_string())),
                None => nodes.push(node),
            }
        }
        Ok(Schema {
            nodes,
            list_parser: self.list_parser,
        })
    }
}
