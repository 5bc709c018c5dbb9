//! TOML schema documents.
//!
//! A schema generator hands its output to the runtime in this form:
//!
//! ```toml
//! list_parser = "comma"
//!
//! [naming]
//! case = "snake_case"
//! strip_get = true
//!
//! [[parameter]]
//! accessor = "getListenPort"
//! type = "i32"
//! default = "8080"
//!
//! [[embedded]]
//! key = "mqtt"
//! mandatory = true
//!
//! [[embedded.parameter]]
//! key = "hosts"
//! type = "string"
//! collection = "list"
//! ```
//!
//! Within a table, parameters precede embedded groups.

use serde::Deserialize;

use super::descriptor::{
    CollectionKind, EmbeddedDescriptor, KeyCase, KeyNaming, ParameterDescriptor, Schema,
};
use super::value::ValueType;
use super::SchemaError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    naming: Option<NamingDoc>,
    #[serde(default)]
    list_parser: Option<String>,
    #[serde(default)]
    parameter: Vec<ParameterDoc>,
    #[serde(default)]
    embedded: Vec<EmbeddedDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamingDoc {
    #[serde(default)]
    case: Option<String>,
    #[serde(default)]
    strip_get: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterDoc {
    key: Option<String>,
    accessor: Option<String>,
    #[serde(rename = "type")]
    value_type: String,
    default: Option<String>,
    #[serde(default)]
    optional: bool,
    collection: Option<String>,
    converter: Option<String>,
    list_parser: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmbeddedDoc {
    key: String,
    separator: Option<String>,
    #[serde(default)]
    mandatory: bool,
    naming: Option<NamingDoc>,
    list_parser: Option<String>,
    #[serde(default)]
    parameter: Vec<ParameterDoc>,
    #[serde(default)]
    embedded: Vec<EmbeddedDoc>,
}

impl Schema {
    /// Parses a TOML schema document.
    pub fn from_toml_str(document: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = toml::from_str(document)?;
        let naming = doc.naming.map(NamingDoc::into_naming).transpose()?.unwrap_or_default();
        build_schema(&naming, doc.list_parser, doc.parameter, doc.embedded)
    }
}

impl NamingDoc {
    fn into_naming(self) -> Result<KeyNaming, SchemaError> {
        let case = match self.case {
            Some(case) => case.parse::<KeyCase>()?,
            None => KeyCase::AsIs,
        };
        Ok(KeyNaming::new(case, self.strip_get))
    }
}

fn build_schema(
    naming: &KeyNaming,
    list_parser: Option<String>,
    parameters: Vec<ParameterDoc>,
    embedded: Vec<EmbeddedDoc>,
) -> Result<Schema, SchemaError> {
    let mut builder = Schema::builder();
    if let Some(id) = list_parser {
        builder = builder.list_parser(id);
    }
    for parameter in parameters {
        builder = builder.parameter(build_parameter(naming, parameter)?);
    }
    for group in embedded {
        // Nested groups inherit the enclosing naming unless they declare their own.
        let nested_naming = match group.naming {
            Some(doc) => doc.into_naming()?,
            None => *naming,
        };
        let schema = build_schema(&nested_naming, group.list_parser, group.parameter, group.embedded)?;
        let mut descriptor =
            EmbeddedDescriptor::builder(group.key, schema).mandatory(group.mandatory);
        if let Some(separator) = group.separator {
            descriptor = descriptor.separator(separator);
        }
        builder = builder.embedded(descriptor.build()?);
    }
    builder.build()
}

fn build_parameter(naming: &KeyNaming, doc: ParameterDoc) -> Result<ParameterDescriptor, SchemaError> {
    let key = match (doc.key, doc.accessor) {
        (explicit, Some(accessor)) => naming.resolve(&accessor, explicit.as_deref()),
        (Some(key), None) => key,
        (None, None) => return Err(SchemaError::MissingKey),
    };
    let value_type: ValueType = doc.value_type.parse()?;

    let mut builder = ParameterDescriptor::builder(key, value_type);
    if let Some(kind) = doc.collection {
        builder = builder.collection(kind.parse::<CollectionKind>()?);
    }
    if let Some(default) = doc.default {
        builder = builder.default_value(default);
    }
    if doc.optional {
        builder = builder.optional();
    }
    if let Some(id) = doc.converter {
        builder = builder.converter(id);
    }
    if let Some(id) = doc.list_parser {
        builder = builder.list_parser(id);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::descriptor::SchemaNode;

    const DOCUMENT: &str = r#"
        list_parser = "comma"

        [naming]
        case = "snake_case"
        strip_get = true

        [[parameter]]
        accessor = "getListenPort"
        type = "i32"
        default = "8080"

        [[parameter]]
        accessor = "getServiceName"
        key = "name"
        type = "string"

        [[embedded]]
        key = "mqtt"
        separator = "/"
        mandatory = true

        [[embedded.parameter]]
        accessor = "getBrokerHosts"
        type = "string"
        collection = "list"
        optional = true
    "#;

    #[test]
    fn test_parse_document() {
        let schema = Schema::from_toml_str(DOCUMENT).unwrap();
        assert_eq!(schema.list_parser(), Some("comma"));

        let port = schema.parameter("listen_port").unwrap();
        assert_eq!(port.value_type(), &ValueType::Int);
        assert_eq!(port.default_value(), Some("8080"));
        assert!(schema.parameter("name").unwrap().is_mandatory());

        let mqtt = schema.embedded().next().unwrap();
        assert_eq!(mqtt.separator(), "/");
        assert!(mqtt.is_mandatory());
        let hosts = mqtt.schema().parameter("broker_hosts").unwrap();
        assert_eq!(hosts.collection(), CollectionKind::List);

        assert_eq!(
            schema.flattened_keys(),
            vec!["listen_port", "name", "mqtt/broker_hosts"]
        );
        assert!(matches!(schema.nodes()[2], SchemaNode::Embedded(_)));
    }

    #[test]
    fn test_document_errors() {
        let unknown_type = "[[parameter]]\nkey = \"x\"\ntype = \"uuid\"\n";
        assert!(matches!(
            Schema::from_toml_str(unknown_type),
            Err(SchemaError::UnknownType(_))
        ));

        let no_key = "[[parameter]]\ntype = \"string\"\n";
        assert!(matches!(
            Schema::from_toml_str(no_key),
            Err(SchemaError::MissingKey)
        ));

        let inconsistent = "[[parameter]]\nkey = \"x\"\ntype = \"string\"\noptional = true\ndefault = \"a\"\n";
        assert!(matches!(
            Schema::from_toml_str(inconsistent),
            Err(SchemaError::OptionalWithDefault(_))
        ));

        assert!(matches!(
            Schema::from_toml_str("[[parameter]]\nkey = "),
            Err(SchemaError::Parse(_))
        ));
    }
}
