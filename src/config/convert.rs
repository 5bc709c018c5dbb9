//! String-to-value converters and the registries that select them.
//!
//! Lookup order for a parameter is: the converter id named on the
//! descriptor, the store's own [`Registry`], the process-wide registry, and
//! finally the built-in table in [`convert_builtin`].

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::RwLock;

use super::list::{ListParser, SplitParser};
use super::literal;
use super::value::{Charset, DigestAlgorithm, Value, ValueType};
use super::ConversionError;

type ConvertFn = dyn Fn(&str) -> Result<Value, ConversionError> + Send + Sync;

/// A conversion function from one raw string to a [`Value`].
#[derive(Clone)]
pub struct Converter(Arc<ConvertFn>);

impl Converter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Converts `raw`, mapping blank input to `None` without calling the function.
    pub fn convert(&self, raw: &str) -> Result<Option<Value>, ConversionError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        (self.0)(raw).map(Some)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(..)")
    }
}

/// Converts with the built-in rule for `ty`. Blank input is absent.
pub fn convert_builtin(ty: &ValueType, raw: &str) -> Result<Option<Value>, ConversionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let fail = |reason: &str| ConversionError::new(raw, ty.name(), reason);

    let value = match ty {
        ValueType::String => Value::String(raw.to_string()),
        ValueType::Bool => Value::Bool(literal::parse_bool(trimmed)),
        ValueType::Int => Value::Int(literal::parse_i32(trimmed).map_err(fail)?),
        ValueType::Long => Value::Long(literal::parse_i64(trimmed).map_err(fail)?),
        ValueType::Double => Value::Double(literal::parse_f64(trimmed).map_err(fail)?),
        ValueType::Duration => Value::Duration(literal::parse_duration(trimmed).map_err(fail)?),
        ValueType::Date => Value::Date(
            trimmed
                .parse::<NaiveDate>()
                .map_err(|e| fail(&e.to_string()))?,
        ),
        ValueType::Time => Value::Time(
            trimmed
                .parse::<NaiveTime>()
                .map_err(|e| fail(&e.to_string()))?,
        ),
        ValueType::DateTime => Value::DateTime(
            trimmed
                .parse::<NaiveDateTime>()
                .map_err(|e| fail(&e.to_string()))?,
        ),
        ValueType::Charset => Value::Charset(
            Charset::from_name(trimmed).ok_or_else(|| fail("unsupported charset"))?,
        ),
        ValueType::Path => Value::Path(PathBuf::from(expand_home(trimmed))),
        ValueType::Address => Value::Address(resolve_address(trimmed).map_err(|r| fail(&r))?),
        ValueType::Digest => Value::Digest(
            DigestAlgorithm::from_name(trimmed)
                .ok_or_else(|| fail("unknown message digest algorithm"))?,
        ),
        ValueType::Custom(name) => {
            return Err(ConversionError::new(
                raw,
                name.to_string(),
                "no converter registered for this type",
            ))
        }
    };
    Ok(Some(value))
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{home}/{rest}"),
        _ => path.to_string(),
    }
}

fn resolve_address(host: &str) -> Result<IpAddr, String> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    let unbracketed = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        return Ok(ip);
    }
    (host, 0)
        .to_socket_addrs()
        .map_err(|e| format!("cannot resolve host: {e}"))?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| "host resolved to no addresses".to_string())
}

/// Converter and list-parser overrides.
///
/// A store carries its own registry as an overlay over the process-wide one
/// reached through [`register_global_converter`] and friends.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_type: HashMap<ValueType, Converter>,
    named: HashMap<String, Converter>,
    list_parsers: HashMap<String, Arc<dyn ListParser>>,
    default_list_parser: Option<Arc<dyn ListParser>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the converter used for every parameter of type `ty`.
    pub fn register_converter(&mut self, ty: ValueType, converter: Converter) {
        self.by_type.insert(ty, converter);
    }

    /// Registers a converter that descriptors select by `id`.
    pub fn register_named_converter(&mut self, id: impl Into<String>, converter: Converter) {
        self.named.insert(id.into(), converter);
    }

    /// Replaces the parser used for collections that name no parser.
    pub fn register_list_parser(&mut self, parser: Arc<dyn ListParser>) {
        self.default_list_parser = Some(parser);
    }

    pub fn register_named_list_parser(&mut self, id: impl Into<String>, parser: Arc<dyn ListParser>) {
        self.list_parsers.insert(id.into(), parser);
    }

    pub fn converter_for(&self, ty: &ValueType) -> Option<Converter> {
        self.by_type.get(ty).cloned()
    }

    pub fn named_converter(&self, id: &str) -> Option<Converter> {
        self.named.get(id).cloned()
    }

    pub fn named_list_parser(&self, id: &str) -> Option<Arc<dyn ListParser>> {
        self.list_parsers.get(id).cloned()
    }

    pub fn default_list_parser(&self) -> Option<Arc<dyn ListParser>> {
        self.default_list_parser.clone()
    }

    /// Converts `raw` to `ty`, honouring an optional named converter.
    ///
    /// The global lock is released before the converter runs.
    pub fn convert(
        &self,
        ty: &ValueType,
        converter_id: Option<&str>,
        raw: &str,
    ) -> Result<Option<Value>, ConversionError> {
        let converter = match converter_id {
            Some(id) => Some(
                self.named_converter(id)
                    .or_else(|| GLOBAL.read().named_converter(id))
                    .ok_or_else(|| {
                        ConversionError::new(raw, ty.name(), format!("no converter named '{id}'"))
                    })?,
            ),
            None => self
                .converter_for(ty)
                .or_else(|| GLOBAL.read().converter_for(ty)),
        };
        match converter {
            Some(converter) => converter.convert(raw),
            None => convert_builtin(ty, raw),
        }
    }

    /// Picks the list parser for a collection: explicit id, then the local
    /// default, then the global default, then whitespace splitting.
    ///
    /// Unknown ids fall back to the default parser.
    pub fn list_parser(&self, parser_id: Option<&str>) -> Arc<dyn ListParser> {
        if let Some(id) = parser_id {
            let found = self
                .named_list_parser(id)
                .or_else(|| GLOBAL.read().named_list_parser(id))
                .or_else(|| SplitParser::builtin(id).map(|p| Arc::new(p) as Arc<dyn ListParser>));
            match found {
                Some(parser) => return parser,
                None => tracing::warn!(parser = id, "unknown list parser, using default"),
            }
        }
        self.default_list_parser()
            .or_else(|| GLOBAL.read().default_list_parser())
            .unwrap_or_else(|| Arc::new(SplitParser::whitespace()))
    }
}

static GLOBAL: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::new()));

/// Replaces, process-wide, the converter used for `ty`. Last writer wins.
///
/// Register at start-up, before any store converts values.
pub fn register_global_converter(ty: ValueType, converter: Converter) {
    tracing::debug!(value_type = %ty, "registering global converter");
    GLOBAL.write().register_converter(ty, converter);
}

pub fn register_global_named_converter(id: impl Into<String>, converter: Converter) {
    let id = id.into();
    tracing::debug!(converter = %id, "registering global named converter");
    GLOBAL.write().register_named_converter(id, converter);
}

/// Replaces, process-wide, the default list parser.
pub fn register_global_list_parser(parser: Arc<dyn ListParser>) {
    tracing::debug!(?parser, "registering global list parser");
    GLOBAL.write().register_list_parser(parser);
}

pub fn register_global_named_list_parser(id: impl Into<String>, parser: Arc<dyn ListParser>) {
    let id = id.into();
    tracing::debug!(parser = %id, "registering global named list parser");
    GLOBAL.write().register_named_list_parser(id, parser);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct Color(u8, u8, u8);

    fn color_converter() -> Converter {
        Converter::new(|raw| {
            let hex = raw.trim().trim_start_matches('#');
            let channel = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|c| u8::from_str_radix(c, 16).ok())
                    .ok_or_else(|| ConversionError::new(raw, "color", "expected #rrggbb"))
            };
            Ok(Value::custom(Color(channel(0)?, channel(2)?, channel(4)?)))
        })
    }

    #[test]
    fn test_blank_input_is_absent_for_every_type() {
        for ty in [
            ValueType::String,
            ValueType::Bool,
            ValueType::Int,
            ValueType::Double,
            ValueType::Address,
            ValueType::custom("anything"),
        ] {
            assert_eq!(convert_builtin(&ty, "  "), Ok(None), "{ty}");
        }
    }

    #[test]
    fn test_builtin_scalars() {
        assert_eq!(
            convert_builtin(&ValueType::Int, "0x1F"),
            Ok(Some(Value::Int(31)))
        );
        assert_eq!(
            convert_builtin(&ValueType::Bool, "Yes"),
            Ok(Some(Value::Bool(true)))
        );
        assert_eq!(
            convert_builtin(&ValueType::Bool, "nope"),
            Ok(Some(Value::Bool(false)))
        );
        assert_eq!(
            convert_builtin(&ValueType::Duration, "5s"),
            Ok(Some(Value::Duration(Duration::from_secs(5))))
        );
        assert_eq!(
            convert_builtin(&ValueType::String, " padded "),
            Ok(Some(Value::String(" padded ".into())))
        );
    }

    #[test]
    fn test_builtin_temporal() {
        let date = convert_builtin(&ValueType::Date, "2024-02-29").unwrap();
        assert_eq!(
            date,
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        let time = convert_builtin(&ValueType::Time, "13:45:00").unwrap();
        assert_eq!(
            time,
            Some(Value::Time(NaiveTime::from_hms_opt(13, 45, 0).unwrap()))
        );
        assert!(convert_builtin(&ValueType::DateTime, "2024-01-02T03:04:05")
            .unwrap()
            .is_some());
        assert!(convert_builtin(&ValueType::Date, "2024-13-01").is_err());
    }

    #[test]
    fn test_builtin_failures_carry_value_and_type() {
        let err = convert_builtin(&ValueType::Int, "12x").unwrap_err();
        assert_eq!(err.value, "12x");
        assert_eq!(err.type_name, "i32");

        let err = convert_builtin(&ValueType::Charset, "EBCDIC-XYZ").unwrap_err();
        assert_eq!(err.type_name, "charset");

        let err = convert_builtin(&ValueType::Digest, "ROT13").unwrap_err();
        assert_eq!(err.value, "ROT13");

        let err = convert_builtin(&ValueType::custom("color"), "#fff").unwrap_err();
        assert_eq!(err.type_name, "color");
    }

    #[test]
    fn test_literal_addresses() {
        assert_eq!(
            convert_builtin(&ValueType::Address, "127.0.0.1"),
            Ok(Some(Value::Address("127.0.0.1".parse().unwrap())))
        );
        assert_eq!(
            convert_builtin(&ValueType::Address, "[::1]"),
            Ok(Some(Value::Address("::1".parse().unwrap())))
        );
    }

    #[test]
    fn test_local_registry_overrides_builtin() {
        let mut registry = Registry::new();
        registry.register_converter(
            ValueType::Int,
            Converter::new(|_| Ok(Value::Int(42))),
        );
        assert_eq!(
            registry.convert(&ValueType::Int, None, "7"),
            Ok(Some(Value::Int(42)))
        );
        assert_eq!(
            registry.convert(&ValueType::Long, None, "7"),
            Ok(Some(Value::Long(7)))
        );
    }

    #[test]
    fn test_named_converter_lookup() {
        let mut registry = Registry::new();
        registry.register_named_converter("color", color_converter());
        let value = registry
            .convert(&ValueType::custom("rgb"), Some("color"), "#ff8000")
            .unwrap()
            .unwrap();
        assert_eq!(value, Value::custom(Color(255, 128, 0)));

        let err = registry
            .convert(&ValueType::String, Some("missing"), "x")
            .unwrap_err();
        assert!(err.reason.contains("missing"));
    }

    #[test]
    fn test_global_registration_reaches_every_registry() {
        let ty = ValueType::custom("test-global-color");
        let converter = color_converter();
        register_global_converter(ty.clone(), converter.clone());
        register_global_converter(ty.clone(), converter);

        let value = Registry::new().convert(&ty, None, "#000000").unwrap();
        assert_eq!(value, Some(Value::custom(Color(0, 0, 0))));
    }

    #[test]
    fn test_global_named_list_parser() {
        register_global_named_list_parser("test-global-slash", Arc::new(SplitParser::on('/')));
        let parser = Registry::new().list_parser(Some("test-global-slash"));
        assert_eq!(parser.split("a/b c"), vec!["a", "b c"]);
    }

    #[test]
    fn test_global_default_list_parser() {
        // Whitespace splitting is already the default, so concurrent tests see no change.
        register_global_list_parser(Arc::new(SplitParser::whitespace()));
        assert!(GLOBAL.read().default_list_parser().is_some());
        assert_eq!(Registry::new().list_parser(None).split("a b"), vec!["a", "b"]);
    }

    #[test]
    fn test_list_parser_selection() {
        let registry = Registry::new();
        assert_eq!(registry.list_parser(Some("comma")).split("a,b"), vec!["a", "b"]);
        assert_eq!(registry.list_parser(Some("nope")).split("a b"), vec!["a", "b"]);

        let mut local = Registry::new();
        local.register_list_parser(Arc::new(SplitParser::on(';')));
        assert_eq!(local.list_parser(None).split("a;b c"), vec!["a", "b c"]);
    }
}
