//! Semantic value types and the typed values converters produce.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::SchemaError;

/// Tag naming the semantic type a parameter converts to.
///
/// The set is closed except for [`ValueType::Custom`], whose values are only
/// produced by converters registered for that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Long,
    Double,
    Duration,
    Date,
    Time,
    DateTime,
    Charset,
    Path,
    Address,
    Digest,
    Custom(Cow<'static, str>),
}

impl ValueType {
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "i32",
            Self::Long => "i64",
            Self::Double => "f64",
            Self::Duration => "duration",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Charset => "charset",
            Self::Path => "path",
            Self::Address => "address",
            Self::Digest => "digest",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = SchemaError;

    /// Parses a type name. Names outside the built-in set must be spelled
    /// `custom:<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Self::String,
            "bool" | "boolean" => Self::Bool,
            "i32" | "int" | "integer" => Self::Int,
            "i64" | "long" => Self::Long,
            "f64" | "double" => Self::Double,
            "duration" => Self::Duration,
            "date" | "localdate" => Self::Date,
            "time" | "localtime" => Self::Time,
            "datetime" | "localdatetime" => Self::DateTime,
            "charset" => Self::Charset,
            "path" | "file" => Self::Path,
            "address" | "inetaddress" => Self::Address,
            "digest" | "messagedigest" => Self::Digest,
            _ => match s.strip_prefix("custom:") {
                Some(name) if !name.is_empty() => Self::Custom(Cow::Owned(name.to_string())),
                _ => return Err(SchemaError::UnknownType(s.to_string())),
            },
        };
        Ok(ty)
    }
}

/// Character sets recognised by the charset converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    UsAscii,
    Iso8859_1,
    Utf16,
    Utf16Be,
    Utf16Le,
    Utf32,
}

impl Charset {
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let charset = match normalized.as_str() {
            "utf8" => Self::Utf8,
            "usascii" | "ascii" => Self::UsAscii,
            "iso88591" | "latin1" => Self::Iso8859_1,
            "utf16" => Self::Utf16,
            "utf16be" => Self::Utf16Be,
            "utf16le" => Self::Utf16Le,
            "utf32" => Self::Utf32,
            _ => return None,
        };
        Some(charset)
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::UsAscii => "US-ASCII",
            Self::Iso8859_1 => "ISO-8859-1",
            Self::Utf16 => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf32 => "UTF-32",
        }
    }
}

/// Message-digest algorithms recognised by the digest converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let algorithm = match normalized.as_str() {
            "md5" => Self::Md5,
            "sha" | "sha1" => Self::Sha1,
            "sha224" => Self::Sha224,
            "sha256" => Self::Sha256,
            "sha384" => Self::Sha384,
            "sha512" => Self::Sha512,
            _ => return None,
        };
        Some(algorithm)
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }
}

/// Payload of a user-defined type.
pub trait CustomData: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_dyn(&self, other: &dyn CustomData) -> bool;
}

impl<T> CustomData for T
where
    T: Any + Send + Sync + fmt::Debug + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn CustomData) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }
}

/// Shared handle to a custom value, compared by the payload's own equality.
#[derive(Debug, Clone)]
pub struct CustomValue(Arc<dyn CustomData>);

impl CustomValue {
    pub fn new<T: CustomData>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

/// A converted configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Duration(Duration),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Charset(Charset),
    Path(PathBuf),
    Address(IpAddr),
    Digest(DigestAlgorithm),
    Custom(CustomValue),
}

impl Value {
    pub fn custom<T: CustomData>(value: T) -> Self {
        Self::Custom(CustomValue::new(value))
    }

    /// Name of the variant, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "i32",
            Self::Long(_) => "i64",
            Self::Double(_) => "f64",
            Self::Duration(_) => "duration",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Charset(_) => "charset",
            Self::Path(_) => "path",
            Self::Address(_) => "address",
            Self::Digest(_) => "digest",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Long(l) => write!(f, "{l}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Duration(d) => write!(f, "{d:?}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Charset(c) => f.write_str(c.canonical_name()),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Address(a) => write!(f, "{a}"),
            Self::Digest(d) => f.write_str(d.canonical_name()),
            Self::Custom(c) => write!(f, "{:?}", c.0),
        }
    }
}

/// Extraction of a Rust value from a converted [`Value`].
///
/// Returns the value back on a variant mismatch so callers can report what
/// was actually stored.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

macro_rules! from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

from_value! {
    String => String,
    bool => Bool,
    Duration => Duration,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    Charset => Charset,
    PathBuf => Path,
    IpAddr => Address,
    DigestAlgorithm => Digest,
    CustomValue => Custom,
}

// Integer widths widen but never narrow.
impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => Ok(i),
            Value::Long(l) => i32::try_from(l).map_err(|_| Value::Long(l)),
            other => Err(other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => Ok(i64::from(i)),
            Value::Long(l) => Ok(l),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Double(d) => Ok(d),
            Value::Int(i) => Ok(f64::from(i)),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Endpoint(String);

    #[test]
    fn test_value_type_names_round_trip() {
        for ty in [
            ValueType::String,
            ValueType::Bool,
            ValueType::Int,
            ValueType::Long,
            ValueType::Double,
            ValueType::Duration,
            ValueType::DateTime,
            ValueType::Digest,
        ] {
            assert_eq!(ty.name().parse::<ValueType>().unwrap(), ty);
        }
        assert_eq!("Integer".parse::<ValueType>().unwrap(), ValueType::Int);
        assert_eq!(
            "custom:endpoint".parse::<ValueType>().unwrap(),
            ValueType::custom("endpoint")
        );
        assert!(matches!(
            "uuid".parse::<ValueType>(),
            Err(SchemaError::UnknownType(_))
        ));
    }

    #[test]
    fn test_charset_aliases() {
        assert_eq!(Charset::from_name("utf-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_name("ISO_8859_1"), Some(Charset::Iso8859_1));
        assert_eq!(Charset::from_name("klingon"), None);
    }

    #[test]
    fn test_digest_aliases() {
        assert_eq!(DigestAlgorithm::from_name("SHA-256"), Some(DigestAlgorithm::Sha256));
        assert_eq!(DigestAlgorithm::from_name("sha"), Some(DigestAlgorithm::Sha1));
        assert_eq!(DigestAlgorithm::from_name("crc32"), None);
    }

    #[test]
    fn test_custom_values_compare_by_payload() {
        let a = Value::custom(Endpoint("a".into()));
        let b = Value::custom(Endpoint("a".into()));
        let c = Value::custom(Endpoint("c".into()));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Value::custom(7_i32));

        let Value::Custom(custom) = a else {
            panic!("expected custom value");
        };
        assert_eq!(custom.downcast_ref::<Endpoint>(), Some(&Endpoint("a".into())));
    }

    #[test]
    fn test_integer_extraction_widens_only() {
        assert_eq!(i64::from_value(Value::Int(5)), Ok(5));
        assert_eq!(i32::from_value(Value::Long(5)), Ok(5));
        assert!(i32::from_value(Value::Long(i64::MAX)).is_err());
        assert_eq!(
            String::from_value(Value::Bool(true)),
            Err(Value::Bool(true))
        );
    }
}
