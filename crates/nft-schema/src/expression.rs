use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payload {
    pub protocol: String,
    pub field: String,
}

impl Payload {
    pub fn new(protocol: &str, field: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    pub key: String,
}

impl Meta {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

/// Address prefix (`10.0.0.0/24` is `addr: "10.0.0.0", len: 24`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Prefix {
    pub addr: String,
    pub len: u8,
}

/// Operand of a match statement.
///
/// Anything that is not exactly one of the modeled shapes is kept as
/// [`Expression::Opaque`] and written back untouched. An `Opaque` holding a
/// modeled shape (a bare string, say) decodes as that shape next time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    String(String),
    Number(i64),
    Bool(bool),
    Payload(Payload),
    Meta(Meta),
    Prefix(Prefix),
    Opaque(Value),
}

impl Expression {
    fn from_object(map: Map<String, Value>) -> Self {
        let modeled = match single_entry(&map) {
            Some(("payload", inner)) => Payload::deserialize(inner).ok().map(Self::Payload),
            Some(("meta", inner)) => Meta::deserialize(inner).ok().map(Self::Meta),
            Some(("prefix", inner)) => Prefix::deserialize(inner).ok().map(Self::Prefix),
            _ => None,
        };

        modeled.unwrap_or_else(|| {
            trace!(
                keys = ?map.keys().collect::<Vec<_>>(),
                "keeping unrecognized expression verbatim"
            );
            Self::Opaque(Value::Object(map))
        })
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::String(s),
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Number(i),
                None => Self::Opaque(Value::Number(n)),
            },
            Value::Object(map) => Self::from_object(map),
            other => Self::Opaque(other),
        }
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Expression {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u16> for Expression {
    fn from(value: u16) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Payload> for Expression {
    fn from(value: Payload) -> Self {
        Self::Payload(value)
    }
}

impl From<Meta> for Expression {
    fn from(value: Meta) -> Self {
        Self::Meta(value)
    }
}

impl From<Prefix> for Expression {
    fn from(value: Prefix) -> Self {
        Self::Prefix(value)
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Payload(payload) => single_key(serializer, "payload", payload),
            Self::Meta(meta) => single_key(serializer, "meta", meta),
            Self::Prefix(prefix) => single_key(serializer, "prefix", prefix),
            Self::Opaque(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// Key and value of a one-entry object
pub(crate) fn single_entry(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => Some((key.as_str(), value)),
        _ => None,
    }
}

/// Write `{"<key>": value}`
pub(crate) fn single_key<S, T>(serializer: S, key: &str, value: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}
