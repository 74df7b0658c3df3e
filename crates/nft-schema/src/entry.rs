use crate::chain::Chain;
use crate::expression::{single_entry, single_key};
use crate::rule::Rule;
use crate::table::Table;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

/// Something a document can add or delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Table(Table),
    Chain(Chain),
    Rule(Rule),
}

/// Something a document can flush: rules are deleted, never flushed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flushable {
    Table(Table),
    Chain(Chain),
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Chain(_) => "chain",
            Self::Rule(_) => "rule",
        }
    }
}

impl From<Table> for Element {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl From<Chain> for Element {
    fn from(value: Chain) -> Self {
        Self::Chain(value)
    }
}

impl From<Rule> for Element {
    fn from(value: Rule) -> Self {
        Self::Rule(value)
    }
}

impl From<Table> for Flushable {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl From<Chain> for Flushable {
    fn from(value: Chain) -> Self {
        Self::Chain(value)
    }
}

/// Header object `nft -j list` puts first in its output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metainfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema_version: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One item of the `nftables` array
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// `{"<kind>": {...}}`, nft's implicit add
    Add(Element),
    /// `{"delete": {"<kind>": {...}}}`
    Delete(Element),
    /// `{"flush": {"<kind>": {...}}}`
    Flush(Flushable),
    Metainfo(Metainfo),
    /// Commands and objects without a model (sets, maps, `insert`, ...)
    Opaque(Map<String, Value>),
}

impl Entry {
    /// Element of an add entry
    pub fn added(&self) -> Option<&Element> {
        match self {
            Self::Add(element) => Some(element),
            _ => None,
        }
    }

    /// Elements that fail to deserialize (missing ids, unknown keywords)
    /// are kept as [`Entry::Opaque`]; only a non-object entry is an error.
    fn from_object(map: Map<String, Value>) -> Self {
        let modeled = match single_entry(&map) {
            Some(("table", inner)) => Table::deserialize(inner)
                .ok()
                .map(|element| Self::Add(Element::Table(element))),
            Some(("chain", inner)) => Chain::deserialize(inner)
                .ok()
                .map(|element| Self::Add(Element::Chain(element))),
            Some(("rule", inner)) => Rule::deserialize(inner)
                .ok()
                .map(|element| Self::Add(Element::Rule(element))),
            Some(("delete", inner)) if wraps_kind(inner, &["table", "chain", "rule"]) => {
                Element::deserialize(inner).ok().map(Self::Delete)
            }
            Some(("flush", inner)) if wraps_kind(inner, &["table", "chain"]) => {
                Flushable::deserialize(inner).ok().map(Self::Flush)
            }
            Some(("metainfo", inner)) => Metainfo::deserialize(inner).ok().map(Self::Metainfo),
            _ => None,
        };

        modeled.unwrap_or_else(|| {
            trace!(
                keys = ?map.keys().collect::<Vec<_>>(),
                "keeping unrecognized entry verbatim"
            );
            Self::Opaque(map)
        })
    }
}

/// Whether `value` is `{"<kind>": ...}` for one of `kinds`
fn wraps_kind(value: &Value, kinds: &[&str]) -> bool {
    value
        .as_object()
        .and_then(single_entry)
        .map(|(kind, _)| kinds.iter().any(|k| *k == kind))
        .unwrap_or(false)
}

impl From<Element> for Entry {
    fn from(value: Element) -> Self {
        Self::Add(value)
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Add(element) => element.serialize(serializer),
            Self::Delete(element) => single_key(serializer, "delete", element),
            Self::Flush(target) => single_key(serializer, "flush", target),
            Self::Metainfo(info) => single_key(serializer, "metainfo", info),
            Self::Opaque(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_object)
    }
}
