use crate::expression::{Expression, single_entry, single_key};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "&")]
    And,
    #[serde(rename = "|")]
    Or,
    #[serde(rename = "^")]
    Xor,
    #[serde(rename = "<<")]
    Lshift,
    #[serde(rename = ">>")]
    Rshift,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::In => "in",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Lshift => "<<",
            Self::Rshift => ">>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Match {
    pub op: Operator,
    pub left: Expression,
    pub right: Expression,
}

impl Match {
    pub fn new(op: Operator, left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Self {
            op,
            left: left.into(),
            right: right.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    Accept,
    Drop,
    Continue,
    Return,
    Jump(String),
    Goto(String),
}

impl Verdict {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Drop => "drop",
            Self::Continue => "continue",
            Self::Return => "return",
            Self::Jump(_) => "jump",
            Self::Goto(_) => "goto",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "accept" => Some(Self::Accept),
            "drop" => Some(Self::Drop),
            "continue" => Some(Self::Continue),
            "return" => Some(Self::Return),
            _ => None,
        }
    }

    fn target(&self) -> Option<&str> {
        match self {
            Self::Jump(target) | Self::Goto(target) => Some(target),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct TargetRef<'a> {
    target: &'a str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Target {
    target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Counter {
    pub packets: u64,
    pub bytes: u64,
}

/// One entry of a rule's `expr` list.
///
/// Exactly one variant is set. An object with several statement keys is not
/// a valid statement for nft, so it is carried as [`Statement::Opaque`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Statement {
    /// `{}`
    #[default]
    Empty,
    Match(Match),
    Verdict(Verdict),
    /// Anonymous counter; `None` lets the kernel start from zero
    Counter(Option<Counter>),
    Opaque(Map<String, Value>),
}

impl Statement {
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Verdict(_))
    }

    fn from_object(map: Map<String, Value>) -> Self {
        if map.is_empty() {
            return Self::Empty;
        }

        let modeled = match single_entry(&map) {
            Some(("match", inner)) => Match::deserialize(inner).ok().map(Self::Match),
            Some(("counter", Value::Null)) => Some(Self::Counter(None)),
            Some(("counter", inner)) => Counter::deserialize(inner)
                .ok()
                .map(|counter| Self::Counter(Some(counter))),
            Some(("jump", inner)) => Target::deserialize(inner)
                .ok()
                .map(|t| Self::Verdict(Verdict::Jump(t.target))),
            Some(("goto", inner)) => Target::deserialize(inner)
                .ok()
                .map(|t| Self::Verdict(Verdict::Goto(t.target))),
            Some((keyword, Value::Null)) => Verdict::from_keyword(keyword).map(Self::Verdict),
            _ => None,
        };

        modeled.unwrap_or_else(|| {
            trace!(
                keys = ?map.keys().collect::<Vec<_>>(),
                "keeping unrecognized statement verbatim"
            );
            Self::Opaque(map)
        })
    }
}

impl From<Match> for Statement {
    fn from(value: Match) -> Self {
        Self::Match(value)
    }
}

impl From<Verdict> for Statement {
    fn from(value: Verdict) -> Self {
        Self::Verdict(value)
    }
}

impl From<Counter> for Statement {
    fn from(value: Counter) -> Self {
        Self::Counter(Some(value))
    }
}

impl Serialize for Statement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_map(Some(0))?.end(),
            Self::Match(m) => single_key(serializer, "match", m),
            Self::Verdict(verdict) => match verdict.target() {
                Some(target) => single_key(serializer, verdict.keyword(), &TargetRef { target }),
                None => single_key(serializer, verdict.keyword(), &()),
            },
            Self::Counter(None) => single_key(serializer, "counter", &()),
            Self::Counter(Some(counter)) => single_key(serializer, "counter", counter),
            Self::Opaque(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Statement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_object)
    }
}
