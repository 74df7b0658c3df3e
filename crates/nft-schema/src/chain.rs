use crate::table::{Family, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Filter,
    Nat,
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainHook {
    Prerouting,
    Input,
    Output,
    Forward,
    Postrouting,
    Ingress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainPolicy {
    Accept,
    Drop,
}

impl ChainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Nat => "nat",
            Self::Route => "route",
        }
    }
}

impl ChainHook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerouting => "prerouting",
            Self::Input => "input",
            Self::Output => "output",
            Self::Forward => "forward",
            Self::Postrouting => "postrouting",
            Self::Ingress => "ingress",
        }
    }
}

impl ChainPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Drop => "drop",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ChainHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regular chain (no hook) or a base chain attached to a netfilter hook.
///
/// `family` and `table` are copied from the owning [`Table`] when the chain is
/// built. Renaming or re-familying that table afterwards leaves the chain as
/// it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub family: Family,
    pub table: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chain_type: Option<ChainType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<ChainHook>,
    #[serde(rename = "prio", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ChainPolicy>,
    /// Device an ingress chain is bound to
    #[serde(rename = "dev", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chain {
    /// Build a chain with any combination of base-chain fields.
    ///
    /// A base chain needs type, hook and priority; leaving one out is
    /// accepted here and rejected by nft when the ruleset is applied.
    pub fn new(
        table: &Table,
        name: &str,
        chain_type: Option<ChainType>,
        hook: Option<ChainHook>,
        priority: Option<i32>,
        policy: Option<ChainPolicy>,
    ) -> Self {
        Self {
            family: table.family,
            table: table.name.clone(),
            name: name.to_string(),
            chain_type,
            hook,
            priority,
            policy,
            device: None,
            handle: None,
            extra: Map::new(),
        }
    }

    /// Regular chain, only reachable through jump/goto
    pub fn regular(table: &Table, name: &str) -> Self {
        Self::new(table, name, None, None, None, None)
    }

    pub fn base(
        table: &Table,
        name: &str,
        chain_type: ChainType,
        hook: ChainHook,
        priority: i32,
        policy: Option<ChainPolicy>,
    ) -> Self {
        Self::new(
            table,
            name,
            Some(chain_type),
            Some(hook),
            Some(priority),
            policy,
        )
    }

    pub fn with_device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    pub fn is_base(&self) -> bool {
        self.hook.is_some()
    }
}
