use crate::chain::Chain;
use crate::statement::Statement;
use crate::table::Family;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A rule inside a chain.
///
/// `family`, `table` and `chain` are copied from the owning [`Chain`] when
/// the rule is built; the rule does not follow later changes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub family: Family,
    pub table: String,
    pub chain: String,
    /// Statements, evaluated in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expr: Vec<Statement>,
    /// Identifies an existing rule within its chain, used for deletion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u64>,
    /// Position of a new rule within its chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    pub fn new(chain: &Chain, expr: Vec<Statement>) -> Self {
        Self {
            family: chain.family,
            table: chain.table.clone(),
            chain: chain.name.clone(),
            expr,
            handle: None,
            index: None,
            comment: None,
            extra: Map::new(),
        }
    }

    pub fn with_handle(mut self, handle: u64) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// An empty comment leaves the rule without one
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = (!comment.is_empty()).then(|| comment.to_string());
        self
    }
}
