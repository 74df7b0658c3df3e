use crate::config::Config;
use nft_schema::{Chain, ChainHook, ChainPolicy, ChainType, Element, Family, Rule, Statement, Table};
use tracing::trace;

/// A partial description of an element.
///
/// Only the fields a query sets constrain the match. Lookups consider added
/// elements only; delete and flush entries are never returned.
pub trait Query {
    type Element;

    fn select(element: &Element) -> Option<&Self::Element>;

    fn matches(&self, candidate: &Self::Element) -> bool;
}

/// Matches tables by family and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub family: Family,
    pub name: String,
}

impl TableQuery {
    pub fn new(family: Family, name: &str) -> Self {
        Self {
            family,
            name: name.to_string(),
        }
    }
}

impl From<&Table> for TableQuery {
    fn from(table: &Table) -> Self {
        Self::new(table.family, &table.name)
    }
}

impl Query for TableQuery {
    type Element = Table;

    fn select(element: &Element) -> Option<&Table> {
        match element {
            Element::Table(table) => Some(table),
            _ => None,
        }
    }

    fn matches(&self, candidate: &Table) -> bool {
        candidate.family == self.family && candidate.name == self.name
    }
}

/// Matches chains by family, table and name, then by whichever base-chain
/// fields are set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainQuery {
    pub family: Family,
    pub table: String,
    pub name: String,
    pub chain_type: Option<ChainType>,
    pub hook: Option<ChainHook>,
    pub priority: Option<i32>,
    pub policy: Option<ChainPolicy>,
}

impl ChainQuery {
    pub fn new(table: &Table, name: &str) -> Self {
        Self {
            family: table.family,
            table: table.name.clone(),
            name: name.to_string(),
            chain_type: None,
            hook: None,
            priority: None,
            policy: None,
        }
    }

    pub fn with_type(mut self, chain_type: ChainType) -> Self {
        self.chain_type = Some(chain_type);
        self
    }

    pub fn with_hook(mut self, hook: ChainHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_policy(mut self, policy: ChainPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

impl From<&Chain> for ChainQuery {
    fn from(chain: &Chain) -> Self {
        Self {
            family: chain.family,
            table: chain.table.clone(),
            name: chain.name.clone(),
            chain_type: chain.chain_type,
            hook: chain.hook,
            priority: chain.priority,
            policy: chain.policy,
        }
    }
}

impl Query for ChainQuery {
    type Element = Chain;

    fn select(element: &Element) -> Option<&Chain> {
        match element {
            Element::Chain(chain) => Some(chain),
            _ => None,
        }
    }

    fn matches(&self, candidate: &Chain) -> bool {
        candidate.family == self.family
            && candidate.table == self.table
            && candidate.name == self.name
            && constrains(self.chain_type, candidate.chain_type)
            && constrains(self.hook, candidate.hook)
            && constrains(self.priority, candidate.priority)
            && constrains(self.policy, candidate.policy)
    }
}

/// Matches rules by family, table and chain, then by handle, comment and
/// statement list when set. An empty `expr` or comment matches anything.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleQuery {
    pub family: Family,
    pub table: String,
    pub chain: String,
    pub handle: Option<u64>,
    pub comment: Option<String>,
    pub expr: Vec<Statement>,
}

impl RuleQuery {
    pub fn new(chain: &Chain) -> Self {
        Self {
            family: chain.family,
            table: chain.table.clone(),
            chain: chain.name.clone(),
            handle: None,
            comment: None,
            expr: vec![],
        }
    }

    pub fn with_handle(mut self, handle: u64) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = (!comment.is_empty()).then(|| comment.to_string());
        self
    }

    pub fn with_expr(mut self, expr: Vec<Statement>) -> Self {
        self.expr = expr;
        self
    }
}

/// Query for `rule` itself; `index` is a placement hint and is not matched
impl From<&Rule> for RuleQuery {
    fn from(rule: &Rule) -> Self {
        Self {
            family: rule.family,
            table: rule.table.clone(),
            chain: rule.chain.clone(),
            handle: rule.handle,
            comment: rule.comment.clone(),
            expr: rule.expr.clone(),
        }
    }
}

impl Query for RuleQuery {
    type Element = Rule;

    fn select(element: &Element) -> Option<&Rule> {
        match element {
            Element::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    fn matches(&self, candidate: &Rule) -> bool {
        candidate.family == self.family
            && candidate.table == self.table
            && candidate.chain == self.chain
            && constrains(self.handle, candidate.handle)
            && constrains(
                self.comment.as_deref().filter(|c| !c.is_empty()),
                candidate.comment.as_deref(),
            )
            && (self.expr.is_empty() || self.expr == candidate.expr)
    }
}

/// An unset query field accepts anything; a set one needs an equal value
fn constrains<T: PartialEq>(wanted: Option<T>, actual: Option<T>) -> bool {
    match wanted {
        Some(wanted) => actual == Some(wanted),
        None => true,
    }
}

impl Config {
    /// Every added element matching `query`, in document order
    pub fn lookup<Q: Query>(&self, query: &Q) -> Vec<&Q::Element> {
        let found: Vec<_> = self
            .nftables
            .iter()
            .filter_map(|entry| entry.added())
            .filter_map(Q::select)
            .filter(|candidate| query.matches(candidate))
            .collect();

        trace!(matches = found.len(), "nftables lookup");
        found
    }

    pub fn lookup_table(&self, query: &TableQuery) -> Option<&Table> {
        self.lookup_tables(query).into_iter().next()
    }

    pub fn lookup_tables(&self, query: &TableQuery) -> Vec<&Table> {
        self.lookup(query)
    }

    pub fn lookup_chain(&self, query: &ChainQuery) -> Option<&Chain> {
        self.lookup_chains(query).into_iter().next()
    }

    pub fn lookup_chains(&self, query: &ChainQuery) -> Vec<&Chain> {
        self.lookup(query)
    }

    pub fn lookup_rules(&self, query: &RuleQuery) -> Vec<&Rule> {
        self.lookup(query)
    }
}
