use crate::error::{Error, Result};
use nft_schema::{Chain, Element, Entry, Flushable, Rule, Table};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// An nftables JSON document: `{"nftables": [...]}`.
///
/// Entries keep the order they were appended in, which is the order nft
/// applies them. Nothing is deduplicated or validated here; nft rejects
/// inconsistent documents when they are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub nftables: Vec<Entry>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.nftables.push(entry);
    }

    /// Append `element` without an explicit action (nft's `add`).
    /// Adding an element that already exists is a no-op once applied.
    pub fn add(&mut self, element: impl Into<Element>) {
        self.push(Entry::Add(element.into()));
    }

    /// Append `element` under the `delete` action.
    /// Deleting something that does not exist fails when applied.
    pub fn delete(&mut self, element: impl Into<Element>) {
        self.push(Entry::Delete(element.into()));
    }

    /// Append `target` under the `flush` action: its contents are removed,
    /// the container stays.
    pub fn flush(&mut self, target: impl Into<Flushable>) {
        self.push(Entry::Flush(target.into()));
    }

    pub fn add_table(&mut self, table: Table) {
        self.add(table);
    }

    pub fn delete_table(&mut self, table: Table) {
        self.delete(table);
    }

    pub fn flush_table(&mut self, table: Table) {
        self.flush(table);
    }

    pub fn add_chain(&mut self, chain: Chain) {
        self.add(chain);
    }

    /// The chain must hold no rules and not be a jump target when applied.
    pub fn delete_chain(&mut self, chain: Chain) {
        self.delete(chain);
    }

    pub fn flush_chain(&mut self, chain: Chain) {
        self.flush(chain);
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.add(rule);
    }

    /// nft identifies the rule to delete by its handle.
    pub fn delete_rule(&mut self, rule: Rule) {
        self.delete(rule);
    }

    pub fn len(&self) -> usize {
        self.nftables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nftables.is_empty()
    }

    /// Compact encoding, suitable for `nft -j -f -`
    pub fn to_json(&self) -> Result<Vec<u8>> {
        debug!(entries = self.nftables.len(), "encoding nftables document");
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        debug!(entries = self.nftables.len(), "encoding nftables document (pretty)");
        serde_json::to_string_pretty(self).map_err(Error::Encode)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes).map_err(|e| {
            debug!(error = %e, "rejected nftables document");
            Error::Parse(e)
        })?;
        debug!(entries = config.nftables.len(), "decoded nftables document");
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::TableQuery;
    use nft_schema::{
        ChainHook, ChainPolicy, ChainType, Expression, Family, Match, Operator, Payload,
        Statement, Verdict,
    };
    use proptest::prelude::*;

    const TABLE_NAME: &str = "test-table";
    const CHAIN_NAME: &str = "test-chain";

    fn encode(config: &Config) -> String {
        String::from_utf8(config.to_json().expect("encode config")).expect("utf-8 output")
    }

    fn rule_document(action: Option<&str>, rule_args: &str) -> String {
        let rule = format!(
            r#"{{"rule":{{"family":"ip","table":"{TABLE_NAME}","chain":"{CHAIN_NAME}"{rule_args}}}}}"#
        );
        match action {
            None => format!(r#"{{"nftables":[{rule}]}}"#),
            Some(action) => format!(r#"{{"nftables":[{{"{action}":{rule}}}]}}"#),
        }
    }

    fn test_chain() -> Chain {
        Chain::regular(&Table::new(Family::Ip, TABLE_NAME), CHAIN_NAME)
    }

    /// `ip saddr 10.10.10.10 return`
    fn match_src_ip4_with_return() -> (Vec<Statement>, &'static str) {
        let statements = vec![
            Match::new(Operator::Eq, Payload::new("ip", "saddr"), "10.10.10.10").into(),
            Verdict::Return.into(),
        ];
        let serialized = r#","expr":[{"match":{"op":"==","left":{"payload":{"protocol":"ip","field":"saddr"}},"right":"10.10.10.10"}},{"return":null}]"#;
        (statements, serialized)
    }

    #[test]
    fn table_actions_wrap_every_family() {
        let actions: [(Option<&str>, fn(&mut Config, Table)); 3] = [
            (None, Config::add_table),
            (Some("delete"), Config::delete_table),
            (Some("flush"), Config::flush_table),
        ];

        for (action, apply) in actions {
            for family in Family::ALL {
                let mut config = Config::new();
                apply(&mut config, Table::new(family, TABLE_NAME));

                let table = format!(r#"{{"table":{{"family":"{family}","name":"{TABLE_NAME}"}}}}"#);
                let expected = match action {
                    None => format!(r#"{{"nftables":[{table}]}}"#),
                    Some(action) => format!(r#"{{"nftables":[{{"{action}":{table}}}]}}"#),
                };
                assert_eq!(encode(&config), expected, "{action:?} {family}");
            }
        }
    }

    #[test]
    fn chain_actions_wrap_regular_chain() {
        let actions: [(Option<&str>, fn(&mut Config, Chain)); 3] = [
            (None, Config::add_chain),
            (Some("delete"), Config::delete_chain),
            (Some("flush"), Config::flush_chain),
        ];
        let chain_args =
            format!(r#"{{"chain":{{"family":"ip","table":"{TABLE_NAME}","name":"{CHAIN_NAME}"}}}}"#);

        for (action, apply) in actions {
            let mut config = Config::new();
            apply(&mut config, test_chain());

            let expected = match action {
                None => format!(r#"{{"nftables":[{chain_args}]}}"#),
                Some(action) => format!(r#"{{"nftables":[{{"{action}":{chain_args}}}]}}"#),
            };
            assert_eq!(encode(&config), expected);
        }
    }

    #[test]
    fn add_rule_with_match_and_verdict() {
        let (statements, serialized) = match_src_ip4_with_return();
        let rule = Rule::new(&test_chain(), statements).with_comment("mycomment");

        let mut config = Config::new();
        config.add_rule(rule);

        let expected = rule_document(None, &format!(r#"{serialized},"comment":"mycomment""#));
        assert_eq!(encode(&config), expected);

        let decoded = Config::from_json(expected.as_bytes()).expect("decode config");
        assert_eq!(decoded, config);
    }

    #[test]
    fn delete_rule_by_handle() {
        let mut config = Config::new();
        config.delete_rule(Rule::new(&test_chain(), vec![]).with_handle(100));

        assert_eq!(encode(&config), rule_document(Some("delete"), r#","handle":100"#));
    }

    #[test]
    fn row_expression_round_trips() {
        let statements = vec![
            Match::new(
                Operator::Eq,
                Expression::Opaque(serde_json::json!({"foo": "boo"})),
                "string-expression",
            )
            .into(),
        ];
        let serialized = r#","expr":[{"match":{"op":"==","left":{"foo":"boo"},"right":"string-expression"}}],"comment":"mycomment""#;

        let mut expected = Config::new();
        expected.add_rule(Rule::new(&test_chain(), statements).with_comment("mycomment"));

        let document = rule_document(None, serialized);
        assert_eq!(encode(&expected), document);
        assert_eq!(Config::from_json(document.as_bytes()).expect("decode"), expected);
    }

    #[test]
    fn numeric_expression_is_read_as_number() {
        let config: Config = r#"
            {"nftables":[{"rule":{
               "expr":[{"match":{"op":"==","left":"foo","right":12345}}]
            }}]}
        "#
        .parse()
        .expect("decode config");

        let Entry::Opaque(rule) = &config.nftables[0] else {
            panic!("a rule without ids is kept verbatim");
        };
        assert_eq!(rule["rule"]["expr"][0]["match"]["right"], 12345);

        let config = Config::from_json(
            br#"{"nftables":[{"rule":{"family":"ip","table":"t","chain":"c","expr":[{"match":{"op":"==","left":"foo","right":12345}}]}}]}"#,
        )
        .expect("decode config");
        let Some(Element::Rule(rule)) = config.nftables[0].added() else {
            panic!("expected an added rule");
        };
        let Statement::Match(m) = &rule.expr[0] else {
            panic!("expected a match statement");
        };
        assert_eq!(m.right, Expression::Number(12345));
    }

    #[test]
    fn listed_ruleset_reencodes_identically() {
        let listed = concat!(
            r#"{"nftables":["#,
            r#"{"metainfo":{"version":"1.0.9","release_name":"Old Doc Yak #3","json_schema_version":1}},"#,
            r#"{"table":{"family":"inet","name":"gw","handle":12,"flags":["dormant"],"comment":"x"}},"#,
            r#"{"chain":{"family":"inet","table":"gw","name":"input","type":"filter","hook":"input","prio":0,"policy":"drop","handle":1,"comment":"y"}},"#,
            r#"{"set":{"family":"inet","table":"gw","name":"banned","type":"ipv4_addr","handle":2}},"#,
            r#"{"rule":{"family":"inet","table":"gw","chain":"input","expr":["#,
            r#"{"match":{"op":"in","left":{"ct":{"key":"state"}},"right":["established","related"]}},"#,
            r#"{"counter":{"packets":12,"bytes":3402}},"#,
            r#"{"accept":null}],"handle":3}}"#,
            r#"]}"#
        );

        let config = Config::from_json(listed.as_bytes()).expect("decode listed ruleset");
        assert_eq!(config.len(), 5);
        assert!(matches!(config.nftables[0], Entry::Metainfo(_)));
        assert!(matches!(config.nftables[3], Entry::Opaque(_)));
        assert_eq!(config.lookup_tables(&TableQuery::new(Family::Inet, "gw")).len(), 1);
        assert_eq!(encode(&config), listed);
    }

    #[test]
    fn structurally_invalid_input_is_rejected() {
        for input in [
            "",
            "not json",
            "[]",
            r#"{"tables":[]}"#,
            r#"{"nftables":{"table":{}}}"#,
            r#"{"nftables":["table"]}"#,
        ] {
            let err = Config::from_json(input.as_bytes()).expect_err(input);
            assert!(matches!(err, Error::Parse(_)));
            assert!(err.to_string().starts_with("failed to parse nftables document"));
        }
    }

    #[test]
    fn duplicate_adds_are_kept() {
        let mut config = Config::new();
        config.add_chain(test_chain());
        config.add_chain(test_chain());
        assert_eq!(config.len(), 2);
    }

    fn name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    fn expression() -> impl Strategy<Value = Expression> {
        prop_oneof![
            "[a-z0-9.:/]{0,16}".prop_map(Expression::String),
            any::<i64>().prop_map(Expression::Number),
            any::<bool>().prop_map(Expression::Bool),
            (name(), name()).prop_map(|(p, f)| Expression::Payload(Payload::new(&p, &f))),
        ]
    }

    fn statement() -> impl Strategy<Value = Statement> {
        prop_oneof![
            Just(Statement::Empty),
            Just(Statement::Verdict(Verdict::Accept)),
            Just(Statement::Verdict(Verdict::Drop)),
            Just(Statement::Verdict(Verdict::Return)),
            name().prop_map(|t| Statement::Verdict(Verdict::Jump(t))),
            Just(Statement::Counter(None)),
            (expression(), expression())
                .prop_map(|(l, r)| Statement::Match(Match::new(Operator::Eq, l, r))),
        ]
    }

    prop_compose! {
        fn arb_chain()(
            table in name(),
            chain in name(),
            priority in proptest::option::of(any::<i32>()),
            hook in proptest::option::of(prop_oneof![
                Just(ChainHook::Input),
                Just(ChainHook::Forward),
                Just(ChainHook::Postrouting),
            ]),
            policy in proptest::option::of(prop_oneof![
                Just(ChainPolicy::Accept),
                Just(ChainPolicy::Drop),
            ]),
        ) -> Chain {
            let table = Table::new(Family::Inet, &table);
            Chain::new(&table, &chain, Some(ChainType::Filter), hook, priority, policy)
        }
    }

    prop_compose! {
        fn arb_rule()(
            chain in arb_chain(),
            expr in proptest::collection::vec(statement(), 0..4),
            handle in proptest::option::of(any::<u64>()),
            comment in proptest::option::of("[ -~]{0,24}"),
        ) -> Rule {
            let mut rule = Rule::new(&chain, expr);
            rule.handle = handle;
            rule.comment = comment;
            rule
        }
    }

    fn entry() -> impl Strategy<Value = Entry> {
        prop_oneof![
            name().prop_map(|n| Entry::Add(Table::new(Family::Ip6, &n).into())),
            arb_chain().prop_map(|c| Entry::Add(c.into())),
            arb_chain().prop_map(|c| Entry::Flush(c.into())),
            arb_rule().prop_map(|r| Entry::Add(r.into())),
            arb_rule().prop_map(|r| Entry::Delete(r.into())),
        ]
    }

    proptest! {
        #[test]
        fn decode_of_encode_is_identity(entries in proptest::collection::vec(entry(), 0..8)) {
            let config = Config { nftables: entries };
            let bytes = config.to_json().expect("encode");
            let decoded = Config::from_json(&bytes).expect("decode");
            prop_assert_eq!(decoded, config);
        }
    }
}
