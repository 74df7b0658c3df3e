use crate::config::Config;
use crate::error::Result;
use similar::{ChangeTag, TextDiff};

pub struct ConfigDiff {
    pub matches: bool,
    /// Line diff of the pretty encodings, `None` when they are identical
    pub diff: Option<String>,
}

impl Config {
    /// Compare this document with `desired` and return a textual diff
    pub fn diff(&self, desired: &Config) -> Result<ConfigDiff> {
        let current = self.to_json_pretty()?;
        let desired = desired.to_json_pretty()?;

        if current == desired {
            return Ok(ConfigDiff {
                matches: true,
                diff: None,
            });
        }

        Ok(ConfigDiff {
            matches: false,
            diff: Some(render_diff(&current, &desired)),
        })
    }
}

fn render_diff(current: &str, desired: &str) -> String {
    let diff = TextDiff::from_lines(current, desired);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        output.push(sign);
        output.push_str(change.value());
        if change.missing_newline() {
            output.push('\n');
        }
    }

    output
}
