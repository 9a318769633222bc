//! Override sources: `key=value` command-line tokens and JSON config files.
//!
//! Both flatten into the same ordered list of `(key, value)` pairs. Nested
//! keys are dotted (`a.b=1` on the command line, `{"a": {"b": 1}}` in JSON).
//! Nothing here knows the job schema; unknown keys and bad types are the
//! resolver's business.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

// Capture:
// 1) key: dotted identifier
// 2) value: everything after the first '=' (may be empty)
static OVERRIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*=(.*)$")
        .expect("override pattern is valid")
});

/// A raw override value, before coercion to a field type.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Null,
    /// JSON values no field can take (arrays, floats).
    Unsupported(Value),
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideValue::Text(s) => write!(f, "{:?}", s),
            OverrideValue::Integer(n) => write!(f, "{}", n),
            OverrideValue::Bool(b) => write!(f, "{}", b),
            OverrideValue::Null => f.write_str("null"),
            OverrideValue::Unsupported(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered overrides; later entries win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    entries: Vec<(String, OverrideValue)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: OverrideValue) {
        self.entries.push((key.into(), value));
    }

    /// Append every entry of `other` after ours, so `other` takes precedence.
    pub fn extend(&mut self, other: Overrides) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, OverrideValue)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, OverrideValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Parse command-line tokens of the form `key=value`. Values stay text.
pub fn parse_cli_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Overrides> {
    let mut out = Overrides::new();
    for token in tokens {
        let token = token.as_ref();
        let caps = OVERRIDE_RE
            .captures(token)
            .ok_or_else(|| Error::MalformedOverride {
                token: token.to_string(),
            })?;
        out.push(&caps[1], OverrideValue::Text(caps[2].to_string()));
    }
    Ok(out)
}

/// Load overrides from a JSON file holding a single object.
pub fn load_config_file(path: &Path) -> Result<Overrides> {
    let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_json(&text).map_err(|message| Error::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_config_json(text: &str) -> std::result::Result<Overrides, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("expected a JSON object at top level".to_string());
    }

    let mut out = Overrides::new();
    flatten_into(&mut out, "", &value);
    Ok(out)
}

fn flatten_into(out: &mut Overrides, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten_into(out, &key, v);
            }
        }
        Value::String(s) => out.push(prefix, OverrideValue::Text(s.clone())),
        Value::Bool(b) => out.push(prefix, OverrideValue::Bool(*b)),
        Value::Null => out.push(prefix, OverrideValue::Null),
        Value::Number(n) => match n.as_i64() {
            Some(i) => out.push(prefix, OverrideValue::Integer(i)),
            None => out.push(prefix, OverrideValue::Unsupported(value.clone())),
        },
        Value::Array(_) => out.push(prefix, OverrideValue::Unsupported(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn text(s: &str) -> OverrideValue {
        OverrideValue::Text(s.to_string())
    }

    #[test]
    fn cli_tokens_split_on_first_equals() {
        let got = parse_cli_tokens(&["job_name=run1", "environment_name=a=b", "walltime="])
            .unwrap();
        let want: Overrides = [
            ("job_name", text("run1")),
            ("environment_name", text("a=b")),
            ("walltime", text("")),
        ]
        .into_iter()
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn cli_tokens_keep_dotted_keys() {
        let got = parse_cli_tokens(&["slurm.nodes=2"]).unwrap();
        let keys: Vec<&str> = got.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["slurm.nodes"]);
    }

    #[test]
    fn cli_token_without_equals_is_malformed() {
        let err = parse_cli_tokens(&["walltime"]).unwrap_err();
        assert!(matches!(err, Error::MalformedOverride { token } if token == "walltime"));

        let err = parse_cli_tokens(&["=02:00:00"]).unwrap_err();
        assert!(matches!(err, Error::MalformedOverride { .. }));
    }

    #[test]
    fn config_json_flattens_nested_objects() {
        let got = parse_config_json(
            r#"{
                "job_name": "run1",
                "node_count": 2,
                "enable_profiling": true,
                "entry_file": null,
                "extra": { "depth": { "x": "y" } },
                "ratio": 0.5,
                "tags": ["a"]
            }"#,
        )
        .unwrap();

        let entries: Vec<(String, OverrideValue)> =
            got.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert!(entries.contains(&("job_name".into(), text("run1"))));
        assert!(entries.contains(&("node_count".into(), OverrideValue::Integer(2))));
        assert!(entries.contains(&("enable_profiling".into(), OverrideValue::Bool(true))));
        assert!(entries.contains(&("entry_file".into(), OverrideValue::Null)));
        assert!(entries.contains(&("extra.depth.x".into(), text("y"))));
        assert!(
            entries
                .iter()
                .any(|(k, v)| k == "ratio" && matches!(v, OverrideValue::Unsupported(_)))
        );
        assert!(
            entries
                .iter()
                .any(|(k, v)| k == "tags" && matches!(v, OverrideValue::Unsupported(_)))
        );
    }

    #[test]
    fn config_json_must_be_an_object() {
        assert!(parse_config_json("[1, 2]").is_err());
        assert!(parse_config_json("{ not json").is_err());
    }

    #[test]
    fn config_file_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            load_config_file(&missing),
            Err(Error::ConfigRead { path, .. }) if path == missing
        ));

        let bad = dir.path().join("bad.json");
        let mut f = fs::File::create(&bad).unwrap();
        writeln!(f, "\"just a string\"").unwrap();
        assert!(matches!(
            load_config_file(&bad),
            Err(Error::ConfigParse { path, .. }) if path == bad
        ));
    }

    #[test]
    fn later_sources_win_after_extend() {
        let mut file: Overrides = [("walltime", text("01:00:00"))].into_iter().collect();
        file.extend(parse_cli_tokens(&["walltime=02:00:00"]).unwrap());
        let last = file.iter().last().map(|(_, v)| v.clone());
        assert_eq!(last, Some(text("02:00:00")));
        assert_eq!(file.len(), 2);
    }
}
