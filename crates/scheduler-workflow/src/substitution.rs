// Parameter substitution on a step's `target` string (§4.5 step 4a):
// `{{ params.NAME }}` (tolerant of internal whitespace) is replaced with
// `str(run_params[NAME])`; unknown names leave the placeholder intact.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*params\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

/// Renders a JSON scalar the way Python's `str()` would for the common
/// cases this substitution needs: strings unquoted, everything else via its
/// natural JSON text form.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        other => other.to_string(),
    }
}

pub fn substitute(target: &str, params: &HashMap<String, Value>) -> String {
    placeholder_pattern()
        .replace_all(target, |caps: &regex::Captures| {
            let name = &caps[1];
            match params.get(name) {
                Some(value) => stringify(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_parameter() {
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("world".into()));
        assert_eq!(substitute("echo hello {{ params.name }}", &params), "echo hello world");
    }

    #[test]
    fn tolerates_irregular_whitespace() {
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("world".into()));
        assert_eq!(substitute("echo {{params.name}}", &params), "echo world");
        assert_eq!(substitute("echo {{  params.name  }}", &params), "echo world");
    }

    #[test]
    fn leaves_unknown_placeholder_intact() {
        let params = HashMap::new();
        assert_eq!(substitute("echo {{ params.missing }}", &params), "echo {{ params.missing }}");
    }

    #[test]
    fn renders_non_string_scalars() {
        let mut params = HashMap::new();
        params.insert("count".to_string(), Value::from(3));
        assert_eq!(substitute("repeat {{ params.count }}", &params), "repeat 3");
    }
}
