use serde::Deserialize;
use std::collections::HashMap;

/// How to launch the capability service as a child process.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the child; values may contain `${VAR}`.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Expand "${VAR}" placeholders from the process environment.
/// Unknown variables are left in place.
pub fn expand_env_placeholders(input: &str) -> String {
    let mut out = input.to_string();
    for (k, v) in std::env::vars() {
        let needle = format!("${{{k}}}");
        if out.contains(&needle) {
            out = out.replace(&needle, &v);
        }
    }
    out
}

pub fn expand_env_map(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), expand_env_placeholders(v)))
        .collect()
}
