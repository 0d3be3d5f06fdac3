use serde_json::{Map, Value};

use super::UserRecord;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Remove a leading code-fence marker (optionally tagged `json`) and a
/// trailing fence marker. The two are stripped independently.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(head) = s.get(..JSON_FENCE.len())
        && head.eq_ignore_ascii_case(JSON_FENCE)
    {
        s = &s[JSON_FENCE.len()..];
    }
    if let Some(rest) = s.strip_prefix(FENCE) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix(FENCE) {
        s = rest;
    }
    s.trim()
}

/// Parse `text` as a (possibly fenced) JSON object describing a user.
///
/// Returns `None` when the text is not a JSON object or when no non-empty
/// name and email can be resolved.
pub fn extract_json(text: &str) -> Option<UserRecord> {
    let value: Value = serde_json::from_str(strip_code_fences(text)).ok()?;
    let obj = value.as_object()?;

    // An explicit name wins even when blank; blank then rejects the record
    let name = match obj.get("name") {
        None | Some(Value::Null) => {
            let first = scalar(obj.get("firstName"))?;
            let last = scalar(obj.get("lastName"))?;
            format!("{first} {last}")
        }
        explicit => scalar(explicit)?,
    };
    let email = scalar(obj.get("email"))?;

    let address = match obj.get("address") {
        Some(Value::Object(parts)) => flatten_address(parts),
        other => scalar(other),
    };
    let phone = scalar(obj.get("phone")).or_else(|| scalar(obj.get("phoneNumber")));

    UserRecord::new(name, email, address, phone)
}

/// `street, city, state, zip` with missing components left out entirely.
fn flatten_address(parts: &Map<String, Value>) -> Option<String> {
    let zip = scalar(parts.get("zip")).or_else(|| scalar(parts.get("zipCode")));
    let components: Vec<String> = [
        scalar(parts.get("street")),
        scalar(parts.get("city")),
        scalar(parts.get("state")),
        zip,
    ]
    .into_iter()
    .flatten()
    .collect();

    if components.is_empty() {
        None
    } else {
        Some(components.join(", "))
    }
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
