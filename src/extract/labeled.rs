use std::sync::LazyLock;

use regex::Regex;

use super::UserRecord;

struct Labels {
    name: Regex,
    email: Regex,
    address: Regex,
    phone_number: Regex,
    phone: Regex,
    trailing_note: Regex,
}

static LABELS: LazyLock<Labels> = LazyLock::new(|| Labels {
    name: label_pattern("Name"),
    email: label_pattern("Email"),
    address: label_pattern("Address"),
    phone_number: label_pattern("Phone Number"),
    phone: label_pattern("Phone"),
    trailing_note: Regex::new(r"\s*\([^)]*\)\s*$").expect("static regex"),
});

fn label_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\*\*{}:\*\*\s*(.+)", regex::escape(label))).expect("static regex")
}

/// Extract a record from prose carrying `**Label:** value` lines.
///
/// A trailing parenthesized note on any value is dropped, so
/// `**Name:** John Doe (verified)` yields `John Doe`.
pub fn extract_labeled(text: &str) -> Option<UserRecord> {
    let labels = &*LABELS;
    let get = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| strip_note(m.as_str(), &labels.trailing_note))
    };

    let name = get(&labels.name)?;
    let email = get(&labels.email)?;
    let address = get(&labels.address);
    let phone = get(&labels.phone_number).or_else(|| get(&labels.phone));

    UserRecord::new(name, email, address, phone)
}

fn strip_note(value: &str, note: &Regex) -> String {
    note.replace(value.trim(), "").trim().to_string()
}
