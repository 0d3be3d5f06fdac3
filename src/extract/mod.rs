//! Best-effort extraction of a user record from language-model output.
//!
//! Model output is not contractually shaped: sometimes it is a (possibly
//! fenced) JSON object, sometimes prose with bold `**Label:**` fields. Two
//! strategies are exposed:
//!
//! - [`extract_json`]: parse the text as a JSON object and normalize common
//!   field variants (`firstName`/`lastName`, structured addresses,
//!   `phoneNumber`).
//! - [`extract_labeled`]: scan for `**Name:** ...` style lines.
//!
//! [`extract_user`] chains them, JSON first. Every entry point returns
//! `None` instead of failing; deciding whether to retry or re-prompt is up to
//! the caller.
//!
//! # Example
//!
//! ```rust
//! use mcp_text_client::extract::extract_user;
//!
//! let record = extract_user("```json\n{\"name\":\"Ada\",\"email\":\"ada@example.com\"}\n```")
//!     .expect("valid payload");
//! assert_eq!(record.name(), "Ada");
//! assert!(record.phone().is_none());
//! ```

mod json;
mod labeled;

pub use json::{extract_json, strip_code_fences};
pub use labeled::extract_labeled;

use serde::Serialize;

/// A structured user record recovered from model output.
///
/// `name` and `email` are always non-empty. Optional fields are either a
/// non-empty string or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

impl UserRecord {
    /// Build a record, returning `None` when `name` or `email` is blank.
    ///
    /// Blank optional fields are normalized to `None`.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        address: Option<String>,
        phone: Option<String>,
    ) -> Option<Self> {
        let name = non_blank(name.into())?;
        let email = non_blank(email.into())?;
        Some(Self {
            name,
            email,
            address: address.and_then(non_blank),
            phone: phone.and_then(non_blank),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// The record as a JSON object, suitable as tool-call arguments.
    pub fn to_arguments(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut args = serde_json::Map::new();
        args.insert("name".into(), self.name.clone().into());
        args.insert("email".into(), self.email.clone().into());
        if let Some(address) = &self.address {
            args.insert("address".into(), address.clone().into());
        }
        if let Some(phone) = &self.phone {
            args.insert("phone".into(), phone.clone().into());
        }
        args
    }
}

/// Extract a record trying the JSON strategy first, then labeled text.
pub fn extract_user(text: &str) -> Option<UserRecord> {
    extract_json(text).or_else(|| extract_labeled(text))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
