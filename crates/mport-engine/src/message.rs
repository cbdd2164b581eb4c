//! Package message parsing (`pkg-message`): a plain string shown always, or
//! a JSON array of conditional entries.

use mport_schema::Version;
use serde::Deserialize;

/// When a message entry should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Always shown.
    Always,
    /// Shown only on a fresh install (no previously installed version).
    Install,
    /// Shown only when upgrading from a previous version.
    Upgrade,
    /// Shown only on removal.
    Remove,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    message: String,
    #[serde(rename = "type", default = "default_type")]
    msg_type: MessageType,
    minimum_version: Option<String>,
    maximum_version: Option<String>,
}

fn default_type() -> MessageType {
    MessageType::Always
}

/// One parsed message entry.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    /// The text to show.
    pub message: String,
    /// Which lifecycle event it applies to.
    pub msg_type: MessageType,
    /// Lower bound (exclusive floor) on the previously installed version.
    pub minimum_version: Option<Version>,
    /// Upper bound on the previously installed version.
    pub maximum_version: Option<Version>,
}

/// Parse a `pkg-message` file's contents.
///
/// A file whose first non-whitespace byte is `[` is parsed as a JSON array
/// of entries; anything else is a single always-shown plain-text message.
pub fn parse(contents: &str) -> Vec<MessageEntry> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<RawEntry>>(trimmed) {
            Ok(entries) => entries
                .into_iter()
                .map(|e| MessageEntry {
                    message: e.message,
                    msg_type: e.msg_type,
                    minimum_version: e.minimum_version.as_deref().map(Version::parse),
                    maximum_version: e.maximum_version.as_deref().map(Version::parse),
                })
                .collect(),
            Err(_) => vec![plain(contents)],
        }
    } else {
        vec![plain(contents)]
    }
}

fn plain(contents: &str) -> MessageEntry {
    MessageEntry {
        message: contents.trim().to_string(),
        msg_type: MessageType::Always,
        minimum_version: None,
        maximum_version: None,
    }
}

/// Select the entries applicable given the previously installed version (if
/// any) and the lifecycle event in progress.
pub fn applicable<'a>(
    entries: &'a [MessageEntry],
    previous: Option<&Version>,
    event: MessageType,
) -> Vec<&'a MessageEntry> {
    entries
        .iter()
        .filter(|e| {
            let type_matches = e.msg_type == MessageType::Always || e.msg_type == event;
            let bounds_ok = match previous {
                Some(v) => {
                    e.minimum_version.as_ref().is_none_or(|min| v >= min)
                        && e.maximum_version.as_ref().is_none_or(|max| v <= max)
                }
                None => e.minimum_version.is_none(),
            };
            type_matches && bounds_ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_always_shown() {
        let entries = parse("thanks for installing\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msg_type, MessageType::Always);
    }

    #[test]
    fn json_array_with_version_bounds() {
        let raw = r#"[{"message":"upgrade note","type":"upgrade","minimum_version":"1.0"}]"#;
        let entries = parse(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msg_type, MessageType::Upgrade);

        let applicable = applicable(&entries, Some(&Version::parse("1.5")), MessageType::Upgrade);
        assert_eq!(applicable.len(), 1);

        let not_applicable = applicable(&entries, None, MessageType::Install);
        assert!(not_applicable.is_empty());
    }
}
