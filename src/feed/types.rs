//! Partner payload shapes and their normalization into directory entries.
//!
//! The partner has shipped several envelope layouts and loosely typed records
//! over time, so decoding works on `serde_json::Value` and never fails: a
//! record without a usable URL is counted and skipped, everything else falls
//! back to defaults.

use serde::Serialize;
use serde_json::Value;

use crate::preview::screenshot_url;
use crate::types::{DirectoryEntry, EntrySource};
use crate::validate::is_valid_http_url;

/// Prefix keeping external ids out of the internal id namespace.
pub const EXTERNAL_ID_PREFIX: &str = "external:";
/// Offset placing partner entries after explicitly ordered internal ones.
pub const EXTERNAL_SORT_OFFSET: i64 = 1000;
pub const FALLBACK_TITLE: &str = "External Site";

const LABEL_MAX_CHARS: usize = 28;
const LABEL_KEEP_CHARS: usize = 25;
const LABEL_ELLIPSIS: &str = "...";

const URL_KEYS: &[&str] = &["websiteUrl", "siteUrl", "url"];
const TITLE_KEYS: &[&str] = &["name", "title", "storyId"];
const ID_KEYS: &[&str] = &["id", "docId", "_id", "storyId"];
const SUBTITLE_KEYS: &[&str] = &["subtitle", "description"];

/// Result of one feed fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub entries: Vec<DirectoryEntry>,
    pub total_clients: usize,
    pub skipped_invalid_url: usize,
}

/// Envelope layouts, in the order they are tried.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEnvelope {
    /// `{"clients": [...]}`
    Clients(Vec<Value>),
    /// `{"data": [...]}`
    Data(Vec<Value>),
    /// `{"data": {"clients": [...]}}`
    NestedData(Vec<Value>),
    /// `[...]`
    Bare(Vec<Value>),
    /// Nothing recognizable.
    Empty,
}

type ShapeDecoder = fn(&Value) -> Option<ClientEnvelope>;

fn array_at(value: &Value, key: &str) -> Option<Vec<Value>> {
    value.get(key).and_then(Value::as_array).cloned()
}

fn top_level_clients(v: &Value) -> Option<ClientEnvelope> {
    array_at(v, "clients").map(ClientEnvelope::Clients)
}

fn top_level_data(v: &Value) -> Option<ClientEnvelope> {
    array_at(v, "data").map(ClientEnvelope::Data)
}

fn nested_data_clients(v: &Value) -> Option<ClientEnvelope> {
    v.get("data")
        .and_then(|data| array_at(data, "clients"))
        .map(ClientEnvelope::NestedData)
}

fn bare_array(v: &Value) -> Option<ClientEnvelope> {
    v.as_array().cloned().map(ClientEnvelope::Bare)
}

const SHAPES: &[ShapeDecoder] = &[
    top_level_clients,
    top_level_data,
    nested_data_clients,
    bare_array,
];

impl ClientEnvelope {
    pub fn resolve(payload: &Value) -> Self {
        SHAPES
            .iter()
            .find_map(|decode| decode(payload))
            .unwrap_or(ClientEnvelope::Empty)
    }

    pub fn into_records(self) -> Vec<Value> {
        match self {
            Self::Clients(records)
            | Self::Data(records)
            | Self::NestedData(records)
            | Self::Bare(records) => records,
            Self::Empty => Vec::new(),
        }
    }
}

/// First non-null value among `keys`, rendered as a trimmed string.
fn first_text(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
        .map(|value| match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        })
}

/// Titles up to 28 characters are kept; longer ones keep 25 plus an ellipsis.
pub fn truncate_label(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.chars().count() <= LABEL_MAX_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(LABEL_KEEP_CHARS).collect();
    format!("{head}{LABEL_ELLIPSIS}")
}

/// Map one partner record at position `index`, or `None` if it has no usable URL.
pub fn map_client(record: &Value, index: usize, actor: &str) -> Option<DirectoryEntry> {
    let url = first_text(record, URL_KEYS).unwrap_or_default();
    if url.is_empty() || !is_valid_http_url(&url) {
        return None;
    }

    let title = first_text(record, TITLE_KEYS)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let source_id = ID_KEYS
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
        .map(|value| match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("external-{index}"));

    let subtitle = first_text(record, SUBTITLE_KEYS).unwrap_or_default();

    let is_active = match record.get("isActive") {
        Some(Value::Bool(flag)) => *flag,
        _ => record.get("active") != Some(&Value::Bool(false)),
    };

    let sort_order = record
        .get("sortOrder")
        .and_then(crate::validate::integer_from_json)
        .unwrap_or(EXTERNAL_SORT_OFFSET + index as i64);

    Some(DirectoryEntry {
        id: format!("{EXTERNAL_ID_PREFIX}{source_id}"),
        label: truncate_label(&title),
        preview_image_url: screenshot_url(&url),
        title,
        subtitle,
        url,
        sort_order,
        is_active,
        created_by: actor.to_string(),
        updated_by: actor.to_string(),
        source: EntrySource::External,
        created_at: None,
        updated_at: None,
    })
}

/// Normalize a raw partner payload.
pub fn normalize_clients(payload: &Value, actor: &str) -> FeedResult {
    let records = ClientEnvelope::resolve(payload).into_records();
    let total_clients = records.len();
    let entries: Vec<DirectoryEntry> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| map_client(record, index, actor))
        .collect();
    FeedResult {
        skipped_invalid_url: total_clients - entries.len(),
        total_clients,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ACTOR: &str = "readyaimgo";

    #[test]
    fn counts_skipped_records() {
        let payload = json!({
            "clients": [
                { "id": "a", "name": "Alpha", "websiteUrl": "https://alpha.example" },
                { "id": "b", "name": "Beta" },
                { "id": "c", "name": "Gamma", "siteUrl": "https://gamma.example" }
            ]
        });
        let result = normalize_clients(&payload, ACTOR);
        assert_eq!(result.total_clients, 3);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.skipped_invalid_url, 1);
    }

    #[test]
    fn envelope_shapes_in_priority_order() {
        let record = json!({ "websiteUrl": "https://x.example" });
        assert!(matches!(
            ClientEnvelope::resolve(&json!({ "clients": [record.clone()], "data": [] })),
            ClientEnvelope::Clients(r) if r.len() == 1
        ));
        assert!(matches!(
            ClientEnvelope::resolve(&json!({ "data": [record.clone()] })),
            ClientEnvelope::Data(r) if r.len() == 1
        ));
        assert!(matches!(
            ClientEnvelope::resolve(&json!({ "data": { "clients": [record.clone()] } })),
            ClientEnvelope::NestedData(r) if r.len() == 1
        ));
        assert!(matches!(
            ClientEnvelope::resolve(&json!([record])),
            ClientEnvelope::Bare(r) if r.len() == 1
        ));
        assert_eq!(
            ClientEnvelope::resolve(&json!({ "clients": "nope" })),
            ClientEnvelope::Empty
        );
    }

    #[test]
    fn invalid_urls_are_skipped() {
        let payload = json!({ "data": [
            { "websiteUrl": "  " },
            { "websiteUrl": "not a url" },
            { "websiteUrl": "ftp://files.example" },
            { "websiteUrl": null, "siteUrl": "https://fallback.example" }
        ]});
        let result = normalize_clients(&payload, ACTOR);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].url, "https://fallback.example");
        assert_eq!(result.skipped_invalid_url, 3);
    }

    #[test]
    fn title_fallback_chain() {
        let by_title = map_client(
            &json!({ "title": "From title", "storyId": "s1", "websiteUrl": "https://a.example" }),
            0,
            ACTOR,
        )
        .unwrap();
        assert_eq!(by_title.title, "From title");

        let by_story = map_client(
            &json!({ "storyId": "story-9", "websiteUrl": "https://a.example" }),
            0,
            ACTOR,
        )
        .unwrap();
        assert_eq!(by_story.title, "story-9");

        let fallback = map_client(&json!({ "websiteUrl": "https://a.example" }), 0, ACTOR).unwrap();
        assert_eq!(fallback.title, FALLBACK_TITLE);
        assert_eq!(fallback.label, FALLBACK_TITLE);

        let blank = map_client(
            &json!({ "name": "   ", "websiteUrl": "https://a.example" }),
            0,
            ACTOR,
        )
        .unwrap();
        assert_eq!(blank.title, FALLBACK_TITLE);
    }

    #[test]
    fn label_truncation_rule() {
        let exactly_28 = "abcdefghijklmnopqrstuvwxyz12";
        assert_eq!(truncate_label(exactly_28), exactly_28);
        let long = "abcdefghijklmnopqrstuvwxyz123";
        assert_eq!(truncate_label(long), "abcdefghijklmnopqrstuvwxy...");
        assert_eq!(truncate_label(long).chars().count(), 28);
        // Counts characters, not bytes.
        let accented = "é".repeat(30);
        assert_eq!(truncate_label(&accented), format!("{}...", "é".repeat(25)));
    }

    #[test]
    fn active_and_sort_defaults() {
        let payload = json!({ "clients": [
            { "websiteUrl": "https://a.example" },
            { "websiteUrl": "https://b.example", "active": false },
            { "websiteUrl": "https://c.example", "isActive": true, "active": false, "sortOrder": 3 },
            { "websiteUrl": "https://d.example", "sortOrder": "7" }
        ]});
        let entries = normalize_clients(&payload, ACTOR).entries;
        assert!(entries[0].is_active);
        assert_eq!(entries[0].sort_order, 1000);
        assert!(!entries[1].is_active);
        assert_eq!(entries[1].sort_order, 1001);
        assert!(entries[2].is_active);
        assert_eq!(entries[2].sort_order, 3);
        assert_eq!(entries[3].sort_order, 1003);
    }

    #[test]
    fn ids_are_namespaced() {
        let payload = json!({ "clients": [
            { "docId": "doc-1", "websiteUrl": "https://a.example" },
            { "_id": 42, "websiteUrl": "https://b.example" },
            { "websiteUrl": "https://c.example" }
        ]});
        let ids: Vec<String> = normalize_clients(&payload, ACTOR)
            .entries
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["external:doc-1", "external:42", "external:external-2"]);
    }

    #[test]
    fn external_entries_carry_marker_and_preview() {
        let entry = map_client(
            &json!({ "name": "Alpha", "description": " About ", "websiteUrl": "https://a.example" }),
            0,
            ACTOR,
        )
        .unwrap();
        assert_eq!(entry.source, EntrySource::External);
        assert_eq!(entry.created_by, ACTOR);
        assert_eq!(entry.updated_by, ACTOR);
        assert_eq!(entry.subtitle, "About");
        assert_eq!(entry.preview_image_url, screenshot_url("https://a.example"));
        assert!(entry.created_at.is_none());
    }
}
