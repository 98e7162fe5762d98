//! Normalization from wire payloads to domain records.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{Comment, WorkRecord};
use crate::wire::{WireComment, WireIdentity, WireWorkItem};

/// Name used when a person field is present but carries no usable name.
pub const UNASSIGNED: &str = "Unassigned";

/// Name used when a comment author cannot be resolved.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Project a wire work item onto the domain record.
///
/// Typed fields are a lossy view of the namespaced field object; the full
/// object is preserved in `raw_fields` so nothing is lost for consumers
/// that need more than the projection.
pub fn to_work_record(item: &WireWorkItem) -> WorkRecord {
    let fields = &item.fields;

    WorkRecord {
        id: item.id,
        revision: item.rev,
        title: string_field(fields, "System.Title"),
        state: string_field(fields, "System.State"),
        item_type: string_field(fields, "System.WorkItemType"),
        assignee: fields
            .get("System.AssignedTo")
            .filter(|v| !v.is_null())
            .map(person_name),
        created_at: timestamp_field(fields, "System.CreatedDate"),
        changed_at: timestamp_field(fields, "System.ChangedDate"),
        description: fields
            .get("System.Description")
            .and_then(Value::as_str)
            .map(str::to_string),
        tags: parse_tags(
            fields
                .get("System.Tags")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ),
        raw_fields: Value::Object(item.fields.clone()),
    }
}

/// Normalize a wire comment.
pub fn to_comment(comment: &WireComment) -> Comment {
    Comment {
        id: comment.id,
        work_item_id: comment.work_item_id,
        text: comment.text.clone(),
        author: author_name(comment.created_by.as_ref()),
        created_at: comment.created_date,
        modified_at: comment.modified_date,
    }
}

/// Split the wire's `;`-separated tag string into a clean list.
///
/// Blank entries disappear; a string of nothing but delimiters and
/// whitespace yields an empty list.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn string_field(fields: &serde_json::Map<String, Value>, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Timestamps that are absent or unparseable project to `None` rather
/// than a fabricated instant.
fn timestamp_field(fields: &serde_json::Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
}

/// Resolve a person field to a display name.
///
/// The service sends either a structured identity object or a plain
/// identifier string. For objects, `displayName` wins over `uniqueName`;
/// a nameless person resolves to the [`UNASSIGNED`] sentinel.
fn person_name(value: &Value) -> String {
    let name = match value {
        Value::String(name) => non_blank(name),
        Value::Object(map) => map
            .get("displayName")
            .and_then(Value::as_str)
            .and_then(non_blank)
            .or_else(|| {
                map.get("uniqueName")
                    .and_then(Value::as_str)
                    .and_then(non_blank)
            }),
        _ => None,
    };
    name.map_or_else(|| UNASSIGNED.to_string(), str::to_string)
}

fn author_name(identity: Option<&WireIdentity>) -> String {
    identity
        .and_then(|person| {
            person
                .display_name
                .as_deref()
                .and_then(non_blank)
                .or_else(|| person.unique_name.as_deref().and_then(non_blank))
        })
        .map_or_else(|| UNKNOWN_AUTHOR.to_string(), str::to_string)
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
