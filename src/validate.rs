//! Admin request bodies and their validation.
//!
//! Bodies arrive as [`EntryDraft`], a permissive shape that keeps `sortOrder`
//! and `isActive` as raw JSON so type mistakes surface as validation messages
//! instead of opaque decode failures. Validation trims every string and either
//! returns a typed input or the full list of messages.

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::DirectoryError;
use crate::types::{DirectoryInput, DirectoryPatch};

/// Raw admin request body, shared by create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub label: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub preview_image_url: Option<String>,
    pub sort_order: Option<Value>,
    pub is_active: Option<Value>,
}

/// True for absolute `http`/`https` URLs.
pub fn is_valid_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Integer view of a JSON number. Fractions truncate; non-numbers and
/// non-finite values are rejected.
pub(crate) fn integer_from_json(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    let f = number.as_f64()?;
    if !f.is_finite() || f >= i64::MAX as f64 || f <= i64::MIN as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|s| s.trim().to_string())
}

impl EntryDraft {
    /// Validate a full field set. Every rule is checked so the caller sees all
    /// problems at once.
    pub fn into_input(self) -> Result<DirectoryInput, DirectoryError> {
        let mut errors = Vec::new();

        let label = trimmed(&self.label).unwrap_or_default();
        let title = trimmed(&self.title).unwrap_or_default();
        let url = trimmed(&self.url).unwrap_or_default();
        let subtitle = trimmed(&self.subtitle).unwrap_or_default();
        let preview_image_url = trimmed(&self.preview_image_url).unwrap_or_default();

        if label.is_empty() {
            errors.push("label is required".to_string());
        }
        if title.is_empty() {
            errors.push("title is required".to_string());
        }
        if url.is_empty() {
            errors.push("url is required".to_string());
        }
        let sort_order = self.sort_order.as_ref().and_then(integer_from_json);
        if sort_order.is_none() {
            errors.push("sortOrder must be a number".to_string());
        }
        let is_active = self.is_active.as_ref().and_then(Value::as_bool);
        if is_active.is_none() {
            errors.push("isActive must be a boolean".to_string());
        }
        if !url.is_empty() && !is_valid_http_url(&url) {
            errors.push("url must be a valid absolute URL".to_string());
        }
        if !preview_image_url.is_empty() && !is_valid_http_url(&preview_image_url) {
            errors.push("previewImageUrl must be a valid absolute URL".to_string());
        }

        match (sort_order, is_active) {
            (Some(sort_order), Some(is_active)) if errors.is_empty() => Ok(DirectoryInput {
                label,
                title,
                subtitle,
                url,
                preview_image_url,
                sort_order,
                is_active,
            }),
            _ => Err(DirectoryError::Validation(errors)),
        }
    }

    /// Validate only the supplied fields of a partial update.
    pub fn into_patch(self) -> Result<DirectoryPatch, DirectoryError> {
        let mut errors = Vec::new();

        let label = trimmed(&self.label);
        let title = trimmed(&self.title);
        let url = trimmed(&self.url);

        if label.as_deref() == Some("") {
            errors.push("label is required".to_string());
        }
        if title.as_deref() == Some("") {
            errors.push("title is required".to_string());
        }
        match url.as_deref() {
            Some("") => errors.push("url is required".to_string()),
            Some(u) if !is_valid_http_url(u) => {
                errors.push("url must be a valid absolute URL".to_string())
            }
            _ => {}
        }

        let sort_order = match &self.sort_order {
            None => None,
            Some(raw) => {
                let parsed = integer_from_json(raw);
                if parsed.is_none() {
                    errors.push("sortOrder must be a number".to_string());
                }
                parsed
            }
        };
        let is_active = match &self.is_active {
            None => None,
            Some(raw) => {
                let parsed = raw.as_bool();
                if parsed.is_none() {
                    errors.push("isActive must be a boolean".to_string());
                }
                parsed
            }
        };

        let preview_image_url = trimmed(&self.preview_image_url);
        if let Some(preview) = preview_image_url.as_deref() {
            if !preview.is_empty() && !is_valid_http_url(preview) {
                errors.push("previewImageUrl must be a valid absolute URL".to_string());
            }
        }

        let patch = DirectoryPatch {
            label,
            title,
            subtitle: trimmed(&self.subtitle),
            url,
            preview_image_url,
            sort_order,
            is_active,
        };
        if errors.is_empty() && patch.is_empty() {
            errors.push("at least one field must be supplied".to_string());
        }

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(DirectoryError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(body: Value) -> EntryDraft {
        serde_json::from_value(body).unwrap()
    }

    fn messages(err: DirectoryError) -> Vec<String> {
        match err {
            DirectoryError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn complete_input_has_no_errors() {
        let input = draft(json!({
            "label": "  Docs ",
            "title": "Documentation",
            "url": "https://docs.example.com",
            "sortOrder": 4,
            "isActive": false
        }))
        .into_input()
        .unwrap();
        assert_eq!(input.label, "Docs");
        assert_eq!(input.sort_order, 4);
        assert!(!input.is_active);
        assert_eq!(input.subtitle, "");
        assert_eq!(input.preview_image_url, "");
    }

    #[test]
    fn each_missing_required_field_has_its_own_message() {
        let base = json!({
            "label": "L", "title": "T", "url": "https://x.com", "sortOrder": 1, "isActive": true
        });
        for (field, expected) in [
            ("label", "label is required"),
            ("title", "title is required"),
            ("url", "url is required"),
        ] {
            let mut body = base.clone();
            body.as_object_mut().unwrap().remove(field);
            let errors = messages(draft(body).into_input().unwrap_err());
            assert_eq!(errors, vec![expected.to_string()], "missing {field}");
        }
    }

    #[test]
    fn omitting_all_three_reports_all_three() {
        let errors = messages(
            draft(json!({"sortOrder": 1, "isActive": true}))
                .into_input()
                .unwrap_err(),
        );
        assert_eq!(
            errors,
            vec!["label is required", "title is required", "url is required"]
        );
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let errors = messages(
            draft(json!({
                "label": "   ", "title": "T", "url": "https://x.com", "sortOrder": 1, "isActive": true
            }))
            .into_input()
            .unwrap_err(),
        );
        assert_eq!(errors, vec!["label is required"]);
    }

    #[test]
    fn type_mistakes_are_reported() {
        let errors = messages(
            draft(json!({
                "label": "L", "title": "T", "url": "ftp://x.com", "sortOrder": "5", "isActive": "yes",
                "previewImageUrl": "not a url"
            }))
            .into_input()
            .unwrap_err(),
        );
        assert_eq!(
            errors,
            vec![
                "sortOrder must be a number",
                "isActive must be a boolean",
                "url must be a valid absolute URL",
                "previewImageUrl must be a valid absolute URL",
            ]
        );
    }

    #[test]
    fn fractional_sort_order_truncates() {
        let input = draft(json!({
            "label": "L", "title": "T", "url": "http://x.com", "sortOrder": 7.9, "isActive": true
        }))
        .into_input()
        .unwrap();
        assert_eq!(input.sort_order, 7);
    }

    #[test]
    fn patch_keeps_only_supplied_fields() {
        let patch = draft(json!({"title": " New ", "isActive": false}))
            .into_patch()
            .unwrap();
        assert_eq!(patch.title.as_deref(), Some("New"));
        assert_eq!(patch.is_active, Some(false));
        assert!(patch.label.is_none());
        assert!(patch.url.is_none());
        assert!(patch.sort_order.is_none());
    }

    #[test]
    fn patch_validates_supplied_fields() {
        let errors = messages(
            draft(json!({"label": "", "url": "mailto:a@b.c", "sortOrder": true}))
                .into_patch()
                .unwrap_err(),
        );
        assert_eq!(
            errors,
            vec![
                "label is required",
                "url must be a valid absolute URL",
                "sortOrder must be a number",
            ]
        );
    }

    #[test]
    fn empty_patch_is_rejected() {
        let errors = messages(draft(json!({})).into_patch().unwrap_err());
        assert_eq!(errors, vec!["at least one field must be supplied"]);
    }

    #[test]
    fn url_scheme_check() {
        assert!(is_valid_http_url("https://example.com/path?q=1"));
        assert!(is_valid_http_url("http://localhost:3000"));
        assert!(!is_valid_http_url("example.com"));
        assert!(!is_valid_http_url("javascript:alert(1)"));
        assert!(!is_valid_http_url(""));
    }
}
