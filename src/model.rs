use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of content characters shown in a list preview before truncation.
pub const PREVIEW_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    #[default]
    Note,
    Bookmark,
}

impl ClipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipKind::Note => "note",
            ClipKind::Bookmark => "bookmark",
        }
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "note" => Ok(ClipKind::Note),
            "bookmark" => Ok(ClipKind::Bookmark),
            other => Err(format!("unknown clip kind '{}' (expected note or bookmark)", other)),
        }
    }
}

/// A clip as returned by the API. Optional fields stay `None` when the server
/// sends `null` so a JSON export reproduces the payload as fetched.
///
/// `kind` is kept as the raw string: the server stores whatever it was given,
/// including `null`, and one odd row must not sink a whole export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clip {
    pub id: i64,
    #[serde(default)]
    pub kind: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Clip {
    pub fn kind_str(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn url_str(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn tags_str(&self) -> &str {
        self.tags.as_deref().unwrap_or("")
    }

    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(self.tags_str())
    }

    /// Short body for list output: the first `PREVIEW_CHARS` characters of the
    /// content with an ellipsis when cut, or the URL when there is no content.
    pub fn preview(&self) -> String {
        let content = self.content_str();
        if content.is_empty() {
            return self.url_str().to_string();
        }
        let mut out: String = content.chars().take(PREVIEW_CHARS).collect();
        if content.chars().count() > PREVIEW_CHARS {
            out.push('…');
        }
        out
    }
}

/// Body of `POST /clips`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewClip {
    pub kind: ClipKind,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub tags: String,
}

impl NewClip {
    /// Build a payload the way the editor form does: title and URL trimmed,
    /// blank URL sent as `null`. Returns `None` for a blank title.
    pub fn new(
        kind: ClipKind,
        title: &str,
        content: Option<&str>,
        url: Option<&str>,
        tags: Option<&str>,
    ) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let url = url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string);
        Some(Self {
            kind,
            title: title.to_string(),
            content: content.unwrap_or_default().to_string(),
            url,
            tags: tags.unwrap_or_default().to_string(),
        })
    }
}

/// Body of `PUT /clips/:id`. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClipUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl ClipUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.url.is_none() && self.tags.is_none()
    }
}

/// Filter state for `GET /clips`. Empty values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub kind: Option<ClipKind>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ClipQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        if let Some(tag) = self.tag.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("tag", tag.to_string()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("kind", kind.as_str().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        pairs
    }
}

/// Response of `GET /clips`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClipPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub items: Vec<Clip>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Split a comma-separated tag string into trimmed, non-empty tokens.
pub fn split_tags(tags: &str) -> Vec<&str> {
    tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()
}

/// Canonical server form of a tag string: tokens joined by bare commas.
pub fn normalize_tags(tags: &str) -> String {
    split_tags(tags).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tags_drops_empty_tokens() {
        assert_eq!(split_tags("a, b,,c"), vec!["a", "b", "c"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" , ,").is_empty());
    }

    #[test]
    fn normalize_tags_joins_tokens() {
        assert_eq!(normalize_tags(" rust , web,, cli "), "rust,web,cli");
    }

    #[test]
    fn clip_deserializes_nulls_and_missing_fields() {
        let clip: Clip = serde_json::from_str(
            r#"{"id": 3, "title": "t", "content": null, "url": null, "tags": "a,b"}"#,
        )
        .unwrap();
        assert_eq!(clip.kind, None);
        assert_eq!(clip.kind_str(), "");
        assert_eq!(clip.content_str(), "");
        assert_eq!(clip.url_str(), "");
        assert_eq!(clip.tag_list(), vec!["a", "b"]);
        assert!(clip.created_at.is_none());
    }

    #[test]
    fn clip_keeps_unknown_and_null_kinds() {
        let clips: Vec<Clip> = serde_json::from_str(
            r#"[{"id": 1, "kind": null, "title": "a"}, {"id": 2, "kind": "video", "title": "b"}]"#,
        )
        .unwrap();
        assert_eq!(clips[0].kind, None);
        assert_eq!(clips[1].kind_str(), "video");

        let back = serde_json::to_value(&clips).unwrap();
        assert_eq!(back[0]["kind"], serde_json::Value::Null);
        assert_eq!(back[1]["kind"], "video");
    }

    #[test]
    fn preview_truncates_long_content() {
        let clip = Clip {
            id: 1,
            kind: Some(ClipKind::Note.to_string()),
            title: "t".into(),
            content: Some("x".repeat(200)),
            url: None,
            tags: None,
            created_at: None,
            updated_at: None,
        };
        let preview = clip.preview();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 1);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn preview_falls_back_to_url() {
        let clip = Clip {
            id: 1,
            kind: Some(ClipKind::Bookmark.to_string()),
            title: "t".into(),
            content: Some(String::new()),
            url: Some("https://example.com".into()),
            tags: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(clip.preview(), "https://example.com");
    }

    #[test]
    fn new_clip_trims_and_rejects_blank_title() {
        assert!(NewClip::new(ClipKind::Note, "   ", None, None, None).is_none());
        let clip = NewClip::new(ClipKind::Bookmark, " Docs ", None, Some("  "), Some("a")).unwrap();
        assert_eq!(clip.title, "Docs");
        assert_eq!(clip.url, None);
        assert_eq!(clip.content, "");
    }

    #[test]
    fn clip_update_skips_absent_fields() {
        let update = ClipUpdate {
            title: Some("new".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({ "title": "new" }));
        assert!(ClipUpdate::default().is_empty());
    }

    #[test]
    fn query_pairs_omit_empty_values() {
        let query = ClipQuery {
            q: Some("  ".into()),
            tag: Some("rust".into()),
            kind: Some(ClipKind::Bookmark),
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![("tag", "rust".to_string()), ("kind", "bookmark".to_string())]
        );
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Bookmark".parse::<ClipKind>().unwrap(), ClipKind::Bookmark);
        assert!("video".parse::<ClipKind>().is_err());
    }
}
