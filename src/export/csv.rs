use crate::model::Clip;

pub const COLUMNS: [&str; 8] = [
    "id",
    "kind",
    "title",
    "content",
    "url",
    "tags",
    "created_at",
    "updated_at",
];

/// Encode clips as CSV: a header row plus one row per clip, joined with `\n`.
///
/// Quotes are always doubled; a value is wrapped in quotes only when it holds
/// a comma or a line break. An empty batch yields an empty string rather than
/// a lone header row.
pub fn to_csv(clips: &[Clip]) -> String {
    if clips.is_empty() {
        return String::new();
    }
    let mut lines = Vec::with_capacity(clips.len() + 1);
    lines.push(COLUMNS.join(","));
    for clip in clips {
        let row = row_values(clip)
            .iter()
            .map(|v| escape_field(v))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

fn row_values(clip: &Clip) -> [String; 8] {
    [
        clip.id.to_string(),
        clip.kind_str().to_string(),
        clip.title.clone(),
        clip.content_str().to_string(),
        clip.url_str().to_string(),
        clip.tags_str().to_string(),
        clip.created_at.clone().unwrap_or_default(),
        clip.updated_at.clone().unwrap_or_default(),
    ]
}

fn escape_field(value: &str) -> String {
    let doubled = value.replace('"', "\"\"");
    if doubled.contains(',') || doubled.contains('\n') || doubled.contains('\r') {
        format!("\"{}\"", doubled)
    } else {
        doubled
    }
}
