//! Printable report: a self-contained HTML document laid out on a fixed-width
//! canvas so the rasterized output has the same proportions on every machine.
use chrono::{DateTime, Local, TimeZone};

use crate::model::Clip;

/// Width of the report wrapper in CSS pixels.
pub const REPORT_WIDTH_PX: u32 = 1200;

/// Render the report stamped with the current local time.
pub fn render_report(clips: &[Clip], title: &str) -> String {
    render_report_at(clips, title, &Local::now())
}

pub fn render_report_at<Tz: TimeZone>(clips: &[Clip], title: &str, exported_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let header = format!(
        r#"<div class="export-header">
      <div class="brand">
        <div class="logo">CS</div>
        <div>
          <div class="report-title">{}</div>
          <div class="meta">Exported: {}</div>
        </div>
      </div>
      <div style="flex:1"></div>
    </div>"#,
        html_escape(title),
        html_escape(&format_local(exported_at))
    );

    let cards = clips.iter().map(render_card).collect::<Vec<_>>().join("\n");

    format!(
        r#"<!doctype html><html><head><meta charset="utf-8"><style>{}</style></head><body><div style="width:{}px; box-sizing:border-box;">{}<div class="cards">{}</div></div></body></html>"#,
        REPORT_STYLE, REPORT_WIDTH_PX, header, cards
    )
}

fn render_card(clip: &Clip) -> String {
    let tags = clip.tags_str();
    let meta = if tags.is_empty() {
        html_escape(clip.kind_str())
    } else {
        format!("{} • {}", html_escape(clip.kind_str()), html_escape(tags))
    };
    let body = html_escape(clip.content_str()).replace('\n', "<br/>");
    let url = match clip.url.as_deref().filter(|u| !u.is_empty()) {
        Some(u) => format!(
            r#"<div class="url"><a href="{}">{}</a></div>"#,
            html_attr(u),
            html_escape(u)
        ),
        None => String::new(),
    };
    let badges = clip
        .tag_list()
        .into_iter()
        .map(|t| format!(r#"<span class="badge">{}</span>"#, html_escape(t)))
        .collect::<Vec<_>>()
        .join(" ");
    let created = clip.created_at.as_deref().unwrap_or("");

    format!(
        r#"
      <article class="card">
        <div class="card-head">
          <h3 class="card-title">{}</h3>
          <div class="card-meta">{}</div>
        </div>
        <div class="card-body">{}</div>
        {}
        <div class="card-footer">
          <div class="badges">{}</div>
          <div class="created">Created: {}</div>
        </div>
      </article>"#,
        html_escape(&clip.title),
        meta,
        body,
        url,
        badges,
        html_escape(created)
    )
}

/// en-US style local timestamp, e.g. `10/18/2026, 9:05:03 PM`.
fn format_local<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn html_attr(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

const REPORT_STYLE: &str = r#"
  @media print { @page { size: A4; margin: 12mm; } }
  :root { --bg:#f7f8fb; --card:#ffffff; --muted:#6b7280; --accent:#6c3fff; }
  body { margin:0; padding:24px; font-family: Inter, Arial, Helvetica, sans-serif; background: var(--bg); color:#111; }
  .export-header { display:flex; align-items:center; gap:16px; margin-bottom:18px; }
  .brand { display:flex; gap:12px; align-items:center; }
  .logo { width:56px; height:56px; border-radius:12px; background:linear-gradient(135deg,var(--accent),#9a6eff); display:flex; align-items:center; justify-content:center; color:white; font-weight:700; font-size:18px; }
  .report-title { font-weight:700; font-size:20px; color:#111; }
  .meta { color:var(--muted); font-size:12px; margin-top:4px; }
  .cards { display:grid; grid-template-columns: repeat(2, 1fr); gap:18px; margin-top:12px; }
  .card { background:var(--card); border-radius:10px; padding:14px; border:1px solid rgba(17,24,39,0.04); min-height:120px; box-sizing:border-box; }
  .card-head { display:flex; justify-content:space-between; align-items:flex-start; gap:12px; }
  .card-title { margin:0; font-size:16px; color:#111; }
  .card-meta { color:var(--muted); font-size:12px; text-align:right; min-width:80px; }
  .card-body { margin-top:8px; color:#333; font-size:13px; line-height:1.4; max-height:300px; overflow:hidden; }
  .url { margin-top:8px; font-size:12px; }
  .url a { color:#0b5fff; text-decoration:underline; }
  .card-footer { display:flex; justify-content:space-between; align-items:center; margin-top:10px; gap:12px; }
  .badges { display:flex; gap:8px; flex-wrap:wrap; }
  .badge { background: rgba(108,63,255,0.08); color: #3b2aa6; padding:4px 8px; border-radius:999px; font-size:11px; }
  .created { color:var(--muted); font-size:11px; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClipKind;
    use chrono::Utc;

    fn clip(title: &str) -> Clip {
        Clip {
            id: 1,
            kind: Some(ClipKind::Bookmark.to_string()),
            title: title.into(),
            content: Some("line1\nline2".into()),
            url: Some("https://example.com/?a=1&b=\"2\"".into()),
            tags: Some("a, b,,c".into()),
            created_at: Some("2024-05-01T10:00:00".into()),
            updated_at: None,
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 21, 5, 3).unwrap()
    }

    #[test]
    fn title_markup_is_escaped() {
        let html = render_report_at(&[clip("<b>x</b>")], "Report", &fixed_time());
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("<b>x</b>"));
    }

    #[test]
    fn body_is_escaped_before_line_breaks() {
        let mut c = clip("t");
        c.content = Some("<script>alert(1)</script>\nnext".into());
        let html = render_report_at(&[c], "Report", &fixed_time());
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;<br/>next"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn url_attribute_escapes_quotes() {
        let html = render_report_at(&[clip("t")], "Report", &fixed_time());
        assert!(html.contains(r#"href="https://example.com/?a=1&amp;b=&quot;2&quot;""#));
        assert!(html.contains(r#">https://example.com/?a=1&amp;b="2"</a>"#));
    }

    #[test]
    fn badges_split_and_trim() {
        let html = render_report_at(&[clip("t")], "Report", &fixed_time());
        assert_eq!(html.matches(r#"<span class="badge">"#).count(), 3);
        assert!(html.contains(r#"<span class="badge">a</span> <span class="badge">b</span> <span class="badge">c</span>"#));
    }

    #[test]
    fn meta_line_and_footer() {
        let html = render_report_at(&[clip("t")], "Report", &fixed_time());
        assert!(html.contains("bookmark • a, b,,c"));
        assert!(html.contains("Created: 2024-05-01T10:00:00"));
        assert!(html.contains("Exported: 5/2/2024, 9:05:03 PM"));
        assert!(html.contains("width:1200px"));
    }

    #[test]
    fn missing_fields_render_empty() {
        let c = Clip {
            id: 2,
            kind: Some(ClipKind::Note.to_string()),
            title: "bare".into(),
            content: None,
            url: None,
            tags: None,
            created_at: None,
            updated_at: None,
        };
        let html = render_report_at(&[c], "Report", &fixed_time());
        assert!(!html.contains("class=\"url\""));
        assert!(!html.contains("null"));
        assert!(!html.contains("None"));
        assert!(html.contains(r#"<div class="card-meta">note</div>"#));
        assert!(html.contains("Created: </div>"));
    }

    #[test]
    fn one_card_per_clip() {
        let html = render_report_at(&[clip("a"), clip("b")], "Report", &fixed_time());
        assert_eq!(html.matches(r#"<article class="card">"#).count(), 2);
    }
}
