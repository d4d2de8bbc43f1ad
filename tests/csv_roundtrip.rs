use clip_saver::export::csv::{to_csv, COLUMNS};
use clip_saver::model::{Clip, ClipKind};

fn sample() -> Vec<Clip> {
    vec![
        Clip {
            id: 1,
            kind: Some(ClipKind::Note.to_string()),
            title: "Groceries".into(),
            content: Some("milk, eggs\nbread".into()),
            url: None,
            tags: Some("home,list".into()),
            created_at: Some("2024-05-01T10:00:00".into()),
            updated_at: Some("2024-05-02T08:30:00".into()),
        },
        Clip {
            id: 2,
            kind: Some(ClipKind::Bookmark.to_string()),
            title: "He said, \"hi\"\nline2".into(),
            content: None,
            url: Some("https://example.com/a?b=c".into()),
            tags: None,
            created_at: None,
            updated_at: None,
        },
        Clip {
            id: 3,
            kind: Some(ClipKind::Note.to_string()),
            title: "plain".into(),
            content: Some(String::new()),
            url: None,
            tags: Some("solo".into()),
            created_at: Some("2024-05-03T12:00:00".into()),
            updated_at: None,
        },
    ]
}

#[test]
fn standard_reader_recovers_every_row() {
    let clips = sample();
    let encoded = to_csv(&clips);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(encoded.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, COLUMNS.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), clips.len());

    for (row, clip) in rows.iter().zip(&clips) {
        assert_eq!(&row[0], clip.id.to_string());
        assert_eq!(&row[1], clip.kind_str());
        assert_eq!(&row[2], clip.title);
        assert_eq!(&row[3], clip.content_str());
        assert_eq!(&row[4], clip.url_str());
        assert_eq!(&row[5], clip.tags_str());
        assert_eq!(&row[6], clip.created_at.as_deref().unwrap_or(""));
        assert_eq!(&row[7], clip.updated_at.as_deref().unwrap_or(""));
    }
}

#[test]
fn quoted_title_field_is_encoded_exactly() {
    let encoded = to_csv(&sample());
    assert!(encoded.contains(",\"He said, \"\"hi\"\"\nline2\","));
}

#[test]
fn empty_batch_has_no_header() {
    assert_eq!(to_csv(&[]), "");
}
