//! Bookmark export rendering.

use chrono::{NaiveDate, SecondsFormat};

use crate::error::{Error, Result};
use crate::models::Bookmark;

/// Column headers of the CSV export, in order.
pub const CSV_HEADERS: [&str; 8] = [
    "URL",
    "Title",
    "Domain",
    "Note",
    "IsFavorite",
    "IsPinned",
    "Status",
    "CreatedAt",
];

/// Supported export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported export format '{}'; expected json or csv",
                s
            ))),
        }
    }
}

/// Quote a CSV value, doubling any embedded double quotes.
pub fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render bookmarks as CSV: a header line, then one line per bookmark.
/// Lines are joined with `\n` and there is no trailing newline.
pub fn bookmarks_to_csv(bookmarks: &[Bookmark]) -> String {
    let mut lines = Vec::with_capacity(bookmarks.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for b in bookmarks {
        let created_at = b.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let row = [
            b.url.as_str(),
            b.title.as_deref().unwrap_or(""),
            b.domain.as_str(),
            b.note.as_deref().unwrap_or(""),
            if b.is_favorite { "true" } else { "false" },
            if b.is_pinned { "true" } else { "false" },
            b.status.as_str(),
            created_at.as_str(),
        ];
        lines.push(row.iter().map(|v| csv_field(v)).collect::<Vec<_>>().join(","));
    }

    lines.join("\n")
}

/// Download filename for a CSV export made on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("bookmarks_export_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookmarkStatus;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn bookmark(note: Option<&str>) -> Bookmark {
        let created = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        Bookmark {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            url: "https://example.com/a".to_string(),
            domain: "example.com".to_string(),
            title: Some("Example".to_string()),
            favicon_url: None,
            note: note.map(str::to_string),
            is_favorite: true,
            is_pinned: false,
            is_read_later: false,
            status: BookmarkStatus::Pending,
            position: 0,
            created_at: created,
            updated_at: created,
            tags: vec![],
            reminder: None,
        }
    }

    #[test]
    fn test_csv_field_doubles_quotes() {
        assert_eq!(csv_field(r#"He said "hi""#), r#""He said ""hi""""#);
        assert_eq!(csv_field(""), "\"\"");
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        assert_eq!(
            bookmarks_to_csv(&[]),
            "URL,Title,Domain,Note,IsFavorite,IsPinned,Status,CreatedAt"
        );
    }

    #[test]
    fn test_csv_row_rendering() {
        let csv = bookmarks_to_csv(&[bookmark(Some(r#"He said "hi""#))]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#""https://example.com/a","Example","example.com","He said ""hi""","true","false","PENDING","2026-03-04T05:06:07.000Z""#
        );
    }

    #[test]
    fn test_csv_missing_optional_fields_render_empty() {
        let mut b = bookmark(None);
        b.title = None;
        let csv = bookmarks_to_csv(&[b]);
        assert!(csv.contains(r#""https://example.com/a","","example.com","","#));
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(export_filename(date), "bookmarks_export_2026-10-16.csv");
    }
}
