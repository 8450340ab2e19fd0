//! Export envelope and summary statistics.

use std::fmt;

use anchor::{Anchor, HighlightColor};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::StoreError;

pub const EXPORT_SOURCE: &str = "Marky Text Highlighter";
pub const EXPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A page's anchors plus where and when they were exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub source: String,
    pub version: String,
    pub url: String,
    pub title: String,
    pub export_date: Option<DateTime<Utc>>,
    pub highlights: Vec<Anchor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBundle {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    export_date: Option<String>,
    #[serde(default)]
    highlights: Option<Value>,
}

impl ExportBundle {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        highlights: Vec<Anchor>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source: EXPORT_SOURCE.to_string(),
            version: EXPORT_VERSION.to_string(),
            url: url.into(),
            title: title.into(),
            export_date: Some(exported_at),
            highlights,
        }
    }

    /// Parse an export file.
    ///
    /// The file must carry a `highlights` array; everything else is optional.
    /// Individual records that cannot be read are skipped with a warning.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let bundle: RawBundle = serde_json::from_str(raw)?;
        let Some(Value::Array(records)) = bundle.highlights else {
            return Err(StoreError::InvalidImport(
                "file has no highlights array".into(),
            ));
        };

        let highlights = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(anchor) => Some(anchor),
                Err(err) => {
                    warn!(index, error = %err, "skipping unreadable exported highlight");
                    None
                }
            })
            .collect();

        let export_date = bundle.export_date.and_then(|date| {
            DateTime::parse_from_rfc3339(&date)
                .map(|parsed| parsed.with_timezone(&Utc))
                .ok()
        });

        Ok(Self {
            source: bundle.source.unwrap_or_default(),
            version: bundle.version.unwrap_or_default(),
            url: bundle.url.unwrap_or_default(),
            title: bundle.title.unwrap_or_default(),
            export_date,
            highlights,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn stats(&self) -> HighlightStats {
        HighlightStats::from_anchors(&self.highlights)
    }

    /// Download name for this bundle; falls back to today's date when the
    /// bundle carries none.
    pub fn suggested_filename(&self) -> String {
        let date = self.export_date.unwrap_or_else(Utc::now).date_naive();
        suggested_filename(&self.title, date)
    }
}

/// Lowercase and replace every char outside `[a-z0-9]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "page".to_string();
    }
    name.chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
                lower
            } else {
                '_'
            }
        })
        .collect()
}

pub fn suggested_filename(title: &str, date: NaiveDate) -> String {
    format!(
        "marky-highlights_{}_{}.json",
        sanitize_filename(title),
        date.format("%Y-%m-%d")
    )
}

/// Per-color highlight counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightStats {
    pub total: usize,
    /// Colors in use, most used first; ties keep palette order.
    pub by_color: Vec<(HighlightColor, usize)>,
}

impl HighlightStats {
    pub fn from_anchors(anchors: &[Anchor]) -> Self {
        let mut by_color: Vec<(HighlightColor, usize)> = HighlightColor::ALL
            .iter()
            .map(|color| {
                let count = anchors.iter().filter(|a| a.color == *color).count();
                (*color, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        // Stable sort keeps palette order for equal counts.
        by_color.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            total: anchors.len(),
            by_color,
        }
    }
}

impl fmt::Display for HighlightStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} highlights", self.total)?;
        for (color, count) in &self.by_color {
            writeln!(f, "  {} {}: {}", color.emoji(), color.display_name(), count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn anchor(id: &str, color: HighlightColor) -> Anchor {
        let mut anchor: Anchor =
            serde_json::from_value(json!({"id": id, "text": "some text"})).unwrap();
        anchor.color = color;
        anchor
    }

    #[test]
    fn bundle_serializes_envelope_fields() {
        let when = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap();
        let bundle = ExportBundle::new(
            "https://docs.test/guide",
            "Guide",
            vec![anchor("a", HighlightColor::Blue)],
            when,
        );
        let value: Value = serde_json::from_str(&bundle.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["source"], EXPORT_SOURCE);
        assert_eq!(value["exportDate"], "2024-03-09T12:30:00Z");
        assert_eq!(value["highlights"][0]["color"], "blue");

        let parsed = ExportBundle::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn missing_highlights_array_is_rejected() {
        assert!(matches!(
            ExportBundle::from_json(r#"{"source": "x"}"#),
            Err(StoreError::InvalidImport(_))
        ));
        assert!(matches!(
            ExportBundle::from_json(r#"{"highlights": {"a": 1}}"#),
            Err(StoreError::InvalidImport(_))
        ));
        assert!(matches!(
            ExportBundle::from_json("not json"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn bare_highlights_file_is_accepted() {
        let parsed = ExportBundle::from_json(
            r#"{"highlights": [{"id": "h", "text": "t"}, {"broken": true}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.highlights.len(), 1);
        assert_eq!(parsed.export_date, None);
        assert_eq!(parsed.title, "");
    }

    #[test]
    fn filenames_are_sanitized() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            suggested_filename("Rust: The Book!", date),
            "marky-highlights_rust__the_book__2024-01-31.json"
        );
        assert_eq!(sanitize_filename(""), "page");
        assert_eq!(sanitize_filename("Café 2"), "caf__2");
    }

    #[test]
    fn stats_sort_by_count_then_palette() {
        let anchors = vec![
            anchor("1", HighlightColor::Pink),
            anchor("2", HighlightColor::Green),
            anchor("3", HighlightColor::Pink),
            anchor("4", HighlightColor::Yellow),
            anchor("5", HighlightColor::Green),
        ];
        let stats = HighlightStats::from_anchors(&anchors);
        assert_eq!(stats.total, 5);
        assert_eq!(
            stats.by_color,
            vec![
                (HighlightColor::Green, 2),
                (HighlightColor::Pink, 2),
                (HighlightColor::Yellow, 1),
            ]
        );
        assert!(stats.to_string().starts_with("5 highlights\n"));
    }
}
