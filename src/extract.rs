//! Best-effort extraction of the classification record from raw model
//! output.
//!
//! The model is asked for strict JSON but may wrap it in a markdown fence or
//! surround it with prose. Extraction slices from the first `{` to the last
//! `}` and decodes that span. Known limitation: multiple independent objects
//! in one response are not disambiguated — only the outermost
//! first-`{`/last-`}` span is considered.

use crate::error::ParseError;

/// The four-field record demanded from the classifier. Absent fields decode
/// to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub subject: String,
    pub priority: String,
    pub summary: String,
}

/// Extract the classification object embedded in `raw`.
pub fn extract_json_block(raw: &str) -> Result<Classification, ParseError> {
    let mut cleaned = raw.trim();

    if cleaned.starts_with("```") {
        cleaned = cleaned.trim_matches('`');
        if cleaned
            .get(..4)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
        {
            cleaned = cleaned[4..].trim();
        }
    }

    let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
        return Err(ParseError::NoJson);
    };
    if start >= end {
        return Err(ParseError::NoJson);
    }

    let value: serde_json::Value = serde_json::from_str(&cleaned[start..=end])?;
    let serde_json::Value::Object(record) = value else {
        // A span that begins with `{` and parses is always an object.
        return Err(ParseError::NoJson);
    };

    let field = |key: &str| {
        record
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Ok(Classification {
        category: field("type"),
        subject: field("Sujet"),
        priority: field("priorite"),
        // The summary key comes back under either spelling; the accented
        // one wins, but an empty (or non-string) value under it falls
        // through to the unaccented key.
        summary: record
            .get("Synthèse")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| record.get("Synthese").and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string(),
    })
}
