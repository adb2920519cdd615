//! Domain and wire types shared by the extraction core and the HTTP layer.
//!
//! Wire types use camelCase field names: progress frames go out as NDJSON to
//! browser clients, and raw item snapshots come back from the in-page
//! collection query, so both sides of the boundary share the JSON shape.

use serde::{Deserialize, Serialize};

/// A search request as accepted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: Option<String>,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, location: Option<String>) -> Self {
        Self {
            keyword: keyword.into(),
            location,
        }
    }

    /// The human-readable search phrase, `"<keyword> in <location>"` when a
    /// location is given.
    pub fn phrase(&self) -> String {
        match &self.location {
            Some(location) => format!("{} in {}", self.keyword, location),
            None => self.keyword.clone(),
        }
    }
}

/// One normalized business listing.
///
/// `title` is the only required field; an item without a title is dropped by
/// the normalizer before it can reach the accumulated set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub title: String,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl Listing {
    /// Column order for tabular export.
    pub const COLUMNS: [&'static str; 8] = [
        "title",
        "rating",
        "reviews",
        "website",
        "address",
        "category",
        "phone",
        "countryCode",
    ];

    /// One export row, columns in [`Listing::COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        let opt = |f: &Option<String>| f.clone().unwrap_or_default();
        vec![
            self.title.clone(),
            opt(&self.rating),
            opt(&self.reviews),
            opt(&self.website),
            opt(&self.address),
            opt(&self.category),
            opt(&self.phone),
            opt(&self.country_code),
        ]
    }
}

/// A transient per-item snapshot read from the page driver.
///
/// Field-bags only; nothing here is trusted or retained past normalization.
/// Candidate lists preserve the order the driver's selector tables produced
/// them in, because resolution is first-match-wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItem {
    /// Title texts from the ordered title selectors.
    pub title_candidates: Vec<String>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    /// Text of the dedicated phone element, when present.
    pub phone: Option<String>,
    /// Candidate texts from the ordered category selectors.
    pub category_candidates: Vec<String>,
    /// Every text fragment in the item, for the phone fallback scan.
    pub text_fragments: Vec<String>,
}

/// A point-in-time progress snapshot written to the output sink as one
/// newline-delimited JSON frame.
///
/// `results` replaces, never appends to, what the client has seen: every
/// cycle re-derives the full visible set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub results: Vec<Listing>,
    pub total: usize,
    pub message: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressFrame {
    /// The opening frame: carries the session id so the caller can issue a
    /// stop request for this stream.
    pub fn started(session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            results: Vec::new(),
            total: 0,
            message: "Started scraping...".to_string(),
            is_complete: false,
            filename: None,
            error: None,
        }
    }

    /// A non-terminal progress frame.
    pub fn progress(results: Vec<Listing>, message: impl Into<String>) -> Self {
        let total = results.len();
        Self {
            session_id: None,
            results,
            total,
            message: message.into(),
            is_complete: false,
            filename: None,
            error: None,
        }
    }

    /// A terminal frame, optionally naming the export artifact.
    pub fn terminal(
        results: Vec<Listing>,
        message: impl Into<String>,
        filename: Option<String>,
    ) -> Self {
        let total = results.len();
        Self {
            session_id: None,
            results,
            total,
            message: message.into(),
            is_complete: true,
            filename,
            error: None,
        }
    }

    /// A terminal failure frame. Accumulated results still ride along so the
    /// caller keeps whatever was extracted before the failure.
    pub fn failed(
        results: Vec<Listing>,
        message: impl Into<String>,
        error: impl Into<String>,
        filename: Option<String>,
    ) -> Self {
        let mut frame = Self::terminal(results, message, filename);
        frame.error = Some(error.into());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_includes_location_when_present() {
        let q = SearchQuery::new("coffee", Some("Lisbon".to_string()));
        assert_eq!(q.phrase(), "coffee in Lisbon");

        let q = SearchQuery::new("coffee", None);
        assert_eq!(q.phrase(), "coffee");
    }

    #[test]
    fn frame_total_tracks_result_len() {
        let listing = Listing {
            title: "A".into(),
            rating: None,
            reviews: None,
            website: None,
            address: None,
            category: None,
            phone: None,
            country_code: None,
        };
        let frame = ProgressFrame::progress(vec![listing.clone(), listing], "two");
        assert_eq!(frame.total, 2);
        assert_eq!(frame.total, frame.results.len());
        assert!(!frame.is_complete);
    }

    #[test]
    fn optional_frame_fields_are_omitted_from_wire() {
        let frame = ProgressFrame::progress(Vec::new(), "none yet");
        let json = serde_json::to_string(&frame).unwrap();
        assert!(!json.contains("sessionId"));
        assert!(!json.contains("filename"));
        assert!(!json.contains("error"));
        assert!(json.contains("\"isComplete\":false"));
    }

    #[test]
    fn started_frame_carries_session_id() {
        let frame = ProgressFrame::started("1700000000000");
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"sessionId\":\"1700000000000\""));
    }

    #[test]
    fn raw_item_deserializes_from_sparse_json() {
        // The in-page query omits fields it found nothing for.
        let item: RawItem =
            serde_json::from_str(r#"{"titleCandidates":["Cafe Luna"],"rating":"4.5"}"#).unwrap();
        assert_eq!(item.title_candidates, vec!["Cafe Luna"]);
        assert_eq!(item.rating.as_deref(), Some("4.5"));
        assert!(item.phone.is_none());
        assert!(item.text_fragments.is_empty());
    }
}
