//! Record normalization: raw item snapshot in, listing (or nothing) out.
//!
//! Pure functions over one item's field bag. Source markup is adversarial,
//! so every rule is best-effort: a field that fails its filters is simply
//! absent, and an item without a title is dropped entirely. Nothing in here
//! can abort a batch.

use lazy_static::lazy_static;
use regex::Regex;

use crate::selectors::COUNTRY_PREFIXES;
use crate::types::{Listing, RawItem};

lazy_static! {
    /// A fragment that is wholly phone-shaped: optional leading '+', then at
    /// least ten digits/spaces/dashes.
    static ref PHONE_FRAGMENT: Regex = Regex::new(r"^\+?[\d\s-]{10,}$").unwrap();

    /// A phone-like digit run embedded in a longer text (address fallback).
    static ref DIGIT_RUN: Regex = Regex::new(r"[\d\s-]{10,}").unwrap();
}

/// Markers that disqualify a text fragment from being a category.
const CATEGORY_STOP_MARKERS: [&str; 4] = ["stars", "reviews", "Open", "Closed"];

/// Category text separator; the feed joins category and address hints with
/// an interpunct.
const CATEGORY_SEPARATOR: char = '·';

/// Collapse runs of whitespace to single spaces and trim; `None` when
/// nothing is left.
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize one raw snapshot into a listing, or discard it.
///
/// The only hard requirement is a title: the first non-empty title candidate
/// wins, and with no title the item yields `None` and never appears in any
/// frame or export.
pub fn normalize(item: &RawItem) -> Option<Listing> {
    let title = item
        .title_candidates
        .iter()
        .find_map(|candidate| clean_text(candidate))?;

    let phone = resolve_phone(item);
    let country_code = phone
        .as_deref()
        .and_then(derive_country_code)
        .map(String::from);

    Some(Listing {
        title,
        rating: item.rating.as_deref().and_then(clean_text),
        reviews: item.reviews.as_deref().and_then(clean_text),
        website: item.website.as_deref().and_then(clean_text),
        address: item.address.as_deref().and_then(clean_text),
        category: resolve_category(&item.category_candidates),
        phone,
        country_code,
    })
}

/// First candidate that survives the category filters, cut at the
/// interpunct separator.
fn resolve_category(candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        let text = candidate.trim();
        if text.chars().count() <= 1 {
            return None;
        }
        if CATEGORY_STOP_MARKERS.iter().any(|m| text.contains(m)) {
            return None;
        }
        if text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        let head = text
            .split(CATEGORY_SEPARATOR)
            .next()
            .unwrap_or(text)
            .trim();
        clean_text(head)
    })
}

/// Phone resolution strategies, in order: the dedicated phone element, then
/// a scan of all text fragments for a wholly phone-shaped one, then a digit
/// run embedded in the trailing address line.
fn resolve_phone(item: &RawItem) -> Option<String> {
    if let Some(phone) = item.phone.as_deref().and_then(clean_text) {
        return Some(phone);
    }

    for fragment in &item.text_fragments {
        let trimmed = fragment.trim();
        if PHONE_FRAGMENT.is_match(trimmed) {
            return clean_text(trimmed);
        }
    }

    let address = item.address.as_deref()?;
    DIGIT_RUN
        .find(address)
        .and_then(|run| clean_text(run.as_str()))
}

/// Map a phone's digit prefix to a dialing code through the ordered table;
/// first matching prefix wins, no match leaves the code absent.
pub fn derive_country_code(phone: &str) -> Option<&'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    COUNTRY_PREFIXES
        .iter()
        .find(|(prefix, _)| digits.starts_with(prefix))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_title(title: &str) -> RawItem {
        RawItem {
            title_candidates: vec![title.to_string()],
            ..RawItem::default()
        }
    }

    #[test]
    fn missing_title_discards_item() {
        let item = RawItem {
            rating: Some("4.8".into()),
            phone: Some("+1 415-555-0100".into()),
            ..RawItem::default()
        };
        assert!(normalize(&item).is_none());

        let blank_titles = RawItem {
            title_candidates: vec!["".into(), "   ".into()],
            ..RawItem::default()
        };
        assert!(normalize(&blank_titles).is_none());
    }

    #[test]
    fn first_non_empty_title_candidate_wins() {
        let item = RawItem {
            title_candidates: vec!["".into(), "  Cafe  Luna ".into(), "Other".into()],
            ..RawItem::default()
        };
        let listing = normalize(&item).unwrap();
        assert_eq!(listing.title, "Cafe Luna");
    }

    #[test]
    fn category_filters_reject_markers_and_digits() {
        let candidates = vec![
            "4.5 stars".to_string(),
            "120 reviews".to_string(),
            "Open 24 hours".to_string(),
            "Closed".to_string(),
            "2nd Avenue".to_string(),
            "·".to_string(),
            "Coffee shop · 12 Main St".to_string(),
        ];
        assert_eq!(resolve_category(&candidates).as_deref(), Some("Coffee shop"));
    }

    #[test]
    fn category_absent_when_every_candidate_fails() {
        let candidates = vec!["1".to_string(), "Open".to_string(), "".to_string()];
        assert!(resolve_category(&candidates).is_none());
    }

    #[test]
    fn dedicated_phone_field_wins_over_fragments() {
        let mut item = item_with_title("Cafe");
        item.phone = Some("020 7946 0958".into());
        item.text_fragments = vec!["+1 415-555-0100".into()];
        let listing = normalize(&item).unwrap();
        assert_eq!(listing.phone.as_deref(), Some("020 7946 0958"));
    }

    #[test]
    fn phone_falls_back_to_fragment_scan() {
        let mut item = item_with_title("Cafe");
        item.text_fragments = vec![
            "Coffee shop".into(),
            "+1 415-555-0100".into(),
            "short 123".into(),
        ];
        let listing = normalize(&item).unwrap();
        assert_eq!(listing.phone.as_deref(), Some("+1 415-555-0100"));
    }

    #[test]
    fn phone_falls_back_to_address_digit_run() {
        let mut item = item_with_title("Cafe");
        item.address = Some("12 Main St 415 555 0100".into());
        let listing = normalize(&item).unwrap();
        assert_eq!(listing.phone.as_deref(), Some("415 555 0100"));
    }

    #[test]
    fn phone_absent_when_no_strategy_matches() {
        let mut item = item_with_title("Cafe");
        item.address = Some("12 Main St".into());
        item.text_fragments = vec!["Coffee shop".into()];
        let listing = normalize(&item).unwrap();
        assert!(listing.phone.is_none());
        assert!(listing.country_code.is_none());
    }

    #[test]
    fn country_code_follows_prefix_table() {
        // "+1 415-555-0100" strips to "14155550100", prefix "1" matches.
        assert_eq!(derive_country_code("+1 415-555-0100"), Some("+1"));
        assert_eq!(derive_country_code("44 20 7946 0958"), Some("+44"));
        // Leading zero resolves through the "0" row, not any later row.
        assert_eq!(derive_country_code("020 7946 0958"), Some("+91"));
        assert_eq!(derive_country_code("7 495 000 00 00"), Some("+7"));
        assert_eq!(derive_country_code("no digits here"), None);
    }

    #[test]
    fn whitespace_is_collapsed_across_fields() {
        let mut item = item_with_title("Cafe");
        item.address = Some("  12   Main\n St  ".into());
        item.rating = Some(" 4.5 ".into());
        let listing = normalize(&item).unwrap();
        assert_eq!(listing.address.as_deref(), Some("12 Main St"));
        assert_eq!(listing.rating.as_deref(), Some("4.5"));
    }
}
