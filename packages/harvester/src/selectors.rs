//! Ordered selector tables and resolution rules for the map-search feed.
//!
//! The feed's markup is unstable, so every lookup is an ordered candidate
//! list evaluated first-match-wins. Keeping the lists here, as data, makes
//! the ordering testable and keeps the driver and normalizer free of inline
//! conditional chains.

/// Result-container selectors; at least one must become visible for the
/// initial load to count as successful.
pub const RESULT_SELECTORS: &[&str] = &[
    ".section-result",
    ".Nv2PK",
    "div[role=\"article\"]",
    "a[href^=\"/maps/place/\"]",
];

/// Selector matching every rendered result item.
pub const ITEM_SELECTOR: &str = "div[role=\"article\"], div.Nv2PK, .section-result";

/// Title sources inside an item, most specific first.
pub const TITLE_SELECTORS: &[&str] = &[
    "div.qBF1Pd",
    "div.fontHeadlineSmall",
    "h3.fontHeadlineSmall",
    "div[role=\"heading\"]",
];

/// Category sources inside an item. Candidates still go through the text
/// filters in the normalizer; this list only controls lookup order.
pub const CATEGORY_SELECTORS: &[&str] = &[
    "div.W4Efsd span.DkEaL",
    "div.W4Efsd span:first-of-type",
    "div[jsaction*=\"placeCard\"] span.DkEaL",
    "div.W4Efsd > span:first-child",
    "button[jsaction*=\"category\"]",
    "div.W4Efsd span.W4Efsd",
];

/// Scrollable results-pane containers, tried in order.
pub const FEED_CONTAINER_SELECTORS: &[&str] = &[
    "div[role=\"feed\"]",
    "div.m6QErb[aria-label]",
    "div.m6QErb div[role=\"region\"]",
    "div.m6QErb",
    "#QA0Szd",
];

/// Rating element inside an item.
pub const RATING_SELECTOR: &str = "span.MW4etd";

/// Review-count sources inside an item.
pub const REVIEWS_SELECTOR: &str =
    "span.UY7F9, span[aria-label*=\"reviews\"], span.fontBodyMedium span:not([class])";

/// Website link inside an item.
pub const WEBSITE_SELECTOR: &str =
    "a[data-item-id*=\"authority\"], a[href^=\"http\"]:not([href*=\"google\"])";

/// Address line inside an item.
pub const ADDRESS_SELECTOR: &str = "div.W4Efsd:last-child";

/// Dedicated phone element inside an item.
pub const PHONE_SELECTOR: &str = "span.Usd1K";

/// Country-code table: digit prefix of the stripped phone number mapped to a
/// dialing code, first matching prefix wins.
///
/// The order is load-bearing, quirks included: a bare "0" maps to +91, and
/// "7" is matched late, after "1" has already claimed numbers starting
/// with 1. Reordering changes which code ambiguous leading digits resolve
/// to.
pub const COUNTRY_PREFIXES: &[(&str, &str)] = &[
    ("1", "+1"),   // USA/Canada
    ("44", "+44"), // UK
    ("0", "+91"),  // India
    ("61", "+61"), // Australia
    ("86", "+86"), // China
    ("49", "+49"), // Germany
    ("33", "+33"), // France
    ("81", "+81"), // Japan
    ("82", "+82"), // South Korea
    ("34", "+34"), // Spain
    ("39", "+39"), // Italy
    ("7", "+7"),   // Russia
    ("55", "+55"), // Brazil
    ("52", "+52"), // Mexico
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_table_order_is_preserved() {
        // First three rows carry the ambiguous-leading-digit semantics the
        // rest of the table depends on.
        assert_eq!(COUNTRY_PREFIXES[0], ("1", "+1"));
        assert_eq!(COUNTRY_PREFIXES[1], ("44", "+44"));
        assert_eq!(COUNTRY_PREFIXES[2], ("0", "+91"));
        // "7" must come after "1" so "1..." never resolves as Russia.
        let pos_1 = COUNTRY_PREFIXES.iter().position(|(p, _)| *p == "1").unwrap();
        let pos_7 = COUNTRY_PREFIXES.iter().position(|(p, _)| *p == "7").unwrap();
        assert!(pos_1 < pos_7);
    }

    #[test]
    fn candidate_lists_are_non_empty() {
        assert!(!RESULT_SELECTORS.is_empty());
        assert!(!TITLE_SELECTORS.is_empty());
        assert!(!CATEGORY_SELECTORS.is_empty());
        assert!(!FEED_CONTAINER_SELECTORS.is_empty());
    }
}
