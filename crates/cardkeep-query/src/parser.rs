// SPDX-License-Identifier: Apache-2.0

use crate::CardFilter;
use regex::Regex;
use std::sync::OnceLock;

/// Field names the query builder special-cases. Any other `field:value`
/// token is stripped from the remainder but contributes no filter.
pub const RECOGNIZED_FIELDS: [&str; 6] = ["text", "style", "rarity", "type", "set", "level"];

/// Strips every character outside `[a-zA-Z0-9\s:'"-]`. Values containing
/// other punctuation lose it before tokenization, which can invalidate
/// field syntax; that matches the search box contract.
#[must_use]
pub fn sanitize_raw_query(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || c.is_whitespace()
                || matches!(c, ':' | '\'' | '"' | '-')
        })
        .collect()
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // field:"quoted value", field:'quoted value', or field:bare. Quotes
        // must match; a bare value stops at whitespace or a quote character.
        Regex::new(r#"([A-Za-z0-9]+):(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#).expect("token regex")
    })
}

fn apply_field(filter: &mut CardFilter, field: &str, value: &str) {
    match field {
        "text" => filter.text = Some(value.to_string()),
        "style" => filter.style = Some(value.to_string()),
        "rarity" => filter.rarity = Some(value.to_string()),
        "type" => filter.card_type = Some(value.to_string()),
        "set" => filter.set = Some(value.to_string()),
        // Exact match; a non-numeric level value is dropped like an
        // unrecognized field.
        "level" => filter.level = value.parse::<i64>().ok(),
        _ => {}
    }
}

/// Parses a raw search-box query into catalog filters.
///
/// The query is sanitized, then scanned for `field:value` tokens (quoted or
/// bare). Every matched token is removed from the remainder whether or not
/// its field is recognized. A non-empty trimmed remainder becomes the
/// free-text name-or-title filter. Returns an empty filter when nothing
/// survives sanitization; callers short-circuit on `is_empty` without
/// touching the store.
#[must_use]
pub fn parse_search_query(raw: &str) -> CardFilter {
    let sanitized = sanitize_raw_query(raw);
    let mut filter = CardFilter::default();
    if sanitized.trim().is_empty() {
        return filter;
    }

    let mut remainder = sanitized.clone();
    for caps in token_regex().captures_iter(&sanitized) {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let field = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        apply_field(&mut filter, &field, value);
        remainder = remainder.replacen(whole, "", 1);
    }

    let free_text = remainder.trim();
    if !free_text.is_empty() {
        filter.name_or_title = Some(free_text.to_string());
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_field_token_plus_free_text() {
        let filter = parse_search_query(r#"type:"Dragon Ball" goku"#);
        assert_eq!(filter.card_type.as_deref(), Some("Dragon Ball"));
        assert_eq!(filter.name_or_title.as_deref(), Some("goku"));
        assert!(filter.text.is_none());
    }

    #[test]
    fn single_quoted_and_bare_values_parse() {
        let filter = parse_search_query("style:'Non-Styled' rarity:rare");
        assert_eq!(filter.style.as_deref(), Some("Non-Styled"));
        assert_eq!(filter.rarity.as_deref(), Some("rare"));
        assert!(filter.name_or_title.is_none());
    }

    #[test]
    fn level_is_numeric_exact_match() {
        let filter = parse_search_query("level:3 vegeta");
        assert_eq!(filter.level, Some(3));
        assert_eq!(filter.name_or_title.as_deref(), Some("vegeta"));
    }

    #[test]
    fn non_numeric_level_is_dropped_but_stripped() {
        let filter = parse_search_query("level:high kick");
        assert_eq!(filter.level, None);
        assert_eq!(filter.name_or_title.as_deref(), Some("kick"));
    }

    #[test]
    fn unrecognized_field_is_stripped_and_its_value_lost() {
        let filter = parse_search_query("power:9000 goku");
        assert_eq!(filter.name_or_title.as_deref(), Some("goku"));
        assert_eq!(filter.level, None);
        assert!(filter.text.is_none() && filter.style.is_none());
    }

    #[test]
    fn punctuation_only_query_yields_empty_filter() {
        let filter = parse_search_query("@@@");
        assert!(filter.is_empty());
    }

    #[test]
    fn sanitization_strips_disallowed_characters_before_tokenizing() {
        // The parentheses vanish, so the token still parses.
        let filter = parse_search_query("set:(Premiere)");
        assert_eq!(filter.set.as_deref(), Some("Premiere"));
        // Sanitization can also invalidate syntax: the colon survives but the
        // value's punctuation is gone.
        assert_eq!(sanitize_raw_query("text:a&b"), "text:ab");
    }

    #[test]
    fn unmatched_quote_produces_no_token() {
        let filter = parse_search_query(r#"type:"Dragon Ball"#);
        assert!(filter.card_type.is_none());
        assert_eq!(
            filter.name_or_title.as_deref(),
            Some(r#"type:"Dragon Ball"#)
        );
    }

    #[test]
    fn multiple_tokens_all_strip_from_remainder() {
        let filter = parse_search_query(r#"style:Saiyan type:Personality level:1 goku"#);
        assert_eq!(filter.style.as_deref(), Some("Saiyan"));
        assert_eq!(filter.card_type.as_deref(), Some("Personality"));
        assert_eq!(filter.level, Some(1));
        assert_eq!(filter.name_or_title.as_deref(), Some("goku"));
    }

    #[test]
    fn whitespace_only_query_is_empty() {
        assert!(parse_search_query("   ").is_empty());
        assert!(parse_search_query("").is_empty());
    }
}
