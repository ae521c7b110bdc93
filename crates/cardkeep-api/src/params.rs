// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiError;
use cardkeep_query::{parse_search_query, CardFilter};
use std::collections::BTreeMap;

/// Parsed catalog search request. `empty_query` is set when a `q` parameter
/// was supplied but nothing survived sanitization; the handler answers with
/// an empty result set instead of the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardSearchParams {
    pub filter: CardFilter,
    pub empty_query: bool,
}

/// Builds a card filter from query parameters. A raw `q` search-box string
/// is parsed first; explicit field parameters override whatever `q`
/// produced for the same field.
pub fn parse_card_search_params(
    query: &BTreeMap<String, String>,
) -> Result<CardSearchParams, ApiError> {
    let mut filter = CardFilter::default();
    let mut empty_query = false;

    if let Some(raw) = query.get("q") {
        filter = parse_search_query(raw);
        if filter.is_empty() {
            empty_query = true;
        }
    }

    if let Some(v) = query.get("text") {
        filter.text = Some(v.clone());
    }
    if let Some(v) = query.get("style") {
        filter.style = Some(v.clone());
    }
    if let Some(v) = query.get("rarity") {
        filter.rarity = Some(v.clone());
    }
    if let Some(v) = query.get("type") {
        filter.card_type = Some(v.clone());
    }
    if let Some(v) = query.get("set") {
        filter.set = Some(v.clone());
    }
    if let Some(raw) = query.get("level") {
        let value = raw
            .parse::<i64>()
            .map_err(|_| ApiError::invalid_param("level", raw))?;
        filter.level = Some(value);
    }
    if let Some(v) = query.get("name") {
        filter.name_or_title = Some(v.clone());
    }

    // Explicit parameters rescue an otherwise empty q.
    if empty_query && !filter.is_empty() {
        empty_query = false;
    }

    Ok(CardSearchParams {
        filter,
        empty_query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn raw_query_feeds_the_search_parser() {
        let params =
            parse_card_search_params(&query(&[("q", "style:Saiyan goku")])).expect("parse");
        assert_eq!(params.filter.style.as_deref(), Some("Saiyan"));
        assert_eq!(params.filter.name_or_title.as_deref(), Some("goku"));
        assert!(!params.empty_query);
    }

    #[test]
    fn explicit_field_overrides_raw_query_value() {
        let params =
            parse_card_search_params(&query(&[("q", "style:Saiyan"), ("style", "Namekian")]))
                .expect("parse");
        assert_eq!(params.filter.style.as_deref(), Some("Namekian"));
    }

    #[test]
    fn sanitized_away_query_flags_empty_result() {
        let params = parse_card_search_params(&query(&[("q", "@@@")])).expect("parse");
        assert!(params.empty_query);
        assert!(params.filter.is_empty());
    }

    #[test]
    fn explicit_params_rescue_an_empty_raw_query() {
        let params =
            parse_card_search_params(&query(&[("q", "@@@"), ("rarity", "Rare")])).expect("parse");
        assert!(!params.empty_query);
        assert_eq!(params.filter.rarity.as_deref(), Some("Rare"));
    }

    #[test]
    fn non_numeric_level_parameter_is_rejected() {
        let err = parse_card_search_params(&query(&[("level", "high")])).expect_err("error");
        assert_eq!(err.code, crate::errors::ApiErrorCode::InvalidQueryParameter);
    }

    #[test]
    fn no_parameters_means_unfiltered_catalog() {
        let params = parse_card_search_params(&BTreeMap::new()).expect("parse");
        assert!(params.filter.is_empty());
        assert!(!params.empty_query);
    }
}
