//! Fuzzy entity-name resolution: turns a loosely-phrased name ("kitchen
//! lights") into one or more candidate Home Assistant entities.

use tg_domain::entity::StateCacheEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveResult {
    /// Exactly one entity matched, or ≥3 query tokens narrowed a multi-match
    /// down to a single best candidate.
    Unique(StateCacheEntry),
    /// Fewer than 3 query tokens matched more than one entity — a
    /// room-level filter ("kitchen lights"). Every match is actuated.
    Multiple(Vec<StateCacheEntry>),
    NotFound,
}

/// Lowercase, underscores to spaces, strip punctuation, collapse whitespace.
/// Does not strip plurals — see [`tokenize`] for that.
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase().replace('_', " ");
    let stripped: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize then split into tokens, stripping a trailing plural `s` from
/// each token ("lights" -> "light", "kitchens" -> "kitchen").
pub fn tokenize(s: &str) -> Vec<String> {
    normalize(s)
        .split_whitespace()
        .map(strip_trailing_plural)
        .collect()
}

fn strip_trailing_plural(token: &str) -> String {
    if token.len() > 2 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

/// Count of query tokens that appear as a whole word in the friendly name
/// (not merely a substring) — the tie-break score for narrow (≥3-token)
/// filters.
fn exact_token_matches(query_tokens: &[String], candidate: &StateCacheEntry) -> usize {
    let name_tokens: Vec<String> = normalize(&candidate.friendly_name())
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();
    query_tokens
        .iter()
        .filter(|t| name_tokens.iter().any(|n| n == *t))
        .count()
}

/// Resolve against any domain — used by the generic device-state lookup,
/// which isn't restricted to lights or switches.
pub fn resolve_any(query: &str, candidates: &[StateCacheEntry]) -> ResolveResult {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return ResolveResult::NotFound;
    }

    let matches: Vec<&StateCacheEntry> = candidates
        .iter()
        .filter(|c| {
            let haystack = normalize(&format!("{} {}", c.friendly_name(), c.entity_id));
            query_tokens.iter().all(|t| haystack.contains(t.as_str()))
        })
        .collect();

    match matches.len() {
        0 => ResolveResult::NotFound,
        1 => ResolveResult::Unique(matches[0].clone()),
        _ if query_tokens.len() >= 3 => {
            // Narrow, device-level phrasing: pick the candidate whose
            // friendly name exactly matches the most query tokens, ties
            // broken by the shorter entity_id.
            let best = matches.into_iter().max_by(|a, b| {
                let score_a = exact_token_matches(&query_tokens, a);
                let score_b = exact_token_matches(&query_tokens, b);
                score_a
                    .cmp(&score_b)
                    .then_with(|| b.entity_id.len().cmp(&a.entity_id.len()))
            });
            match best {
                Some(e) => ResolveResult::Unique(e.clone()),
                None => ResolveResult::NotFound,
            }
        }
        _ => ResolveResult::Multiple(matches.into_iter().cloned().collect()),
    }
}

/// Resolve `query` against `candidates`, matching only entities whose
/// `entity_id` starts with `domain.` (e.g. `"light"`, `"switch"`).
pub fn resolve(query: &str, candidates: &[StateCacheEntry], domain: &str) -> ResolveResult {
    let prefix = format!("{domain}.");
    let scoped: Vec<StateCacheEntry> = candidates
        .iter()
        .filter(|c| c.entity_id.starts_with(&prefix))
        .cloned()
        .collect();
    resolve_any(query, &scoped)
}

/// Resolve against `domain` first; if nothing matches, retry against
/// `fallback_domain` (used for light -> switch fallback per the device
/// control contract).
pub fn resolve_with_fallback(
    query: &str,
    candidates: &[StateCacheEntry],
    domain: &str,
    fallback_domain: &str,
) -> ResolveResult {
    match resolve(query, candidates, domain) {
        ResolveResult::NotFound => resolve(query, candidates, fallback_domain),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn entity(id: &str, name: &str) -> StateCacheEntry {
        let mut attrs = HashMap::new();
        attrs.insert(
            "friendly_name".to_string(),
            serde_json::Value::String(name.to_string()),
        );
        StateCacheEntry {
            entity_id: id.into(),
            state: "on".into(),
            attributes: attrs,
            last_changed: Utc::now(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn normalizes_underscores_and_punctuation() {
        assert_eq!(normalize("Kitchen_Lights!"), "kitchen lights");
    }

    #[test]
    fn tokenize_strips_trailing_plural() {
        assert_eq!(tokenize("kitchen lights"), vec!["kitchen", "light"]);
    }

    #[test]
    fn tokenize_keeps_double_s_endings() {
        assert_eq!(tokenize("glass"), vec!["glass"]);
    }

    #[test]
    fn single_match_is_unique() {
        let candidates = vec![entity("light.kitchen", "Kitchen Light")];
        assert_eq!(
            resolve("kitchen light", &candidates, "light"),
            ResolveResult::Unique(candidates[0].clone())
        );
    }

    #[test]
    fn broad_filter_below_three_tokens_actuates_every_match() {
        let candidates = vec![
            entity("light.kitchen_main", "Kitchen Main Light"),
            entity("light.kitchen_counter", "Kitchen Counter Light"),
            entity("light.kitchen_island", "Kitchen Island Light"),
        ];
        match resolve("kitchen light", &candidates, "light") {
            ResolveResult::Multiple(matches) => assert_eq!(matches.len(), 3),
            other => panic!("expected Multiple, got {other:?}"),
        }
    }

    #[test]
    fn three_tokens_narrows_to_single_best() {
        let candidates = vec![
            entity("light.kitchen_main", "Kitchen Main Light"),
            entity("light.kitchen_counter", "Kitchen Counter Light"),
        ];
        match resolve("kitchen counter light", &candidates, "light") {
            ResolveResult::Unique(e) => assert_eq!(e.entity_id, "light.kitchen_counter"),
            other => panic!("expected Unique, got {other:?}"),
        }
    }

    #[test]
    fn tie_break_prefers_shorter_entity_id() {
        let candidates = vec![
            entity("light.kitchen_above_cabinet", "Kitchen Above Cabinet Light"),
            entity("light.cab", "Kitchen Above Cabinet Light"),
        ];
        match resolve("kitchen above cabinet light", &candidates, "light") {
            ResolveResult::Unique(e) => assert_eq!(e.entity_id, "light.cab"),
            other => panic!("expected Unique, got {other:?}"),
        }
    }

    #[test]
    fn not_found_when_no_tokens_match() {
        let candidates = vec![entity("light.kitchen", "Kitchen Light")];
        assert_eq!(
            resolve("garage door", &candidates, "light"),
            ResolveResult::NotFound
        );
    }

    #[test]
    fn falls_back_to_switch_domain() {
        let candidates = vec![entity("switch.office_lamp", "Office Lamp")];
        match resolve_with_fallback("office lamp", &candidates, "light", "switch") {
            ResolveResult::Unique(e) => assert_eq!(e.entity_id, "switch.office_lamp"),
            other => panic!("expected Unique via fallback, got {other:?}"),
        }
    }
}
