use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::error::LookupError;
use crate::model::{EntityId, GraphIndex};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Resolves a user-typed query to an entity: exact id first, then a
/// case-insensitive display name, then the best fuzzy name match.
pub fn resolve_entity(index: &GraphIndex, query: &str) -> Result<EntityId, LookupError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(LookupError::NoMatch(String::new()));
    }

    let as_id = EntityId::new(query);
    if index.contains(&as_id) {
        return Ok(as_id);
    }

    if let Some(entity) = index
        .entities()
        .iter()
        .find(|entity| entity.display_name.eq_ignore_ascii_case(query))
    {
        return Ok(entity.id.clone());
    }

    let matcher = SkimMatcherV2::default();
    index
        .entities()
        .iter()
        .filter_map(|entity| {
            fuzzy_match_score(&matcher, &entity.display_name, query).map(|score| (score, entity))
        })
        // Lower ids win ties.
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.id.cmp(&a.1.id)))
        .map(|(_, entity)| entity.id.clone())
        .ok_or_else(|| LookupError::NoMatch(query.to_owned()))
}

/// Up to `limit` entities whose display name fuzzily matches `query`, best
/// first.
pub fn suggestions<'a>(index: &'a GraphIndex, query: &str, limit: usize) -> Vec<(&'a EntityId, &'a str)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = index
        .entities()
        .iter()
        .filter_map(|entity| {
            fuzzy_match_score(&matcher, &entity.display_name, query).map(|score| (score, entity))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, entity)| (&entity.id, entity.display_name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, build_index};

    fn index() -> GraphIndex {
        build_index(
            vec![
                Entity::new("c1", "Northwind Traders"),
                Entity::new("c2", "Contoso"),
                Entity::new("c3", "Fabrikam"),
            ],
            Vec::new(),
        )
        .0
    }

    #[test]
    fn exact_id_wins() {
        assert_eq!(resolve_entity(&index(), "c2"), Ok("c2".into()));
    }

    #[test]
    fn display_name_is_case_insensitive() {
        assert_eq!(resolve_entity(&index(), "  contoso "), Ok("c2".into()));
    }

    #[test]
    fn falls_back_to_fuzzy_name() {
        assert_eq!(resolve_entity(&index(), "nwind"), Ok("c1".into()));
    }

    #[test]
    fn misses_are_reported() {
        assert_eq!(
            resolve_entity(&index(), "zzqx"),
            Err(LookupError::NoMatch("zzqx".into()))
        );
        assert!(resolve_entity(&index(), "   ").is_err());
    }

    #[test]
    fn suggestions_are_limited() {
        let index = index();
        let found = suggestions(&index, "o", 2);
        assert_eq!(found.len(), 2);
    }
}
