use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::GraphModel;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Node names fuzzily matching `query`, best match first.
pub fn suggest_names<'a>(model: &'a GraphModel, query: &str, limit: usize) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = model
        .nodes()
        .iter()
        .filter_map(|node| {
            fuzzy_match_score(&matcher, &node.name, query).map(|score| (score, node.name.as_str()))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawDataset;
    use crate::graph::tests::{raw_link, raw_node};

    fn model() -> GraphModel {
        let dataset = RawDataset {
            nodes: vec![
                raw_node("Ada Lovelace", "Analytical", 10.0),
                raw_node("Charles Babbage", "Analytical", 20.0),
                raw_node("Mary Somerville", "Royal", 5.0),
            ],
            links: vec![raw_link("Ada Lovelace", "Charles Babbage", 3.0)],
            clusters: None,
        };
        GraphModel::build(&dataset, 5.0).expect("valid dataset")
    }

    #[test]
    fn suggestions_rank_closest_names_first() {
        let model = model();
        assert_eq!(suggest_names(&model, "babb", 5), vec!["Charles Babbage"]);
        assert_eq!(suggest_names(&model, "ADA", 5).first(), Some(&"Ada Lovelace"));
    }

    #[test]
    fn empty_query_suggests_nothing() {
        let model = model();
        assert!(suggest_names(&model, "  ", 5).is_empty());
        assert!(suggest_names(&model, "ada", 0).is_empty());
        assert_eq!(suggest_names(&model, "a", 2).len(), 2);
    }
}
