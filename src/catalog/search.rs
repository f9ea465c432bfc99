use crate::models::{SearchHit, Year};

/// Case-insensitive substring search over module titles.
///
/// Placeholder titles never match and a blank query matches nothing.
pub fn search_modules(years: &[Year], query: &str) -> Vec<SearchHit> {
    let lowered = query.trim().to_lowercase();
    let needle = lowered.as_str();
    if needle.is_empty() {
        return Vec::new();
    }

    years
        .iter()
        .flat_map(move |year| {
            year.all_modules()
                .into_iter()
                .filter(|m| !m.is_placeholder())
                .filter(move |m| m.title.to_lowercase().contains(needle))
                .map(move |m| SearchHit {
                    module: m.clone(),
                    year_id: year.id.clone(),
                    year_label: year.label.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    fn titled_catalog() -> Vec<Year> {
        let mut years = default_catalog();
        years[0].semesters[0].modules[0].title = "Anatomy I".to_string();
        years[0].semesters[1].modules[0].title = "Anatomy I".to_string();
        years[0].semesters[1].modules[6].title = "Physiology".to_string();
        years[1].standalone_modules[0].title = "علم التشريح".to_string();
        years[1].units[0].modules[0].title = "Clinical ANATOMY".to_string();
        years
    }

    #[test]
    fn blank_query_returns_nothing() {
        assert!(search_modules(&titled_catalog(), "   ").is_empty());
    }

    #[test]
    fn matches_case_insensitively_and_dedupes_shared() {
        let hits = search_modules(&titled_catalog(), "  anatomy ");
        let ids: Vec<(&str, &str)> = hits
            .iter()
            .map(|h| (h.module.id.as_str(), h.year_id.as_str()))
            .collect();

        assert_eq!(
            ids,
            vec![("mod-y1-shared-001", "year-1"), ("mod-y2-u1-001", "year-2")]
        );
        assert_eq!(hits[0].year_label, "السنة الأولى");
    }

    #[test]
    fn placeholder_titles_never_match() {
        assert!(search_modules(&default_catalog(), "to_be").is_empty());
    }

    #[test]
    fn matches_arabic_titles() {
        let hits = search_modules(&titled_catalog(), "التشريح");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].module.id, "mod-standalone-001");
    }
}
