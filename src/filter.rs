//! Client-side relative filters and generation labels.
//!
//! Every predicate is optional; a relative is shown when it passes all the
//! predicates that are set. Filters are pure and recomputed on every change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::{Gender, Relative};

/// Combined filter predicates (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeFilter {
    pub gender: Option<Gender>,
    /// Only relatives with exactly this generation pass. Relatives with no
    /// generation never pass an active generation filter.
    pub generation: Option<i32>,
    /// `Some(true)` keeps the living, `Some(false)` the deceased.
    pub alive: Option<bool>,
    /// `Some(true)` keeps relatives with stories, `Some(false)` those without.
    pub has_stories: Option<bool>,
    /// Case-insensitive substring of "first last middle". Empty disables.
    pub search: String,
}

impl RelativeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_generation(mut self, generation: i32) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_alive(mut self, alive: bool) -> Self {
        self.alive = Some(alive);
        self
    }

    pub fn with_has_stories(mut self, has_stories: bool) -> Self {
        self.has_stories = Some(has_stories);
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_owned();
        self
    }

    /// Whether any predicate is set.
    pub fn is_active(&self) -> bool {
        self.gender.is_some()
            || self.generation.is_some()
            || self.alive.is_some()
            || self.has_stories.is_some()
            || !self.search.is_empty()
    }

    /// Reset every predicate.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, relative: &Relative) -> bool {
        if let Some(gender) = self.gender
            && relative.gender != Some(gender)
        {
            return false;
        }
        if let Some(generation) = self.generation
            && relative.generation != Some(generation)
        {
            return false;
        }
        if let Some(alive) = self.alive
            && relative.is_alive() != alive
        {
            return false;
        }
        if let Some(has_stories) = self.has_stories
            && relative.has_stories() != has_stories
        {
            return false;
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !relative.full_name().to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }

    /// Relatives passing the filter, in input order.
    pub fn apply(&self, relatives: &[Relative]) -> Vec<Relative> {
        relatives
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

const ROMAN: [&str; 14] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV",
];

/// Display label of one generation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationLabel {
    /// 1-based rank among the generations present.
    pub order: usize,
    /// Roman numeral for `order`, or its decimal form past XIV.
    pub roman: String,
}

/// Distinct generations present, ascending.
pub fn unique_generations(relatives: &[Relative]) -> Vec<i32> {
    let mut generations: Vec<i32> = relatives.iter().filter_map(|r| r.generation).collect();
    generations.sort_unstable();
    generations.dedup();
    generations
}

/// Label every generation present in `relatives` by its rank.
pub fn generation_labels(relatives: &[Relative]) -> BTreeMap<i32, GenerationLabel> {
    unique_generations(relatives)
        .into_iter()
        .enumerate()
        .map(|(index, generation)| {
            let order = index + 1;
            let roman = ROMAN
                .get(index)
                .map_or_else(|| order.to_string(), |r| (*r).to_owned());
            (generation, GenerationLabel { order, roman })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> Vec<Relative> {
        vec![
            Relative::new(1, "Иван", "Петров")
                .with_gender(Gender::Male)
                .with_generation(1)
                .with_death_date("1980-05-01"),
            Relative::new(2, "Мария", "Петрова")
                .with_gender(Gender::Female)
                .with_generation(1)
                .with_story("Свадьба", "..."),
            Relative::new(3, "Анна", "Петрова")
                .with_gender(Gender::Female)
                .with_generation(0)
                .with_middle_name("Ивановна"),
            Relative::new(4, "Гость", ""),
        ]
    }

    fn ids(relatives: &[Relative]) -> Vec<i64> {
        relatives.iter().map(|r| r.id.raw()).collect()
    }

    #[test]
    fn test_inactive_filter_keeps_everything() {
        let filter = RelativeFilter::new();
        assert!(!filter.is_active());
        assert_eq!(ids(&filter.apply(&family())), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let filter = RelativeFilter::new()
            .with_gender(Gender::Female)
            .with_generation(1);
        assert!(filter.is_active());
        assert_eq!(ids(&filter.apply(&family())), vec![2]);
    }

    #[test]
    fn test_generation_filter_excludes_missing_generation() {
        let filter = RelativeFilter::new().with_generation(0);
        assert_eq!(ids(&filter.apply(&family())), vec![3]);
    }

    #[test]
    fn test_alive_and_stories() {
        let relatives = family();
        assert_eq!(
            ids(&RelativeFilter::new().with_alive(false).apply(&relatives)),
            vec![1]
        );
        assert_eq!(
            ids(&RelativeFilter::new().with_has_stories(true).apply(&relatives)),
            vec![2]
        );
        assert_eq!(
            ids(&RelativeFilter::new().with_has_stories(false).apply(&relatives)),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn test_search_is_case_insensitive_over_full_name() {
        let relatives = family();
        assert_eq!(
            ids(&RelativeFilter::new().with_search("ПЕТРОВА").apply(&relatives)),
            vec![2, 3]
        );
        assert_eq!(
            ids(&RelativeFilter::new().with_search("ивановна").apply(&relatives)),
            vec![3]
        );
    }

    #[test]
    fn test_clear_resets_predicates() {
        let mut filter = RelativeFilter::new().with_search("x").with_alive(true);
        filter.clear();
        assert_eq!(filter, RelativeFilter::default());
    }

    #[test]
    fn test_partial_filter_deserializes() {
        let filter: RelativeFilter =
            serde_json::from_value(serde_json::json!({"gender": "male"})).unwrap();
        assert_eq!(filter.gender, Some(Gender::Male));
        assert!(filter.search.is_empty());
    }

    #[test]
    fn test_generation_labels_rank_by_order() {
        let labels = generation_labels(&family());
        assert_eq!(unique_generations(&family()), vec![0, 1]);
        assert_eq!(labels[&0].roman, "I");
        assert_eq!(labels[&1].order, 2);
        assert_eq!(labels[&1].roman, "II");
    }

    #[test]
    fn test_generation_labels_fall_back_to_decimal() {
        let relatives: Vec<Relative> = (0..16)
            .map(|g| Relative::new(g as i64, "R", "").with_generation(g - 3))
            .collect();
        let labels = generation_labels(&relatives);
        assert_eq!(labels[&10].roman, "XIV");
        assert_eq!(labels[&11].roman, "15");
        assert_eq!(labels[&12].roman, "16");
    }
}
