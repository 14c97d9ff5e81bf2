//! Catalog filter-sort pipeline.
//!
//! `compute_visible` narrows a record set through the search, kind and facet
//! stages and then reorders it with the configured sort key. It is pure:
//! it borrows both inputs, keeps no state between calls and returns
//! references into the caller's slice, so identical inputs always yield the
//! same records in the same order.

pub mod filter;
pub mod sort;

use std::collections::BTreeSet;

use crate::types::{AssetKind, AssetRecord, RarityTier, Theme, TraitType};

pub use filter::{FacetProfile, FilterConfig, PriceRange, ScoreRange, SlotThemes, SortKey};

/// First stage that dropped a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Search,
    Kind,
    Theme,
    TraitType,
    SlotTheme,
    Tier,
    RarityScore,
    Price,
    Unlisted,
}

/// Per-stage rejection counts for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub input: usize,
    pub rejected_search: usize,
    pub rejected_kind: usize,
    pub rejected_theme: usize,
    pub rejected_trait_type: usize,
    pub rejected_slot_theme: usize,
    pub rejected_tier: usize,
    pub rejected_rarity_score: usize,
    pub rejected_price: usize,
    pub rejected_unlisted: usize,
    pub visible: usize,
}

impl PipelineStats {
    fn record(&mut self, rejection: Rejection) {
        let slot = match rejection {
            Rejection::Search => &mut self.rejected_search,
            Rejection::Kind => &mut self.rejected_kind,
            Rejection::Theme => &mut self.rejected_theme,
            Rejection::TraitType => &mut self.rejected_trait_type,
            Rejection::SlotTheme => &mut self.rejected_slot_theme,
            Rejection::Tier => &mut self.rejected_tier,
            Rejection::RarityScore => &mut self.rejected_rarity_score,
            Rejection::Price => &mut self.rejected_price,
            Rejection::Unlisted => &mut self.rejected_unlisted,
        };
        *slot += 1;
    }
}

/// Ordered subset of `records` visible under `config`.
pub fn compute_visible<'a>(records: &'a [AssetRecord], config: &FilterConfig) -> Vec<&'a AssetRecord> {
    compute_visible_with_stats(records, config).0
}

pub fn compute_visible_with_stats<'a>(
    records: &'a [AssetRecord],
    config: &FilterConfig,
) -> (Vec<&'a AssetRecord>, PipelineStats) {
    let stages = Stages::from_config(config);
    let mut stats = PipelineStats {
        input: records.len(),
        ..PipelineStats::default()
    };

    let mut visible = Vec::with_capacity(records.len());
    for record in records {
        match stages.first_rejection(record) {
            Some(rejection) => stats.record(rejection),
            None => visible.push(record),
        }
    }

    sort::sort_records(&mut visible, config.sort);
    stats.visible = visible.len();
    (visible, stats)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// The configuration resolved into the restrictions that are actually
/// active. `None` / `false` means the stage admits everything.
struct Stages<'c> {
    search: Option<String>,
    kind: Option<AssetKind>,
    themes: Option<&'c BTreeSet<Theme>>,
    trait_types: Option<&'c BTreeSet<TraitType>>,
    slot_themes: Option<Vec<(TraitType, &'c BTreeSet<Theme>)>>,
    tiers: Option<&'c BTreeSet<RarityTier>>,
    rarity_score: Option<(f64, f64)>,
    price: Option<(f64, f64)>,
    listed_only: bool,
}

impl<'c> Stages<'c> {
    fn from_config(config: &'c FilterConfig) -> Self {
        let extended = config.profile.is_extended();

        let search = (!config.search.is_empty()).then(|| config.search.to_lowercase());

        // Both or neither kind toggle: no restriction.
        let kind = match (config.watch, config.trait_kind) {
            (true, false) => Some(AssetKind::Watch),
            (false, true) => Some(AssetKind::Trait),
            _ => None,
        };

        let themes = (extended && !config.themes.is_empty()).then_some(&config.themes);

        let trait_types = (extended && config.trait_kind && !config.trait_types.is_empty())
            .then_some(&config.trait_types);

        let slot_themes = (extended && config.watch && !config.slot_themes.is_empty())
            .then(|| config.slot_themes.populated());

        let tiers = (config.trait_kind && !config.tiers.is_empty()).then_some(&config.tiers);

        let rarity_score = if extended && config.watch {
            config.rarity_score.active_bounds()
        } else {
            None
        };

        Self {
            search,
            kind,
            themes,
            trait_types,
            slot_themes,
            tiers,
            rarity_score,
            price: config.price.active_bounds(),
            listed_only: config.listed_only,
        }
    }

    fn first_rejection(&self, rec: &AssetRecord) -> Option<Rejection> {
        if let Some(term) = &self.search {
            if !matches_search(rec, term) {
                return Some(Rejection::Search);
            }
        }
        if let Some(kind) = self.kind {
            if rec.kind() != kind {
                return Some(Rejection::Kind);
            }
        }
        if let Some(themes) = self.themes {
            if !themes.contains(&rec.theme) {
                return Some(Rejection::Theme);
            }
        }
        if let Some(types) = self.trait_types {
            if !rec.trait_type().is_some_and(|t| types.contains(&t)) {
                return Some(Rejection::TraitType);
            }
        }
        if let Some(slots) = &self.slot_themes {
            if !matches_any_slot(rec, slots) {
                return Some(Rejection::SlotTheme);
            }
        }
        if let Some(tiers) = self.tiers {
            if rec.kind() != AssetKind::Trait || !tiers.contains(&rec.rarity_tier) {
                return Some(Rejection::Tier);
            }
        }
        if let Some((min, max)) = self.rarity_score {
            let in_range = rec.rarity_score >= min && rec.rarity_score <= max;
            if rec.kind() != AssetKind::Watch || !in_range {
                return Some(Rejection::RarityScore);
            }
        }
        if let Some((min, max)) = self.price {
            let price = rec.effective_price();
            if !(price >= min && price <= max) {
                return Some(Rejection::Price);
            }
        }
        if self.listed_only && !rec.is_listed {
            return Some(Rejection::Unlisted);
        }
        None
    }
}

/// `term` is already lowercased.
fn matches_search(rec: &AssetRecord, term: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(term);

    let basic = hit(&rec.name)
        || hit(rec.theme.label())
        || rec.trait_type().is_some_and(|t| hit(t.label()))
        || hit(rec.rarity_tier.label())
        || hit(&rec.kind().to_string());

    if rec.kind() != AssetKind::Watch {
        return basic;
    }

    // Watches also match on the fixed component vocabulary, not on the
    // watch's own components.
    basic
        || TraitType::ALL.into_iter().any(|t| hit(t.label()))
        || Theme::FILTER_VOCABULARY.into_iter().any(|t| hit(t.label()))
}

/// Passes when any populated slot set contains the watch's theme for that slot.
fn matches_any_slot(rec: &AssetRecord, slots: &[(TraitType, &BTreeSet<Theme>)]) -> bool {
    let Some(components) = rec.components() else {
        return false;
    };
    slots
        .iter()
        .any(|(slot, allowed)| allowed.contains(&components.slot(*slot).theme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures;

    fn ids<'a>(records: &[&'a AssetRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn listed_only_drops_unlisted_and_sorts_by_price() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().toggle_listed();
        let visible = compute_visible(&catalog, &cfg);
        assert_eq!(ids(&visible), ["1004", "1001", "1002", "1003", "1005"]);
    }

    #[test]
    fn trait_kind_with_unique_tier() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default()
            .toggle_trait()
            .toggle_tier(RarityTier::Unique);
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1004"]);
    }

    #[test]
    fn price_range_excludes_offer_only() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_price_range(Some(1000.0), Some(2000.0));
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1002", "1003"]);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_price_range(Some(1200.0), Some(1800.0));
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1002", "1003"]);
    }

    #[test]
    fn score_bounds_are_inclusive() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default()
            .toggle_watch()
            .with_score_range(Some(45.1), Some(76.2));
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1003", "1005"]);
    }

    #[test]
    fn max_price_alone_keeps_absent_price_as_zero() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_price_range(None, Some(400.0));
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1005", "1006"]);
    }

    #[test]
    fn search_matches_theme_and_watch_vocabulary() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_search("GOLDEN");
        let visible = compute_visible(&catalog, &cfg);
        // 1004 by theme; watches through the fixed component vocabulary.
        assert_eq!(ids(&visible), ["1004", "1001", "1003", "1005"]);
        assert!(visible
            .iter()
            .filter(|r| r.kind() == AssetKind::Trait)
            .all(|r| r.theme == Theme::Golden || r.name.to_lowercase().contains("golden")));
    }

    #[test]
    fn search_on_trait_matches_tier_label() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_search("super rare").toggle_trait();
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1002", "1006"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let cfg = FilterConfig::default()
            .toggle_watch()
            .with_search("neon")
            .with_price_range(Some(1.0), None);
        assert!(compute_visible(&[], &cfg).is_empty());
        assert!(compute_visible(&[], &FilterConfig::default()).is_empty());
    }

    #[test]
    fn both_kind_toggles_equal_neither() {
        let catalog = fixtures::catalog();
        let neither = FilterConfig::default();
        let both = FilterConfig::default().toggle_watch().toggle_trait();
        assert_eq!(
            ids(&compute_visible(&catalog, &neither)),
            ids(&compute_visible(&catalog, &both))
        );
        assert_eq!(compute_visible(&catalog, &both).len(), 6);
    }

    #[test]
    fn output_is_subset_and_deterministic() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default()
            .toggle_watch()
            .with_score_range(Some(50.0), None)
            .with_sort(Some(SortKey::LeastRare));
        let first = compute_visible(&catalog, &cfg);
        let second = compute_visible(&catalog, &cfg);
        assert_eq!(ids(&first), ids(&second));
        for rec in &first {
            assert!(catalog.iter().any(|c| std::ptr::eq(c, *rec)));
        }
        assert_eq!(ids(&first), ["1003", "1001"]);
    }

    #[test]
    fn adding_a_restriction_never_grows_the_result() {
        let catalog = fixtures::catalog();
        let base = FilterConfig::default().toggle_trait();
        let base_len = compute_visible(&catalog, &base).len();

        let narrowed = [
            base.clone().toggle_listed(),
            base.clone().toggle_theme(Theme::Neon),
            base.clone().with_price_range(Some(500.0), None),
            base.clone().toggle_tier(RarityTier::SuperRare),
            base.clone().toggle_trait_type(TraitType::Hologram),
        ];
        for cfg in &narrowed {
            assert!(compute_visible(&catalog, cfg).len() <= base_len, "{cfg:?}");
        }
    }

    #[test]
    fn inverted_score_range_matches_nothing() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default()
            .toggle_watch()
            .with_score_range(Some(90.0), Some(10.0));
        assert!(compute_visible(&catalog, &cfg).is_empty());
    }

    #[test]
    fn inverted_price_range_matches_nothing() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_price_range(Some(5000.0), Some(100.0));
        assert!(compute_visible(&catalog, &cfg).is_empty());
    }

    #[test]
    fn slot_themes_are_disjunctive_across_slots() {
        let catalog = fixtures::catalog();
        // 1001 has a Neon strap, 1005 a Classic dial.
        let cfg = FilterConfig::default()
            .toggle_watch()
            .toggle_slot_theme(TraitType::Strap, Theme::Neon)
            .toggle_slot_theme(TraitType::Dial, Theme::Classic);
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1001", "1005"]);
    }

    #[test]
    fn slot_filter_rejects_watch_without_components() {
        let mut catalog = fixtures::catalog();
        if let crate::types::AssetVariant::Watch { components } = &mut catalog[0].variant {
            *components = None;
        }
        let cfg = FilterConfig::default()
            .toggle_watch()
            .toggle_slot_theme(TraitType::Strap, Theme::Neon);
        let (visible, stats) = compute_visible_with_stats(&catalog, &cfg);
        assert!(visible.is_empty());
        assert_eq!(stats.rejected_slot_theme, 3);
    }

    #[test]
    fn basic_profile_ignores_extended_facets() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default()
            .toggle_theme(Theme::Neon)
            .with_profile(FacetProfile::Basic);
        assert_eq!(compute_visible(&catalog, &cfg).len(), 6);
        let cfg = cfg.with_profile(FacetProfile::Extended);
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1006"]);
    }

    #[test]
    fn tier_facet_needs_trait_toggle() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().toggle_tier(RarityTier::Unique);
        assert_eq!(compute_visible(&catalog, &cfg).len(), 6);
    }

    #[test]
    fn trait_type_facet_drops_watches_when_both_kinds_shown() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default()
            .toggle_watch()
            .toggle_trait()
            .toggle_trait_type(TraitType::Hologram);
        assert_eq!(ids(&compute_visible(&catalog, &cfg)), ["1002"]);
    }

    #[test]
    fn stats_attribute_each_rejection_once() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().toggle_watch().toggle_listed();
        let (visible, stats) = compute_visible_with_stats(&catalog, &cfg);
        assert_eq!(stats.input, 6);
        assert_eq!(stats.rejected_kind, 3);
        assert_eq!(stats.rejected_unlisted, 0);
        assert_eq!(stats.visible, visible.len());
        assert_eq!(stats.visible, 3);
    }

    #[test]
    fn unknown_sort_keeps_source_order() {
        let catalog = fixtures::catalog();
        let cfg = FilterConfig::default().with_sort(SortKey::parse_lenient("bogus"));
        assert_eq!(
            ids(&compute_visible(&catalog, &cfg)),
            ["1001", "1002", "1003", "1004", "1005", "1006"]
        );
    }
}
