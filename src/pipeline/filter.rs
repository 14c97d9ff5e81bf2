//! Declarative filter/sort configuration for the catalog pipeline.
//!
//! A `FilterConfig` is a plain serializable value. UI interactions never
//! mutate one in place: every `toggle_*`/`with_*` method consumes the
//! current value and returns the next one, so callers can keep the previous
//! configuration around (or memoize on it) without surprises.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::rarity_score_bounds;
use crate::types::{RarityTier, Theme, TraitType, UnknownValue};

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    PriceHighLow,
    PriceLowHigh,
    /// Compares rarity score, same as `RarityScoreHigh`.
    MostRare,
    /// Compares rarity score, same as `RarityScoreLow`.
    LeastRare,
    RarityScoreHigh,
    RarityScoreLow,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::PriceHighLow,
        SortKey::PriceLowHigh,
        SortKey::MostRare,
        SortKey::LeastRare,
        SortKey::RarityScoreHigh,
        SortKey::RarityScoreLow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::PriceHighLow => "price-high-low",
            SortKey::PriceLowHigh => "price-low-high",
            SortKey::MostRare => "most-rare",
            SortKey::LeastRare => "least-rare",
            SortKey::RarityScoreHigh => "rarity-score-high",
            SortKey::RarityScoreLow => "rarity-score-low",
        }
    }

    /// Wire value, or `None` for anything unrecognized. Unknown keys mean
    /// "keep the incoming order", never an error.
    pub fn parse_lenient(s: &str) -> Option<SortKey> {
        s.parse().ok()
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| UnknownValue {
                vocabulary: "sort key",
                value: s.to_string(),
            })
    }
}

fn lenient_sort<'de, D>(deserializer: D) -> Result<Option<SortKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SortKey::parse_lenient))
}

fn default_sort() -> Option<SortKey> {
    Some(SortKey::PriceHighLow)
}

// ---------------------------------------------------------------------------
// Facet profile
// ---------------------------------------------------------------------------

/// Which facet set the pipeline honours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetProfile {
    /// Search, kind, rarity tier, price, listed-only, sort.
    Basic,
    /// Basic plus theme, trait type, component slot theme and rarity score.
    #[default]
    Extended,
}

impl FacetProfile {
    pub fn is_extended(self) -> bool {
        self == FacetProfile::Extended
    }
}

impl std::fmt::Display for FacetProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacetProfile::Basic => write!(f, "basic"),
            FacetProfile::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for FacetProfile {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(FacetProfile::Basic),
            "extended" => Ok(FacetProfile::Extended),
            _ => Err(UnknownValue {
                vocabulary: "facet profile",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// Price bounds. A missing or zero bound is open on that side; the filter
/// is inactive when both are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    /// `(min, max)` when the range restricts anything.
    pub fn active_bounds(&self) -> Option<(f64, f64)> {
        let min = self.min.unwrap_or(0.0);
        let max = self.max.unwrap_or(0.0);
        if min > 0.0 || max > 0.0 {
            let upper = if max > 0.0 { max } else { f64::INFINITY };
            Some((min, upper))
        } else {
            None
        }
    }
}

/// Rarity-score bounds; missing bounds fall back to the full 0..=100 range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScoreRange {
    pub fn active_bounds(&self) -> Option<(f64, f64)> {
        let min = self.min.unwrap_or(rarity_score_bounds::MIN);
        let max = self.max.unwrap_or(rarity_score_bounds::MAX);
        if min > rarity_score_bounds::MIN || max < rarity_score_bounds::MAX {
            Some((min, max))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Component slot themes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotThemes {
    pub strap: BTreeSet<Theme>,
    pub dial: BTreeSet<Theme>,
    pub item: BTreeSet<Theme>,
    pub hologram: BTreeSet<Theme>,
}

impl SlotThemes {
    pub fn get(&self, slot: TraitType) -> &BTreeSet<Theme> {
        match slot {
            TraitType::Strap => &self.strap,
            TraitType::Dial => &self.dial,
            TraitType::Item => &self.item,
            TraitType::Hologram => &self.hologram,
        }
    }

    fn get_mut(&mut self, slot: TraitType) -> &mut BTreeSet<Theme> {
        match slot {
            TraitType::Strap => &mut self.strap,
            TraitType::Dial => &mut self.dial,
            TraitType::Item => &mut self.item,
            TraitType::Hologram => &mut self.hologram,
        }
    }

    /// Populated slots only, in slot order.
    pub fn populated(&self) -> Vec<(TraitType, &BTreeSet<Theme>)> {
        TraitType::ALL
            .into_iter()
            .map(|slot| (slot, self.get(slot)))
            .filter(|(_, set)| !set.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        TraitType::ALL.into_iter().all(|slot| self.get(slot).is_empty())
    }
}

// ---------------------------------------------------------------------------
// FilterConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub profile: FacetProfile,
    /// Case-insensitive substring; empty = no search.
    pub search: String,
    /// "All" toggle. Only exclusive with `listed_only`; never filters.
    pub show_all: bool,
    pub listed_only: bool,
    pub watch: bool,
    #[serde(rename = "trait")]
    pub trait_kind: bool,
    pub tiers: BTreeSet<RarityTier>,
    pub themes: BTreeSet<Theme>,
    pub trait_types: BTreeSet<TraitType>,
    pub slot_themes: SlotThemes,
    pub price: PriceRange,
    pub rarity_score: ScoreRange,
    #[serde(default = "default_sort", deserialize_with = "lenient_sort")]
    pub sort: Option<SortKey>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            profile: FacetProfile::default(),
            search: String::new(),
            show_all: false,
            listed_only: false,
            watch: false,
            trait_kind: false,
            tiers: BTreeSet::new(),
            themes: BTreeSet::new(),
            trait_types: BTreeSet::new(),
            slot_themes: SlotThemes::default(),
            price: PriceRange::default(),
            rarity_score: ScoreRange::default(),
            sort: default_sort(),
        }
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

impl FilterConfig {
    #[must_use]
    pub fn with_profile(mut self, profile: FacetProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    /// Turning "all" on or off always clears "listed".
    #[must_use]
    pub fn toggle_show_all(mut self) -> Self {
        self.show_all = !self.show_all;
        self.listed_only = false;
        self
    }

    /// Turning "listed" on or off always clears "all".
    #[must_use]
    pub fn toggle_listed(mut self) -> Self {
        self.listed_only = !self.listed_only;
        self.show_all = false;
        self
    }

    #[must_use]
    pub fn toggle_watch(mut self) -> Self {
        self.watch = !self.watch;
        self
    }

    #[must_use]
    pub fn toggle_trait(mut self) -> Self {
        self.trait_kind = !self.trait_kind;
        self
    }

    #[must_use]
    pub fn toggle_tier(mut self, tier: RarityTier) -> Self {
        toggle(&mut self.tiers, tier);
        self
    }

    #[must_use]
    pub fn toggle_theme(mut self, theme: Theme) -> Self {
        toggle(&mut self.themes, theme);
        self
    }

    #[must_use]
    pub fn toggle_trait_type(mut self, trait_type: TraitType) -> Self {
        toggle(&mut self.trait_types, trait_type);
        self
    }

    #[must_use]
    pub fn toggle_slot_theme(mut self, slot: TraitType, theme: Theme) -> Self {
        toggle(self.slot_themes.get_mut(slot), theme);
        self
    }

    #[must_use]
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price = PriceRange { min, max };
        self
    }

    #[must_use]
    pub fn with_score_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.rarity_score = ScoreRange { min, max };
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_listed_are_mutually_exclusive() {
        let cfg = FilterConfig::default().toggle_show_all();
        assert!(cfg.show_all);
        let cfg = cfg.toggle_listed();
        assert!(cfg.listed_only);
        assert!(!cfg.show_all);
        let cfg = cfg.toggle_show_all();
        assert!(cfg.show_all);
        assert!(!cfg.listed_only);
    }

    #[test]
    fn toggles_leave_previous_value_untouched() {
        let before = FilterConfig::default();
        let after = before.clone().toggle_tier(RarityTier::Rare);
        assert!(before.tiers.is_empty());
        assert!(after.tiers.contains(&RarityTier::Rare));
        let back = after.toggle_tier(RarityTier::Rare);
        assert_eq!(back, before);
    }

    #[test]
    fn price_range_zero_bounds_are_open() {
        assert_eq!(PriceRange::default().active_bounds(), None);
        assert_eq!(
            PriceRange { min: Some(0.0), max: Some(0.0) }.active_bounds(),
            None
        );
        assert_eq!(
            PriceRange { min: Some(500.0), max: None }.active_bounds(),
            Some((500.0, f64::INFINITY))
        );
        assert_eq!(
            PriceRange { min: None, max: Some(900.0) }.active_bounds(),
            Some((0.0, 900.0))
        );
    }

    #[test]
    fn score_range_full_span_is_inactive() {
        assert_eq!(ScoreRange::default().active_bounds(), None);
        assert_eq!(
            ScoreRange { min: Some(0.0), max: Some(100.0) }.active_bounds(),
            None
        );
        assert_eq!(
            ScoreRange { min: Some(80.0), max: None }.active_bounds(),
            Some((80.0, 100.0))
        );
    }

    #[test]
    fn unknown_sort_key_deserializes_to_identity() {
        let cfg: FilterConfig = serde_json::from_str(r#"{"sort":"newest-first"}"#).unwrap();
        assert_eq!(cfg.sort, None);
        let cfg: FilterConfig = serde_json::from_str(r#"{"sort":"most-rare"}"#).unwrap();
        assert_eq!(cfg.sort, Some(SortKey::MostRare));
        let cfg: FilterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.sort, Some(SortKey::PriceHighLow));
    }

    #[test]
    fn config_round_trips_trait_field_name() {
        let cfg = FilterConfig::default()
            .toggle_trait()
            .toggle_slot_theme(TraitType::Dial, Theme::Neon);
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["trait"], true);
        assert_eq!(json["slot_themes"]["dial"][0], "Neon");
        let back: FilterConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, cfg);
    }
}
