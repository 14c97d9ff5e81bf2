use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Asset record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub variant: AssetVariant,
    pub theme: Theme,
    pub rarity_tier: RarityTier,
    /// 0..=100, finer-grained than the tier.
    pub rarity_score: f64,
    /// Absent or 0 means offer-only.
    pub price: Option<f64>,
    pub last_sold_price: Option<f64>,
    pub is_listed: bool,
    /// Present only while the asset is under auction.
    pub auction: Option<AuctionState>,
    pub token_id: String,
    pub owner: String,
}

impl AssetRecord {
    pub fn kind(&self) -> AssetKind {
        match self.variant {
            AssetVariant::Watch { .. } => AssetKind::Watch,
            AssetVariant::Trait { .. } => AssetKind::Trait,
        }
    }

    pub fn trait_type(&self) -> Option<TraitType> {
        match &self.variant {
            AssetVariant::Trait { trait_type, .. } => Some(*trait_type),
            AssetVariant::Watch { .. } => None,
        }
    }

    pub fn components(&self) -> Option<&WatchComponents> {
        match &self.variant {
            AssetVariant::Watch { components } => components.as_ref(),
            AssetVariant::Trait { .. } => None,
        }
    }

    /// Price with "absent" folded to zero.
    pub fn effective_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    pub fn is_auction(&self) -> bool {
        self.auction.is_some()
    }

    /// How a buyer can acquire this asset right now.
    pub fn listing_mode(&self) -> ListingMode {
        let buy_now = self.is_listed && self.effective_price() > 0.0;
        match (buy_now, self.is_auction()) {
            (true, true) => ListingMode::Both,
            (false, true) => ListingMode::Auction,
            (true, false) => ListingMode::BuyNow,
            (false, false) => ListingMode::MakeOffer,
        }
    }
}

/// Kind-specific payload. Encoding the kind as a tagged variant keeps
/// `trait_type` on traits only and component themes on watches only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AssetVariant {
    Watch {
        components: Option<WatchComponents>,
    },
    Trait {
        trait_type: TraitType,
        lore: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Watch,
    Trait,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Watch => write!(f, "Watch"),
            AssetKind::Trait => write!(f, "Trait"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionState {
    pub highest_bid: Option<f64>,
    pub ends_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    BuyNow,
    Auction,
    Both,
    MakeOffer,
}

impl std::fmt::Display for ListingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ListingMode::BuyNow => "buy_now",
            ListingMode::Auction => "auction",
            ListingMode::Both => "both",
            ListingMode::MakeOffer => "make_offer",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Watch components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub theme: Theme,
    pub rarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchComponents {
    pub strap: Component,
    pub dial: Component,
    pub item: Component,
    pub hologram: Component,
}

impl WatchComponents {
    pub fn slot(&self, slot: TraitType) -> &Component {
        match slot {
            TraitType::Strap => &self.strap,
            TraitType::Dial => &self.dial,
            TraitType::Item => &self.item,
            TraitType::Hologram => &self.hologram,
        }
    }
}

// ---------------------------------------------------------------------------
// Closed vocabularies
// ---------------------------------------------------------------------------

/// Component slot of a watch, and the type of a standalone trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitType {
    Strap,
    Dial,
    Item,
    Hologram,
}

impl TraitType {
    pub const ALL: [TraitType; 4] = [
        TraitType::Strap,
        TraitType::Dial,
        TraitType::Item,
        TraitType::Hologram,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TraitType::Strap => "Strap",
            TraitType::Dial => "Dial",
            TraitType::Item => "Item",
            TraitType::Hologram => "Hologram",
        }
    }
}

impl std::fmt::Display for TraitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TraitType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TraitType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownValue::new("trait type", s))
    }
}

/// Ordinal rarity tiers, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RarityTier {
    Common,
    Rare,
    SuperRare,
    UltraRare,
    Unique,
}

impl RarityTier {
    pub const ALL: [RarityTier; 5] = [
        RarityTier::Common,
        RarityTier::Rare,
        RarityTier::SuperRare,
        RarityTier::UltraRare,
        RarityTier::Unique,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RarityTier::Common => "Common",
            RarityTier::Rare => "Rare",
            RarityTier::SuperRare => "Super Rare",
            RarityTier::UltraRare => "Ultra Rare",
            RarityTier::Unique => "Unique",
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for RarityTier {
    type Err = UnknownValue;

    /// Accepts the display label ("Super Rare") or a compact form
    /// ("superrare", "super_rare").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        RarityTier::ALL
            .into_iter()
            .find(|t| t.label().replace(' ', "").to_ascii_lowercase() == compact)
            .ok_or_else(|| UnknownValue::new("rarity tier", s))
    }
}

/// Named aesthetic themes. Closed vocabulary; new themes are added here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Theme {
    Cyberpunk,
    Futuristic,
    Classic,
    Neon,
    Golden,
    Holographic,
    Digital,
    Metallic,
    Plasma,
    Crystal,
    Alien,
    Aquatic,
    Cyber,
    Ancient,
    Traditional,
    Mystic,
    Ethereal,
}

impl Theme {
    pub const ALL: [Theme; 17] = [
        Theme::Cyberpunk,
        Theme::Futuristic,
        Theme::Classic,
        Theme::Neon,
        Theme::Golden,
        Theme::Holographic,
        Theme::Digital,
        Theme::Metallic,
        Theme::Plasma,
        Theme::Crystal,
        Theme::Alien,
        Theme::Aquatic,
        Theme::Cyber,
        Theme::Ancient,
        Theme::Traditional,
        Theme::Mystic,
        Theme::Ethereal,
    ];

    /// Themes offered as filter checkboxes for every component slot.
    pub const FILTER_VOCABULARY: [Theme; 10] = [
        Theme::Cyberpunk,
        Theme::Futuristic,
        Theme::Classic,
        Theme::Neon,
        Theme::Golden,
        Theme::Holographic,
        Theme::Digital,
        Theme::Metallic,
        Theme::Plasma,
        Theme::Crystal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Theme::Cyberpunk => "Cyberpunk",
            Theme::Futuristic => "Futuristic",
            Theme::Classic => "Classic",
            Theme::Neon => "Neon",
            Theme::Golden => "Golden",
            Theme::Holographic => "Holographic",
            Theme::Digital => "Digital",
            Theme::Metallic => "Metallic",
            Theme::Plasma => "Plasma",
            Theme::Crystal => "Crystal",
            Theme::Alien => "Alien",
            Theme::Aquatic => "Aquatic",
            Theme::Cyber => "Cyber",
            Theme::Ancient => "Ancient",
            Theme::Traditional => "Traditional",
            Theme::Mystic => "Mystic",
            Theme::Ethereal => "Ethereal",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Theme {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownValue::new("theme", s))
    }
}

/// A string that does not name any member of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary}: {value:?}")]
pub struct UnknownValue {
    pub vocabulary: &'static str,
    pub value: String,
}

impl UnknownValue {
    fn new(vocabulary: &'static str, value: &str) -> Self {
        Self {
            vocabulary,
            value: value.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// `0x742d35Cc6C6C4532BC558B40c22469DDC38C95e1` -> `0x742d...95e1`.
pub fn abbreviate_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_label_and_compact_forms() {
        assert_eq!("Super Rare".parse::<RarityTier>(), Ok(RarityTier::SuperRare));
        assert_eq!("superrare".parse::<RarityTier>(), Ok(RarityTier::SuperRare));
        assert_eq!("ultra_rare".parse::<RarityTier>(), Ok(RarityTier::UltraRare));
        assert!("legendary".parse::<RarityTier>().is_err());
    }

    #[test]
    fn tiers_are_ordered_low_to_high() {
        assert!(RarityTier::Common < RarityTier::Rare);
        assert!(RarityTier::UltraRare < RarityTier::Unique);
    }

    #[test]
    fn theme_parse_is_case_insensitive() {
        assert_eq!("golden".parse::<Theme>(), Ok(Theme::Golden));
        let err = "Gold".parse::<Theme>().unwrap_err();
        assert_eq!(err.vocabulary, "theme");
    }

    #[test]
    fn abbreviates_long_addresses_only() {
        assert_eq!(
            abbreviate_address("0x742d35Cc6C6C4532BC558B40c22469DDC38C95e1"),
            "0x742d...95e1"
        );
        assert_eq!(abbreviate_address("0x1234"), "0x1234");
        assert_eq!(abbreviate_address(""), "");
    }

    #[test]
    fn listing_mode_follows_price_and_auction() {
        let mut rec = AssetRecord {
            id: "x".into(),
            name: "x".into(),
            variant: AssetVariant::Trait {
                trait_type: TraitType::Dial,
                lore: None,
            },
            theme: Theme::Neon,
            rarity_tier: RarityTier::Rare,
            rarity_score: 50.0,
            price: None,
            last_sold_price: None,
            is_listed: false,
            auction: None,
            token_id: "#1".into(),
            owner: "0x0".into(),
        };
        assert_eq!(rec.listing_mode(), ListingMode::MakeOffer);
        rec.price = Some(10.0);
        rec.is_listed = true;
        assert_eq!(rec.listing_mode(), ListingMode::BuyNow);
        rec.auction = Some(AuctionState {
            highest_bid: None,
            ends_at: "7d".into(),
        });
        assert_eq!(rec.listing_mode(), ListingMode::Both);
        rec.price = Some(0.0);
        assert_eq!(rec.listing_mode(), ListingMode::Auction);
    }
}
