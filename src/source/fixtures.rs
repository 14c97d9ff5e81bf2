//! Hard-coded marketplace data served by the mock source.

#[cfg(test)]
use crate::config::OWNER_ADDRESS;
use crate::listing::{AuctionTerms, Bid, Listing, Offer, OwnedAsset};
use crate::types::{
    AssetRecord, AssetVariant, AuctionState, Component, RarityTier, Theme, TraitType,
    WatchComponents,
};

const MARKET_WALLET: &str = "0x742d35Cc6C6C4532BC558B40c22469DDC38C95e1";

fn component(name: &str, theme: Theme, rarity_score: f64) -> Component {
    Component {
        name: name.to_string(),
        theme,
        rarity_score,
    }
}

/// Catalog with the session wallet at its default address.
#[cfg(test)]
pub fn catalog() -> Vec<AssetRecord> {
    catalog_for(OWNER_ADDRESS)
}

/// Six-record catalog; 1003 and 1006 belong to `owner`.
pub fn catalog_for(owner: &str) -> Vec<AssetRecord> {
    vec![
        AssetRecord {
            id: "1001".to_string(),
            name: "Neon Genesis Watch".to_string(),
            variant: AssetVariant::Watch {
                components: Some(WatchComponents {
                    strap: component("Cyber Strap Alpha", Theme::Neon, 89.3),
                    dial: component("Quantum Dial", Theme::Holographic, 92.1),
                    item: component("Power Core", Theme::Crystal, 88.4),
                    hologram: component("Genesis Hologram", Theme::Cyberpunk, 95.7),
                }),
            },
            theme: Theme::Cyberpunk,
            rarity_tier: RarityTier::UltraRare,
            rarity_score: 95.8,
            price: Some(3200.0),
            last_sold_price: Some(2500.0),
            is_listed: true,
            auction: None,
            token_id: "#1001".to_string(),
            owner: MARKET_WALLET.to_string(),
        },
        AssetRecord {
            id: "1002".to_string(),
            name: "Plasma Glow Effect".to_string(),
            variant: AssetVariant::Trait {
                trait_type: TraitType::Hologram,
                lore: None,
            },
            theme: Theme::Holographic,
            rarity_tier: RarityTier::SuperRare,
            rarity_score: 87.3,
            price: Some(1800.0),
            last_sold_price: Some(1200.0),
            is_listed: true,
            auction: None,
            token_id: "#1002".to_string(),
            owner: MARKET_WALLET.to_string(),
        },
        AssetRecord {
            id: "1003".to_string(),
            name: "Cyber Elite Timepiece".to_string(),
            variant: AssetVariant::Watch {
                components: Some(WatchComponents {
                    strap: component("Alloy Strap", Theme::Metallic, 71.0),
                    dial: component("Matrix Dial", Theme::Digital, 77.4),
                    item: component("Chrono Lens", Theme::Futuristic, 74.9),
                    hologram: component("Flux Hologram", Theme::Plasma, 81.5),
                }),
            },
            theme: Theme::Futuristic,
            rarity_tier: RarityTier::Rare,
            rarity_score: 76.2,
            price: Some(1200.0),
            last_sold_price: Some(800.0),
            is_listed: true,
            auction: Some(AuctionState {
                highest_bid: Some(950.0),
                ends_at: "5d".to_string(),
            }),
            token_id: "#1003".to_string(),
            owner: owner.to_string(),
        },
        AssetRecord {
            id: "1004".to_string(),
            name: "Divine Aura Boost".to_string(),
            variant: AssetVariant::Trait {
                trait_type: TraitType::Item,
                lore: Some(
                    "Forged in the ancient fires of Mount Chronos, it channels the power of time itself."
                        .to_string(),
                ),
            },
            theme: Theme::Golden,
            rarity_tier: RarityTier::Unique,
            rarity_score: 99.9,
            price: Some(7500.0),
            last_sold_price: Some(5000.0),
            is_listed: true,
            auction: None,
            token_id: "#1004".to_string(),
            owner: MARKET_WALLET.to_string(),
        },
        AssetRecord {
            id: "1005".to_string(),
            name: "Standard Timer".to_string(),
            variant: AssetVariant::Watch {
                components: Some(WatchComponents {
                    strap: component("Leather Strap", Theme::Classic, 40.2),
                    dial: component("Roman Dial", Theme::Classic, 47.8),
                    item: component("Brass Gear", Theme::Metallic, 44.0),
                    hologram: component("Faint Glow", Theme::Digital, 48.3),
                }),
            },
            theme: Theme::Classic,
            rarity_tier: RarityTier::Common,
            rarity_score: 45.1,
            price: Some(350.0),
            last_sold_price: Some(200.0),
            is_listed: true,
            auction: None,
            token_id: "#1005".to_string(),
            owner: MARKET_WALLET.to_string(),
        },
        AssetRecord {
            id: "1006".to_string(),
            name: "Electric Storm Effect".to_string(),
            variant: AssetVariant::Trait {
                trait_type: TraitType::Strap,
                lore: Some(
                    "Woven from captured lightning, it crackles whenever its wearer moves."
                        .to_string(),
                ),
            },
            theme: Theme::Neon,
            rarity_tier: RarityTier::SuperRare,
            rarity_score: 89.7,
            price: None,
            last_sold_price: Some(1500.0),
            is_listed: false,
            auction: None,
            token_id: "#1006".to_string(),
            owner: owner.to_string(),
        },
    ]
}

/// Holdings of the session wallet, matching the listing state in `catalog_for`.
pub fn collection() -> Vec<OwnedAsset> {
    vec![
        OwnedAsset {
            asset_id: "1003".to_string(),
            listing: Some(Listing::Both {
                price: 1200.0,
                auction: AuctionTerms {
                    starting_bid: 800.0,
                    reserve_price: Some(900.0),
                    duration_days: 5,
                    current_bid: Some(950.0),
                },
            }),
            bids: vec![Bid {
                amount: 950.0,
                bidder: "0xabcd00000000000000000000000000000000efgh".to_string(),
                placed_at: "2024-01-10".to_string(),
            }],
            offers: Vec::new(),
        },
        OwnedAsset {
            asset_id: "1006".to_string(),
            listing: None,
            bids: Vec::new(),
            offers: vec![Offer {
                amount: 1500.0,
                from: "0x1234000000000000000000000000000000005678".to_string(),
                expires: "2024-01-15".to_string(),
            }],
        },
    ]
}
