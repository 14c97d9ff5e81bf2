//! Owner-side listings: dialog drafts, validation, and how a listing shows
//! up on the catalog record.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_AUCTION_DAYS;
use crate::error::{AppError, Result};
use crate::types::{AssetRecord, AuctionState};

// ---------------------------------------------------------------------------
// Holdings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub amount: f64,
    pub bidder: String,
    pub placed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub amount: f64,
    pub from: String,
    pub expires: String,
}

/// An asset held by the session wallet, with its market activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedAsset {
    pub asset_id: String,
    pub listing: Option<Listing>,
    pub bids: Vec<Bid>,
    pub offers: Vec<Offer>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// Fixed price.
    Sale,
    Auction,
    /// Auction with a buy-now price.
    Both,
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ListingKind::Sale => "sale",
            ListingKind::Auction => "auction",
            ListingKind::Both => "both",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuctionTerms {
    pub starting_bid: f64,
    /// Hidden from bidders; the auction fails below it.
    pub reserve_price: Option<f64>,
    pub duration_days: u32,
    pub current_bid: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Listing {
    Sale { price: f64 },
    Auction { auction: AuctionTerms },
    Both { price: f64, auction: AuctionTerms },
}

/// Which part of a listing to take down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoveScope {
    Auction,
    Sale,
    #[default]
    All,
}

impl Listing {
    pub fn kind(&self) -> ListingKind {
        match self {
            Listing::Sale { .. } => ListingKind::Sale,
            Listing::Auction { .. } => ListingKind::Auction,
            Listing::Both { .. } => ListingKind::Both,
        }
    }

    pub fn buy_now_price(&self) -> Option<f64> {
        match self {
            Listing::Sale { price } | Listing::Both { price, .. } => Some(*price),
            Listing::Auction { .. } => None,
        }
    }

    pub fn auction(&self) -> Option<&AuctionTerms> {
        match self {
            Listing::Auction { auction } | Listing::Both { auction, .. } => Some(auction),
            Listing::Sale { .. } => None,
        }
    }

    /// What is left after removing `scope`; `None` means fully unlisted.
    pub fn without(self, scope: RemoveScope) -> Option<Listing> {
        match (self, scope) {
            (_, RemoveScope::All) => None,
            (Listing::Both { auction, .. }, RemoveScope::Sale) => Some(Listing::Auction { auction }),
            (Listing::Both { price, .. }, RemoveScope::Auction) => Some(Listing::Sale { price }),
            (Listing::Sale { .. }, RemoveScope::Sale) => None,
            (Listing::Auction { .. }, RemoveScope::Auction) => None,
            (other, _) => Some(other),
        }
    }

    /// Carry the running bid over from the listing being replaced.
    pub fn keeping_bid_from(mut self, previous: &Listing) -> Listing {
        let running = previous.auction().and_then(|a| a.current_bid);
        match &mut self {
            Listing::Auction { auction } | Listing::Both { auction, .. } => {
                auction.current_bid = running;
            }
            Listing::Sale { .. } => {}
        }
        self
    }

    /// Project the listing onto the catalog record buyers see.
    pub fn apply_to(&self, rec: &mut AssetRecord) {
        rec.is_listed = true;
        rec.price = self.buy_now_price();
        rec.auction = self.auction().map(|a| AuctionState {
            highest_bid: a.current_bid,
            ends_at: format!("{}d", a.duration_days),
        });
    }
}

/// Clear every listing field of a catalog record.
pub fn unlist(rec: &mut AssetRecord) {
    rec.is_listed = false;
    rec.price = None;
    rec.auction = None;
}

// ---------------------------------------------------------------------------
// Draft (dialog input)
// ---------------------------------------------------------------------------

/// A dialog field: typed text, or a number from a JSON client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftValue {
    Number(f64),
    Text(String),
}

impl DraftValue {
    fn is_blank(&self) -> bool {
        matches!(self, DraftValue::Text(s) if s.trim().is_empty())
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            DraftValue::Number(n) => Some(*n),
            DraftValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub kind: ListingKind,
    #[serde(default)]
    pub buy_now_price: Option<DraftValue>,
    #[serde(default)]
    pub starting_bid: Option<DraftValue>,
    #[serde(default)]
    pub reserve_price: Option<DraftValue>,
    #[serde(default)]
    pub duration_days: Option<DraftValue>,
}

fn present(value: &Option<DraftValue>) -> Option<&DraftValue> {
    value.as_ref().filter(|v| !v.is_blank())
}

fn positive_amount(field: &str, value: &Option<DraftValue>) -> Result<f64> {
    let raw = present(value)
        .ok_or_else(|| AppError::InvalidListing(format!("{field} is required")))?;
    match raw.as_f64() {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(AppError::InvalidListing(format!(
            "{field} must be a positive number"
        ))),
    }
}

impl ListingDraft {
    pub fn validate(&self) -> Result<Listing> {
        match self.kind {
            ListingKind::Sale => Ok(Listing::Sale {
                price: positive_amount("buy now price", &self.buy_now_price)?,
            }),
            ListingKind::Auction => Ok(Listing::Auction {
                auction: self.auction_terms()?,
            }),
            ListingKind::Both => Ok(Listing::Both {
                price: positive_amount("buy now price", &self.buy_now_price)?,
                auction: self.auction_terms()?,
            }),
        }
    }

    fn auction_terms(&self) -> Result<AuctionTerms> {
        let starting_bid = positive_amount("starting bid", &self.starting_bid)?;

        let reserve_price = match present(&self.reserve_price) {
            None => None,
            Some(_) => {
                let reserve = positive_amount("reserve price", &self.reserve_price)?;
                if reserve < starting_bid {
                    return Err(AppError::InvalidListing(
                        "reserve price cannot be below the starting bid".to_string(),
                    ));
                }
                Some(reserve)
            }
        };

        let duration_days = match present(&self.duration_days) {
            None => DEFAULT_AUCTION_DAYS,
            Some(raw) => match raw.as_f64() {
                Some(d) if d.fract() == 0.0 && d >= 1.0 && d <= f64::from(u32::MAX) => d as u32,
                _ => {
                    return Err(AppError::InvalidListing(
                        "duration must be a whole number of days, at least 1".to_string(),
                    ))
                }
            },
        };

        Ok(AuctionTerms {
            starting_bid,
            reserve_price,
            duration_days,
            current_bid: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures;
    use crate::types::ListingMode;

    fn text(s: &str) -> Option<DraftValue> {
        Some(DraftValue::Text(s.to_string()))
    }

    fn draft(kind: ListingKind) -> ListingDraft {
        ListingDraft {
            kind,
            buy_now_price: None,
            starting_bid: None,
            reserve_price: None,
            duration_days: None,
        }
    }

    #[test]
    fn sale_needs_positive_price() {
        let mut d = draft(ListingKind::Sale);
        assert!(matches!(d.validate(), Err(AppError::InvalidListing(_))));
        d.buy_now_price = text("abc");
        assert!(d.validate().is_err());
        d.buy_now_price = text("-3");
        assert!(d.validate().is_err());
        d.buy_now_price = text(" 2.5 ");
        assert_eq!(d.validate().unwrap(), Listing::Sale { price: 2.5 });
    }

    #[test]
    fn auction_defaults_duration_and_checks_reserve() {
        let mut d = draft(ListingKind::Auction);
        d.starting_bid = Some(DraftValue::Number(1.0));
        d.reserve_price = text("");
        d.duration_days = text("   ");
        let listing = d.validate().unwrap();
        let terms = listing.auction().unwrap();
        assert_eq!(terms.duration_days, DEFAULT_AUCTION_DAYS);
        assert_eq!(terms.reserve_price, None);

        d.reserve_price = text("0.5");
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("reserve"));

        d.reserve_price = text("1.5");
        d.duration_days = text("2.5");
        assert!(d.validate().is_err());
        d.duration_days = text("0");
        assert!(d.validate().is_err());
        d.duration_days = text("3");
        assert_eq!(d.validate().unwrap().auction().unwrap().duration_days, 3);
    }

    #[test]
    fn both_requires_price_and_bid() {
        let mut d = draft(ListingKind::Both);
        d.starting_bid = text("1");
        assert!(d.validate().is_err());
        d.buy_now_price = text("4");
        let listing = d.validate().unwrap();
        assert_eq!(listing.kind(), ListingKind::Both);
        assert_eq!(listing.buy_now_price(), Some(4.0));
    }

    #[test]
    fn removing_half_of_both_downgrades() {
        let terms = AuctionTerms {
            starting_bid: 1.0,
            reserve_price: None,
            duration_days: 7,
            current_bid: Some(1.2),
        };
        let both = Listing::Both { price: 3.0, auction: terms };
        assert_eq!(
            both.clone().without(RemoveScope::Sale),
            Some(Listing::Auction { auction: terms })
        );
        assert_eq!(
            both.clone().without(RemoveScope::Auction),
            Some(Listing::Sale { price: 3.0 })
        );
        assert_eq!(both.without(RemoveScope::All), None);
        assert_eq!(Listing::Sale { price: 3.0 }.without(RemoveScope::Sale), None);
        assert_eq!(
            Listing::Sale { price: 3.0 }.without(RemoveScope::Auction),
            Some(Listing::Sale { price: 3.0 })
        );
    }

    #[test]
    fn apply_and_unlist_update_catalog_record() {
        let mut rec = fixtures::catalog().remove(5);
        assert_eq!(rec.listing_mode(), ListingMode::MakeOffer);

        let mut d = draft(ListingKind::Auction);
        d.starting_bid = text("2");
        d.validate().unwrap().apply_to(&mut rec);
        assert!(rec.is_listed);
        assert_eq!(rec.price, None);
        assert_eq!(rec.auction.as_ref().unwrap().ends_at, "7d");
        assert_eq!(rec.listing_mode(), ListingMode::Auction);

        unlist(&mut rec);
        assert!(!rec.is_listed);
        assert!(rec.auction.is_none());
    }

    #[test]
    fn edit_keeps_running_bid() {
        let previous = fixtures::collection().remove(0).listing.unwrap();
        let mut d = draft(ListingKind::Auction);
        d.starting_bid = text("700");
        let next = d.validate().unwrap().keeping_bid_from(&previous);
        assert_eq!(next.auction().unwrap().current_bid, Some(950.0));
    }

    #[test]
    fn draft_accepts_numbers_and_strings() {
        let d: ListingDraft = serde_json::from_str(
            r#"{"kind":"both","buy_now_price":"3.5","starting_bid":1,"duration_days":"10"}"#,
        )
        .unwrap();
        let listing = d.validate().unwrap();
        assert_eq!(listing.buy_now_price(), Some(3.5));
        assert_eq!(listing.auction().unwrap().duration_days, 10);
    }
}
