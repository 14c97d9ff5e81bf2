//! Buyer and owner market intents. Nothing settles on-chain: an accepted
//! intent is handed to the `ActionLogger` task, which records it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::health::HealthState;
use crate::error::{AppError, Result};
use crate::listing::{DraftValue, OwnedAsset};
use crate::types::{abbreviate_address, AssetRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MarketAction {
    BuyNow { asset_id: String, price: f64 },
    PlaceBid { asset_id: String, amount: f64 },
    MakeOffer { asset_id: String, amount: f64 },
    AcceptBid { asset_id: String, amount: f64, bidder: String },
    AcceptOffer { asset_id: String, amount: f64, from: String },
}

impl MarketAction {
    pub fn asset_id(&self) -> &str {
        match self {
            MarketAction::BuyNow { asset_id, .. }
            | MarketAction::PlaceBid { asset_id, .. }
            | MarketAction::MakeOffer { asset_id, .. }
            | MarketAction::AcceptBid { asset_id, .. }
            | MarketAction::AcceptOffer { asset_id, .. } => asset_id,
        }
    }
}

/// Body of bid and offer requests.
#[derive(Debug, Clone, Deserialize)]
pub struct AmountInput {
    pub amount: DraftValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptKind {
    Bid,
    Offer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptInput {
    pub kind: AcceptKind,
    #[serde(default)]
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn positive(amount: &DraftValue) -> Result<f64> {
    match amount.as_f64() {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(AppError::InvalidAction(
            "amount must be a positive number".to_string(),
        )),
    }
}

pub fn buy_now(rec: &AssetRecord) -> Result<MarketAction> {
    match rec.price {
        Some(price) if rec.is_listed && price > 0.0 => Ok(MarketAction::BuyNow {
            asset_id: rec.id.clone(),
            price,
        }),
        _ => Err(AppError::InvalidAction(format!(
            "{} has no buy now price",
            rec.id
        ))),
    }
}

/// Bids must beat the current highest bid.
pub fn place_bid(rec: &AssetRecord, input: &AmountInput) -> Result<MarketAction> {
    let auction = rec
        .auction
        .as_ref()
        .ok_or_else(|| AppError::InvalidAction(format!("{} is not under auction", rec.id)))?;
    let amount = positive(&input.amount)?;
    if let Some(highest) = auction.highest_bid {
        if amount <= highest {
            return Err(AppError::InvalidAction(format!(
                "bid must exceed the highest bid of {highest}"
            )));
        }
    }
    Ok(MarketAction::PlaceBid {
        asset_id: rec.id.clone(),
        amount,
    })
}

/// Offers are open on any asset, listed or not.
pub fn make_offer(rec: &AssetRecord, input: &AmountInput) -> Result<MarketAction> {
    Ok(MarketAction::MakeOffer {
        asset_id: rec.id.clone(),
        amount: positive(&input.amount)?,
    })
}

pub fn accept(holding: &OwnedAsset, input: &AcceptInput) -> Result<MarketAction> {
    let missing = || {
        AppError::InvalidAction(format!(
            "no {:?} #{} on {}",
            input.kind, input.index, holding.asset_id
        ))
    };
    match input.kind {
        AcceptKind::Bid => {
            let bid = holding.bids.get(input.index).ok_or_else(missing)?;
            Ok(MarketAction::AcceptBid {
                asset_id: holding.asset_id.clone(),
                amount: bid.amount,
                bidder: bid.bidder.clone(),
            })
        }
        AcceptKind::Offer => {
            let offer = holding.offers.get(input.index).ok_or_else(missing)?;
            Ok(MarketAction::AcceptOffer {
                asset_id: holding.asset_id.clone(),
                amount: offer.amount,
                from: offer.from.clone(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Channel plumbing
// ---------------------------------------------------------------------------

/// Handler-side end of the action channel. Never waits on a full channel.
#[derive(Clone)]
pub struct ActionSink {
    tx: mpsc::Sender<MarketAction>,
}

impl ActionSink {
    pub fn new(tx: mpsc::Sender<MarketAction>) -> Self {
        Self { tx }
    }

    pub fn submit(&self, action: MarketAction) -> Result<()> {
        let asset_id = action.asset_id().to_string();
        self.tx.try_send(action).map_err(|e| {
            warn!(asset_id = %asset_id, "Action channel full or closed: {e}");
            AppError::ChannelSend(e.to_string())
        })
    }
}

/// Consumes market intents and logs them.
pub struct ActionLogger {
    rx: mpsc::Receiver<MarketAction>,
    health: Arc<HealthState>,
}

impl ActionLogger {
    pub fn new(rx: mpsc::Receiver<MarketAction>, health: Arc<HealthState>) -> Self {
        Self { rx, health }
    }

    pub async fn run(mut self) {
        while let Some(action) = self.rx.recv().await {
            log_action(&action);
            self.health.inc_actions_logged();
        }
    }
}

fn log_action(action: &MarketAction) {
    match action {
        MarketAction::BuyNow { asset_id, price } => {
            info!(event = "BUY_NOW", asset_id = %asset_id, price = price, "BUY NOW    | asset: {asset_id} | price: {price:.2}");
        }
        MarketAction::PlaceBid { asset_id, amount } => {
            info!(event = "PLACE_BID", asset_id = %asset_id, amount = amount, "PLACE BID  | asset: {asset_id} | amount: {amount:.2}");
        }
        MarketAction::MakeOffer { asset_id, amount } => {
            info!(event = "MAKE_OFFER", asset_id = %asset_id, amount = amount, "MAKE OFFER | asset: {asset_id} | amount: {amount:.2}");
        }
        MarketAction::AcceptBid { asset_id, amount, bidder } => {
            let who = abbreviate_address(bidder);
            info!(event = "ACCEPT_BID", asset_id = %asset_id, amount = amount, bidder = %who, "ACCEPT BID | asset: {asset_id} | amount: {amount:.2} | from: {who}");
        }
        MarketAction::AcceptOffer { asset_id, amount, from } => {
            let who = abbreviate_address(from);
            info!(event = "ACCEPT_OFFER", asset_id = %asset_id, amount = amount, from = %who, "ACCEPT OFFER | asset: {asset_id} | amount: {amount:.2} | from: {who}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures;

    fn amount(s: &str) -> AmountInput {
        AmountInput {
            amount: DraftValue::Text(s.to_string()),
        }
    }

    #[test]
    fn buy_now_needs_a_listed_price() {
        let catalog = fixtures::catalog();
        assert!(matches!(
            buy_now(&catalog[0]),
            Ok(MarketAction::BuyNow { price, .. }) if price == 3200.0
        ));
        assert!(buy_now(&catalog[5]).is_err());
    }

    #[test]
    fn bid_must_target_auction_and_beat_highest() {
        let catalog = fixtures::catalog();
        assert!(place_bid(&catalog[0], &amount("5000")).is_err());
        assert!(place_bid(&catalog[2], &amount("900")).is_err());
        assert!(place_bid(&catalog[2], &amount("950")).is_err());
        assert_eq!(
            place_bid(&catalog[2], &amount("1000")).unwrap(),
            MarketAction::PlaceBid {
                asset_id: "1003".to_string(),
                amount: 1000.0
            }
        );
    }

    #[test]
    fn offer_rejects_non_positive_amounts() {
        let catalog = fixtures::catalog();
        assert!(make_offer(&catalog[5], &amount("0")).is_err());
        assert!(make_offer(&catalog[5], &amount("ten")).is_err());
        assert!(make_offer(&catalog[5], &amount("12.5")).is_ok());
        assert!(matches!(
            make_offer(&catalog[5], &amount(" 7 ")),
            Ok(MarketAction::MakeOffer { amount, .. }) if amount == 7.0
        ));
    }

    #[test]
    fn accept_picks_indexed_bid_or_offer() {
        let collection = fixtures::collection();
        let bid = accept(&collection[0], &AcceptInput { kind: AcceptKind::Bid, index: 0 }).unwrap();
        assert_eq!(bid.asset_id(), "1003");
        assert!(accept(&collection[0], &AcceptInput { kind: AcceptKind::Offer, index: 0 }).is_err());
        let offer = accept(&collection[1], &AcceptInput { kind: AcceptKind::Offer, index: 0 }).unwrap();
        assert!(matches!(offer, MarketAction::AcceptOffer { amount, .. } if amount == 1500.0));
        assert!(accept(&collection[1], &AcceptInput { kind: AcceptKind::Offer, index: 3 }).is_err());
    }

    #[tokio::test]
    async fn logger_counts_consumed_actions() {
        let (tx, rx) = mpsc::channel(4);
        let health = Arc::new(HealthState::new());
        let logger = ActionLogger::new(rx, Arc::clone(&health));
        let sink = ActionSink::new(tx);

        sink.submit(MarketAction::MakeOffer { asset_id: "1006".into(), amount: 1.0 }).unwrap();
        sink.submit(MarketAction::BuyNow { asset_id: "1001".into(), price: 3200.0 }).unwrap();
        drop(sink);

        logger.run().await;
        assert_eq!(health.actions_logged(), 2);
    }

    #[test]
    fn full_channel_is_an_error_not_a_wait() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = ActionSink::new(tx);
        sink.submit(MarketAction::MakeOffer { asset_id: "1".into(), amount: 1.0 }).unwrap();
        let err = sink
            .submit(MarketAction::MakeOffer { asset_id: "1".into(), amount: 1.0 })
            .unwrap_err();
        assert!(matches!(err, AppError::ChannelSend(_)));
    }
}
