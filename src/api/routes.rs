use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::actions::{self, AcceptInput, ActionSink, AmountInput, MarketAction};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::listing::{Bid, Listing, ListingDraft, Offer, OwnedAsset, RemoveScope};
use crate::pipeline::{compute_visible_with_stats, FacetProfile, FilterConfig, SortKey};
use crate::state::CatalogStore;
use crate::types::{
    abbreviate_address, AssetRecord, ListingMode, RarityTier, Theme, TraitType, UnknownValue,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<CatalogStore>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
    pub actions: ActionSink,
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/assets", get(get_assets))
        .route("/assets/query", post(query_assets))
        .route("/assets/:id", get(get_asset))
        .route("/assets/:id/buy", post(buy_asset))
        .route("/assets/:id/bid", post(bid_on_asset))
        .route("/assets/:id/offer", post(offer_on_asset))
        .route("/collection", get(get_collection))
        .route("/collection/:id", get(get_owned_asset))
        .route(
            "/collection/:id/listing",
            post(create_listing).put(edit_listing).delete(remove_listing),
        )
        .route("/collection/:id/accept", post(accept_bid_or_offer))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

/// Flat, URL-friendly form of `FilterConfig`. Lists are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct AssetsQuery {
    pub search: Option<String>,
    pub all: Option<bool>,
    pub listed: Option<bool>,
    pub watch: Option<bool>,
    #[serde(rename = "trait")]
    pub trait_kind: Option<bool>,
    pub tiers: Option<String>,
    pub themes: Option<String>,
    pub trait_types: Option<String>,
    pub strap_themes: Option<String>,
    pub dial_themes: Option<String>,
    pub item_themes: Option<String>,
    pub hologram_themes: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub sort: Option<String>,
    pub profile: Option<String>,
}

fn parse_list<T>(raw: Option<&str>) -> std::result::Result<BTreeSet<T>, UnknownValue>
where
    T: FromStr<Err = UnknownValue> + Ord,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

impl AssetsQuery {
    pub fn into_config(self) -> Result<FilterConfig> {
        let sort = match self.sort.as_deref() {
            None => Some(SortKey::PriceHighLow),
            Some(raw) => {
                let key = SortKey::parse_lenient(raw);
                if key.is_none() {
                    warn!(sort = raw, "Unknown sort key, keeping catalog order");
                }
                key
            }
        };
        let profile = match self.profile.as_deref() {
            None => FacetProfile::default(),
            Some(raw) => raw.parse()?,
        };

        let tiers: BTreeSet<RarityTier> = parse_list(self.tiers.as_deref())?;
        let themes: BTreeSet<Theme> = parse_list(self.themes.as_deref())?;
        let trait_types: BTreeSet<TraitType> = parse_list(self.trait_types.as_deref())?;
        let slots: [(TraitType, BTreeSet<Theme>); 4] = [
            (TraitType::Strap, parse_list(self.strap_themes.as_deref())?),
            (TraitType::Dial, parse_list(self.dial_themes.as_deref())?),
            (TraitType::Item, parse_list(self.item_themes.as_deref())?),
            (TraitType::Hologram, parse_list(self.hologram_themes.as_deref())?),
        ];

        let mut config = FilterConfig::default()
            .with_profile(profile)
            .with_search(self.search.unwrap_or_default())
            .with_price_range(self.min_price, self.max_price)
            .with_score_range(self.min_score, self.max_score)
            .with_sort(sort);
        if self.all.unwrap_or(false) {
            config = config.toggle_show_all();
        }
        if self.listed.unwrap_or(false) {
            config = config.toggle_listed();
        }
        if self.watch.unwrap_or(false) {
            config = config.toggle_watch();
        }
        if self.trait_kind.unwrap_or(false) {
            config = config.toggle_trait();
        }
        config = tiers.into_iter().fold(config, FilterConfig::toggle_tier);
        config = themes.into_iter().fold(config, FilterConfig::toggle_theme);
        config = trait_types.into_iter().fold(config, FilterConfig::toggle_trait_type);
        for (slot, set) in slots {
            config = set
                .into_iter()
                .fold(config, |cfg, theme| cfg.toggle_slot_theme(slot, theme));
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    pub scope: Option<RemoveScope>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AssetSummary {
    #[serde(flatten)]
    pub asset: AssetRecord,
    pub listing_mode: ListingMode,
}

impl From<&AssetRecord> for AssetSummary {
    fn from(rec: &AssetRecord) -> Self {
        Self {
            listing_mode: rec.listing_mode(),
            asset: rec.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Size of the full catalog.
    pub total: usize,
    /// Size of the visible subset.
    pub showing: usize,
    pub sort: Option<SortKey>,
    pub profile: FacetProfile,
    pub assets: Vec<AssetSummary>,
}

#[derive(Debug, Serialize)]
pub struct AssetDetailResponse {
    #[serde(flatten)]
    pub asset: AssetRecord,
    pub listing_mode: ListingMode,
    pub owner_short: String,
    pub owner_url: String,
    pub token_url: String,
    pub owned_by_session: bool,
}

#[derive(Debug, Serialize)]
pub struct OwnedAssetResponse {
    pub asset: AssetDetailResponse,
    pub listing: Option<Listing>,
    pub bids: Vec<Bid>,
    pub offers: Vec<Offer>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub catalog_loaded: bool,
    pub total_assets: usize,
    pub owned_assets: usize,
    pub queries_served: u64,
    pub actions_logged: u64,
}

#[derive(Debug, Serialize)]
pub struct LatencyResponse {
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
    pub sample_count: u64,
}

fn detail(state: &ApiState, asset: AssetRecord) -> AssetDetailResponse {
    AssetDetailResponse {
        listing_mode: asset.listing_mode(),
        owner_short: abbreviate_address(&asset.owner),
        owner_url: state.config.explorer_address_url(&asset.owner),
        token_url: state.config.explorer_token_url(&asset.token_id),
        owned_by_session: state.store.is_owned(&asset.id),
        asset,
    }
}

fn owned_response(state: &ApiState, holding: OwnedAsset) -> Result<OwnedAssetResponse> {
    let asset = state
        .store
        .get(&holding.asset_id)
        .ok_or_else(|| AppError::NotFound(holding.asset_id.clone()))?;
    Ok(OwnedAssetResponse {
        asset: detail(state, asset),
        listing: holding.listing,
        bids: holding.bids,
        offers: holding.offers,
    })
}

fn find_asset(state: &ApiState, id: &str) -> Result<AssetRecord> {
    state
        .store
        .get(id)
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

fn find_holding(state: &ApiState, id: &str) -> Result<OwnedAsset> {
    state
        .store
        .owned_asset(id)
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

fn run_query(state: &ApiState, config: &FilterConfig) -> CatalogResponse {
    let snapshot = state.store.snapshot();

    let started = Instant::now();
    let (visible, stats) = compute_visible_with_stats(&snapshot, config);
    state.latency.record(started.elapsed());
    state.health.inc_queries_served();

    debug!(
        "[FILTER] visible={} of {} rejected: search={} kind={} theme={} trait_type={} slot={} tier={} score={} price={} unlisted={}",
        stats.visible,
        stats.input,
        stats.rejected_search,
        stats.rejected_kind,
        stats.rejected_theme,
        stats.rejected_trait_type,
        stats.rejected_slot_theme,
        stats.rejected_tier,
        stats.rejected_rarity_score,
        stats.rejected_price,
        stats.rejected_unlisted,
    );

    CatalogResponse {
        total: snapshot.len(),
        showing: visible.len(),
        sort: config.sort,
        profile: config.profile,
        assets: visible.into_iter().map(AssetSummary::from).collect(),
    }
}

async fn get_assets(
    State(state): State<ApiState>,
    Query(params): Query<AssetsQuery>,
) -> Result<Json<CatalogResponse>> {
    let config = params.into_config()?;
    Ok(Json(run_query(&state, &config)))
}

async fn query_assets(
    State(state): State<ApiState>,
    Json(config): Json<FilterConfig>,
) -> Json<CatalogResponse> {
    Json(run_query(&state, &config))
}

async fn get_asset(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<AssetDetailResponse>> {
    let asset = find_asset(&state, &id)?;
    Ok(Json(detail(&state, asset)))
}

fn submit(state: &ApiState, action: MarketAction) -> Result<(StatusCode, Json<MarketAction>)> {
    state.actions.submit(action.clone())?;
    Ok((StatusCode::ACCEPTED, Json(action)))
}

async fn buy_asset(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<MarketAction>)> {
    let asset = find_asset(&state, &id)?;
    submit(&state, actions::buy_now(&asset)?)
}

async fn bid_on_asset(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(input): Json<AmountInput>,
) -> Result<(StatusCode, Json<MarketAction>)> {
    let asset = find_asset(&state, &id)?;
    submit(&state, actions::place_bid(&asset, &input)?)
}

async fn offer_on_asset(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(input): Json<AmountInput>,
) -> Result<(StatusCode, Json<MarketAction>)> {
    let asset = find_asset(&state, &id)?;
    submit(&state, actions::make_offer(&asset, &input)?)
}

// ---------------------------------------------------------------------------
// Collection handlers
// ---------------------------------------------------------------------------

async fn get_collection(State(state): State<ApiState>) -> Result<Json<Vec<OwnedAssetResponse>>> {
    let entries = state
        .store
        .collection()
        .into_iter()
        .map(|h| owned_response(&state, h))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(entries))
}

async fn get_owned_asset(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<OwnedAssetResponse>> {
    let holding = find_holding(&state, &id)?;
    Ok(Json(owned_response(&state, holding)?))
}

async fn create_listing(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(draft): Json<ListingDraft>,
) -> Result<(StatusCode, Json<OwnedAssetResponse>)> {
    let listing = draft.validate()?;
    let kind = listing.kind();
    state.store.create_listing(&id, listing)?;
    info!(asset_id = %id, kind = %kind, "Listing created");
    let holding = find_holding(&state, &id)?;
    Ok((StatusCode::CREATED, Json(owned_response(&state, holding)?)))
}

async fn edit_listing(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(draft): Json<ListingDraft>,
) -> Result<Json<OwnedAssetResponse>> {
    let listing = draft.validate()?;
    let kind = listing.kind();
    state.store.edit_listing(&id, listing)?;
    info!(asset_id = %id, kind = %kind, "Listing updated");
    let holding = find_holding(&state, &id)?;
    Ok(Json(owned_response(&state, holding)?))
}

async fn remove_listing(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<RemoveQuery>,
) -> Result<Json<OwnedAssetResponse>> {
    let scope = params.scope.unwrap_or_default();
    state.store.remove_listing(&id, scope)?;
    info!(asset_id = %id, scope = ?scope, "Listing removed");
    let holding = find_holding(&state, &id)?;
    Ok(Json(owned_response(&state, holding)?))
}

async fn accept_bid_or_offer(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(input): Json<AcceptInput>,
) -> Result<(StatusCode, Json<MarketAction>)> {
    let holding = find_holding(&state, &id)?;
    submit(&state, actions::accept(&holding, &input)?)
}

// ---------------------------------------------------------------------------
// Service handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        catalog_loaded: state.health.catalog_loaded(),
        total_assets: state.store.len(),
        owned_assets: state.store.collection().len(),
        queries_served: state.health.queries_served(),
        actions_logged: state.health.actions_logged(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50_us, p95_us, p99_us) = state.latency.percentiles();
    Json(LatencyResponse {
        p50_us,
        p95_us,
        p99_us,
        sample_count: state.latency.len(),
    })
}
