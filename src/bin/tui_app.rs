use std::collections::BTreeSet;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct AuctionResponse {
    pub highest_bid: Option<f64>,
    pub ends_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct AssetResponse {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub trait_type: Option<String>,
    pub theme: String,
    pub rarity_tier: String,
    pub rarity_score: f64,
    pub price: Option<f64>,
    pub last_sold_price: Option<f64>,
    pub is_listed: bool,
    pub auction: Option<AuctionResponse>,
    pub listing_mode: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct CatalogResponse {
    pub total: usize,
    pub showing: usize,
    pub sort: Option<String>,
    pub profile: Option<String>,
    pub assets: Vec<AssetResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentResponse {
    pub name: String,
    pub theme: String,
    pub rarity_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentsResponse {
    pub strap: ComponentResponse,
    pub dial: ComponentResponse,
    pub item: ComponentResponse,
    pub hologram: ComponentResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct AssetDetailResponse {
    #[serde(flatten)]
    pub asset: AssetResponse,
    pub components: Option<ComponentsResponse>,
    pub lore: Option<String>,
    pub token_id: String,
    pub owner_short: String,
    pub owner_url: String,
    pub token_url: String,
    pub owned_by_session: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct HealthResponse {
    pub catalog_loaded: bool,
    pub total_assets: usize,
    pub owned_assets: usize,
    pub queries_served: u64,
    pub actions_logged: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct LatencyResponse {
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
    pub sample_count: u64,
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Tier labels bound to keys 1-5.
pub const TIERS: [&str; 5] = ["Common", "Rare", "Super Rare", "Ultra Rare", "Unique"];

/// (wire value, label) in the order `s` cycles through them.
pub const SORT_KEYS: [(&str, &str); 6] = [
    ("price-high-low", "Price: High to Low"),
    ("price-low-high", "Price: Low to High"),
    ("most-rare", "Most Rare"),
    ("least-rare", "Least Rare"),
    ("rarity-score-high", "Rarity Score: High"),
    ("rarity-score-low", "Rarity Score: Low"),
];

/// Browser-side copy of the catalog filter, sent as GET /assets params.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub search: String,
    pub show_all: bool,
    pub listed: bool,
    pub watch: bool,
    pub trait_kind: bool,
    pub tiers: BTreeSet<usize>,
    /// Index into `SORT_KEYS`.
    pub sort: usize,
    pub basic_profile: bool,
}

impl QueryState {
    /// "All" and "Listed" are mutually exclusive.
    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
        if self.show_all {
            self.listed = false;
        }
    }

    pub fn toggle_listed(&mut self) {
        self.listed = !self.listed;
        if self.listed {
            self.show_all = false;
        }
    }

    pub fn toggle_tier(&mut self, index: usize) {
        if index >= TIERS.len() {
            return;
        }
        if !self.tiers.remove(&index) {
            self.tiers.insert(index);
        }
    }

    pub fn cycle_sort(&mut self) {
        self.sort = (self.sort + 1) % SORT_KEYS.len();
    }

    pub fn sort_label(&self) -> &'static str {
        SORT_KEYS[self.sort % SORT_KEYS.len()].1
    }

    /// Reset every facet. Search and profile survive.
    pub fn clear(&mut self) {
        *self = Self {
            search: std::mem::take(&mut self.search),
            basic_profile: self.basic_profile,
            ..Self::default()
        };
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        let flags = [
            ("all", self.show_all),
            ("listed", self.listed),
            ("watch", self.watch),
            ("trait", self.trait_kind),
        ];
        for (name, on) in flags {
            if on {
                params.push((name, "true".to_string()));
            }
        }
        if !self.tiers.is_empty() {
            let tiers: Vec<&str> = self.tiers.iter().map(|&i| TIERS[i]).collect();
            params.push(("tiers", tiers.join(",")));
        }
        params.push(("sort", SORT_KEYS[self.sort % SORT_KEYS.len()].0.to_string()));
        if self.basic_profile {
            params.push(("profile", "basic".to_string()));
        }
        params
    }
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub query: QueryState,
    /// Keystrokes go to the search box.
    pub search_mode: bool,
    pub catalog: CatalogResponse,
    pub detail: Option<AssetDetailResponse>,
    pub health: HealthResponse,
    pub latency: LatencyResponse,
    pub last_refresh: std::time::Instant,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            query: QueryState::default(),
            search_mode: false,
            catalog: CatalogResponse::default(),
            detail: None,
            health: HealthResponse::default(),
            latency: LatencyResponse::default(),
            last_refresh: std::time::Instant::now(),
            base_url,
        }
    }

    /// Fetch the detail view for one asset (GET /assets/:id).
    pub async fn fetch_detail(&mut self, client: &reqwest::Client, asset_id: &str) {
        let url = format!("{}/assets/{}", self.base_url, asset_id);
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<AssetDetailResponse>().await {
                    Ok(detail) => self.detail = Some(detail),
                    Err(e) => self.status = ConnectionStatus::Error(format!("parse error: {e}")),
                }
            }
            Ok(resp) => {
                self.status = ConnectionStatus::Error(format!("detail: HTTP {}", resp.status()));
            }
            Err(e) => self.status = ConnectionStatus::Error(format!("{e}")),
        }
    }

    pub fn clear_detail(&mut self) {
        self.detail = None;
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let assets_url = format!("{}/assets", self.base_url);
        let health_url = format!("{}/health", self.base_url);
        let latency_url = format!("{}/stats/latency", self.base_url);
        let params = self.query.to_params();

        let (assets_res, health_res, latency_res) = tokio::join!(
            client.get(&assets_url).query(&params).send(),
            client.get(&health_url).send(),
            client.get(&latency_url).send(),
        );

        let resp = match assets_res {
            Ok(resp) => resp,
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };
        if !resp.status().is_success() {
            self.status = ConnectionStatus::Error(format!("assets: HTTP {}", resp.status()));
            return;
        }

        match resp.json::<CatalogResponse>().await {
            Ok(catalog) => {
                self.catalog = catalog;
                self.status = ConnectionStatus::Connected;
                self.last_refresh = std::time::Instant::now();

                if let Ok(h) = health_res {
                    if let Ok(health) = h.json::<HealthResponse>().await {
                        self.health = health;
                    }
                }
                if let Ok(l) = latency_res {
                    if let Ok(latency) = l.json::<LatencyResponse>().await {
                        self.latency = latency;
                    }
                }
            }
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("parse error: {e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn showing_line(showing: usize, total: usize) -> String {
    format!("Showing {showing} of {total} items")
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p > 0.0 => format!("{p:.0} XIO"),
        _ => "—".to_string(),
    }
}

pub fn format_listing_mode(mode: &str) -> &'static str {
    match mode {
        "buy_now" => "Buy Now",
        "auction" => "Auction",
        "both" => "Buy/Bid",
        "make_offer" => "Offer",
        _ => "—",
    }
}

/// "SuperRare" -> "Super Rare".
pub fn format_tier(tier: &str) -> String {
    let mut out = String::with_capacity(tier.len() + 1);
    for (i, c) in tier.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

pub fn format_latency_us(us: Option<u64>) -> String {
    match us {
        Some(v) if v >= 1000 => format!("{:.1}ms", v as f64 / 1000.0),
        Some(v) => format!("{v}us"),
        None => "—".to_string(),
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[allow(dead_code)]
fn main() {
    // Built as part of src/bin/tui.rs; this target only exists because Cargo
    // auto-discovers every file under src/bin.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_sends_only_sort() {
        let q = QueryState::default();
        assert_eq!(q.to_params(), vec![("sort", "price-high-low".to_string())]);
    }

    #[test]
    fn params_carry_flags_tiers_and_profile() {
        let mut q = QueryState::default();
        q.search = "golden".to_string();
        q.trait_kind = true;
        q.toggle_tier(4);
        q.toggle_tier(2);
        q.basic_profile = true;
        let params = q.to_params();
        assert!(params.contains(&("search", "golden".to_string())));
        assert!(params.contains(&("trait", "true".to_string())));
        assert!(params.contains(&("tiers", "Super Rare,Unique".to_string())));
        assert!(params.contains(&("profile", "basic".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "watch"));
    }

    #[test]
    fn search_is_sent_as_typed() {
        let mut q = QueryState::default();
        q.search = " neon ".to_string();
        assert!(q.to_params().contains(&("search", " neon ".to_string())));
    }

    #[test]
    fn all_and_listed_are_exclusive() {
        let mut q = QueryState::default();
        q.toggle_listed();
        q.toggle_show_all();
        assert!(q.show_all);
        assert!(!q.listed);
        q.toggle_listed();
        assert!(q.listed);
        assert!(!q.show_all);
    }

    #[test]
    fn tier_toggle_is_symmetric_and_bounded() {
        let mut q = QueryState::default();
        q.toggle_tier(1);
        q.toggle_tier(1);
        q.toggle_tier(9);
        assert!(q.tiers.is_empty());
    }

    #[test]
    fn sort_cycles_back_to_start() {
        let mut q = QueryState::default();
        for _ in 0..SORT_KEYS.len() {
            q.cycle_sort();
        }
        assert_eq!(q.sort, 0);
        q.cycle_sort();
        assert_eq!(q.sort_label(), "Price: Low to High");
    }

    #[test]
    fn clear_keeps_search_and_profile() {
        let mut q = QueryState::default();
        q.search = "neon".to_string();
        q.basic_profile = true;
        q.watch = true;
        q.toggle_tier(0);
        q.cycle_sort();
        q.clear();
        assert_eq!(q.search, "neon");
        assert!(q.basic_profile);
        assert!(!q.watch);
        assert!(q.tiers.is_empty());
        assert_eq!(q.sort, 0);
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(showing_line(5, 6), "Showing 5 of 6 items");
        assert_eq!(format_price(Some(3200.0)), "3200 XIO");
        assert_eq!(format_price(None), "—");
        assert_eq!(format_listing_mode("both"), "Buy/Bid");
        assert_eq!(format_tier("UltraRare"), "Ultra Rare");
        assert_eq!(format_latency_us(Some(1500)), "1.5ms");
        assert_eq!(truncate("Cyber Elite Timepiece", 6), "Cyber…");
    }

    #[test]
    fn detail_parses_flattened_record() {
        let body = r##"{
            "id": "1003", "name": "Cyber Elite Timepiece", "kind": "Watch",
            "components": {
                "strap": {"name": "Alloy Strap", "theme": "Metallic", "rarity_score": 71.0},
                "dial": {"name": "Matrix Dial", "theme": "Digital", "rarity_score": 77.4},
                "item": {"name": "Chrono Lens", "theme": "Futuristic", "rarity_score": 74.9},
                "hologram": {"name": "Flux Hologram", "theme": "Plasma", "rarity_score": 81.5}
            },
            "theme": "Futuristic", "rarity_tier": "Rare", "rarity_score": 76.2,
            "price": 1200.0, "last_sold_price": 800.0, "is_listed": true,
            "auction": {"highest_bid": 950.0, "ends_at": "5d"},
            "token_id": "#1003", "owner": "0x1234",
            "listing_mode": "both", "owner_short": "0x1234", "owner_url": "u",
            "token_url": "t", "owned_by_session": true
        }"##;
        let detail: AssetDetailResponse = serde_json::from_str(body).unwrap();
        assert_eq!(detail.asset.listing_mode, "both");
        assert_eq!(detail.components.unwrap().dial.theme, "Digital");
        assert!(detail.asset.trait_type.is_none());
    }
}
