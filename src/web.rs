//! Read-only web API for catalog, profile and share pages
//!
//! Collections are only changed through an inventory store; the API serves
//! what is persisted.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use vibes_common::{Card, Variant, VariantCounts};

use crate::backend::{RemoteStore, SqliteBackend};
use crate::catalog::Catalog;
use crate::deck::Deck;
use crate::error::CollectionError;
use crate::filter::{CardFilter, FilterParams};
use crate::inventory::Inventory;
use crate::prices::{CardPrices, CollectionValue, DeckCost, PriceTable};
use crate::profile::{find_by_username, UserProfile};
use crate::stats::{CollectionStats, OwnershipStatus};

/// Shared application state
#[derive(Clone)]
struct AppState {
    backend: SqliteBackend,
    catalog: Arc<Catalog>,
    prices: Arc<PriceTable>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, StatusCode>;

/// Card with its current quotes
#[derive(Serialize)]
struct CardDetail {
    card: Card,
    prices: Option<CardPrices>,
}

/// Profile page header data
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileData {
    user_id: String,
    profile: UserProfile,
    stats: CollectionStats,
}

/// One tile on a collection page
#[derive(Serialize)]
struct CardView {
    card: Card,
    variants: VariantCounts,
    total: u32,
    status: OwnershipStatus,
    summary: String,
}

#[derive(Deserialize)]
struct DeckCostParams {
    #[serde(default = "default_variant")]
    variant: Variant,
}

fn default_variant() -> Variant {
    Variant::Normal
}

fn map_error(e: CollectionError) -> StatusCode {
    match e {
        CollectionError::UserNotFound(_) | CollectionError::CardNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        CollectionError::Value(_) => StatusCode::BAD_REQUEST,
        other => {
            log::error!("Request failed: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Resolve a username to `(user_id, profile, inventory)`. A collection that
/// fails to load is served as empty.
fn load_user(
    state: &AppState,
    username: &str,
) -> Result<(String, UserProfile, Inventory), StatusCode> {
    let (user_id, profile) = find_by_username(&state.backend, username).map_err(map_error)?;
    let inventory = match state.backend.load_collection(&user_id) {
        Ok(record) => record.map(|r| r.cards).unwrap_or_default(),
        Err(e) => {
            log::error!("Error loading collection {}: {}", user_id, e);
            Inventory::new()
        }
    };
    Ok((user_id, profile, inventory))
}

/// GET /api/cards?search=&color=&type=&rarity=&set=&sort=
async fn cards_handler(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<Card>> {
    let filter = CardFilter::try_from(params).map_err(map_error)?;
    let cards = filter
        .apply(&state.catalog, &Inventory::new())
        .into_iter()
        .cloned()
        .collect();
    Ok(ApiResponse::ok(cards))
}

/// GET /api/cards/{id}
async fn card_handler(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> ApiResult<CardDetail> {
    let card = state
        .catalog
        .get(&card_id)
        .cloned()
        .ok_or_else(|| map_error(CollectionError::CardNotFound(card_id.clone())))?;
    let prices = state.prices.get_card_prices(&card_id).cloned();
    Ok(ApiResponse::ok(CardDetail { card, prices }))
}

/// GET /api/users/{username}
async fn profile_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<ProfileData> {
    let (user_id, profile, inventory) = load_user(&state, &username)?;
    let stats = CollectionStats::compute(&state.catalog, &inventory);
    Ok(ApiResponse::ok(ProfileData {
        user_id,
        profile,
        stats,
    }))
}

/// GET /api/users/{username}/cards?owned=&sort=...
async fn user_cards_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<CardView>> {
    let (_, _, inventory) = load_user(&state, &username)?;
    let filter = CardFilter::try_from(params).map_err(map_error)?;

    let views = filter
        .apply(&state.catalog, &inventory)
        .into_iter()
        .map(|card| {
            let variants = inventory.variants_of(&card.id);
            CardView {
                card: card.clone(),
                variants,
                total: variants.total(),
                status: OwnershipStatus::of(&variants),
                summary: variants.summary(),
            }
        })
        .collect();
    Ok(ApiResponse::ok(views))
}

/// GET /api/users/{username}/value
async fn value_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<CollectionValue> {
    let (_, _, inventory) = load_user(&state, &username)?;
    Ok(ApiResponse::ok(state.prices.value_of(&inventory)))
}

/// POST /api/decks/cost?variant=foil
async fn deck_cost_handler(
    State(state): State<AppState>,
    Query(params): Query<DeckCostParams>,
    Json(deck): Json<Deck>,
) -> ApiResult<DeckCost> {
    Ok(ApiResponse::ok(state.prices.cost_of(&deck, params.variant)))
}

/// Build the web server router
pub fn create_router(
    backend: SqliteBackend,
    catalog: Arc<Catalog>,
    prices: Arc<PriceTable>,
) -> Router {
    let state = AppState {
        backend,
        catalog,
        prices,
    };

    Router::new()
        .route("/api/cards", get(cards_handler))
        .route("/api/cards/{id}", get(card_handler))
        .route("/api/users/{username}", get(profile_handler))
        .route("/api/users/{username}/cards", get(user_cards_handler))
        .route("/api/users/{username}/value", get(value_handler))
        .route("/api/decks/cost", post(deck_cost_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(
    backend: SqliteBackend,
    catalog: Arc<Catalog>,
    port: u16,
) -> crate::Result<()> {
    let prices = Arc::new(PriceTable::load(&backend));
    let app = create_router(backend, catalog, prices);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Web API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
