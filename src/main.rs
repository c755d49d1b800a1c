//! Driftwell Storefront - Headless Storefront Core Service

use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use driftwell_storefront::{
    can_add_to_cart, resolve_variant, CardView, Cart, Catalog, LineItem, Money, PriceView,
    Product, SelectionState, StorefrontError,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub carts: Arc<RwLock<HashMap<String, Cart>>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let catalog_path = std::env::var("CATALOG_PATH").unwrap_or_else(|_| "catalog.json".to_string());
    let raw = std::fs::read_to_string(&catalog_path)?;
    let catalog = Catalog::from_json_str(&raw)?;
    tracing::info!("loaded {} products from {}", catalog.len(), catalog_path);
    let state = AppState { catalog: Arc::new(catalog), carts: Arc::new(RwLock::new(HashMap::new())) };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "driftwell-storefront"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/card", post(card_view))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/count", get(cart_count))
        .route("/api/v1/cart/:session/items", post(add_to_cart))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("🚀 Driftwell storefront listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)] pub struct ListParams { pub page: Option<u32>, pub per_page: Option<u32>, pub featured: Option<bool> }
#[derive(Debug, Serialize)] pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: usize, pub page: u32 }

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Json<PaginatedResponse<Product>> {
    let page = p.page.unwrap_or(1).max(1); let per_page = p.per_page.unwrap_or(20).min(100) as usize;
    let filtered: Vec<&Product> = s.catalog.products().iter().filter(|prod| p.featured.map_or(true, |f| prod.featured == f)).collect();
    let total = filtered.len();
    let data = filtered.into_iter().skip((page as usize - 1) * per_page).take(per_page).cloned().collect();
    Json(PaginatedResponse { data, total, page })
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>, (StatusCode, String)> {
    s.catalog.find(&id).cloned().map(Json).ok_or((StatusCode::NOT_FOUND, StorefrontError::ProductNotFound.to_string()))
}

#[derive(Debug, Deserialize)] pub struct CardRequest { #[serde(default)] pub selection: Option<BTreeMap<String, String>> }
#[derive(Debug, Serialize)] pub struct CardResponse { #[serde(flatten)] pub view: CardView, pub price_display: String, pub compare_at_display: Option<String> }

/// Derived card state for one `(product, selection)` pair. Omitting the
/// selection yields the initial card: pre-seeded to the first in-stock
/// variant so a concrete price shows immediately.
async fn card_view(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<CardRequest>) -> Result<Json<CardResponse>, (StatusCode, String)> {
    let product = s.catalog.find(&id).ok_or((StatusCode::NOT_FOUND, StorefrontError::ProductNotFound.to_string()))?;
    let selection = match r.selection {
        Some(map) => SelectionState::from(map),
        None => SelectionState::seeded(product),
    };
    let view = CardView::project(product, &selection);
    let price_display = view.pricing.price.to_string();
    let compare_at_display = view.pricing.compare_at.as_ref().map(Money::to_string);
    Ok(Json(CardResponse { view, price_display, compare_at_display }))
}

#[derive(Debug, Deserialize)] pub struct AddLineItemRequest { pub product_id: String, #[serde(default)] pub selection: Option<BTreeMap<String, String>>, pub quantity: Option<u32> }
#[derive(Debug, Serialize)] pub struct LineItemResponse { pub product_id: String, pub variant_id: Option<String>, pub title: String, pub selected_options: BTreeMap<String, String>, pub quantity: u32, pub unit_price: Money, pub line_total: Money }
#[derive(Debug, Serialize)] pub struct CartResponse { pub id: String, pub session_id: String, pub items: Vec<LineItemResponse>, pub subtotal: Money, pub total_item_count: u32, pub updated_at: DateTime<Utc> }

fn cart_response(cart: &Cart) -> CartResponse {
    CartResponse {
        id: cart.id().to_string(),
        session_id: cart.session_id().to_string(),
        items: cart.items().iter().map(|i| LineItemResponse {
            product_id: i.product_id.clone(), variant_id: i.variant_id.clone(), title: i.title.clone(),
            selected_options: i.selected_options.clone(), quantity: i.quantity,
            unit_price: i.unit_price.clone(), line_total: i.line_total(),
        }).collect(),
        subtotal: cart.subtotal().clone(),
        total_item_count: cart.total_item_count(),
        updated_at: cart.updated_at(),
    }
}

fn drain_events(cart: &mut Cart) {
    for event in cart.take_events() {
        tracing::info!(event = ?event, "cart updated");
    }
}

/// Adds a line item, consulting the eligibility gate server-side: an
/// incomplete or out-of-stock selection is rejected, never silently added.
async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddLineItemRequest>) -> Result<(StatusCode, Json<CartResponse>), (StatusCode, String)> {
    let quantity = r.quantity.unwrap_or(1);
    if quantity == 0 { return Err((StatusCode::BAD_REQUEST, StorefrontError::InvalidQuantity.to_string())); }
    let product = s.catalog.find(&r.product_id).ok_or((StatusCode::NOT_FOUND, StorefrontError::ProductNotFound.to_string()))?;
    let selection = match r.selection {
        Some(map) => SelectionState::from(map),
        None => SelectionState::seeded(product),
    };
    let variant = resolve_variant(product, &selection);
    if !can_add_to_cart(product, variant) {
        return Err((StatusCode::CONFLICT, StorefrontError::NotAddable.to_string()));
    }
    let unit_price = PriceView::project(product, variant).price;
    let item = LineItem {
        id: Uuid::now_v7().to_string(),
        product_id: product.id.clone(),
        variant_id: variant.map(|v| v.id.clone()),
        title: product.title.clone(),
        selected_options: selection.snapshot(),
        quantity,
        unit_price: unit_price.clone(),
    };
    let mut carts = s.carts.write().await;
    let cart = carts.entry(session.clone()).or_insert_with(|| Cart::new(session.as_str(), unit_price.currency()));
    cart.add_line_item(item);
    drain_events(cart);
    Ok((StatusCode::CREATED, Json(cart_response(cart))))
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let carts = s.carts.read().await;
    carts.get(&session).map(|c| Json(cart_response(c))).ok_or((StatusCode::NOT_FOUND, StorefrontError::CartNotFound.to_string()))
}

async fn cart_count(State(s): State<AppState>, Path(session): Path<String>) -> Json<serde_json::Value> {
    let carts = s.carts.read().await;
    let count = carts.get(&session).map(Cart::total_item_count).unwrap_or(0);
    Json(serde_json::json!({"count": count}))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    let mut carts = s.carts.write().await;
    if let Some(cart) = carts.get_mut(&session) {
        cart.clear();
        drain_events(cart);
    }
    StatusCode::NO_CONTENT
}
