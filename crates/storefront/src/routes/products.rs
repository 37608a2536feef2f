//! Product route handlers.
//!
//! Listing with category filter, search, and sort; product detail with the
//! "you may also like" strip; review submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::seq::IndexedRandom;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use herbloom_core::ProductId;

use crate::api::ApiError;
use crate::api::AuthContext;
use crate::api::types::{Category, Product, Review, Variant};
use crate::catalog::{self, ProductFilter, ProductSort};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, SessionId};
use crate::state::AppState;
use crate::stores::{Flash, FlashStore};

/// Products fetched as the pool for the related strip.
const RELATED_POOL_SIZE: u32 = 12;

/// Products shown in the related strip.
const RELATED_COUNT: usize = 8;

// =============================================================================
// View Types
// =============================================================================

/// Product card data for listing grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub cutoff_price: Option<String>,
    pub image: Option<String>,
    pub in_stock: bool,
}

/// Variant display data for the detail page.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub pack_size: String,
    pub price: String,
    pub cutoff_price: Option<String>,
    pub stock: u32,
    pub in_stock: bool,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub benefits: Vec<String>,
    pub cures: Vec<String>,
    pub usage: Option<String>,
    pub ingredients: Vec<String>,
    pub variants: Vec<VariantView>,
}

/// Review display data.
#[derive(Clone)]
pub struct ReviewView {
    pub name: String,
    pub stars: String,
    pub comment: Option<String>,
    pub date: String,
}

/// Category display data for the filter sidebar.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub selected: bool,
    /// Listing URL with this category toggled in or out.
    pub toggle_link: String,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.min_price().to_string(),
            cutoff_price: product
                .first_variant()
                .and_then(|v| v.cutoff_price.as_ref())
                .map(ToString::to_string),
            image: product.primary_image().map(String::from),
            in_stock: product.variants.iter().any(Variant::is_in_stock),
        }
    }
}

impl From<&Variant> for VariantView {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id.to_string(),
            pack_size: variant.pack_size.clone(),
            price: variant.price.to_string(),
            cutoff_price: variant.cutoff_price.as_ref().map(ToString::to_string),
            stock: variant.stock,
            in_stock: variant.is_in_stock(),
        }
    }
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            images: product.base_images.clone(),
            benefits: product.benefits.clone(),
            cures: product.cures.clone(),
            usage: product.usage.clone(),
            ingredients: product.ingredients.clone(),
            variants: product.variants.iter().map(VariantView::from).collect(),
        }
    }
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        let filled = usize::from(review.rating.min(5));
        Self {
            name: review.name.clone(),
            stars: format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)),
            comment: review.comment.clone(),
            date: review.created_at.format("%B %-d, %Y").to_string(),
        }
    }
}

// =============================================================================
// Query and Form Types
// =============================================================================

/// Listing query parameters.
///
/// `category` holds a comma-separated list of category slugs or ids, so
/// multi-select survives a plain query string.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub sort: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
}

impl ListingQuery {
    /// Trimmed, non-empty search text.
    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Selected category slugs or ids.
    fn categories(&self) -> Vec<String> {
        self.category
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rebuild the query string with the given selections, keeping search
    /// and sort, dropping the page number.
    fn link_with_categories(&self, selections: &[String]) -> String {
        let mut parts = Vec::new();
        if let Some(q) = self.search() {
            parts.push(format!("q={}", urlencoding::encode(q)));
        }
        if !selections.is_empty() {
            parts.push(format!(
                "category={}",
                urlencoding::encode(&selections.join(","))
            ));
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("sort={}", urlencoding::encode(sort)));
        }
        if parts.is_empty() {
            "/products".to_string()
        } else {
            format!("/products?{}", parts.join("&"))
        }
    }
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    pub comment: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryView>,
    pub query: String,
    pub sort: &'static str,
    /// Comma-joined current selections, echoed as a hidden form field so a
    /// new search keeps the filter.
    pub category_param: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: usize,
    /// Page links append the page number to this.
    pub page_link_base: String,
    pub load_failed: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
    pub related: Vec<ProductCardView>,
    pub reviews: Vec<ReviewView>,
    pub signed_in: bool,
    pub flash: Option<Flash>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing.
///
/// A non-empty `q` goes to the backend search endpoint and its results
/// replace the catalog list; category filter and sort still apply on top.
/// If search is down, the catalog list is filtered locally so the page
/// still renders.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let sort = query
        .sort
        .as_deref()
        .map(ProductSort::parse)
        .unwrap_or_default();
    let selections = query.categories();

    let (fetched, local_query) = match query.search() {
        Some(q) => match state.api().search_products(q).await {
            Ok(found) => (Ok(found), None),
            Err(e) => {
                tracing::error!("Product search failed, filtering locally: {e}");
                (state.api().get_products(None).await, Some(q.to_string()))
            }
        },
        None => (state.api().get_products(None).await, None),
    };

    let all_categories = match state.api().get_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!("Failed to fetch categories: {e}");
            Vec::new()
        }
    };

    let (products, current_page, total_pages, total_count, load_failed) = match &fetched {
        Ok(list) => {
            let filter = ProductFilter {
                categories: selections.clone(),
                query: local_query,
            };
            let page = catalog::page(
                list,
                &all_categories,
                &filter,
                sort,
                query.page.unwrap_or(1),
            );
            (
                page.products
                    .into_iter()
                    .map(ProductCardView::from)
                    .collect(),
                page.current_page,
                page.total_pages,
                page.total_count,
                false,
            )
        }
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            (Vec::new(), 1, 1, 0, true)
        }
    };

    let categories = category_views(&all_categories, &selections, &query);

    let page_link_base = {
        let base = query.link_with_categories(&selections);
        if base.contains('?') {
            format!("{base}&page=")
        } else {
            format!("{base}?page=")
        }
    };

    ProductsIndexTemplate {
        products,
        categories,
        query: query.search().unwrap_or_default().to_string(),
        sort: sort.as_str(),
        category_param: selections.join(","),
        current_page,
        total_pages,
        total_count,
        page_link_base,
        load_failed,
    }
}

/// Build the sidebar views with per-category toggle links.
fn category_views(
    categories: &[Category],
    selections: &[String],
    query: &ListingQuery,
) -> Vec<CategoryView> {
    categories
        .iter()
        .filter(|c| c.is_active)
        .map(|category| {
            let id = category.id.to_string();
            let selected = selections
                .iter()
                .any(|sel| *sel == category.slug || *sel == id);

            let toggled: Vec<String> = if selected {
                selections
                    .iter()
                    .filter(|sel| **sel != category.slug && **sel != id)
                    .cloned()
                    .collect()
            } else {
                let mut with = selections.to_vec();
                with.push(category.slug.clone());
                with
            };

            CategoryView {
                name: category.name.clone(),
                selected,
                toggle_link: query.link_with_categories(&toggled),
            }
        })
        .collect()
}

/// Display the product detail page.
///
/// # Errors
///
/// Returns 404 when the product does not exist.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Response, AppError> {
    let product = state.api().get_product(&product_id).await?;

    let reviews = match state.api().get_reviews(&product_id).await {
        Ok(reviews) => reviews.iter().map(ReviewView::from).collect(),
        Err(e) => {
            tracing::error!("Failed to fetch reviews: {e}");
            Vec::new()
        }
    };

    let pool = match state.api().get_products(Some(RELATED_POOL_SIZE)).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!("Failed to fetch related products: {e}");
            Vec::new()
        }
    };
    let related = related_strip(&pool, &product_id);

    let flash = FlashStore::new(session).take().await;

    Ok(ProductShowTemplate {
        product: ProductDetailView::from(&product),
        related,
        reviews,
        signed_in: auth.is_some(),
        flash,
    }
    .into_response())
}

/// Draw up to [`RELATED_COUNT`] random products from the pool, excluding the
/// one being viewed.
fn related_strip(pool: &[Product], current: &ProductId) -> Vec<ProductCardView> {
    let candidates: Vec<&Product> = pool
        .iter()
        .filter(|p| p.is_active && p.id != *current)
        .collect();

    let mut rng = rand::rng();
    candidates
        .choose_multiple(&mut rng, RELATED_COUNT)
        .map(|p| ProductCardView::from(*p))
        .collect()
}

/// Submit a review and return to the product page.
///
/// # Errors
///
/// Returns an error response when the backend rejects the session token.
#[instrument(skip_all, fields(product_id = %product_id, rating = form.rating))]
pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
    Path(product_id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let back = format!("/products/{product_id}");
    let flash = FlashStore::new(session);

    if !(1..=5).contains(&form.rating) {
        flash
            .push(Flash::error("Rating must be between 1 and 5."))
            .await;
        return Ok(Redirect::to(&back).into_response());
    }

    let comment = form.comment.trim();
    if comment.is_empty() {
        flash
            .push(Flash::error("Please write a few words about the product."))
            .await;
        return Ok(Redirect::to(&back).into_response());
    }

    let ctx = AuthContext::new(session_id.value(), Some(record.token));
    match state
        .api()
        .add_review(&ctx, &product_id, &record.user.name, form.rating, comment)
        .await
    {
        Ok(_) => {
            flash.push(Flash::success("Thanks for your review!")).await;
        }
        Err(ApiError::Unauthorized) => return Err(AppError::Api(ApiError::Unauthorized)),
        Err(ApiError::Validation(message)) => {
            flash.push(Flash::error(message)).await;
        }
        Err(e) => {
            tracing::error!("Failed to submit review: {e}");
            flash
                .push(Flash::error("Could not submit your review. Please try again."))
                .await;
        }
    }

    Ok(Redirect::to(&back).into_response())
}
