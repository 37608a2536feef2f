//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::{self, ProductFilter, ProductSort};
use crate::filters;
use crate::state::AppState;
use crate::stores::{Flash, FlashStore};

use super::products::ProductCardView;

// =============================================================================
// Static Copy
// =============================================================================

/// Hero banner content.
#[derive(Clone)]
pub struct HeroView {
    pub eyebrow: String,
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub button_url: String,
    pub image_path: String,
    pub image_alt: String,
}

impl Default for HeroView {
    fn default() -> Self {
        Self {
            eyebrow: "Rooted in Ayurveda".to_string(),
            title: "Herbal wellness, made honest".to_string(),
            subtitle: "Small-batch ayurvedic blends from growers we know. \
                       No fillers, no shortcuts."
                .to_string(),
            button_text: "Shop all products".to_string(),
            button_url: "/products".to_string(),
            image_path: "/static/images/hero.svg".to_string(),
            image_alt: "Fresh herbs laid out for preparation".to_string(),
        }
    }
}

/// One trust badge under the hero.
#[derive(Clone)]
pub struct BenefitView {
    /// Icon identifier matched by the stylesheet.
    pub icon: &'static str,
    pub title: &'static str,
    pub blurb: &'static str,
}

/// Static trust badges for the home page.
fn trust_badges() -> Vec<BenefitView> {
    vec![
        BenefitView {
            icon: "leaf",
            title: "Ayurvedic formulations",
            blurb: "Classical recipes, prepared the slow way.",
        },
        BenefitView {
            icon: "truck",
            title: "Free shipping over \u{20b9}500",
            blurb: "Delivered anywhere in India.",
        },
        BenefitView {
            icon: "shield",
            title: "Secure payments",
            blurb: "Pay online or choose cash on delivery.",
        },
        BenefitView {
            icon: "mortar",
            title: "Honest sourcing",
            blurb: "Single-origin herbs, tested batch by batch.",
        },
    ]
}

// =============================================================================
// Category Strip
// =============================================================================

/// One tile in the category strip.
#[derive(Clone)]
pub struct CategoryTileView {
    pub name: String,
    pub link: String,
}

// =============================================================================
// Template and Handler
// =============================================================================

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub hero: HeroView,
    pub benefits: Vec<BenefitView>,
    pub categories: Vec<CategoryTileView>,
    pub featured: Vec<ProductCardView>,
    pub flash: Option<Flash>,
}

/// Display the home page.
///
/// Product data comes from the cached catalog reads; either fetch failing
/// leaves its section empty rather than taking the page down.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let products = match state.api().get_products(None).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!("Failed to fetch products for home page: {e}");
            Vec::new()
        }
    };

    let categories = match state.api().get_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!("Failed to fetch categories for home page: {e}");
            Vec::new()
        }
    };

    let listing = catalog::page(
        &products,
        &categories,
        &ProductFilter::default(),
        ProductSort::Newest,
        1,
    );
    let featured = listing
        .products
        .iter()
        .map(|product| ProductCardView::from(*product))
        .collect();

    let category_tiles = categories
        .iter()
        .filter(|category| category.is_active)
        .map(|category| CategoryTileView {
            name: category.name.clone(),
            link: format!("/products?category={}", urlencoding::encode(&category.slug)),
        })
        .collect();

    let flash = FlashStore::new(session).take().await;

    HomeTemplate {
        hero: HeroView::default(),
        benefits: trust_badges(),
        categories: category_tiles,
        featured,
        flash,
    }
}
