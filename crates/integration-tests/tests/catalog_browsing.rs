//! Catalog browsing behaviour: filtering, sorting and pagination exactly as
//! the listing page drives them, against fixture products.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, TimeZone, Utc};
use herbloom_core::{CategoryId, Money, ProductId, VariantId};
use herbloom_storefront::api::types::{Category, Product, Variant};
use herbloom_storefront::catalog::{self, PRODUCTS_PER_PAGE, ProductFilter, ProductSort};

// =============================================================================
// Fixtures
// =============================================================================

fn variant(id: &str, price: i64) -> Variant {
    Variant {
        id: VariantId::from(id),
        pack_size: "100g".to_string(),
        price: Money::from_major(price),
        cutoff_price: None,
        stock: 10,
        images: Vec::new(),
    }
}

/// A product with a single variant, created `age_days` before the fixture
/// epoch so lower ages sort as newer.
fn product(id: &str, name: &str, category: &str, price: i64, age_days: i64) -> Product {
    Product {
        id: ProductId::from(id),
        name: name.to_string(),
        description: None,
        base_images: Vec::new(),
        benefits: Vec::new(),
        cures: Vec::new(),
        usage: None,
        ingredients: Vec::new(),
        category: CategoryId::from(category),
        tags: Vec::new(),
        is_active: true,
        variants: vec![variant(&format!("{id}-v1"), price)],
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() - Duration::days(age_days),
    }
}

fn category(id: &str, slug: &str) -> Category {
    Category {
        id: CategoryId::from(id),
        name: slug.to_string(),
        slug: slug.to_string(),
        description: None,
        is_active: true,
    }
}

fn no_filter() -> ProductFilter {
    ProductFilter::default()
}

fn names<'a>(page: &'a catalog::ProductPage<'_>) -> Vec<&'a str> {
    page.products.iter().map(|p| p.name.as_str()).collect()
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn test_twelve_products_per_page() {
    let products: Vec<Product> = (0..30)
        .map(|i| product(&format!("p-{i:02}"), &format!("Product {i:02}"), "c-1", 100, i))
        .collect();

    let first = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 1);
    assert_eq!(first.products.len(), PRODUCTS_PER_PAGE);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.total_count, 30);

    let last = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 3);
    assert_eq!(last.products.len(), 6);
}

#[test]
fn test_page_numbers_clamp_into_range() {
    let products: Vec<Product> = (0..5)
        .map(|i| product(&format!("p-{i}"), &format!("Product {i}"), "c-1", 100, i))
        .collect();

    let too_high = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 99);
    assert_eq!(too_high.current_page, 1);
    assert_eq!(too_high.products.len(), 5);

    let zero = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 0);
    assert_eq!(zero.current_page, 1);
}

#[test]
fn test_empty_catalog_still_has_one_page() {
    let page = catalog::page(&[], &[], &no_filter(), ProductSort::Newest, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_count, 0);
    assert!(page.products.is_empty());
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn test_newest_first_is_the_default_order() {
    let products = vec![
        product("p-1", "Oldest", "c-1", 100, 30),
        product("p-2", "Newest", "c-1", 100, 1),
        product("p-3", "Middle", "c-1", 100, 15),
    ];

    let page = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["Newest", "Middle", "Oldest"]);
}

#[test]
fn test_newest_ties_break_by_id() {
    // Same timestamp, ids decide the order deterministically
    let products = vec![
        product("p-b", "Second", "c-1", 100, 5),
        product("p-a", "First", "c-1", 100, 5),
    ];

    let page = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["First", "Second"]);
}

#[test]
fn test_price_sort_uses_cheapest_variant() {
    let mut multi = product("p-1", "Sampler", "c-1", 900, 1);
    multi.variants.push(variant("p-1-v2", 80));
    let products = vec![multi, product("p-2", "Single", "c-1", 200, 2)];

    // The sampler's cheapest pack is 80, so it leads the low-to-high order
    // even though its dearest pack is 900
    let low = catalog::page(&products, &[], &no_filter(), ProductSort::PriceLow, 1);
    assert_eq!(names(&low), vec!["Sampler", "Single"]);

    let high = catalog::page(&products, &[], &no_filter(), ProductSort::PriceHigh, 1);
    assert_eq!(names(&high), vec!["Sampler", "Single"]);
}

#[test]
fn test_name_sorts_both_directions_case_insensitively() {
    let products = vec![
        product("p-1", "brahmi", "c-1", 100, 1),
        product("p-2", "Ashwagandha", "c-1", 100, 2),
        product("p-3", "Triphala", "c-1", 100, 3),
    ];

    let asc = catalog::page(&products, &[], &no_filter(), ProductSort::NameAsc, 1);
    assert_eq!(names(&asc), vec!["Ashwagandha", "brahmi", "Triphala"]);

    let desc = catalog::page(&products, &[], &no_filter(), ProductSort::NameDesc, 1);
    assert_eq!(names(&desc), vec!["Triphala", "brahmi", "Ashwagandha"]);
}

#[test]
fn test_sort_tokens_round_trip() {
    for sort in [
        ProductSort::Newest,
        ProductSort::PriceLow,
        ProductSort::PriceHigh,
        ProductSort::NameAsc,
        ProductSort::NameDesc,
    ] {
        assert_eq!(ProductSort::parse(sort.as_str()), sort);
    }
    // Unknown tokens fall back to the default
    assert_eq!(ProductSort::parse("cheapest"), ProductSort::default());
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn test_inactive_products_never_appear() {
    let mut hidden = product("p-1", "Hidden", "c-1", 100, 1);
    hidden.is_active = false;
    let products = vec![hidden, product("p-2", "Visible", "c-1", 100, 2)];

    let page = catalog::page(&products, &[], &no_filter(), ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["Visible"]);
    assert_eq!(page.total_count, 1);
}

#[test]
fn test_category_filter_matches_id_or_slug() {
    let categories = vec![category("c-teas", "herbal-teas"), category("c-oils", "oils")];
    let products = vec![
        product("p-1", "Tulsi Tea", "c-teas", 150, 1),
        product("p-2", "Neem Oil", "c-oils", 220, 2),
    ];

    let by_slug = ProductFilter {
        categories: vec!["herbal-teas".to_string()],
        query: None,
    };
    let page = catalog::page(&products, &categories, &by_slug, ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["Tulsi Tea"]);

    let by_id = ProductFilter {
        categories: vec!["c-oils".to_string()],
        query: None,
    };
    let page = catalog::page(&products, &categories, &by_id, ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["Neem Oil"]);
}

#[test]
fn test_multi_select_categories_union() {
    let categories = vec![category("c-teas", "herbal-teas"), category("c-oils", "oils")];
    let products = vec![
        product("p-1", "Tulsi Tea", "c-teas", 150, 1),
        product("p-2", "Neem Oil", "c-oils", 220, 2),
        product("p-3", "Churna", "c-powders", 180, 3),
    ];

    let filter = ProductFilter {
        categories: vec!["herbal-teas".to_string(), "oils".to_string()],
        query: None,
    };
    let page = catalog::page(&products, &categories, &filter, ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["Tulsi Tea", "Neem Oil"]);
}

#[test]
fn test_search_matches_name_description_and_tags() {
    let mut by_description = product("p-1", "Night Blend", "c-1", 100, 1);
    by_description.description = Some("Supports restful sleep".to_string());
    let mut by_tag = product("p-2", "Calm Churna", "c-1", 100, 2);
    by_tag.tags = vec!["sleep".to_string()];
    let products = vec![
        by_description,
        by_tag,
        product("p-3", "Sleepy Tea", "c-1", 100, 3),
        product("p-4", "Digestive Tonic", "c-1", 100, 4),
    ];

    let filter = ProductFilter {
        categories: Vec::new(),
        query: Some("SLEEP".to_string()),
    };
    let page = catalog::page(&products, &[], &filter, ProductSort::Newest, 1);
    assert_eq!(
        names(&page),
        vec!["Night Blend", "Calm Churna", "Sleepy Tea"]
    );
}

#[test]
fn test_search_and_category_compose() {
    let categories = vec![category("c-teas", "herbal-teas")];
    let products = vec![
        product("p-1", "Tulsi Tea", "c-teas", 150, 1),
        product("p-2", "Tulsi Drops", "c-oils", 320, 2),
    ];

    let filter = ProductFilter {
        categories: vec!["herbal-teas".to_string()],
        query: Some("tulsi".to_string()),
    };
    let page = catalog::page(&products, &categories, &filter, ProductSort::Newest, 1);
    assert_eq!(names(&page), vec!["Tulsi Tea"]);
}
