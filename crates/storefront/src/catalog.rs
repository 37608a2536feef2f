//! Catalog listing logic: filter, sort, paginate.
//!
//! The backend hands the storefront the full active catalog in one call (the
//! range is small), so listing pages filter and sort in memory and slice
//! twelve products per page. Backend search results run through the same
//! pipeline, so category filters and sort orders apply to them too.

use crate::api::types::{Category, Product};

/// Products per listing page.
pub const PRODUCTS_PER_PAGE: usize = 12;

/// Listing sort order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    /// Most recently added first.
    #[default]
    Newest,
    /// Cheapest minimum variant price first.
    PriceLow,
    /// Highest maximum variant price first.
    PriceHigh,
    NameAsc,
    NameDesc,
}

impl ProductSort {
    /// Parse from URL parameter value, defaulting to newest.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price_low" => Self::PriceLow,
            "price_high" => Self::PriceHigh,
            "name_asc" => Self::NameAsc,
            "name_desc" => Self::NameDesc,
            _ => Self::Newest,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLow => "price_low",
            Self::PriceHigh => "price_high",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }
}

/// Listing filter parameters.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// Category selections, each an id or a slug. A product matches when its
    /// category matches any selection.
    pub categories: Vec<String>,
    /// Case-insensitive substring matched against name, description, and
    /// tags.
    pub query: Option<String>,
}

/// One page of a filtered, sorted listing.
#[derive(Debug)]
pub struct ProductPage<'a> {
    pub products: Vec<&'a Product>,
    /// 1-based, clamped into range.
    pub current_page: u32,
    /// At least 1, even for an empty result.
    pub total_pages: u32,
    /// Matches across all pages.
    pub total_count: usize,
}

/// Filter, sort, and slice the catalog into one listing page.
///
/// Inactive products never appear. Out-of-range page numbers clamp to the
/// nearest valid page so stale links still land somewhere sensible.
#[must_use]
pub fn page<'a>(
    products: &'a [Product],
    categories: &[Category],
    filter: &ProductFilter,
    sort: ProductSort,
    page: u32,
) -> ProductPage<'a> {
    let needle = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&Product> = products
        .iter()
        .filter(|p| p.is_active)
        .filter(|p| in_categories(p, &filter.categories, categories))
        .filter(|p| needle.as_deref().is_none_or(|q| text_matches(p, q)))
        .collect();

    sort_products(&mut matched, sort);
    paginate(matched, page)
}

/// Whether the product's category matches any selection, by id or by slug.
fn in_categories(product: &Product, selections: &[String], categories: &[Category]) -> bool {
    if selections.is_empty() {
        return true;
    }
    selections.iter().any(|sel| {
        product.category.as_str() == sel
            || categories
                .iter()
                .any(|c| c.slug == *sel && c.id == product.category)
    })
}

/// Case-insensitive substring match; `needle` is already lowercased.
fn text_matches(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
        || product
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
}

fn sort_products(products: &mut [&Product], sort: ProductSort) {
    match sort {
        ProductSort::Newest => products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        ProductSort::PriceLow => products.sort_by(|a, b| {
            a.min_price()
                .cmp(&b.min_price())
                .then_with(|| a.name.cmp(&b.name))
        }),
        ProductSort::PriceHigh => products.sort_by(|a, b| {
            b.max_price()
                .cmp(&a.max_price())
                .then_with(|| a.name.cmp(&b.name))
        }),
        ProductSort::NameAsc => products.sort_by_key(|p| p.name.to_lowercase()),
        ProductSort::NameDesc => {
            products.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()));
        }
    }
}

fn paginate(matched: Vec<&Product>, page: u32) -> ProductPage<'_> {
    let total_count = matched.len();
    #[allow(clippy::cast_possible_truncation)]
    let total_pages = total_count.div_ceil(PRODUCTS_PER_PAGE).max(1) as u32;
    let current_page = page.clamp(1, total_pages);
    let start = (current_page as usize - 1) * PRODUCTS_PER_PAGE;

    let products = matched
        .into_iter()
        .skip(start)
        .take(PRODUCTS_PER_PAGE)
        .collect();

    ProductPage {
        products,
        current_page,
        total_pages,
        total_count,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use herbloom_core::{CategoryId, Money, ProductId, VariantId};

    use crate::api::types::Variant;

    use super::*;

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

    fn product(id: &str, name: &str, category: &str, prices: &[i64], created: &str) -> Product {
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
            variants: prices
                .iter()
                .enumerate()
                .map(|(i, p)| variant(&format!("{id}-v{i}"), *p))
                .collect(),
            created_at: created.parse().unwrap(),
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

    fn names<'a>(page: &'a ProductPage<'a>) -> Vec<&'a str> {
        page.products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_price_low_sorts_by_minimum_variant_price() {
        let products = vec![
            product("p-1", "Amla", "c-1", &[250, 120], "2025-01-01T00:00:00Z"),
            product("p-2", "Brahmi", "c-1", &[150], "2025-01-02T00:00:00Z"),
            product("p-3", "Neem", "c-1", &[90, 400], "2025-01-03T00:00:00Z"),
        ];

        let page = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::PriceLow,
            1,
        );
        assert_eq!(names(&page), vec!["Neem", "Amla", "Brahmi"]);
    }

    #[test]
    fn test_price_high_sorts_by_maximum_variant_price() {
        let products = vec![
            product("p-1", "Amla", "c-1", &[250, 120], "2025-01-01T00:00:00Z"),
            product("p-2", "Brahmi", "c-1", &[150], "2025-01-02T00:00:00Z"),
            product("p-3", "Neem", "c-1", &[90, 400], "2025-01-03T00:00:00Z"),
        ];

        let page = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::PriceHigh,
            1,
        );
        assert_eq!(names(&page), vec!["Neem", "Amla", "Brahmi"]);
    }

    #[test]
    fn test_newest_first_with_id_tiebreak() {
        let products = vec![
            product("p-b", "Second", "c-1", &[100], "2025-03-01T00:00:00Z"),
            product("p-a", "First", "c-1", &[100], "2025-03-01T00:00:00Z"),
            product("p-c", "Latest", "c-1", &[100], "2025-04-01T00:00:00Z"),
        ];

        let page = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::Newest,
            1,
        );
        assert_eq!(names(&page), vec!["Latest", "First", "Second"]);
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let products = vec![
            product("p-1", "amla", "c-1", &[100], "2025-01-01T00:00:00Z"),
            product("p-2", "Brahmi", "c-1", &[100], "2025-01-01T00:00:00Z"),
            product("p-3", "Ashwagandha", "c-1", &[100], "2025-01-01T00:00:00Z"),
        ];

        let asc = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::NameAsc,
            1,
        );
        assert_eq!(names(&asc), vec!["amla", "Ashwagandha", "Brahmi"]);

        let desc = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::NameDesc,
            1,
        );
        assert_eq!(names(&desc), vec!["Brahmi", "Ashwagandha", "amla"]);
    }

    #[test]
    fn test_category_filter_matches_id_or_slug() {
        let products = vec![
            product("p-1", "Tulsi Tea", "c-tea", &[100], "2025-01-01T00:00:00Z"),
            product("p-2", "Neem Oil", "c-oil", &[100], "2025-01-02T00:00:00Z"),
            product("p-3", "Amla Juice", "c-juice", &[100], "2025-01-03T00:00:00Z"),
        ];
        let categories = vec![
            category("c-tea", "herbal-teas"),
            category("c-oil", "oils"),
            category("c-juice", "juices"),
        ];

        // By slug
        let by_slug = page(
            &products,
            &categories,
            &ProductFilter {
                categories: vec!["herbal-teas".to_string()],
                query: None,
            },
            ProductSort::Newest,
            1,
        );
        assert_eq!(names(&by_slug), vec!["Tulsi Tea"]);

        // By raw id, plus OR across selections
        let union = page(
            &products,
            &categories,
            &ProductFilter {
                categories: vec!["c-oil".to_string(), "juices".to_string()],
                query: None,
            },
            ProductSort::Newest,
            1,
        );
        assert_eq!(names(&union), vec!["Amla Juice", "Neem Oil"]);
    }

    #[test]
    fn test_text_filter_covers_name_description_and_tags() {
        let mut with_desc = product("p-1", "Chyawanprash", "c-1", &[100], "2025-01-01T00:00:00Z");
        with_desc.description = Some("Daily immunity booster".to_string());

        let mut with_tag = product("p-2", "Giloy Drops", "c-1", &[100], "2025-01-02T00:00:00Z");
        with_tag.tags = vec!["Immunity".to_string()];

        let other = product("p-3", "Hair Oil", "c-1", &[100], "2025-01-03T00:00:00Z");
        let products = vec![with_desc, with_tag, other];

        let filter = ProductFilter {
            categories: Vec::new(),
            query: Some("IMMUNITY".to_string()),
        };
        let page = page(&products, &[], &filter, ProductSort::NameAsc, 1);
        assert_eq!(names(&page), vec!["Chyawanprash", "Giloy Drops"]);
    }

    #[test]
    fn test_inactive_products_are_excluded() {
        let mut hidden = product("p-1", "Retired", "c-1", &[100], "2025-01-01T00:00:00Z");
        hidden.is_active = false;
        let products = vec![
            hidden,
            product("p-2", "Current", "c-1", &[100], "2025-01-02T00:00:00Z"),
        ];

        let page = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::Newest,
            1,
        );
        assert_eq!(names(&page), vec!["Current"]);
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_pagination_slices_twelve_per_page() {
        let products: Vec<Product> = (0..25)
            .map(|i| {
                product(
                    &format!("p-{i:02}"),
                    &format!("Product {i:02}"),
                    "c-1",
                    &[100],
                    &format!("2025-01-{:02}T00:00:00Z", i + 1),
                )
            })
            .collect();

        let first = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::NameAsc,
            1,
        );
        assert_eq!(first.products.len(), 12);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_count, 25);

        let last = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::NameAsc,
            3,
        );
        assert_eq!(last.products.len(), 1);
        assert_eq!(last.products[0].name, "Product 24");

        // Out-of-range pages clamp
        let clamped_low = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::NameAsc,
            0,
        );
        assert_eq!(clamped_low.current_page, 1);

        let clamped_high = page(
            &products,
            &[],
            &ProductFilter::default(),
            ProductSort::NameAsc,
            99,
        );
        assert_eq!(clamped_high.current_page, 3);
    }

    #[test]
    fn test_empty_catalog_has_one_empty_page() {
        let page = page(
            &[],
            &[],
            &ProductFilter::default(),
            ProductSort::Newest,
            1,
        );
        assert!(page.products.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }

    #[test]
    fn test_sort_parse_roundtrip() {
        for sort in [
            ProductSort::Newest,
            ProductSort::PriceLow,
            ProductSort::PriceHigh,
            ProductSort::NameAsc,
            ProductSort::NameDesc,
        ] {
            assert_eq!(ProductSort::parse(sort.as_str()), sort);
        }
        assert_eq!(ProductSort::parse("bogus"), ProductSort::Newest);
    }
}
