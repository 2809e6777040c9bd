//! Search, sort and facet filtering over product lists.
//!
//! Everything here is pure: functions take a product slice and return a new
//! `Vec`, leaving the input untouched. Browsing pages chain the stages in a
//! fixed order (search, season facets, origin facets, sort, page), which
//! [`browse`] runs in one call.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::data::{CategoryDocument, PriceRange, Product};
use crate::seasons::{is_in_season_at, season_status_at, Season, SeasonState};

/// Case-insensitive substring search over name, description and variety.
///
/// Surrounding whitespace in the query is ignored, so an absent or blank
/// query returns the input unchanged.
pub fn search_products(products: &[Product], query: Option<&str>) -> Vec<Product> {
    let needle = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return products.to_vec(),
    };

    products
        .iter()
        .filter(|product| {
            product.name.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle)
                || product
                    .variety
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle)
        })
        .cloned()
        .collect()
}

/// Sort orders offered by browsing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Alphabetical by name
    Name,
    /// Best month first, then peak season, then everything else
    Season,
    /// Best-month products as a block, then season order
    PeakSeason,
    /// Year-round products as a block, then the rest by name
    YearRound,
    /// Keep the input order
    #[default]
    Original,
}

impl SortMode {
    /// Parses a sort mode; unrecognised input keeps the original order.
    pub fn parse(s: &str) -> SortMode {
        match s.trim().to_lowercase().as_str() {
            "name" => SortMode::Name,
            "season" => SortMode::Season,
            "peak-season" => SortMode::PeakSeason,
            "year-round" => SortMode::YearRound,
            _ => SortMode::Original,
        }
    }
}

/// Season priority for ordering: 1 best month, 2 peak season, 3 otherwise.
pub fn season_priority(product: &Product, month: u32) -> u8 {
    let Some(seasons) = product.seasons.as_ref() else {
        return 3;
    };
    if seasons.best_months.contains(&month) {
        1
    } else if seasons
        .peak
        .iter()
        .any(|peak| peak.trim().eq_ignore_ascii_case(Season::from_month(month).name()))
    {
        2
    } else {
        3
    }
}

fn is_year_round(product: &Product) -> bool {
    product
        .seasons
        .as_ref()
        .is_some_and(|seasons| seasons.is_year_round())
}

fn by_name(a: &Product, b: &Product) -> std::cmp::Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

/// Returns a sorted copy of the products for the given month.
///
/// All orderings are stable: products with equal keys keep their input order.
pub fn sort_products(products: &[Product], mode: SortMode, month: u32) -> Vec<Product> {
    let mut sorted = products.to_vec();
    match mode {
        SortMode::Name => sorted.sort_by(by_name),
        SortMode::Season => sorted.sort_by_key(|product| season_priority(product, month)),
        SortMode::PeakSeason => sorted.sort_by_key(|product| {
            let best_month = season_status_at(product, month).state == SeasonState::BestMonth;
            (!best_month, season_priority(product, month))
        }),
        SortMode::YearRound => {
            let (mut year_round, mut rest): (Vec<Product>, Vec<Product>) =
                sorted.into_iter().partition(is_year_round);
            rest.sort_by(by_name);
            year_round.append(&mut rest);
            sorted = year_round;
        }
        SortMode::Original => {}
    }
    sorted
}

/// Featured products of a category, or its first two products if none are marked.
pub fn featured_products(document: &CategoryDocument) -> Vec<Product> {
    match document.featured.as_ref() {
        Some(featured) if !featured.is_empty() => featured.clone(),
        _ => document.products.iter().take(2).cloned().collect(),
    }
}

/// Price tiers shown to buyers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceTier {
    #[default]
    Wholesale,
    Retail,
}

/// Formats the display price for a tier, falling back to wholesale.
pub fn format_price(price_range: Option<&PriceRange>, tier: PriceTier) -> String {
    let Some(prices) = price_range else {
        return "Price on request".to_string();
    };

    let requested = match tier {
        PriceTier::Wholesale => prices.wholesale.as_ref(),
        PriceTier::Retail => prices.retail.as_ref(),
    };

    requested
        .or(prices.wholesale.as_ref())
        .cloned()
        .unwrap_or_else(|| "Contact for pricing".to_string())
}

/// A season filter choice on a browsing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonFacet {
    /// Anything not out of season this month
    InSeason,
    /// `available` is literally "year-round"
    YearRound,
    /// A named season appears in `peak`
    Named(Season),
}

impl SeasonFacet {
    /// Parses "in-season", "year-round" or a season name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<SeasonFacet> {
        match s.trim().to_lowercase().as_str() {
            "in-season" => Some(SeasonFacet::InSeason),
            "year-round" => Some(SeasonFacet::YearRound),
            other => Season::from_str(other).map(SeasonFacet::Named),
        }
    }

    fn matches(&self, product: &Product, month: u32) -> bool {
        match self {
            SeasonFacet::InSeason => is_in_season_at(product, month),
            SeasonFacet::YearRound => is_year_round(product),
            SeasonFacet::Named(season) => product.seasons.as_ref().is_some_and(|seasons| {
                seasons
                    .peak
                    .iter()
                    .any(|peak| peak.to_lowercase().contains(season.name()))
            }),
        }
    }
}

/// Keeps products matching any of the facets; no facets keeps everything.
pub fn filter_by_season(products: &[Product], facets: &[SeasonFacet], month: u32) -> Vec<Product> {
    if facets.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|product| facets.iter().any(|facet| facet.matches(product, month)))
        .cloned()
        .collect()
}

/// Keeps products with an origin containing any selected value (case-insensitive).
pub fn filter_by_origin(products: &[Product], origins: &[String]) -> Vec<Product> {
    let wanted: Vec<String> = origins
        .iter()
        .map(|origin| origin.trim().to_lowercase())
        .filter(|origin| !origin.is_empty())
        .collect();
    if wanted.is_empty() {
        return products.to_vec();
    }

    products
        .iter()
        .filter(|product| {
            product.origins().any(|origin| {
                let origin = origin.to_lowercase();
                wanted.iter().any(|selected| origin.contains(selected.as_str()))
            })
        })
        .cloned()
        .collect()
}

/// Distinct origins across the products, sorted.
pub fn available_origins(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .flat_map(Product::origins)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Product>,
    /// Number of products before paging
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Slices out a 1-based page. `per_page` of 0 is treated as 1; page 0 as 1.
pub fn paginate(products: &[Product], page: usize, per_page: usize) -> Page {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = products.len();
    let start = (page - 1).saturating_mul(per_page);

    let items = products
        .iter()
        .skip(start)
        .take(per_page)
        .cloned()
        .collect();

    Page {
        items,
        total,
        page,
        per_page,
        total_pages: total.div_ceil(per_page),
    }
}

/// Filters, ordering and paging chosen on a browsing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub seasons: Vec<SeasonFacet>,
    pub origins: Vec<String>,
    pub sort: SortMode,
    pub page: usize,
    pub per_page: usize,
}

impl Default for BrowseQuery {
    fn default() -> Self {
        Self {
            search: None,
            seasons: Vec::new(),
            origins: Vec::new(),
            sort: SortMode::Original,
            page: 1,
            per_page: 12,
        }
    }
}

/// Runs search, season facets, origin facets, sort and paging in that order.
pub fn browse(products: &[Product], query: &BrowseQuery, month: u32) -> Page {
    let found = search_products(products, query.search.as_deref());
    let in_season = filter_by_season(&found, &query.seasons, month);
    let from_origin = filter_by_origin(&in_season, &query.origins);
    let sorted = sort_products(&from_origin, query.sort, month);
    paginate(&sorted, query.page, query.per_page)
}
