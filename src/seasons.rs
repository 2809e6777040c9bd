//! Seasonal availability classification.
//!
//! Classifies a product against a calendar month using its `seasons` block.
//! Every function comes in two forms: an `_at` variant taking the month
//! (1-12) explicitly, and a wrapper that reads the local wall clock. There is
//! no timezone handling; the month is whatever the local clock says.

use chrono::{Datelike, Local};
use serde::Serialize;

use crate::data::{Product, Seasons};

/// Canonical month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Returns the current local month (1-12).
pub fn current_month() -> u32 {
    Local::now().month()
}

/// Returns the name of a month (1-12), or `None` when out of range.
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Resolves a month name to its number (1-12).
///
/// Matching is case-insensitive: the input must be a prefix of the canonical
/// name, so "aug", "August" and "AUGUST" all resolve to 8. Empty input and
/// unknown names return `None`.
pub fn parse_month(name: &str) -> Option<u32> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|month| month.to_lowercase().starts_with(&needle))
        .map(|index| index as u32 + 1)
}

/// Parses a month range such as "August-March" into (start, end).
///
/// Splits on the first `-`. Returns `None` if either side does not resolve.
pub fn parse_month_range(range: &str) -> Option<(u32, u32)> {
    let (start, end) = range.split_once('-')?;
    Some((parse_month(start)?, parse_month(end)?))
}

/// Whether `month` lies in the inclusive range, wrapping past December.
pub fn month_in_range(month: u32, start: u32, end: u32) -> bool {
    if start <= end {
        (start..=end).contains(&month)
    } else {
        month >= start || month <= end
    }
}

/// Calendar seasons (northern hemisphere, by month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Returns all seasons in calendar order.
    pub fn all() -> &'static [Season] {
        &[Season::Spring, Season::Summer, Season::Fall, Season::Winter]
    }

    /// Maps a month to its season: spring 3-5, summer 6-8, fall 9-11,
    /// winter 12, 1, 2.
    pub fn from_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    /// Lowercase name as it appears in `peak` lists.
    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }

    /// Capitalised display label.
    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    /// The season that follows this one.
    pub fn next(&self) -> Season {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Fall,
            Season::Fall => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    /// Parses a season name, case-insensitively.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Season> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "fall" => Some(Season::Fall),
            "winter" => Some(Season::Winter),
            _ => None,
        }
    }
}

/// Per-product availability state, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonState {
    YearRound,
    BestMonth,
    PeakSeason,
    AvailableRange,
    OutOfSeason,
}

impl SeasonState {
    /// Display label for the state.
    pub fn label(&self) -> &'static str {
        match self {
            SeasonState::YearRound => "Available",
            SeasonState::BestMonth => "Peak Season",
            SeasonState::PeakSeason => "In Season",
            SeasonState::AvailableRange => "Available",
            SeasonState::OutOfSeason => "Out of Season",
        }
    }
}

/// Classification result for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStatus {
    pub in_season: bool,
    pub label: &'static str,
    pub state: SeasonState,
    /// Only set when out of season
    pub next_available: Option<String>,
}

impl SeasonStatus {
    fn new(state: SeasonState) -> Self {
        Self {
            in_season: state != SeasonState::OutOfSeason,
            label: state.label(),
            state,
            next_available: None,
        }
    }
}

/// Season status plus a sentence describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDetails {
    #[serde(flatten)]
    pub status: SeasonStatus,
    pub description: String,
}

fn peak_contains(seasons: &Seasons, season: Season) -> bool {
    seasons
        .peak
        .iter()
        .any(|peak| peak.trim().eq_ignore_ascii_case(season.name()))
}

fn in_available_range(seasons: &Seasons, month: u32) -> bool {
    seasons
        .available
        .as_deref()
        .and_then(parse_month_range)
        .is_some_and(|(start, end)| month_in_range(month, start, end))
}

/// Classifies a product for the given month. First matching rule wins:
/// no seasons block or "year-round", best month, peak season, month range,
/// otherwise out of season with a hint for when it comes back.
pub fn season_status_at(product: &Product, month: u32) -> SeasonStatus {
    let Some(seasons) = product.seasons.as_ref() else {
        return SeasonStatus::new(SeasonState::YearRound);
    };

    if seasons.is_year_round() {
        return SeasonStatus::new(SeasonState::YearRound);
    }
    if seasons.best_months.contains(&month) {
        return SeasonStatus::new(SeasonState::BestMonth);
    }
    if peak_contains(seasons, Season::from_month(month)) {
        return SeasonStatus::new(SeasonState::PeakSeason);
    }
    if in_available_range(seasons, month) {
        return SeasonStatus::new(SeasonState::AvailableRange);
    }

    SeasonStatus {
        next_available: Some(next_available(seasons, month)),
        ..SeasonStatus::new(SeasonState::OutOfSeason)
    }
}

/// Classifies a product for the current local month.
pub fn season_status(product: &Product) -> SeasonStatus {
    season_status_at(product, current_month())
}

/// Hint for when an out-of-season product is next available.
fn next_available(seasons: &Seasons, month: u32) -> String {
    if seasons.is_year_round() {
        return "Available year-round".to_string();
    }

    let mut best: Vec<u32> = seasons
        .best_months
        .iter()
        .copied()
        .filter(|m| (1..=12).contains(m))
        .collect();
    best.sort_unstable();
    if let Some(next) = best.iter().find(|m| **m > month).or(best.first()) {
        if let Some(name) = month_name(*next) {
            return name.to_string();
        }
    }

    if !seasons.peak.is_empty() {
        let mut season = Season::from_month(month).next();
        for _ in 0..Season::all().len() {
            if peak_contains(seasons, season) {
                return season.label().to_string();
            }
            season = season.next();
        }
    }

    // Only a range whose ends both name months is echoed back.
    if let Some(range) = seasons
        .available
        .as_deref()
        .filter(|available| parse_month_range(available).is_some())
    {
        return format!("Available {}", range);
    }

    "Check availability".to_string()
}

/// Whether the product is available in the given month (any state but out of season).
pub fn is_in_season_at(product: &Product, month: u32) -> bool {
    season_status_at(product, month).in_season
}

/// Whether the product is available this month.
pub fn is_in_season(product: &Product) -> bool {
    is_in_season_at(product, current_month())
}

/// Narrower availability check: year-round, or the month is a best month.
///
/// Ignores peak seasons and month ranges, so it can disagree with
/// [`is_in_season_at`]. Products without a seasons block count as available.
pub fn is_product_available_at(product: &Product, month: u32) -> bool {
    match product.seasons.as_ref() {
        None => true,
        Some(seasons) => seasons.is_year_round() || seasons.best_months.contains(&month),
    }
}

/// Narrower availability check for the current local month.
pub fn is_product_available(product: &Product) -> bool {
    is_product_available_at(product, current_month())
}

/// Status plus a human-readable description for the given month.
pub fn season_details_at(product: &Product, month: u32) -> SeasonDetails {
    let status = season_status_at(product, month);

    let description = if !status.in_season {
        let next = status.next_available.as_deref().unwrap_or("Check availability");
        format!("Next available: {}", next)
    } else {
        match product.seasons.as_ref() {
            None => "Available year-round".to_string(),
            Some(seasons) => describe_in_season(seasons),
        }
    };

    SeasonDetails {
        status,
        description,
    }
}

/// Status plus description for the current local month.
pub fn season_details(product: &Product) -> SeasonDetails {
    season_details_at(product, current_month())
}

fn describe_in_season(seasons: &Seasons) -> String {
    if !seasons.peak.is_empty() {
        let names: Vec<String> = seasons
            .peak
            .iter()
            .map(|peak| match Season::from_str(peak) {
                Some(season) => season.label().to_string(),
                None => peak.trim().to_string(),
            })
            .collect();
        return format!("Peak season: {}", names.join(", "));
    }

    let months: Vec<&str> = seasons
        .best_months
        .iter()
        .filter_map(|month| month_name(*month))
        .collect();
    if !months.is_empty() {
        return format!("Best months: {}", months.join(", "));
    }

    match seasons.available.as_deref() {
        Some(available) if seasons.is_year_round() => format!("Available {}", available),
        Some(available) => format!("Available: {}", available),
        None => "Available".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with(seasons: Option<Seasons>) -> Product {
        Product {
            id: "p".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            variety: None,
            origin: String::new(),
            image: None,
            specifications: Default::default(),
            seasons,
            nutrition: None,
            featured: None,
            price_range: None,
        }
    }

    fn seasons(available: Option<&str>, peak: &[&str], best: &[u32]) -> Option<Seasons> {
        Some(Seasons {
            available: available.map(str::to_string),
            peak: peak.iter().map(|p| p.to_string()).collect(),
            best_months: best.to_vec(),
            harvest_months: None,
        })
    }

    #[test]
    fn test_parse_month_prefix_and_case() {
        assert_eq!(parse_month("August"), Some(8));
        assert_eq!(parse_month("  march "), Some(3));
        assert_eq!(parse_month("DEC"), Some(12));
        assert_eq!(parse_month("Smarch"), None);
        assert_eq!(parse_month(""), None);
    }

    #[test]
    fn test_parse_month_range() {
        assert_eq!(parse_month_range("August-March"), Some((8, 3)));
        assert_eq!(parse_month_range("june - september"), Some((6, 9)));
        assert_eq!(parse_month_range("year-round"), None);
        assert_eq!(parse_month_range("June"), None);
    }

    #[test]
    fn test_month_in_range_wraps() {
        assert!(month_in_range(5, 3, 7));
        assert!(!month_in_range(8, 3, 7));
        assert!(month_in_range(12, 11, 2));
        assert!(month_in_range(1, 11, 2));
        assert!(!month_in_range(6, 11, 2));
    }

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Fall);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
    }

    #[test]
    fn test_missing_seasons_is_year_round() {
        let product = product_with(None);
        let status = season_status_at(&product, 6);
        assert_eq!(status.state, SeasonState::YearRound);
        assert_eq!(status.label, "Available");
        assert!(status.in_season);
    }

    #[test]
    fn test_priority_best_month_beats_peak_and_range() {
        let product = product_with(seasons(Some("March-June"), &["spring"], &[4]));
        assert_eq!(season_status_at(&product, 4).state, SeasonState::BestMonth);
        assert_eq!(season_status_at(&product, 5).state, SeasonState::PeakSeason);
        assert_eq!(season_status_at(&product, 6).state, SeasonState::AvailableRange);
        assert_eq!(season_status_at(&product, 7).state, SeasonState::OutOfSeason);
    }

    #[test]
    fn test_year_round_beats_best_month() {
        let product = product_with(seasons(Some("YEAR-ROUND"), &[], &[1]));
        assert_eq!(season_status_at(&product, 1).state, SeasonState::YearRound);
    }

    #[test]
    fn test_peak_match_is_case_insensitive() {
        let product = product_with(seasons(None, &["Summer"], &[]));
        let status = season_status_at(&product, 7);
        assert_eq!(status.state, SeasonState::PeakSeason);
        assert_eq!(status.label, "In Season");
    }

    #[test]
    fn test_wrapping_range_membership() {
        let product = product_with(seasons(Some("November-February"), &[], &[]));
        for month in [11, 12, 1, 2] {
            assert!(is_in_season_at(&product, month), "month {} should be in season", month);
        }
        for month in 3..=10 {
            assert!(!is_in_season_at(&product, month), "month {} should be out of season", month);
        }
    }

    #[test]
    fn test_unparseable_range_is_out_of_season() {
        let product = product_with(seasons(Some("Spring-ish"), &[], &[]));
        let status = season_status_at(&product, 4);
        assert_eq!(status.state, SeasonState::OutOfSeason);
        assert_eq!(status.next_available.as_deref(), Some("Check availability"));
    }

    #[test]
    fn test_next_available_from_best_months() {
        let product = product_with(seasons(None, &["summer"], &[9, 3, 5]));
        assert_eq!(
            season_status_at(&product, 4).next_available.as_deref(),
            Some("May")
        );
        // Nothing later this year wraps to the earliest best month.
        assert_eq!(
            season_status_at(&product, 10).next_available.as_deref(),
            Some("March")
        );
    }

    #[test]
    fn test_next_available_from_peak_walks_forward() {
        let product = product_with(seasons(None, &["spring", "fall"], &[]));
        // Summer: next season with a peak is fall.
        assert_eq!(
            season_status_at(&product, 7).next_available.as_deref(),
            Some("Fall")
        );
        // Winter: next is spring.
        assert_eq!(
            season_status_at(&product, 12).next_available.as_deref(),
            Some("Spring")
        );
    }

    #[test]
    fn test_next_available_echoes_range() {
        let product = product_with(seasons(Some("June-August"), &[], &[]));
        let status = season_status_at(&product, 1);
        assert_eq!(status.label, "Out of Season");
        assert_eq!(status.next_available.as_deref(), Some("Available June-August"));
    }

    #[test]
    fn test_classification_is_total() {
        let products = [
            product_with(None),
            product_with(seasons(Some("year-round"), &[], &[])),
            product_with(seasons(Some("August-March"), &["winter"], &[1, 2])),
            product_with(seasons(None, &[], &[])),
            product_with(seasons(Some("garbage"), &["monsoon"], &[13])),
        ];
        for product in &products {
            for month in 1..=12 {
                let status = season_status_at(product, month);
                assert_eq!(status.in_season, status.state != SeasonState::OutOfSeason);
                assert_eq!(is_in_season_at(product, month), status.in_season);
                assert_eq!(status.next_available.is_some(), !status.in_season);
            }
        }
    }

    #[test]
    fn test_product_available_ignores_peak_and_range() {
        let product = product_with(seasons(Some("January-December"), &["summer"], &[]));
        assert!(is_in_season_at(&product, 7));
        assert!(!is_product_available_at(&product, 7));

        let best = product_with(seasons(None, &[], &[7]));
        assert!(is_product_available_at(&best, 7));
        assert!(!is_product_available_at(&best, 8));

        let year_round = product_with(seasons(Some("Year-round"), &[], &[]));
        assert!(is_product_available_at(&year_round, 2));
        assert!(is_product_available_at(&product_with(None), 2));
    }

    #[test]
    fn test_details_prefers_peak_description() {
        let product = product_with(seasons(None, &["summer", "fall"], &[7]));
        let details = season_details_at(&product, 7);
        assert_eq!(details.description, "Peak season: Summer, Fall");
        assert_eq!(details.status.state, SeasonState::BestMonth);
    }

    #[test]
    fn test_details_falls_back_to_best_months_then_available() {
        let best = product_with(seasons(None, &[], &[3, 4]));
        assert_eq!(season_details_at(&best, 3).description, "Best months: March, April");

        let ranged = product_with(seasons(Some("May-July"), &[], &[]));
        assert_eq!(season_details_at(&ranged, 6).description, "Available: May-July");

        let year_round = product_with(seasons(Some("year-round"), &[], &[]));
        assert_eq!(season_details_at(&year_round, 6).description, "Available year-round");
    }

    #[test]
    fn test_details_out_of_season_uses_next_available() {
        let product = product_with(seasons(None, &[], &[10]));
        let details = season_details_at(&product, 2);
        assert!(!details.status.in_season);
        assert_eq!(details.description, "Next available: October");
    }

    #[test]
    fn test_current_month_is_valid() {
        let month = current_month();
        assert!((1..=12).contains(&month));
        assert!(month_name(month).is_some());
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}
