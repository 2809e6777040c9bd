//! Command-line interface parsing for the produce catalog
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a `CatalogConfig` plus the per-command inputs (category, month,
//! browse filters).

use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use thiserror::Error;

use crate::config::{CatalogConfig, SourceLocation};
use crate::data::Category;
use crate::search::{BrowseQuery, SeasonFacet, SortMode};
use crate::seasons::current_month;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified category is not recognized
    #[error("Invalid category: '{0}'. Valid categories: vegetables, fruits, crops")]
    InvalidCategory(String),

    /// The specified season filter is not recognized
    #[error("Invalid season filter: '{0}'. Valid filters: in-season, year-round, spring, summer, fall, winter")]
    InvalidSeasonFacet(String),

    /// Month outside 1-12
    #[error("Invalid month: {0}. Months run from 1 to 12")]
    InvalidMonth(u32),
}

/// Produce catalog - browse categories and check what is in season
#[derive(Parser, Debug)]
#[command(name = "producecat")]
#[command(about = "Browse the produce catalog and check seasonal availability")]
#[command(version)]
pub struct Cli {
    /// Directory or base URL holding vegetables.json, fruits.json and crops.json
    #[arg(long, env = "PRODUCECAT_SOURCE", default_value = "data")]
    pub source: String,

    /// Seconds a fetched category stays fresh
    #[arg(long, env = "PRODUCECAT_TTL_SECS", default_value_t = 300)]
    pub ttl_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "PRODUCECAT_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Catalog commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show one category with the season status of each product
    Category {
        /// vegetables, fruits or crops
        name: String,
    },
    /// Summarise all categories (fetched concurrently)
    All,
    /// Show a single product by id
    Product {
        id: String,
    },
    /// Search, filter, sort and page a category
    Browse(BrowseArgs),
    /// Show season status and description for a product
    Season {
        id: String,
        /// Month to classify against (1-12), defaults to the current month
        #[arg(long)]
        month: Option<u32>,
    },
}

/// Arguments for the browse command
#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// vegetables, fruits or crops
    pub category: String,

    /// Free-text search over name, description and variety
    #[arg(long)]
    pub query: Option<String>,

    /// Season filter, repeatable: in-season, year-round, spring, summer, fall, winter
    #[arg(long = "season", value_name = "FILTER")]
    pub seasons: Vec<String>,

    /// Origin filter, repeatable
    #[arg(long = "origin", value_name = "ORIGIN")]
    pub origins: Vec<String>,

    /// name, season, peak-season or year-round; anything else keeps catalog order
    #[arg(long, default_value = "original")]
    pub sort: String,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = 12)]
    pub per_page: usize,

    /// Month to classify against (1-12), defaults to the current month
    #[arg(long)]
    pub month: Option<u32>,
}

/// Parses a category argument into a `Category`.
///
/// # Returns
/// * `Ok(Category)` if the string names a known category
/// * `Err(CliError::InvalidCategory)` otherwise
pub fn parse_category_arg(s: &str) -> Result<Category, CliError> {
    Category::from_str(s).ok_or_else(|| CliError::InvalidCategory(s.to_string()))
}

/// Resolves an optional month argument, defaulting to the current month.
pub fn parse_month_arg(month: Option<u32>) -> Result<u32, CliError> {
    match month {
        None => Ok(current_month()),
        Some(m) if (1..=12).contains(&m) => Ok(m),
        Some(m) => Err(CliError::InvalidMonth(m)),
    }
}

/// Parses season filter arguments.
pub fn parse_season_facets(values: &[String]) -> Result<Vec<SeasonFacet>, CliError> {
    values
        .iter()
        .map(|value| {
            SeasonFacet::from_str(value).ok_or_else(|| CliError::InvalidSeasonFacet(value.clone()))
        })
        .collect()
}

impl Cli {
    /// Builds the catalog configuration from the global flags
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            source: SourceLocation::parse(&self.source),
            ttl: Duration::from_secs(self.ttl_secs),
            request_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl BrowseArgs {
    /// Converts the browse flags into a query
    pub fn to_query(&self) -> Result<BrowseQuery, CliError> {
        Ok(BrowseQuery {
            search: self.query.clone(),
            seasons: parse_season_facets(&self.seasons)?,
            origins: self.origins.clone(),
            sort: SortMode::parse(&self.sort),
            page: self.page,
            per_page: self.per_page,
        })
    }
}
