//! Produce catalog CLI - browse categories and seasonal availability
//!
//! A thin front end over the catalog cache, the season classifier and the
//! search engine. Logs go to stderr; set `RUST_LOG` to see cache activity.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use producecat::cache::ProductCache;
use producecat::cli::{parse_category_arg, parse_month_arg, BrowseArgs, Cli, Command};
use producecat::data::{CategoryDocument, Product};
use producecat::search::{browse, featured_products, format_price, PriceTier};
use producecat::seasons::{month_name, season_details_at, season_status_at};

/// Sets up the global tracing subscriber, falling back to `warn` when
/// `RUST_LOG` is not set.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Prints one product row with its season status
fn print_product_row(product: &Product, month: u32) {
    let status = season_status_at(product, month);
    let next = status
        .next_available
        .map(|next| format!(" (next: {})", next))
        .unwrap_or_default();
    println!("  {:<12} {:<24} {}{}", product.id, product.name, status.label, next);
}

/// Prints a category header and all of its products
fn print_category(document: &CategoryDocument, month: u32) {
    println!("{}", document.category_name);
    if !document.description.is_empty() {
        println!("{}", document.description);
    }
    let featured: Vec<String> = featured_products(document)
        .into_iter()
        .map(|product| product.name)
        .collect();
    println!("Featured: {}", featured.join(", "));
    println!();
    for product in &document.products {
        print_product_row(product, month);
    }
}

async fn run_browse(cache: &ProductCache, args: &BrowseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let category = parse_category_arg(&args.category)?;
    let month = parse_month_arg(args.month)?;
    let query = args.to_query()?;

    let document = cache.fetch_category(category.key()).await?;
    let page = browse(&document.products, &query, month);

    println!(
        "{}: {} result(s), page {} of {}",
        document.category_name,
        page.total,
        page.page,
        page.total_pages.max(1)
    );
    for product in &page.items {
        print_product_row(product, month);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cache = cli.catalog_config().build_cache()?;

    match &cli.command {
        Command::Category { name } => {
            let category = parse_category_arg(name)?;
            let month = parse_month_arg(None)?;
            let document = cache.fetch_category(category.key()).await?;
            print_category(&document, month);
        }
        Command::All => {
            let all = cache.fetch_all_categories().await?;
            for (category, document) in all.iter() {
                println!(
                    "{:<12} {:<16} {} product(s)",
                    category.key(),
                    document.category_name,
                    document.products.len()
                );
            }
        }
        Command::Product { id } => {
            let month = parse_month_arg(None)?;
            let found = cache.fetch_product_by_id(id).await?;
            let product = &found.product;
            let details = season_details_at(product, month);

            println!("{} ({})", product.name, found.category_name);
            if let Some(variety) = &product.variety {
                println!("Variety: {}", variety);
            }
            if !product.origin.is_empty() {
                println!("Origin: {}", product.origin);
            }
            println!("Price: {}", format_price(product.price_range.as_ref(), PriceTier::Wholesale));
            println!("Season: {} - {}", details.status.label, details.description);
        }
        Command::Browse(args) => run_browse(&cache, args).await?,
        Command::Season { id, month } => {
            let month = parse_month_arg(*month)?;
            let found = cache.fetch_product_by_id(id).await?;
            let details = season_details_at(&found.product, month);
            println!(
                "{} in {}: {}",
                found.product.name,
                month_name(month).unwrap_or("?"),
                details.status.label
            );
            println!("{}", details.description);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(error) = run(cli).await {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}
