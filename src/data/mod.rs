//! Core data models for the produce catalog
//!
//! This module contains the catalog types served by the cache and consumed
//! by the season classifier and the search engine, plus the sources that
//! load category documents.

pub mod source;

pub use source::{CategorySource, FileCategorySource, HttpCategorySource, SourceError};

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// The three catalog categories the cache knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vegetables,
    Fruits,
    Crops,
}

impl Category {
    /// Returns every category in lookup order (vegetables, fruits, crops).
    pub fn all() -> &'static [Category] {
        &[Category::Vegetables, Category::Fruits, Category::Crops]
    }

    /// Returns the key used to locate the category document.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Vegetables => "vegetables",
            Category::Fruits => "fruits",
            Category::Crops => "crops",
        }
    }

    /// Returns a human-readable label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Vegetables => "Vegetables",
            Category::Fruits => "Fruits",
            Category::Crops => "Crops",
        }
    }

    /// Parses a category key, case-insensitively.
    ///
    /// Returns `None` if the input is not one of the known categories.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "vegetables" | "vegetable" | "veg" => Some(Category::Vegetables),
            "fruits" | "fruit" => Some(Category::Fruits),
            "crops" | "crop" => Some(Category::Crops),
            _ => None,
        }
    }
}

/// One product category as served by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    /// Human label, e.g. "Vegetables"
    pub category_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub hero_image: Option<String>,
    /// Highlighted products, usually duplicates of entries in `products`
    #[serde(default, deserialize_with = "optional_product_list")]
    pub featured: Option<Vec<Product>>,
    /// Authoritative product list; entries that are not objects are skipped
    #[serde(deserialize_with = "product_list")]
    pub products: Vec<Product>,
}

impl CategoryDocument {
    /// Finds a product by id, checking the featured list before the full list.
    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.featured
            .iter()
            .flatten()
            .chain(self.products.iter())
            .find(|product| product.id == id)
    }
}

/// A single catalog product
///
/// Every field tolerates `null` or an unexpected type and falls back to its
/// default, so one sloppy record never takes its category down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique across all categories
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub variety: Option<String>,
    /// Comma-separated list of places
    #[serde(default, deserialize_with = "lenient")]
    pub origin: String,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "spec_map")]
    pub specifications: BTreeMap<String, SpecValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub seasons: Option<Seasons>,
    #[serde(default, deserialize_with = "lenient")]
    pub nutrition: Option<Nutrition>,
    #[serde(default, deserialize_with = "lenient")]
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub price_range: Option<PriceRange>,
}

impl Product {
    /// Returns the individual origins listed in the comma-separated `origin` field.
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.origin
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

/// Specification values are either a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Text(String),
    List(Vec<String>),
}

/// Seasonal availability block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seasons {
    /// Either "year-round" or a month range such as "August-March"
    #[serde(default, deserialize_with = "lenient")]
    pub available: Option<String>,
    /// Season names (spring, summer, fall, winter)
    #[serde(default, deserialize_with = "string_list")]
    pub peak: Vec<String>,
    /// Months 1-12
    #[serde(default, deserialize_with = "month_list")]
    pub best_months: Vec<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub harvest_months: Option<Vec<u32>>,
}

impl Seasons {
    /// Whether `available` is the literal "year-round" (case-insensitive).
    pub fn is_year_round(&self) -> bool {
        self.available
            .as_deref()
            .is_some_and(|available| available.trim().eq_ignore_ascii_case("year-round"))
    }
}

/// Nutrition facts (display only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, deserialize_with = "string_list")]
    pub vitamins: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub minerals: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub calories: Option<Measure>,
    #[serde(default, deserialize_with = "lenient")]
    pub fiber: Option<Measure>,
}

/// A nutrition measure written either as a number or as free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure {
    Number(f64),
    Text(String),
}

/// Display prices per tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, deserialize_with = "lenient")]
    pub wholesale: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub retail: Option<String>,
}

/// Result of a product lookup by id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMatch {
    pub product: Product,
    /// `categoryName` of the document the product was found in
    pub category_name: String,
}

/// All three category documents, fetched together
#[derive(Debug, Clone, PartialEq)]
pub struct AllCategories {
    pub vegetables: Arc<CategoryDocument>,
    pub fruits: Arc<CategoryDocument>,
    pub crops: Arc<CategoryDocument>,
}

impl AllCategories {
    /// Returns the document for a category.
    pub fn get(&self, category: Category) -> &Arc<CategoryDocument> {
        match category {
            Category::Vegetables => &self.vegetables,
            Category::Fruits => &self.fruits,
            Category::Crops => &self.crops,
        }
    }

    /// Iterates the documents in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Arc<CategoryDocument>)> {
        Category::all()
            .iter()
            .map(move |category| (*category, self.get(*category)))
    }
}

/// Decodes a field, falling back to its default on `null` or a type mismatch
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Accepts a list of strings or a single comma-separated string
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Keeps the whole-number entries of a month list
fn month_list<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|month| u32::try_from(month).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Keeps the specification entries whose value is text or a list of text
fn spec_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, SpecValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries
            .into_iter()
            .filter_map(|(key, value)| serde_json::from_value(value).ok().map(|spec| (key, spec)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

fn decode_products(items: Vec<Value>) -> Vec<Product> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(product) => Some(product),
            Err(error) => {
                warn!(%error, "skipping product entry that is not an object");
                None
            }
        })
        .collect()
}

fn product_list<'de, D>(deserializer: D) -> Result<Vec<Product>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => decode_products(items),
        _ => Vec::new(),
    })
}

fn optional_product_list<'de, D>(deserializer: D) -> Result<Option<Vec<Product>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(decode_products(items)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "categoryName": "Fruits",
            "description": "Fresh fruit",
            "heroImage": "/img/fruits.jpg",
            "featured": [{"id": "m1", "name": "Mango"}],
            "products": [
                {
                    "id": "m1",
                    "name": "Mango",
                    "variety": "Alphonso",
                    "origin": "Ratnagiri, Devgad",
                    "specifications": {
                        "packaging": "5kg box",
                        "grades": ["A", "B"]
                    },
                    "seasons": {"available": "March-June", "peak": ["summer"], "bestMonths": [4, 5]},
                    "nutrition": {"vitamins": ["A", "C"], "calories": 60, "fiber": "1.6g"}
                },
                {"id": "s1", "name": "Strawberry", "seasons": {"bestMonths": [3, 4]}}
            ]
        }"#
    }

    #[test]
    fn test_category_from_str_aliases() {
        assert_eq!(Category::from_str("vegetables"), Some(Category::Vegetables));
        assert_eq!(Category::from_str("Veg"), Some(Category::Vegetables));
        assert_eq!(Category::from_str("FRUIT"), Some(Category::Fruits));
        assert_eq!(Category::from_str(" crops "), Some(Category::Crops));
        assert_eq!(Category::from_str("meat"), None);
    }

    #[test]
    fn test_category_order_is_fixed() {
        let keys: Vec<&str> = Category::all().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["vegetables", "fruits", "crops"]);
    }

    #[test]
    fn test_category_document_deserializes_camel_case() {
        let doc: CategoryDocument = serde_json::from_str(sample_json()).expect("valid document");

        assert_eq!(doc.category_name, "Fruits");
        assert_eq!(doc.hero_image.as_deref(), Some("/img/fruits.jpg"));
        assert_eq!(doc.products.len(), 2);

        let mango = &doc.products[0];
        assert_eq!(mango.variety.as_deref(), Some("Alphonso"));
        assert_eq!(
            mango.specifications.get("grades"),
            Some(&SpecValue::List(vec!["A".to_string(), "B".to_string()]))
        );
        assert_eq!(
            mango.specifications.get("packaging"),
            Some(&SpecValue::Text("5kg box".to_string()))
        );
        let seasons = mango.seasons.as_ref().expect("seasons present");
        assert_eq!(seasons.best_months, vec![4, 5]);
        let nutrition = mango.nutrition.as_ref().expect("nutrition present");
        assert_eq!(nutrition.calories, Some(Measure::Number(60.0)));
        assert_eq!(nutrition.fiber, Some(Measure::Text("1.6g".to_string())));
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let doc: CategoryDocument = serde_json::from_str(sample_json()).unwrap();
        let strawberry = &doc.products[1];

        assert_eq!(strawberry.description, "");
        assert_eq!(strawberry.origin, "");
        assert!(strawberry.variety.is_none());
        assert!(strawberry.specifications.is_empty());
        let seasons = strawberry.seasons.as_ref().unwrap();
        assert!(seasons.available.is_none());
        assert!(seasons.peak.is_empty());
    }

    #[test]
    fn test_find_product_checks_featured_first() {
        let doc: CategoryDocument = serde_json::from_str(sample_json()).unwrap();

        // The featured copy of m1 carries no variety; the products copy does.
        let found = doc.find_product("m1").expect("m1 present");
        assert!(found.variety.is_none());
        assert_eq!(doc.find_product("s1").map(|p| p.name.as_str()), Some("Strawberry"));
        assert!(doc.find_product("zz").is_none());
    }

    #[test]
    fn test_origins_split_and_trim() {
        let doc: CategoryDocument = serde_json::from_str(sample_json()).unwrap();
        let origins: Vec<&str> = doc.products[0].origins().collect();
        assert_eq!(origins, vec!["Ratnagiri", "Devgad"]);
        assert_eq!(doc.products[1].origins().count(), 0);
    }

    #[test]
    fn test_null_and_mistyped_product_fields_fall_back_to_defaults() {
        let doc: CategoryDocument = serde_json::from_value(serde_json::json!({
            "categoryName": "Fruits",
            "description": null,
            "products": [{
                "id": "g1",
                "name": "Guava",
                "description": null,
                "origin": 42,
                "variety": ["not", "text"],
                "specifications": {"grade": "A", "weight": 5},
                "seasons": {"available": null, "peak": null, "bestMonths": [7, "Aug", 9]},
                "nutrition": {"vitamins": "A, C", "minerals": null, "calories": {}},
                "priceRange": "cheap"
            }]
        }))
        .expect("lenient document");

        assert_eq!(doc.description, "");
        let guava = &doc.products[0];
        assert_eq!(guava.description, "");
        assert_eq!(guava.origin, "");
        assert!(guava.variety.is_none());
        assert_eq!(guava.specifications.len(), 1);
        let seasons = guava.seasons.as_ref().expect("seasons present");
        assert!(seasons.available.is_none());
        assert!(seasons.peak.is_empty());
        assert_eq!(seasons.best_months, vec![7, 9]);
        let nutrition = guava.nutrition.as_ref().expect("nutrition present");
        assert_eq!(nutrition.vitamins, vec!["A".to_string(), "C".to_string()]);
        assert!(nutrition.minerals.is_empty());
        assert!(nutrition.calories.is_none());
        assert!(guava.price_range.is_none());
    }

    #[test]
    fn test_non_object_product_entries_are_skipped() {
        let doc: CategoryDocument = serde_json::from_value(serde_json::json!({
            "categoryName": "Crops",
            "featured": "none",
            "products": ["wheat", null, {"name": "Rice"}]
        }))
        .expect("lenient document");

        assert!(doc.featured.is_none());
        assert_eq!(doc.products.len(), 1);
        assert_eq!(doc.products[0].id, "");
        assert_eq!(doc.products[0].name, "Rice");
    }

    #[test]
    fn test_is_year_round_is_case_insensitive() {
        let seasons = Seasons {
            available: Some("Year-Round".to_string()),
            ..Default::default()
        };
        assert!(seasons.is_year_round());

        let ranged = Seasons {
            available: Some("August-March".to_string()),
            ..Default::default()
        };
        assert!(!ranged.is_year_round());
        assert!(!Seasons::default().is_year_round());
    }
}
