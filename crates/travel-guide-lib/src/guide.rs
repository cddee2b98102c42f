//! Guide tree model
//!
//! The JSON document served to the viewer is an array of [`Country`] values,
//! each holding its [`City`] guides, which in turn hold their [`Place`]s.
//! Field names follow the camelCase layout of the published document. Every
//! field is optional on input so partially authored documents still load.

use crate::geometry::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-of-interest category
///
/// Matching is case-insensitive. Anything that is not one of the three known
/// categories becomes [`Category::Unlabeled`], which renders with a numeric pin.
/// Places keep the category text they were loaded with, so an unknown value
/// survives an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Sightseeing,
    Food,
    Coffee,
    #[default]
    Unlabeled,
}

impl Category {
    /// The three categories that have a glyph and a tag
    pub const KNOWN: [Category; 3] = [Category::Sightseeing, Category::Food, Category::Coffee];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "sightseeing" => Category::Sightseeing,
            "food" => Category::Food,
            "coffee" => Category::Coffee,
            _ => Category::Unlabeled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sightseeing => "sightseeing",
            Category::Food => "food",
            Category::Coffee => "coffee",
            Category::Unlabeled => "",
        }
    }

    /// Text stored on a place, `None` for unlabeled
    pub fn raw(self) -> Option<String> {
        (self != Category::Unlabeled).then(|| self.as_str().to_string())
    }

    /// Pin glyph, `None` for unlabeled places
    pub fn glyph(&self) -> Option<&'static str> {
        match self {
            Category::Sightseeing => Some("🏛️"),
            Category::Food => Some("🍽️"),
            Category::Coffee => Some("☕"),
            Category::Unlabeled => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point of interest inside a city guide
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub description: String,
    pub google_maps_url: String,
    pub lat: f64,
    pub lng: f64,
    pub photos: Vec<String>,
    pub annotation: String,
    /// Category text as authored; see [`Place::category`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Place {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn category(&self) -> Category {
        self.category
            .as_deref()
            .map(Category::parse)
            .unwrap_or_default()
    }
}

/// A city guide: description, walking route and places
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct City {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cover_images: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub route: Vec<GeoPoint>,
    pub places: Vec<Place>,
}

impl City {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn find_place(&self, place_id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == place_id)
    }

    /// Places of one category, in guide order
    pub fn places_in(&self, category: Category) -> impl Iterator<Item = &Place> {
        self.places.iter().filter(move |p| p.category() == category)
    }
}

/// A country guide, the root entity of the tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Country {
    pub id: String,
    pub country: String,
    pub description: String,
    pub cover_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub is_premium: bool,
    pub cities: Vec<City>,
}

impl Country {
    pub fn find_city(&self, city_id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == city_id)
    }

    pub fn find_city_mut(&mut self, city_id: &str) -> Option<&mut City> {
        self.cities.iter_mut().find(|c| c.id == city_id)
    }
}
