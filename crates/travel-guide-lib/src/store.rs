//! GuideStore - owner of the guide tree
//!
//! The store is the single writer of the countries → cities → places tree.
//! It is filled from the remote JSON document, edited by the admin screens
//! and serialized back for export. Every mutation validates its draft first
//! and leaves the tree untouched when validation fails.

use crate::geometry::GeoPoint;
use crate::guide::{Category, City, Country, Place};
use crate::{GuideError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default file name offered when exporting the tree
pub const EXPORT_FILE_NAME: &str = "travel-guides-data.json";

/// Which optional-looking fields the admin forms insist on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredFieldPolicy {
    /// Cities need at least one non-blank cover image
    pub city_cover_image: bool,
    /// Places need at least one non-blank photo
    pub place_photo: bool,
}

impl Default for RequiredFieldPolicy {
    fn default() -> Self {
        Self {
            city_cover_image: true,
            place_photo: true,
        }
    }
}

/// Form contents for creating or editing a country
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryDraft {
    pub country: String,
    pub description: String,
    pub cover_image: String,
    pub is_premium: bool,
}

impl From<&Country> for CountryDraft {
    fn from(country: &Country) -> Self {
        Self {
            country: country.country.clone(),
            description: country.description.clone(),
            cover_image: country.cover_image.clone(),
            is_premium: country.is_premium,
        }
    }
}

impl CountryDraft {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.country) {
            missing.push("country");
        }
        if is_blank(&self.description) {
            missing.push("description");
        }
        if is_blank(&self.cover_image) {
            missing.push("coverImage");
        }
        missing
    }
}

/// Form contents for creating or editing a city
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityDraft {
    pub name: String,
    pub description: String,
    pub cover_images: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub route: Vec<GeoPoint>,
}

impl From<&City> for CityDraft {
    fn from(city: &City) -> Self {
        Self {
            name: city.name.clone(),
            description: city.description.clone(),
            cover_images: city.cover_images.clone(),
            lat: city.lat,
            lng: city.lng,
            route: city.route.clone(),
        }
    }
}

impl CityDraft {
    fn missing_fields(&self, policy: &RequiredFieldPolicy) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("name");
        }
        if is_blank(&self.description) {
            missing.push("description");
        }
        if policy.city_cover_image && non_blank(&self.cover_images).is_empty() {
            missing.push("coverImages");
        }
        // A zero coordinate is what an untouched form field holds
        if self.lat == 0.0 {
            missing.push("lat");
        }
        if self.lng == 0.0 {
            missing.push("lng");
        }
        missing
    }
}

/// Form contents for creating or editing a place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDraft {
    pub name: String,
    pub description: String,
    pub annotation: String,
    pub google_maps_url: String,
    pub lat: f64,
    pub lng: f64,
    pub photos: Vec<String>,
    pub category: Category,
}

impl From<&Place> for PlaceDraft {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            annotation: place.annotation.clone(),
            google_maps_url: place.google_maps_url.clone(),
            lat: place.lat,
            lng: place.lng,
            photos: place.photos.clone(),
            category: place.category(),
        }
    }
}

impl PlaceDraft {
    /// Split a one-URL-per-line text block into photo URLs
    pub fn photos_from_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn missing_fields(&self, policy: &RequiredFieldPolicy) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("name");
        }
        if is_blank(&self.description) {
            missing.push("description");
        }
        if is_blank(&self.annotation) {
            missing.push("annotation");
        }
        if is_blank(&self.google_maps_url) {
            missing.push("googleMapsUrl");
        }
        if policy.place_photo && non_blank(&self.photos).is_empty() {
            missing.push("photos");
        }
        if self.category == Category::Unlabeled {
            missing.push("category");
        }
        missing
    }
}

/// Parse a coordinate typed into a form; anything unparsable counts as zero
pub fn parse_coordinate(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Editable list of route points backing the city form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutePoints {
    points: Vec<GeoPoint>,
}

impl RoutePoints {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Append a point at the origin for the user to fill in
    pub fn add(&mut self) {
        self.points.push(GeoPoint::new(0.0, 0.0));
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.points.len() {
            self.points.remove(index);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point_mut(&mut self, index: usize) -> Option<&mut GeoPoint> {
        self.points.get_mut(index)
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn check(missing: Vec<&'static str>) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GuideError::MissingFields(missing))
    }
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Build a `<prefix><millis>` id not yet present in `taken`
fn timestamped_id<'a, I>(prefix: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let mut stamp = timestamp_millis();
    loop {
        let candidate = format!("{prefix}{stamp}");
        if !taken.clone().into_iter().any(|id| id == candidate) {
            return candidate;
        }
        stamp += 1;
    }
}

/// In-memory guide tree with admin operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideStore {
    countries: Vec<Country>,
    policy: RequiredFieldPolicy,
}

impl GuideStore {
    pub fn new(countries: Vec<Country>) -> Self {
        Self {
            countries,
            policy: RequiredFieldPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RequiredFieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse a guide document
    pub fn from_json(json: &str) -> Result<Self> {
        let countries: Vec<Country> = serde_json::from_str(json)?;
        Ok(Self::new(countries))
    }

    /// Parse a guide document from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let countries: Vec<Country> = serde_json::from_slice(bytes)?;
        Ok(Self::new(countries))
    }

    /// Serialize the tree as pretty-printed JSON for export
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.countries)?)
    }

    /// Replace the whole tree with an imported document
    ///
    /// Parsing happens before anything is touched, so a malformed document
    /// leaves the current tree as it was. Returns the number of countries.
    pub fn import_slice(&mut self, bytes: &[u8]) -> Result<usize> {
        profiling::scope!("GuideStore::import");
        let countries: Vec<Country> = serde_json::from_slice(bytes).map_err(|err| {
            tracing::warn!("Rejected guide import: {err}");
            err
        })?;
        let count = countries.len();
        self.countries = countries;
        tracing::info!("Imported {count} countries");
        Ok(count)
    }

    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        self.import_slice(json.as_bytes())
    }

    pub fn policy(&self) -> RequiredFieldPolicy {
        self.policy
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn find_country(&self, country_id: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == country_id)
    }

    pub fn find_city(&self, country_id: &str, city_id: &str) -> Option<&City> {
        self.find_country(country_id)?.find_city(city_id)
    }

    fn country_mut(&mut self, country_id: &str) -> Result<&mut Country> {
        self.countries
            .iter_mut()
            .find(|c| c.id == country_id)
            .ok_or_else(|| GuideError::CountryNotFound(country_id.to_string()))
    }

    fn city_mut(&mut self, country_id: &str, city_id: &str) -> Result<&mut City> {
        self.country_mut(country_id)?
            .find_city_mut(city_id)
            .ok_or_else(|| GuideError::CityNotFound(city_id.to_string()))
    }

    /// Next numeric country id: one past the largest numeric id in use
    fn next_country_id(&self) -> String {
        let max = self
            .countries
            .iter()
            .filter_map(|c| c.id.trim().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }

    // === Countries ===

    pub fn add_country(&mut self, draft: CountryDraft) -> Result<String> {
        check(draft.missing_fields())?;
        let id = self.next_country_id();
        self.countries.push(Country {
            id: id.clone(),
            country: draft.country,
            description: draft.description,
            cover_image: draft.cover_image,
            created_at: None,
            is_premium: draft.is_premium,
            cities: Vec::new(),
        });
        tracing::debug!("Added country {id}");
        Ok(id)
    }

    /// Update a country's own fields, keeping its cities
    pub fn update_country(&mut self, country_id: &str, draft: CountryDraft) -> Result<()> {
        check(draft.missing_fields())?;
        let country = self.country_mut(country_id)?;
        country.country = draft.country;
        country.description = draft.description;
        country.cover_image = draft.cover_image;
        country.is_premium = draft.is_premium;
        tracing::debug!("Updated country {country_id}");
        Ok(())
    }

    pub fn delete_country(&mut self, country_id: &str) -> Result<Country> {
        let index = self
            .countries
            .iter()
            .position(|c| c.id == country_id)
            .ok_or_else(|| GuideError::CountryNotFound(country_id.to_string()))?;
        tracing::debug!("Deleted country {country_id}");
        Ok(self.countries.remove(index))
    }

    // === Cities ===

    pub fn add_city(&mut self, country_id: &str, draft: CityDraft) -> Result<String> {
        check(draft.missing_fields(&self.policy))?;
        let country = self.country_mut(country_id)?;
        let id = timestamped_id("city_", country.cities.iter().map(|c| c.id.as_str()));
        country.cities.push(City {
            id: id.clone(),
            name: draft.name,
            description: draft.description,
            cover_images: non_blank(&draft.cover_images),
            lat: draft.lat,
            lng: draft.lng,
            route: draft.route,
            places: Vec::new(),
        });
        tracing::debug!("Added city {id} to country {country_id}");
        Ok(id)
    }

    /// Update a city's own fields, keeping its places
    pub fn update_city(&mut self, country_id: &str, city_id: &str, draft: CityDraft) -> Result<()> {
        check(draft.missing_fields(&self.policy))?;
        let city = self.city_mut(country_id, city_id)?;
        city.name = draft.name;
        city.description = draft.description;
        city.cover_images = non_blank(&draft.cover_images);
        city.lat = draft.lat;
        city.lng = draft.lng;
        city.route = draft.route;
        tracing::debug!("Updated city {city_id}");
        Ok(())
    }

    pub fn delete_city(&mut self, country_id: &str, city_id: &str) -> Result<City> {
        let country = self.country_mut(country_id)?;
        let index = country
            .cities
            .iter()
            .position(|c| c.id == city_id)
            .ok_or_else(|| GuideError::CityNotFound(city_id.to_string()))?;
        tracing::debug!("Deleted city {city_id}");
        Ok(country.cities.remove(index))
    }

    // === Places ===

    pub fn add_place(&mut self, country_id: &str, city_id: &str, draft: PlaceDraft) -> Result<String> {
        check(draft.missing_fields(&self.policy))?;
        let city = self.city_mut(country_id, city_id)?;
        let id = timestamped_id("p", city.places.iter().map(|p| p.id.as_str()));
        city.places.push(Place {
            id: id.clone(),
            name: draft.name,
            description: draft.description,
            google_maps_url: draft.google_maps_url,
            lat: draft.lat,
            lng: draft.lng,
            photos: non_blank(&draft.photos),
            annotation: draft.annotation,
            category: draft.category.raw(),
        });
        tracing::debug!("Added place {id} to city {city_id}");
        Ok(id)
    }

    pub fn update_place(
        &mut self,
        country_id: &str,
        city_id: &str,
        place_id: &str,
        draft: PlaceDraft,
    ) -> Result<()> {
        check(draft.missing_fields(&self.policy))?;
        let city = self.city_mut(country_id, city_id)?;
        let place = city
            .places
            .iter_mut()
            .find(|p| p.id == place_id)
            .ok_or_else(|| GuideError::PlaceNotFound(place_id.to_string()))?;
        place.name = draft.name;
        place.description = draft.description;
        place.annotation = draft.annotation;
        place.google_maps_url = draft.google_maps_url;
        place.lat = draft.lat;
        place.lng = draft.lng;
        place.photos = non_blank(&draft.photos);
        // Keep the authored spelling unless the category really changed
        if place.category() != draft.category {
            place.category = draft.category.raw();
        }
        tracing::debug!("Updated place {place_id}");
        Ok(())
    }

    pub fn delete_place(&mut self, country_id: &str, city_id: &str, place_id: &str) -> Result<Place> {
        let city = self.city_mut(country_id, city_id)?;
        let index = city
            .places
            .iter()
            .position(|p| p.id == place_id)
            .ok_or_else(|| GuideError::PlaceNotFound(place_id.to_string()))?;
        tracing::debug!("Deleted place {place_id}");
        Ok(city.places.remove(index))
    }
}
