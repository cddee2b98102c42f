//! What a map view is asked to show
//!
//! [`MapInputs`] is the semantic description of one map: a walking route,
//! a set of place markers and an optional transit route between cities. The
//! engine rebuilds the map whenever the inputs compare unequal to the ones
//! it last rendered.

use crate::geometry::GeoPoint;
use crate::guide::{Category, City, Country, Place};

/// A place shown as a pin
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMarker {
    pub id: String,
    pub name: String,
    pub position: GeoPoint,
    /// `None` when the place has no recognized category
    pub category: Option<Category>,
    pub photos: Option<Vec<String>>,
}

impl PlaceMarker {
    pub fn from_place(place: &Place) -> Self {
        Self {
            id: place.id.clone(),
            name: place.name.clone(),
            position: place.position(),
            category: Some(place.category()).filter(|c| *c != Category::Unlabeled),
            photos: (!place.photos.is_empty()).then(|| place.photos.clone()),
        }
    }

    pub fn first_photo(&self) -> Option<&str> {
        self.photos.as_ref()?.first().map(String::as_str)
    }
}

/// One city on a transit route
#[derive(Debug, Clone, PartialEq)]
pub struct TransitStop {
    pub name: String,
    pub position: GeoPoint,
}

/// Ordered cities joined by routed driving segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitRoute {
    pub cities: Vec<TransitStop>,
}

impl TransitRoute {
    /// Consecutive (origin, destination) pairs, one per segment
    pub fn legs(&self) -> impl Iterator<Item = (&TransitStop, &TransitStop)> {
        self.cities.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn segment_count(&self) -> usize {
        self.cities.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapInputs {
    pub route: Vec<GeoPoint>,
    pub markers: Vec<PlaceMarker>,
    pub transit: Option<TransitRoute>,
}

impl MapInputs {
    /// City map: the walking route and every place of the city
    pub fn for_city(city: &City) -> Self {
        Self {
            route: city.route.clone(),
            markers: city.places.iter().map(PlaceMarker::from_place).collect(),
            transit: None,
        }
    }

    /// Country map: the places of all cities plus a transit route through
    /// the cities in guide order
    pub fn for_country(country: &Country) -> Self {
        let markers = country
            .cities
            .iter()
            .flat_map(|city| {
                city.places.iter().map(move |place| PlaceMarker {
                    id: format!("{}-{}", city.id, place.id),
                    name: format!("{} ({})", place.name, city.name),
                    ..PlaceMarker::from_place(place)
                })
            })
            .collect();

        let cities = country
            .cities
            .iter()
            .map(|city| TransitStop {
                name: city.name.clone(),
                position: city.position(),
            })
            .collect();

        Self {
            route: Vec::new(),
            markers,
            transit: Some(TransitRoute { cities }),
        }
    }

    /// The transit route, if it has at least one segment
    pub fn renderable_transit(&self) -> Option<&TransitRoute> {
        self.transit.as_ref().filter(|t| t.cities.len() >= 2)
    }

    /// Whether the inputs warrant a map surface at all
    pub fn is_renderable(&self) -> bool {
        !self.markers.is_empty() || self.route.len() >= 2 || self.renderable_transit().is_some()
    }

    /// A route polyline is drawn only for a real route with no markers
    pub fn shows_route(&self) -> bool {
        self.markers.is_empty() && self.route.len() >= 2
    }

    /// Points the seed center is computed from: markers, else the route,
    /// else the transit cities
    pub fn focus_points(&self) -> Vec<GeoPoint> {
        if !self.markers.is_empty() {
            self.markers.iter().map(|m| m.position).collect()
        } else if !self.route.is_empty() {
            self.route.clone()
        } else {
            self.transit
                .iter()
                .flat_map(|t| t.cities.iter().map(|c| c.position))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, category: Category) -> Place {
        Place {
            id: id.into(),
            name: format!("Place {id}"),
            lat: 35.0,
            lng: 139.0,
            category: category.raw(),
            ..Default::default()
        }
    }

    fn japan() -> Country {
        Country {
            id: "1".into(),
            country: "Japan".into(),
            cities: vec![
                City {
                    id: "tokyo".into(),
                    name: "Tokyo".into(),
                    lat: 35.6762,
                    lng: 139.6503,
                    places: vec![place("p1", Category::Food)],
                    ..Default::default()
                },
                City {
                    id: "kyoto".into(),
                    name: "Kyoto".into(),
                    lat: 35.0116,
                    lng: 135.7681,
                    places: vec![place("p2", Category::Unlabeled)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_inputs_are_not_renderable() {
        let inputs = MapInputs::default();
        assert!(!inputs.is_renderable());

        let single_point = MapInputs {
            route: vec![GeoPoint::new(1.0, 1.0)],
            transit: Some(TransitRoute {
                cities: vec![TransitStop {
                    name: "Solo".into(),
                    position: GeoPoint::new(1.0, 1.0),
                }],
            }),
            ..Default::default()
        };
        assert!(!single_point.is_renderable());
    }

    #[test]
    fn test_country_inputs() {
        let inputs = MapInputs::for_country(&japan());
        let ids: Vec<&str> = inputs.markers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["tokyo-p1", "kyoto-p2"]);
        assert_eq!(inputs.markers[0].name, "Place p1 (Tokyo)");
        assert_eq!(inputs.markers[0].category, Some(Category::Food));
        assert_eq!(inputs.markers[1].category, None);
        assert!(inputs.route.is_empty());

        let transit = inputs.renderable_transit().unwrap();
        assert_eq!(transit.segment_count(), 1);
        let (from, to) = transit.legs().next().unwrap();
        assert_eq!((from.name.as_str(), to.name.as_str()), ("Tokyo", "Kyoto"));
    }

    #[test]
    fn test_focus_points_priority() {
        let country = japan();
        let tokyo = &country.cities[0];

        let with_markers = MapInputs::for_city(tokyo);
        assert_eq!(with_markers.focus_points(), vec![GeoPoint::new(35.0, 139.0)]);

        let route_only = MapInputs {
            route: vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)],
            ..Default::default()
        };
        assert_eq!(route_only.focus_points(), route_only.route);
        assert!(route_only.shows_route());

        let transit_only = MapInputs {
            markers: Vec::new(),
            ..MapInputs::for_country(&country)
        };
        assert_eq!(
            transit_only.focus_points(),
            vec![tokyo.position(), country.cities[1].position()]
        );
    }

    #[test]
    fn test_markers_hide_route() {
        let mut city = japan().cities.remove(0);
        city.route = vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)];
        let inputs = MapInputs::for_city(&city);
        assert!(!inputs.shows_route());
    }

    #[test]
    fn test_marker_photos() {
        let mut p = place("p9", Category::Coffee);
        assert!(PlaceMarker::from_place(&p).photos.is_none());
        p.photos = vec!["a.jpg".into(), "b.jpg".into()];
        assert_eq!(PlaceMarker::from_place(&p).first_photo(), Some("a.jpg"));
    }
}
