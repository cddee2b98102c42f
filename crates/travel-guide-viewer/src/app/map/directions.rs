//! Driving directions from an OSRM server

use serde::Deserialize;
use std::future::Future;
use travel_guide_lib::{Directions, DirectionsError, GeoPoint};

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    /// `[lng, lat]` pairs
    coordinates: Vec<[f64; 2]>,
}

pub struct OsrmDirections {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmDirections {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn route_url(&self, origin: GeoPoint, destination: GeoPoint) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }
}

/// Extract the path of the first route of an OSRM answer
pub fn parse_route(
    body: &[u8],
    origin: GeoPoint,
    destination: GeoPoint,
) -> Result<Vec<GeoPoint>, DirectionsError> {
    let response: OsrmResponse = serde_json::from_slice(body)
        .map_err(|err| DirectionsError::InvalidResponse(err.to_string()))?;

    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" => return Err(DirectionsError::NoRoute { origin, destination }),
        code => {
            return Err(DirectionsError::InvalidResponse(format!(
                "{code}: {}",
                response.message.unwrap_or_default()
            )));
        }
    }

    let path: Vec<GeoPoint> = response
        .routes
        .into_iter()
        .next()
        .map(|route| {
            route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| GeoPoint::new(lat, lng))
                .collect()
        })
        .unwrap_or_default();

    if path.is_empty() {
        return Err(DirectionsError::NoRoute { origin, destination });
    }
    Ok(path)
}

impl Directions for OsrmDirections {
    fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> impl Future<Output = Result<Vec<GeoPoint>, DirectionsError>> + Send {
        let client = self.client.clone();
        let url = self.route_url(origin, destination);

        async move {
            tracing::trace!("Requesting directions: {url}");
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|err| DirectionsError::Request(err.to_string()))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|err| DirectionsError::Request(err.to_string()))?;

            // OSRM reports routing failures as JSON with a 4xx status
            parse_route(&body, origin, destination).map_err(|err| match err {
                DirectionsError::InvalidResponse(_) if !status.is_success() => {
                    DirectionsError::Request(format!("directions server answered {status}"))
                }
                err => err,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO: GeoPoint = GeoPoint::new(35.6762, 139.6503);
    const KYOTO: GeoPoint = GeoPoint::new(35.0116, 135.7681);

    #[test]
    fn test_route_url() {
        let directions = OsrmDirections::new("https://router.example/");
        assert_eq!(
            directions.route_url(TOKYO, KYOTO),
            "https://router.example/route/v1/driving/139.6503,35.6762;135.7681,35.0116?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_parse_route() {
        let body = br#"{"code":"Ok","routes":[{"geometry":{"type":"LineString","coordinates":[[139.65,35.67],[137.0,35.2],[135.76,35.01]]},"distance":450000.0}],"waypoints":[]}"#;
        let path = parse_route(body, TOKYO, KYOTO).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], GeoPoint::new(35.67, 139.65));
        assert_eq!(path[2], GeoPoint::new(35.01, 135.76));
    }

    #[test]
    fn test_no_route() {
        let body = br#"{"code":"NoRoute","message":"Impossible route between points"}"#;
        assert!(matches!(
            parse_route(body, TOKYO, KYOTO),
            Err(DirectionsError::NoRoute { .. })
        ));

        let empty = br#"{"code":"Ok","routes":[]}"#;
        assert!(matches!(
            parse_route(empty, TOKYO, KYOTO),
            Err(DirectionsError::NoRoute { .. })
        ));
    }

    #[test]
    fn test_invalid_response() {
        let err = parse_route(br#"{"code":"InvalidQuery","message":"bad"}"#, TOKYO, KYOTO)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid directions response: InvalidQuery: bad"
        );
        assert!(matches!(
            parse_route(b"<html>", TOKYO, KYOTO),
            Err(DirectionsError::InvalidResponse(_))
        ));
    }
}
