use crate::app::map::TilesProvider;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use travel_guide_lib::engine::{Rgb, SegmentPalette};
use travel_guide_lib::{EngineConfig, Language, RequiredFieldPolicy};

/// Published guide document
pub const DEFAULT_DATA_URL: &str =
    "https://storage.yandexcloud.net/travel-guides/travel-guides-data.json";

/// Public OSRM demo server
pub const DEFAULT_DIRECTIONS_URL: &str = "https://router.project-osrm.org";

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Travel Guide Viewer - Country and city guides on an interactive map
pub struct Settings {
    /// URL of the guide JSON document
    #[clap(long, value_name = "URL", default_value = DEFAULT_DATA_URL)]
    pub data_url: String,

    /// Load the guide from a local JSON file instead of fetching it
    #[clap(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Interface language (en, ru); overrides the saved preference
    #[clap(short, long)]
    pub language: Option<Language>,

    /// Initial page, e.g. `#country/1` or `#admin`
    #[clap(long, value_name = "FRAGMENT")]
    pub route: Option<String>,

    /// Base URL of the OSRM server used for routes between cities
    #[clap(long, value_name = "URL", default_value = DEFAULT_DIRECTIONS_URL)]
    pub directions_url: String,

    /// Map tiles
    #[clap(long, value_enum, default_value_t = TilesProvider::OpenStreetMap)]
    pub tiles: TilesProvider,

    /// Colors of the routes between cities, e.g. `#3b82f6,#10b981`
    #[clap(long, value_name = "HEX", value_delimiter = ',', value_parser = parse_color)]
    pub segment_colors: Vec<Rgb>,

    /// Require at least one cover image when saving a city
    #[clap(long, action = ArgAction::Set, default_value_t = true)]
    pub require_city_photos: bool,

    /// Ignore previously persisted state and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

fn parse_color(value: &str) -> Result<Rgb, String> {
    Rgb::from_hex(value).ok_or_else(|| format!("expected a #rrggbb color, got `{value}`"))
}

impl Settings {
    /// Parse the process arguments, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn field_policy(&self) -> RequiredFieldPolicy {
        RequiredFieldPolicy {
            city_cover_image: self.require_city_photos,
            ..Default::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            segments: SegmentPalette::default().with_colors(self.segment_colors.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["travel-guide-viewer"]).unwrap();
        assert_eq!(settings.data_url, DEFAULT_DATA_URL);
        assert_eq!(settings.directions_url, DEFAULT_DIRECTIONS_URL);
        assert_eq!(settings.tiles, TilesProvider::OpenStreetMap);
        assert!(settings.language.is_none());
        assert!(settings.data_file.is_none());
        assert!(settings.require_city_photos);
        assert!(!settings.ignore_persisted);
        assert_eq!(settings.field_policy(), RequiredFieldPolicy::default());
        assert_eq!(settings.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "travel-guide-viewer",
            "--language",
            "en",
            "--route",
            "#country/2",
            "--tiles",
            "open-topo-map",
            "--require-city-photos",
            "false",
            "--data-file",
            "guides.json",
        ])
        .unwrap();
        assert_eq!(settings.language, Some(Language::En));
        assert_eq!(settings.route.as_deref(), Some("#country/2"));
        assert_eq!(settings.tiles, TilesProvider::OpenTopoMap);
        assert_eq!(settings.data_file, Some(PathBuf::from("guides.json")));
        assert!(!settings.field_policy().city_cover_image);
        assert!(settings.field_policy().place_photo);
    }

    #[test]
    fn test_segment_colors() {
        let settings = Settings::try_parse_from([
            "travel-guide-viewer",
            "--segment-colors",
            "#ff0000,00ff00",
        ])
        .unwrap();
        let palette = settings.engine_config().segments;
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.color_for(0), Rgb::new(255, 0, 0));
        assert_eq!(palette.color_for(3), Rgb::new(0, 255, 0));

        assert!(
            Settings::try_parse_from(["travel-guide-viewer", "--segment-colors", "#fff"]).is_err()
        );
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert!(Settings::try_parse_from(["travel-guide-viewer", "--language", "de"]).is_err());
    }
}
