//! Tile providers and the one-time map library bring-up
//!
//! Before a map is built the engine waits on the process-wide
//! [`ScriptLoader`] for [`TileLibrary`], which checks that the selected tile
//! server answers and keeps the HTTP client around for later probes. A
//! failed probe drops the client so the next map view starts over.

use once_cell::sync::OnceCell;
use std::sync::{Mutex, PoisonError};
use travel_guide_lib::{LoadError, MapLibrary, ScriptLoader};
use walkers::{
    HttpTiles, TileId,
    sources::{Attribution, OpenStreetMap, TileSource},
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// OpenTopoMap tile source
pub struct OpenTopoMap;

impl TileSource for OpenTopoMap {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://tile.opentopomap.org/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenTopoMap (CC-BY-SA)",
            url: "https://opentopomap.org/",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        17
    }
}

/// Available map tile providers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TilesProvider {
    #[default]
    OpenStreetMap,
    OpenTopoMap,
}

impl TilesProvider {
    pub fn http_tiles(&self, ctx: egui::Context) -> HttpTiles {
        match self {
            Self::OpenStreetMap => HttpTiles::new(OpenStreetMap, ctx),
            Self::OpenTopoMap => HttpTiles::new(OpenTopoMap, ctx),
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "© OpenStreetMap contributors",
            Self::OpenTopoMap => "© OpenTopoMap (CC-BY-SA)",
        }
    }

    /// The world tile, fetched once to check the server is reachable
    pub fn probe_url(&self) -> String {
        let world = TileId {
            x: 0,
            y: 0,
            zoom: 0,
        };
        match self {
            Self::OpenStreetMap => OpenStreetMap.tile_url(world),
            Self::OpenTopoMap => OpenTopoMap.tile_url(world),
        }
    }
}

pub struct TileLibrary {
    provider: TilesProvider,
    client: Mutex<Option<reqwest::Client>>,
}

impl TileLibrary {
    pub fn new(provider: TilesProvider) -> Self {
        Self {
            provider,
            client: Mutex::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl MapLibrary for TileLibrary {
    async fn load(&self) -> Result<(), LoadError> {
        let url = self.provider.probe_url();
        tracing::debug!("Probing tile server at {url}");

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| LoadError::Failed(err.to_string()))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|err| LoadError::Failed(err.to_string()))?;
        if !response.status().is_success() {
            return Err(LoadError::Failed(format!(
                "tile server answered {}",
                response.status()
            )));
        }

        *self.client.lock().unwrap_or_else(PoisonError::into_inner) = Some(client);
        tracing::info!("Tile server {} ready", self.provider.attribution());
        Ok(())
    }

    fn discard(&self) {
        if self
            .client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            tracing::debug!("Discarded tile client");
        }
    }
}

static LOADER: OnceCell<ScriptLoader<TileLibrary>> = OnceCell::new();

/// The loader shared by every map view of the process
///
/// The provider of the first call wins.
pub fn tile_loader(provider: TilesProvider) -> ScriptLoader<TileLibrary> {
    LOADER
        .get_or_init(|| ScriptLoader::new(TileLibrary::new(provider)))
        .clone()
}
