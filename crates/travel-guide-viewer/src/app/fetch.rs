//! Loading the guide document
//!
//! The document comes from the published URL, or from a local file when
//! `--data-file` is given. Loading runs as a Tokio task; the UI polls the
//! shared slot each frame and takes the result once it lands.

use reqwest::header::ACCEPT;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use travel_guide_lib::{GuideError, GuideStore, RequiredFieldPolicy};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server answered {code} {reason}")]
    Status { code: u16, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid guide document: {0}")]
    Parse(#[from] GuideError),
}

/// Where the guide document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideSource {
    Remote(String),
    File(PathBuf),
}

impl GuideSource {
    pub fn describe(&self) -> String {
        match self {
            GuideSource::Remote(url) => url.clone(),
            GuideSource::File(path) => path.display().to_string(),
        }
    }
}

/// Result slot shared between the loading task and the UI
pub type FetchSlot = Arc<RwLock<Option<Result<GuideStore, FetchError>>>>;

/// GET the document, requiring a 2xx answer
pub async fn fetch_guides(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

pub async fn load_guides(
    source: &GuideSource,
    policy: RequiredFieldPolicy,
) -> Result<GuideStore, FetchError> {
    profiling::scope!("load_guides");
    let bytes = match source {
        GuideSource::Remote(url) => fetch_guides(&reqwest::Client::new(), url).await?,
        GuideSource::File(path) => tokio::fs::read(path).await.map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?,
    };
    let store = GuideStore::from_slice(&bytes)?.with_policy(policy);
    Ok(store)
}

/// Start loading in the background; `ctx` is repainted when done
pub fn spawn_load(
    source: GuideSource,
    policy: RequiredFieldPolicy,
    ctx: Option<egui::Context>,
) -> FetchSlot {
    let slot: FetchSlot = Arc::new(RwLock::new(None));
    let task_slot = Arc::clone(&slot);

    tokio::spawn(async move {
        tracing::info!("Loading guides from {}", source.describe());
        let result = load_guides(&source, policy).await;
        match &result {
            Ok(store) => tracing::info!("Loaded {} countries", store.countries().len()),
            Err(err) => tracing::error!("Failed to load guides: {err}"),
        }
        *task_slot.write().await = Some(result);
        if let Some(ctx) = ctx {
            ctx.request_repaint();
        }
    });

    slot
}
