use super::fetch::{FetchSlot, GuideSource, spawn_load};
use super::map::MapRegistry;
use super::settings::Settings;
use super::storage::{
    LANGUAGE_KEY, ROUTE_KEY, StorageBackend, load_json_backend, save_json_backend,
};
use super::toasts::Toasts;
use super::transfer::{self, TransferEvent};
use super::views::admin::AdminState;
use super::views::detail::DetailState;
use travel_guide_lib::i18n::{Key, t};
use travel_guide_lib::{GuideStore, Language, Navigator, Page};

/// Progress of the initial guide load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataState {
    Loading,
    Ready,
    Failed(String),
}

/// Main application state
pub struct AppState {
    pub settings: Settings,
    pub store: GuideStore,
    pub data: DataState,
    pub language: Language,
    pub navigator: Navigator,
    pub page: Page,
    pub toasts: Toasts,
    pub admin: AdminState,
    pub detail: DetailState,
    pub maps: MapRegistry,
    storage: Option<Box<dyn StorageBackend>>,
    fetch: Option<FetchSlot>,
}

impl AppState {
    pub fn new(settings: Settings, storage: Option<Box<dyn StorageBackend>>) -> Self {
        let persisted = storage.as_deref().filter(|_| !settings.ignore_persisted);

        let saved_language = persisted.and_then(|storage| {
            load_json_backend::<Language>(storage, LANGUAGE_KEY)
                .inspect_err(|err| tracing::warn!("Ignoring saved language: {err}"))
                .ok()
                .flatten()
        });
        let language = settings.language.or(saved_language).unwrap_or_default();

        let saved_route = persisted.and_then(|storage| storage.get_string(ROUTE_KEY).ok().flatten());
        let initial_route = settings
            .route
            .clone()
            .or(saved_route)
            .unwrap_or_default();
        tracing::debug!("Starting at #{initial_route} in {}", language.code());

        let maps = MapRegistry::new(
            settings.tiles,
            &settings.directions_url,
            settings.engine_config(),
        );
        let store = GuideStore::default().with_policy(settings.field_policy());

        Self {
            navigator: Navigator::new(&initial_route),
            page: Page::default(),
            store,
            data: DataState::Loading,
            language,
            toasts: Toasts::default(),
            admin: AdminState::default(),
            detail: DetailState::default(),
            maps,
            settings,
            storage,
            fetch: None,
        }
    }

    pub fn source(&self) -> GuideSource {
        match &self.settings.data_file {
            Some(path) => GuideSource::File(path.clone()),
            None => GuideSource::Remote(self.settings.data_url.clone()),
        }
    }

    /// (Re)load the guide document in the background
    pub fn start_fetch(&mut self, ctx: Option<egui::Context>) {
        self.data = DataState::Loading;
        self.fetch = Some(spawn_load(
            self.source(),
            self.settings.field_policy(),
            ctx,
        ));
    }

    /// Take the load result if it has arrived; true when the state changed
    pub fn poll_fetch(&mut self) -> bool {
        let Some(slot) = &self.fetch else {
            return false;
        };
        // Use try_write for non-blocking UI polling
        let result = match slot.try_write() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(result) = result else {
            return false;
        };

        self.fetch = None;
        match result {
            Ok(store) => {
                self.store = store;
                self.data = DataState::Ready;
                self.admin.fix_selection(&self.store);
            }
            Err(err) => self.data = DataState::Failed(err.to_string()),
        }
        true
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.language = language;
        tracing::info!("Language set to {}", language.code());
        if let Some(storage) = self.storage.as_deref()
            && let Err(err) = save_json_backend(storage, LANGUAGE_KEY, &language)
        {
            tracing::warn!("Failed to save language: {err}");
        }
    }

    pub fn navigate(&mut self, page: Page) {
        self.navigator.navigate(&page);
    }

    /// Follow fragment changes and fall back to the list for unknown
    /// countries once the data is in
    pub fn sync_page(&mut self) {
        if let Some(page) = self.navigator.poll() {
            self.page = page;
            if let Some(storage) = self.storage.as_deref()
                && let Err(err) = storage.set_string(ROUTE_KEY, self.navigator.fragment())
            {
                tracing::warn!("Failed to save route: {err}");
            }
        }

        if self.data == DataState::Ready {
            let resolved = self.page.clone().resolve(&self.store);
            if resolved != self.page {
                self.navigator.navigate(&resolved);
                self.page = resolved;
            }
        }
    }

    /// Serialize the store and ask where to save it
    pub fn export(&mut self, ctx: &egui::Context) {
        match self.store.to_json_pretty() {
            Ok(json) => transfer::start_export(json, ctx),
            Err(err) => self.toasts.error(err.to_string()),
        }
    }

    pub fn handle_transfer(&mut self, event: TransferEvent) {
        match event {
            TransferEvent::Imported { name, bytes } => match self.store.import_slice(&bytes) {
                Ok(count) => {
                    tracing::info!("Imported {count} countries from {name}");
                    self.data = DataState::Ready;
                    self.admin.fix_selection(&self.store);
                    self.toasts.success(t(Key::ImportSuccess, self.language));
                }
                Err(err) => {
                    tracing::warn!("Import of {name} failed: {err}");
                    self.toasts.error(t(Key::ImportError, self.language));
                }
            },
            TransferEvent::Exported { name } => {
                tracing::info!("Exported guides to {name}");
                self.toasts.success(t(Key::ExportSuccess, self.language));
            }
            TransferEvent::Failed(message) => self.toasts.error(message),
        }
    }
}
