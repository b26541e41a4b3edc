//! Wires the session, settings and router together for one running app
//!
//! Created once at start up. Logging out tears down the navigation state but
//! keeps the context itself alive for the next login.

use std::sync::Arc;

use bizdesk_shared::{
    errors::DeskResult,
    nav::{HistoryEntry, ModalId, PageId},
    req_args::{BranchLoginReqArgs, LoginReqArgs},
    settings::{CurrencyCode, ThemeName},
    uac::{Identity, Profile},
};
use futures::channel::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::{
    backend::{
        AuthStateChange, BrowserHistory, LocalStore, ModalHost, RemoteBackend, ViewRenderer,
    },
    configuration::DefaultSettings,
    router::{LoadOptions, Router},
    session::{AuthTransition, SessionStore},
    settings::SettingsLoader,
};

pub struct AppContext<B, S, H, M, V> {
    session: SessionStore<B, S>,
    settings: SettingsLoader<B, S>,
    router: Router<H, M>,
    renderer: V,
    auth_changes: Option<UnboundedReceiver<AuthStateChange>>,
}

impl<B, S, H, M, V> AppContext<B, S, H, M, V>
where
    B: RemoteBackend,
    S: LocalStore,
    H: BrowserHistory,
    M: ModalHost,
    V: ViewRenderer,
{
    pub fn new(
        backend: B,
        store: S,
        history: H,
        modals: M,
        renderer: V,
        defaults: DefaultSettings,
    ) -> Self {
        let backend = Arc::new(backend);
        let store = Arc::new(store);
        Self {
            session: SessionStore::new(Arc::clone(&backend), Arc::clone(&store)),
            settings: SettingsLoader::new(backend, store, defaults),
            router: Router::new(history, modals),
            renderer,
            auth_changes: None,
        }
    }

    pub fn session(&self) -> &SessionStore<B, S> {
        &self.session
    }

    pub fn settings(&self) -> &SettingsLoader<B, S> {
        &self.settings
    }

    pub fn router(&self) -> &Router<H, M> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<H, M> {
        &mut self.router
    }

    pub fn renderer(&self) -> &V {
        &self.renderer
    }

    /// Resolves the session and shows the first view. Never fails, anything
    /// that goes wrong leaves the user at the entry view
    #[tracing::instrument(skip(self))]
    pub async fn start(&mut self, query: &str) {
        self.auth_changes = Some(self.session.subscribe());
        match self.session.init().await {
            Some(identity) => {
                self.hydrate_settings(&identity).await;
                let landing_page = self.settings.defaults().landing_page.clone();
                let page = self.router.mount(query, &landing_page);
                self.render(&page);
            }
            None => {
                info!("no session to resume");
                self.render_entry();
            }
        }
    }

    pub fn load_page(&mut self, page: PageId, options: LoadOptions) {
        let page = self.router.load_page(page, options);
        self.render(&page);
    }

    pub fn on_pop_state(&mut self, entry: Option<HistoryEntry>) {
        if let Some(page) = self.router.handle_pop_state(entry) {
            self.render(&page);
        }
    }

    pub fn open_modal(&mut self, id: ModalId) {
        self.router.open_modal(id);
    }

    pub fn close_modal(&mut self, id: &ModalId) {
        self.router.close_modal(id);
    }

    #[tracing::instrument(skip(self))]
    pub async fn login(&mut self, args: LoginReqArgs) -> DeskResult<()> {
        let identity = self.session.login(args).await?;
        self.enter(&identity).await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn login_branch(&mut self, args: BranchLoginReqArgs) -> DeskResult<()> {
        let identity = self.session.login_branch(args).await?;
        self.enter(&identity).await;
        Ok(())
    }

    /// Navigation is reset and the entry view shown even if signing out with
    /// the backend fails
    #[tracing::instrument(skip(self))]
    pub async fn logout(&mut self) -> DeskResult<()> {
        let result = self.session.logout().await;
        self.router.reset();
        self.render_entry();
        result
    }

    /// Saves theme and currency for the active identity and re-renders
    #[tracing::instrument(skip(self))]
    pub async fn update_settings(
        &mut self,
        theme: Option<ThemeName>,
        currency: Option<CurrencyCode>,
    ) -> DeskResult<Profile> {
        let profile = self.session.update_settings(theme, currency).await?;
        if let Some(settings) = self.session.settings() {
            self.settings.apply_theme(&settings.theme);
        }
        let page = self.router.current_page().clone();
        self.render(&page);
        Ok(profile)
    }

    /// Applies every auth notification received since the last call
    #[tracing::instrument(skip(self))]
    pub async fn process_auth_changes(&mut self) {
        let Some(mut receiver) = self.auth_changes.take() else {
            return;
        };
        while let Ok(change) = receiver.try_recv() {
            match self.session.handle_auth_change(change).await {
                AuthTransition::Unchanged => {}
                AuthTransition::RecoveryRequested => self.renderer.show_password_reset(),
                AuthTransition::SignedIn => {
                    if let Some(identity) = self.session.identity() {
                        self.enter(&identity).await;
                    }
                }
                AuthTransition::SignedOut => {
                    self.router.reset();
                    self.render_entry();
                }
            }
        }
        self.auth_changes = Some(receiver);
    }

    async fn enter(&mut self, identity: &Identity) {
        self.hydrate_settings(identity).await;
        let landing_page = self.settings.defaults().landing_page.clone();
        self.load_page(landing_page, LoadOptions::top_level());
    }

    async fn hydrate_settings(&mut self, identity: &Identity) {
        let settings = match self.settings.load(identity).await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(?err, "falling back to default settings");
                self.settings.fallback(identity)
            }
        };
        self.settings.apply_theme(&settings.theme);
        self.session.set_settings(identity, settings);
    }

    fn render(&mut self, page: &PageId) {
        let viewer = self.session.viewer();
        let settings = self.session.settings();
        match (viewer, settings) {
            (Some(viewer), Some(settings)) => self.renderer.render_page(page, &viewer, &settings),
            _ => self.render_entry(),
        }
    }

    fn render_entry(&mut self) {
        let theme = self.settings.device_theme();
        self.renderer.render_entry(&theme);
    }
}
