#![warn(unused_crate_dependencies)]

use std::{fmt::Debug, ops::Deref, sync::LazyLock};

use bizdesk_client_core::{AppContext, DefaultSettings, LoadOptions};
use bizdesk_shared::{
    const_config::storage::STORAGE_KEY_BRANCH_TOKEN,
    errors::DeskResult,
    nav::{ModalId, PageId},
    telemetry::{self, get_subscriber, init_subscriber},
};
use uuid::Uuid;

mod fake_backend;
mod platform;

pub use fake_backend::{
    FakeBackend, Failure, TestBranch, TestUser, MSG_INVALID_LOGIN, MSG_JWT_EXPIRED,
    MSG_NETWORK_DOWN, MSG_PIN_MISMATCH,
};
pub use platform::{FakeHistory, FakeModals, MemoryStore, RecordingRenderer, Rendered};

pub type TestContext =
    AppContext<FakeBackend, MemoryStore, FakeHistory, FakeModals, RecordingRenderer>;

pub const ENTERPRISE_NAME: &str = "Acme Trading";

// Ensure that the `tracing` stack is only initialised once
pub static TRACING: LazyLock<String> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let log_file_name = format!("client_tests{}", Uuid::new_v4());
        let (file, path) = telemetry::create_trace_file(&log_file_name).unwrap();
        let subscriber = get_subscriber(subscriber_name, default_filter_level, file);
        init_subscriber(subscriber).unwrap();
        format!("Traces for tests being written to: {path:?}")
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).unwrap();
        "Traces set to std::io::sink".to_string()
    }
});

pub struct TestApp {
    pub ctx: TestContext,
    pub backend: FakeBackend,
    pub store: MemoryStore,
    /// Admin of an enterprise called [`ENTERPRISE_NAME`]
    pub admin: TestUser,
    /// A branch of the admin's enterprise
    pub branch: TestBranch,
}

impl Debug for TestApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestApp")
            .field("backend", &self.backend)
            .field("admin", &self.admin)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

/// Builds an app that has not been started yet, with one enterprise admin and
/// one branch seeded in the backend
pub fn spawn_app() -> TestApp {
    start_tracing();
    let backend = FakeBackend::new();
    let store = MemoryStore::new();
    let admin = backend.seed_enterprise_admin(ENTERPRISE_NAME);
    let enterprise_id = admin
        .enterprise_id
        .expect("seeded admin always has an enterprise");
    let branch = backend.seed_branch(enterprise_id, "Harbour");
    let ctx = AppContext::new(
        backend.clone(),
        store.clone(),
        FakeHistory::new(),
        FakeModals::default(),
        RecordingRenderer::default(),
        DefaultSettings::default(),
    );
    TestApp {
        ctx,
        backend,
        store,
        admin,
        branch,
    }
}

fn start_tracing() {
    // Accessing TRACING also forces the LazyLock to initialize
    let logging_msg = TRACING.deref();
    println!("{logging_msg}");
}

pub fn page(id: &str) -> PageId {
    PageId::try_from(id).expect("valid page id")
}

pub fn modal(id: &str) -> ModalId {
    ModalId::try_from(id).expect("valid modal id")
}

impl TestApp {
    /// Starts the app with an empty query string
    pub async fn start(&mut self) {
        self.ctx.start("").await;
    }

    pub async fn login_admin(&mut self) -> DeskResult<()> {
        self.ctx.login(self.admin.login_args()).await
    }

    pub async fn login_branch(&mut self) -> DeskResult<()> {
        self.ctx.login_branch(self.branch.login_args()).await
    }

    /// Loads `id` the way a click on a dock link does
    pub fn visit(&mut self, id: &str) {
        self.ctx.load_page(page(id), LoadOptions::default());
    }

    pub fn press_back(&mut self) {
        self.ctx.router_mut().history_mut().back();
        self.deliver_pops();
    }

    pub fn press_forward(&mut self) {
        self.ctx.router_mut().history_mut().forward();
        self.deliver_pops();
    }

    /// Moves through the browser history by `delta` entries at once
    pub fn jump(&mut self, delta: isize) {
        self.ctx.router_mut().history_mut().go(delta);
        self.deliver_pops();
    }

    /// Hands every queued popstate notification to the app
    pub fn deliver_pops(&mut self) {
        while let Some(entry) = self.ctx.router_mut().history_mut().take_pop() {
            self.ctx.on_pop_state(entry);
        }
    }

    pub fn stored_branch_token(&self) -> Option<String> {
        self.store.value(STORAGE_KEY_BRANCH_TOKEN)
    }

    /// Simulates a branch token saved by an earlier page load
    pub fn store_branch_token(&self, token: &str) {
        self.store.insert(STORAGE_KEY_BRANCH_TOKEN, token);
    }

    pub fn current_page(&self) -> &str {
        self.ctx.router().current_page()
    }

    pub fn stack(&self) -> Vec<&str> {
        self.ctx
            .router()
            .state()
            .stack()
            .iter()
            .map(|x| &**x)
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.ctx.router().state().cursor()
    }

    pub fn visible_modals(&self) -> Vec<&str> {
        self.ctx.router().modals().visible()
    }

    pub fn last_rendered(&self) -> Option<&Rendered> {
        self.ctx.renderer().last()
    }

    pub fn last_page_rendered(&self) -> Option<&str> {
        self.ctx.renderer().last_page()
    }
}
