//! Session, settings and navigation core for the bizdesk dashboard
//! NB: The assumption is made that the async runtime has already been started
//! before any functions from this library are called

#![warn(unused_crate_dependencies)]



pub mod backend;
mod client;
pub mod configuration;
mod context;
pub mod router;
mod sequence;
pub mod session;
pub mod settings;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use backend::{
    AuthEvent, AuthStateChange, BrowserHistory, LocalStore, ModalHost, NewBranchAccount,
    RemoteBackend, RemoteSession, RemoteUser, ViewRenderer,
};
pub use client::Client;
pub use configuration::{BackendSettings, ClientConfig, DefaultSettings};
pub use context::AppContext;
pub use router::{LoadOptions, NavigationState, Router};
pub use sequence::{RequestSequencer, Ticket, TrackedField};
pub use session::{AuthTransition, SessionStore};
pub use settings::SettingsLoader;
