#![cfg(not(target_arch = "wasm32"))]

mod auth_changes;
mod capabilities;
mod helpers;
mod login;
mod logout;
mod modals;
mod navigation;
mod session_init;
mod settings;
