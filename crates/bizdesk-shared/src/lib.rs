//! Types shared by the bizdesk client crates
//!
//! Nothing in here talks to the network or the browser. Values are validated
//! on construction so the rest of the client can pass them around freely.

#![warn(unused_crate_dependencies)]

pub mod branch;
pub mod const_config;
pub mod enterprise;
pub mod errors;
pub mod id;
mod macros;
pub mod nav;
pub mod req_args;
pub mod settings;
pub mod token;
pub mod uac;

#[cfg(not(target_arch = "wasm32"))]
pub mod telemetry;

