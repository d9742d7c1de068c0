//! HTTP gateway to a hub
//!
//! Implements [`hub_core::RemoteGateway`] over the hub's web UI: list pages
//! are scraped ([`html`]), code is fetched and updated through the JSON
//! endpoints the built-in code editor uses, and new code is created by
//! submitting the editor's form.

pub mod client;
pub mod error;
pub mod html;

pub use client::HubClient;
pub use error::{Error, Result};
pub use html::{Device, InstalledApp};
