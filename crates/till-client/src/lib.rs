//! # till-client: I/O Layer for Till POS
//!
//! HTTP access to the POS backend, the held-sale file, and the register's
//! configuration. All pricing decisions stay in `till-core`; this crate only
//! moves data.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  register command                                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  dyn PosApi ──► HttpPosApi ──► wire DTO (dollars) ──► reqwest ──► HTTP │
//! │        ▲                                                         │      │
//! │        │                                                         ▼      │
//! │  till-core type (cents) ◄── wire DTO ◄── handle_response ◄── JSON      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - `PosApi` trait and the `reqwest` implementation
//! - [`wire`] - JSON bodies and the decimal ↔ cents boundary
//! - [`held_store`] - Single-slot held-sale file
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Client error types

pub mod api;
pub mod config;
pub mod error;
pub mod held_store;
pub mod wire;

pub use api::{HistoryRange, HttpPosApi, PosApi};
pub use config::{ApiConfig, RegisterConfig};
pub use error::{ClientError, ClientResult};
pub use held_store::HeldSaleStore;
pub use wire::SaleSummary;
