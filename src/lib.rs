//! Client core for the mould-tracking and MES backend: session and role
//! gating, typed API access, in-memory list handling and the machine panel
//! stopwatch.

/// Backend API client.
pub mod api;
/// Application directory helpers.
pub mod app_dirs;
/// Token claims, roles and route gating.
pub mod auth;
/// Persistent client settings.
pub mod config;
/// Shared HTTP agent and bounded body readers.
pub mod http_client;
/// List normalization, ordering, filtering and pagination.
pub mod listing;
/// Logging setup.
pub mod logging;
/// MES machine panel.
pub mod mes;
/// Typed backend records.
pub mod models;
/// Session storage.
pub mod session;
