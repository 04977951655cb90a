//! Backend API: auth, record collections, file downloads and production.

mod client;
mod error;
pub mod form;
mod production;
pub mod resource;

pub use client::{ApiClient, Body, DEFAULT_DOWNLOAD_LIMIT, ListQuery};
pub use error::{ApiError, error_detail};
pub use form::MultipartForm;
pub use resource::{BodyEncoding, Resource};
