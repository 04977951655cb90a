//! List handling shared by every collection view: envelope normalization,
//! ordering, search and pagination, all performed in memory.

pub mod envelope;
pub mod fields;
pub mod filter;
pub mod ordering;
pub mod paginate;

pub use envelope::normalize_envelope;
pub use ordering::ListOrdering;
pub use paginate::{OpenDonePager, PageItem, PageView, page_strip, paginate};
