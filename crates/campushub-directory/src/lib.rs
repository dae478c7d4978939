//! # campushub-directory
//!
//! Client interface to the external portal store. The realtime core never
//! persists users, courses, or messages itself; everything
//! membership-related is answered by a [`DirectoryStore`] implementation:
//!
//! - [`HttpDirectory`] — queries the portal backend's directory API
//! - [`InMemoryDirectory`] — seedable provider for tests and development

pub mod http;
pub mod memory;
pub mod store;

pub use http::HttpDirectory;
pub use memory::{CourseRecord, InMemoryDirectory};
pub use store::{DirectoryStore, MembershipSnapshot};
