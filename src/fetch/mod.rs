//! Remote lookups over HTTP.
//!
//! This module provides the release feed client and the redirect resolver
//! used in front of artifact downloads.

pub mod metadata;
pub mod redirect;

pub use metadata::{parse_feed, MetadataClient, ReleaseType, UpdateMetadata};
pub use redirect::RedirectingFetcher;
