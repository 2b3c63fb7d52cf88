//! Upstream provider plumbing shared by every service
//!
//! Endpoint and credential configuration, response sniffing (JSON vs XML
//! error envelope), listing decoding and credential redaction for logs.

mod config;
mod envelope;
mod listing;
mod urls;

pub use config::{Credentials, Endpoints, PagingConfig, ResolverConfig};
pub use envelope::{expect_json, sniff, Payload};
pub use listing::{decode_listing, f64_field, str_field, Listing};
pub use urls::{build_url, redact_url};
