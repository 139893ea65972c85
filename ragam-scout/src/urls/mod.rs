//! URL handling for discovery runs.
//!
//! This module provides:
//! - Unwrapping of tracking/redirect wrapper URLs
//! - Normalized keys for deduplication
//! - Domain filters for interstitials and video hosts
//! - The run-wide URL aggregator

mod aggregate;
mod filters;
mod normalize;
mod wrapper;

pub use aggregate::UrlAggregator;
pub use filters::{UrlFilter, DEFAULT_INTERSTITIAL_DOMAINS, DEFAULT_VIDEO_HOSTS};
pub use normalize::{host_matches, host_of, normalize_key};
pub use wrapper::{
    default_wrapper_params, embedded_target, has_wrapper_param, is_http_url,
    unwrap_redirect_wrapper, DEFAULT_WRAPPER_PARAMS,
};
