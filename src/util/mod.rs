//! Utility functions shared by configuration and the channel source.

mod url_validator;

pub use url_validator::{validate_bridge_url, UrlValidationError};
