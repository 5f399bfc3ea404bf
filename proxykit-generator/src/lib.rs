//! FoxyProxy configuration document generator.
//!
//! Turns an endpoint, port, region and proxy count plus a pair of account
//! credentials into the JSON document the FoxyProxy add-on imports. Each entry
//! gets its own upstream session through a random session id embedded in the
//! derived username.
//!
//! ```
//! use proxykit_generator::{build_document, Credentials, GeneratorOptions};
//!
//! let options = GeneratorOptions::new("na.proxys5.net", 6200, "US", 3);
//! let credentials = Credentials::new("abc", "xyz");
//! let doc = build_document(&options, &credentials).unwrap();
//!
//! assert_eq!(doc.mode, "na.proxys5.net:6200");
//! assert_eq!(doc.data.len(), 3);
//! assert_eq!(doc.data[0].title, "1 🌟");
//! ```

pub mod builder;
pub mod document;
pub mod export;
pub mod options;
pub mod palette;

pub use builder::{
    build_document, build_document_with_rng, build_entry, generate_session_id,
    generate_session_id_with, SESSION_ID_LEN,
};
pub use document::{Commands, ConfigDocument, ProxyEntry, PROXY_TYPE_SOCKS5};
pub use export::{export_filename, write_document};
pub use options::{Credentials, GeneratorOptions, SESSION_MINUTES};

use proxykit_common::ProxyKitError;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("{0}")]
    Validation(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing export failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GeneratorError> for ProxyKitError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::Validation(msg) => ProxyKitError::Validation(msg),
            other => ProxyKitError::Persistence(other.to_string()),
        }
    }
}
