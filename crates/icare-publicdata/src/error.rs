use thiserror::Error;

/// Errors returned by the public-data API client.
#[derive(Debug, Error)]
pub enum PublicDataError {
    /// Network or TLS failure, or a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a `resultCode` other than `00`.
    #[error("public data API error {code}: {message}")]
    Api { code: String, message: String },

    /// The response body did not match the expected XML shape.
    #[error("XML decode error for {context}: {source}")]
    Xml {
        context: String,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
