//! Parsing errors for the LCP JSON documents.

use thiserror::Error;

/// Errors raised while parsing a License or Status Document.
#[derive(Debug, Error)]
pub enum ParsingError {
    /// The payload is not well-formed JSON.
    #[error("the JSON is malformed and can't be parsed")]
    MalformedJson(#[source] serde_json::Error),

    /// The JSON does not represent a valid License Document.
    #[error("the JSON is not representing a valid License Document")]
    LicenseDocument,

    /// The JSON does not represent a valid Status Document.
    #[error("the JSON is not representing a valid Status Document")]
    StatusDocument,

    /// A link object is malformed.
    #[error("a link in the document is malformed")]
    Link,

    /// The encryption object is malformed.
    #[error("the encryption object in the document is malformed")]
    Encryption,

    /// The signature object is malformed.
    #[error("the signature object in the document is malformed")]
    Signature,

    /// A link with the given rel holds an invalid URL.
    #[error("the link with rel {0} holds an invalid URL")]
    Url(String),
}

/// Result type for document parsing.
pub type ParsingResult<T> = Result<T, ParsingError>;
