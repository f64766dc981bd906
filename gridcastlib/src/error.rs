//! Error types for gridcastlib

use thiserror::Error;

use crate::sink::Media;

/// Errors that can occur while building, customizing or exporting a table
#[derive(Error, Debug)]
pub enum GridcastError {
    /// A customization payload or table document could not be interpreted
    #[error("invalid payload: {0}")]
    Payload(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A format identifier did not name any known media
    #[error("unknown output format: {0}")]
    UnknownMedia(String),

    /// The media is known but no sink is registered for it
    #[error("no sink registered for {0}")]
    UnsupportedMedia(Media),

    /// The sink failed while the table was being written
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// The single error category surfaced when traversal into a sink fails.
///
/// Carries the media being produced and the originating sink failure.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("error exporting table as {media}: {source}")]
    Generation {
        media: Media,
        #[source]
        source: SinkError,
    },
}

impl ExportError {
    /// Media whose sink raised the failure.
    pub fn media(&self) -> Media {
        match self {
            ExportError::Generation { media, .. } => *media,
        }
    }
}

/// Failures raised by a sink implementation.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Event received in a state the sink cannot handle
    #[error("{0}")]
    Message(String),
}

impl SinkError {
    pub fn message(msg: impl Into<String>) -> Self {
        SinkError::Message(msg.into())
    }
}

impl<W> From<csv::IntoInnerError<W>> for SinkError {
    fn from(err: csv::IntoInnerError<W>) -> Self {
        let io = err.error();
        SinkError::Io(std::io::Error::new(io.kind(), io.to_string()))
    }
}

/// A property could not be read or translated from a row source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve property '{property}': {message}")]
pub struct ResolveError {
    pub property: String,
    pub message: String,
}

impl ResolveError {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

/// A capability probe (e.g. an access-control check) failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("capability check failed: {0}")]
pub struct CapabilityError(pub String);
