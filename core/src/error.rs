use std::io;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RentlensErr>;

/// Failures that are visible to the user. Malformed stream lines, ambiguous
/// chunks and unparseable reports are recovered inside the pipeline and never
/// show up here.
#[derive(Error, Debug)]
pub enum RentlensErr {
    /// The analysis stream broke off: read error, early close or a transport
    /// level failure reported while streaming.
    #[error("stream error: {0}")]
    Stream(String),

    /// No bytes arrived for the configured idle window.
    #[error("no data received from the analysis stream for {0:?}")]
    IdleTimeout(Duration),

    /// The upstream service reported a failure through an `error` event.
    #[error("analysis failed: {0}")]
    Upstream(String),

    /// A non-success HTTP status from either collaborator.
    #[error("unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// A response body that could not be decoded.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl RentlensErr {
    /// Transport failures tear the stream down; everything else is reported
    /// by the service or the caller.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Stream(_)
                | Self::IdleTimeout(_)
                | Self::UnexpectedStatus { .. }
                | Self::Reqwest(_)
                | Self::Io(_)
        )
    }
}
