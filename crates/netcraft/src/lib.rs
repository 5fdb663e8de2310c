//! Netcraft reporting API client for Rust.
//!
//! Every call goes through one pipeline: the body is encoded with the
//! API's wire conventions, the request is sent, and the response status is
//! checked against the statuses the call accepts. Rejected responses become
//! an [`Error::Failure`] carrying the method, path, status and any parsed
//! [`ApiError`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use netcraft::{MistakeReport, Netcraft};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netcraft::Error> {
//!     let client = Netcraft::new()?;
//!
//!     client
//!         .report()
//!         .mistake(&MistakeReport::new(
//!             "me@example.com",
//!             "This is our own login page",
//!             "https://login.example.com",
//!         ))
//!         .await?;
//!
//!     for entry in client.misc().leaderboard().await? {
//!         println!("{} {}", entry.rank, entry.nickname);
//!     }
//!     Ok(())
//! }
//! ```

mod api_error;
mod client;
pub mod codec;
mod config;
mod error;
mod transport;
pub mod types;

pub use api_error::{ApiError, ErrorDetail};
pub use client::{
    MiscMethods, Netcraft, ReportMethods, MAX_EMAIL_MESSAGE_SIZE, MAX_REASON_LENGTH,
    SUCCESS_MISTAKE_REPORT_MESSAGE, SUCCESS_REPORT_MESSAGE,
};
pub use codec::{EnumFamily, JsonCodec, WireEnum};
pub use config::{
    Config, NetcraftBuilder, API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    PREVIEW_MAX_LENGTH,
};
pub use error::{ClientFailure, CodecError, Error, FailureKind};
pub use transport::{AcceptedStatus, ApiRequest, ApiResponse, HttpTransport, JSON_CONTENT_TYPE};
pub use types::{
    Direction, EmailReport, FileSort, LeaderboardEntry, MistakeReport, ReportResult, State,
    UrlReport, UrlsReport,
};

pub use reqwest::{Method, StatusCode};

#[doc(hidden)]
pub use serde as __serde;
