//! Netcraft client implementation.

use crate::config::{Config, NetcraftBuilder};
use crate::error::{ClientFailure, FailureKind};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::types::{
    EmailReport, LeaderboardContainer, LeaderboardEntry, MistakeReport, ReportResult, UrlsReport,
};
use crate::Error;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Confirmation message of a successful URL or email report.
pub const SUCCESS_REPORT_MESSAGE: &str = "Successfully reported";

/// Confirmation message of a successful mistake report.
pub const SUCCESS_MISTAKE_REPORT_MESSAGE: &str = "Successfully reported mistake";

/// Longest accepted report reason, in characters.
pub const MAX_REASON_LENGTH: usize = 10_000;

/// Largest accepted reported email, in bytes.
pub const MAX_EMAIL_MESSAGE_SIZE: usize = 20 * 1024 * 1024;

const REPORT_URLS_PATH: &str = "report/urls";
const REPORT_EMAIL_PATH: &str = "report/email";
const REPORT_MISTAKE_PATH: &str = "report/mistake";
const LEADERBOARD_PATH: &str = "stats/leaderboard";

/// Netcraft API client.
///
/// Cloning is cheap; clones share one connection pool and may be used
/// from any number of tasks at once.
///
/// # Example
///
/// ```rust,no_run
/// use netcraft::{Netcraft, UrlReport, UrlsReport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), netcraft::Error> {
///     let client = Netcraft::new()?;
///
///     let uuid = client
///         .report()
///         .urls(&UrlsReport::new(
///             "me@example.com",
///             "Phishing page imitating my bank",
///             [UrlReport::new("https://login.bank.example.test")],
///         ))
///         .await?;
///
///     println!("submission {uuid}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Netcraft {
    config: Arc<Config>,
    transport: Arc<HttpTransport>,
}

impl Netcraft {
    /// Create a new builder.
    pub fn builder() -> NetcraftBuilder {
        NetcraftBuilder::new()
    }

    /// Create a client with the default configuration.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    pub(crate) fn from_config(config: Config) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a raw API request.
    ///
    /// Returns the response when its status is accepted by the request.
    /// Use [`ApiResponse::json`] to decode it.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        request: ApiRequest<'_, B>,
    ) -> Result<ApiResponse, Error> {
        self.transport.execute(request).await
    }

    /// Report malicious URLs, emails or mistakes.
    pub fn report(&self) -> ReportMethods<'_> {
        ReportMethods { client: self }
    }

    /// Endpoints that fit nowhere else.
    pub fn misc(&self) -> MiscMethods<'_> {
        MiscMethods { client: self }
    }

    // ============================================
    // INTERNAL
    // ============================================

    async fn post_report<B: Serialize>(
        &self,
        path: &'static str,
        label: &str,
        body: &B,
        expected: &str,
    ) -> Result<(StatusCode, ReportResult), Error> {
        let response = self.execute(ApiRequest::post(path).json(body)).await?;
        let method = response.method().clone();
        let status = response.status();
        let result: ReportResult = response.json().await?;

        if result.message != expected {
            return Err(contract_violation(
                &method,
                path,
                status,
                format!(
                    "{label} reporting response has an unexpected message: {}",
                    result.message
                ),
            ));
        }

        Ok((status, result))
    }
}

impl NetcraftBuilder {
    /// Build the Netcraft client.
    pub fn build(self) -> Result<Netcraft, Error> {
        let config = self.build_config()?;
        Netcraft::from_config(config)
    }
}

fn contract_violation(method: &Method, path: &str, status: StatusCode, message: String) -> Error {
    error!(%method, path, %status, message = %message, "unexpected response contents");
    ClientFailure::new(FailureKind::ContractViolation, method.clone(), path, message)
        .with_status(status)
        .into()
}

fn require(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ============================================
// NAMESPACE METHODS
// ============================================

/// Report endpoints.
pub struct ReportMethods<'a> {
    client: &'a Netcraft,
}

impl<'a> ReportMethods<'a> {
    /// Report malicious URLs. Returns the submission UUID.
    ///
    /// Accepted types include phishing, malware, cryptocurrency scams, fake
    /// tech support, fake shops, web shells and phishing kits.
    #[instrument(skip(self, report), fields(url_count = report.urls.len()))]
    pub async fn urls(&self, report: &UrlsReport) -> Result<String, Error> {
        require("email", &report.email)?;
        require("reason", &report.reason)?;
        if report.reason.chars().count() > MAX_REASON_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "reason is over {MAX_REASON_LENGTH} characters"
            )));
        }
        if report.urls.is_empty() {
            return Err(Error::InvalidArgument("no URLs were provided".into()));
        }
        for url in &report.urls {
            require("url", &url.url)?;
        }

        let (status, result) = self
            .client
            .post_report(REPORT_URLS_PATH, "URLs", report, SUCCESS_REPORT_MESSAGE)
            .await?;

        let uuid = submission_uuid(&Method::POST, REPORT_URLS_PATH, status, result)?;
        info!(%uuid, "URLs reported");
        Ok(uuid)
    }

    /// Report a malicious email. Returns the submission UUID.
    ///
    /// The message is either plain MIME, or base64 of the AES-256-CBC
    /// encrypted MIME message when a password is set.
    #[instrument(skip(self, report))]
    pub async fn email(&self, report: &EmailReport) -> Result<String, Error> {
        require("email", &report.email)?;
        require("message", &report.message)?;
        if report.message.len() > MAX_EMAIL_MESSAGE_SIZE {
            return Err(Error::InvalidArgument("message is over 20 MiB".into()));
        }

        let (status, result) = self
            .client
            .post_report(REPORT_EMAIL_PATH, "Email", report, SUCCESS_REPORT_MESSAGE)
            .await?;

        let uuid = submission_uuid(&Method::POST, REPORT_EMAIL_PATH, status, result)?;
        info!(%uuid, "email reported");
        Ok(uuid)
    }

    /// Report a false positive for review.
    #[instrument(skip(self, report), fields(url = %report.url))]
    pub async fn mistake(&self, report: &MistakeReport) -> Result<(), Error> {
        require("email", &report.email)?;
        require("reason", &report.reason)?;
        require("url", &report.url)?;

        self.client
            .post_report(
                REPORT_MISTAKE_PATH,
                "Mistake",
                report,
                SUCCESS_MISTAKE_REPORT_MESSAGE,
            )
            .await?;

        info!("mistake reported");
        Ok(())
    }
}

fn submission_uuid(
    method: &Method,
    path: &str,
    status: StatusCode,
    result: ReportResult,
) -> Result<String, Error> {
    result
        .uuid
        .filter(|uuid| !uuid.is_empty())
        .ok_or_else(|| contract_violation(method, path, status, "report response has no uuid".into()))
}

/// Miscellaneous endpoints.
pub struct MiscMethods<'a> {
    client: &'a Netcraft,
}

impl<'a> MiscMethods<'a> {
    /// The public reporter leaderboard.
    #[instrument(skip(self))]
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, Error> {
        let response = self.client.execute(ApiRequest::get(LEADERBOARD_PATH)).await?;
        let container: LeaderboardContainer = response.json().await?;
        Ok(container.leaderboard)
    }
}
