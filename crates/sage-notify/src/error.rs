/// Errors raised by the outbound transports.
///
/// Callers on the pipeline path log these and carry on; nothing here is
/// retried.
///
/// # Examples
///
/// ```rust
/// use sage_notify::error::NotifyError;
///
/// let err = NotifyError::ApiError {
///     service: "chat webhook".to_string(),
///     status: 404,
///     body: "no_service".to_string(),
/// };
/// assert!(err.to_string().contains("404"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport has no endpoint configured.
    #[error("Notify: {0} is not configured")]
    NotConfigured(&'static str),

    /// An HTTP request to an external endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization of an outbound body failed.
    #[error("Notify: JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The external API returned a non-success response.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    ApiError {
        service: String,
        status: u16,
        body: String,
    },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
