//! Shared plumbing for the microservice HTTP clients.

use std::time::Duration;

use anyhow::{Context, Result};
use durable::TaskError;
use reqwest::{Client, Response, StatusCode};

/// Non-success HTTP status from a collaborator service.
#[derive(Debug, thiserror::Error)]
#[error("{service} service returned {status}: {body}")]
pub struct ServiceError {
    pub service: &'static str,
    pub status: StatusCode,
    pub body: String,
}

impl ServiceError {
    /// 4xx other than 408/429 will not succeed on retry.
    pub fn is_permanent(&self) -> bool {
        self.status.is_client_error()
            && self.status != StatusCode::REQUEST_TIMEOUT
            && self.status != StatusCode::TOO_MANY_REQUESTS
    }
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Pass through success responses; turn anything else into a [`ServiceError`].
pub async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ServiceError {
        service,
        status,
        body,
    }
    .into())
}

/// Map an activity error onto the task retry contract.
pub fn classify_error(error: anyhow::Error) -> TaskError {
    let permanent = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ServiceError>())
        .any(ServiceError::is_permanent);

    if permanent {
        TaskError::terminal(format!("{error:#}"))
    } else {
        TaskError::from(error)
    }
}
