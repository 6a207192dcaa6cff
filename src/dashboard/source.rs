use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    auth::SESSION_COOKIE,
    models::{pagination::Pagination, ride::RidePage},
};

use super::session::{SessionHandle, SessionToken};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no active session")]
    Unauthorized,
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Where the ride list gets its pages from.
#[async_trait]
pub trait RideSource: Send + Sync {
    async fn fetch_page(&self, pagination: Pagination) -> Result<RidePage, SourceError>;

    async fn sign_out(&self) -> Result<(), SourceError>;
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
}

/// Talks to the dashboard's JSON API. The session cookie is read from the
/// shared [`SessionHandle`] on every request.
#[derive(Clone)]
pub struct HttpRideSource {
    client: reqwest::Client,
    base: Url,
    session: SessionHandle,
}

impl HttpRideSource {
    pub fn new(mut base: Url, session: SessionHandle, timeout: Duration) -> Result<Self, SourceError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|err| SourceError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base,
            session,
        })
    }

    /// Logs in through the form endpoint and publishes the issued cookie.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SessionToken, SourceError> {
        let response = self
            .client
            .post(self.endpoint("login")?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(network_error)?;

        let token = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
            .map(|pair| SessionToken(pair.to_string()));

        match token {
            Some(token) if response.status().is_redirection() => {
                self.session.set(Some(token.clone()));
                Ok(token)
            }
            _ => Err(SourceError::Unauthorized),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path)
            .map_err(|err| SourceError::Decode(format!("invalid endpoint {path}: {err}")))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, SourceError> {
        let token = self.session.current().ok_or(SourceError::Unauthorized)?;
        Ok(builder.header(header::COOKIE, token.cookie_header()))
    }
}

#[async_trait]
impl RideSource for HttpRideSource {
    async fn fetch_page(&self, pagination: Pagination) -> Result<RidePage, SourceError> {
        let request = self.authorized(self.client.get(self.endpoint("api/rides")?).query(&[
            ("page", pagination.page_index()),
            ("pageSize", pagination.page_size()),
        ]))?;
        debug!(page = pagination.page_index(), "fetching rides page");

        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<RidePage>()
                .await
                .map_err(|err| SourceError::Decode(err.to_string()));
        }

        let message = response
            .json::<ErrorPayload>()
            .await
            .map(|payload| payload.error)
            .unwrap_or_else(|_| status.to_string());
        Err(classify(status, message))
    }

    async fn sign_out(&self) -> Result<(), SourceError> {
        let outcome = match self.authorized(self.client.post(self.endpoint("api/auth/sign-out")?)) {
            Ok(request) => match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || status.is_redirection() {
                        Ok(())
                    } else {
                        Err(classify(status, status.to_string()))
                    }
                }
                Err(err) => Err(network_error(err)),
            },
            Err(SourceError::Unauthorized) => Ok(()),
            Err(err) => Err(err),
        };
        // The local session is dropped even when the server call fails.
        self.session.clear();
        if let Err(err) = &outcome {
            warn!("sign-out request failed: {err}");
        }
        outcome
    }
}

fn classify(status: StatusCode, message: String) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED => SourceError::Unauthorized,
        s if s.is_client_error() => SourceError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => SourceError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

fn network_error(err: reqwest::Error) -> SourceError {
    SourceError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_error_kinds() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "No existe sesión".into()),
            SourceError::Unauthorized
        );
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, "page".into()),
            SourceError::Rejected { status: 400, .. }
        ));
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            SourceError::Server { status: 500, .. }
        ));
    }
}
