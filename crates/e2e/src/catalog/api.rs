//! Client for the catalog's JSON API
//!
//! Only the endpoints the suite needs: session login/logout and report
//! download. The server keeps the session in a cookie, so every client
//! carries its own cookie store.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::{E2eError, E2eResult};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Account details returned by a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub admin: bool,
}

/// `{"status": "success" | "failure" | "warning", ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReply {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub account: Option<Account>,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    fn describe(&self) -> String {
        match &self.message {
            Some(message) => format!("{} ({})", message, self.status),
            None => self.status.clone(),
        }
    }
}

pub struct CatalogApi {
    http: reqwest::Client,
    api_url: String,
}

impl CatalogApi {
    pub fn new(api_url: impl Into<String>) -> E2eResult<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `POST /api/session`.
    ///
    /// A refused login comes back as a 401 with a JSON body, so the body is
    /// read before the status code.
    pub async fn login(&self, credentials: &Credentials) -> E2eResult<Account> {
        let url = format!("{}/session", self.api_url);
        debug!("logging in to {} as {}", url, credentials.username);

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await?;
        let status = response.status();
        let reply: ApiReply = response
            .json()
            .await
            .map_err(|e| E2eError::Authentication(format!("unreadable login reply ({}): {}", status, e)))?;

        check_login(reply)
    }

    /// `DELETE /api/session`
    pub async fn logout(&self) -> E2eResult<()> {
        let url = format!("{}/session", self.api_url);
        let reply: ApiReply = self.http.delete(&url).send().await?.json().await?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(E2eError::Api(format!("logout: {}", reply.describe())))
        }
    }

    /// `GET /api/report/{id}`: the raw workbook bytes of an Excel report
    pub async fn fetch_report(&self, request_id: &str) -> E2eResult<Vec<u8>> {
        let url = format!("{}/report/{}", self.api_url, request_id);
        info!("fetching {}", url);

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);
        let body = response.bytes().await?;

        if is_json {
            // HTML-format reports and errors come back as JSON, never a workbook
            let reply: ApiReply = serde_json::from_slice(&body)?;
            return Err(E2eError::Api(format!("report {} is not a workbook: {}", request_id, reply.describe())));
        }
        Ok(body.to_vec())
    }
}

fn check_login(reply: ApiReply) -> E2eResult<Account> {
    if !reply.is_success() {
        return Err(E2eError::Authentication(reply.describe()));
    }
    reply
        .account
        .ok_or_else(|| E2eError::Authentication("login reply carries no account".to_string()))
}
