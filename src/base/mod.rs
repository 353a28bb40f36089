mod payload;

pub use payload::{Payload, Record};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, DATE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::util::time::{parse_http_date, rectify_time};

/// Sent on the wire as `X-Kanbanery-ApiToken`; header names are case-insensitive.
pub const API_TOKEN_HEADER: &str = "x-kanbanery-apitoken";

/// Query string and JSON body sent along with a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn body(body: Value) -> Self {
        Self {
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Authenticated request layer shared by every resource.
#[derive(Debug, Clone)]
pub struct Base {
    config: Config,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Workspace {
    name: String,
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct Project {
    id: u64,
    name: String,
}

impl Base {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project_id(&self) -> Option<u64> {
        self.config.project_id()
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::GET, url, options, StatusCode::OK).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::POST, url, options, StatusCode::CREATED)
            .await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::PUT, url, options, StatusCode::OK).await
    }

    /// Look up a project id by workspace and project name.
    pub async fn find_project_id(
        project_name: &str,
        workspace_name: &str,
        api_key: &str,
    ) -> Result<Option<u64>> {
        Base::new(Config::new(api_key, workspace_name, None))
            .project_id_for(project_name)
            .await
    }

    /// Project id by name inside this config's workspace.
    pub async fn project_id_for(&self, project_name: &str) -> Result<Option<u64>> {
        let payload = self
            .get("/user/workspaces.json", RequestOptions::default())
            .await?;
        let workspaces: Vec<Workspace> = serde_json::from_value(payload.into_value())?;

        let project_id = workspaces
            .into_iter()
            .find(|w| w.name == self.config.workspace())
            .and_then(|w| w.projects.into_iter().find(|p| p.name == project_name))
            .map(|p| p.id);
        Ok(project_id)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let token = HeaderValue::from_str(self.config.api_key()).map_err(|_| {
            Error::InvalidParameter("api_key contains characters not allowed in a header.".into())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_TOKEN_HEADER), token);
        Ok(headers)
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
        expected: StatusCode,
    ) -> Result<Payload> {
        check_parameters(url, &options)?;

        let full_url = format!("{}{}", self.config.base_uri(), url);
        tracing::debug!(%method, %url, "kanbanery request");

        let mut builder = self
            .client
            .request(method.clone(), &full_url)
            .headers(self.headers()?);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status != expected {
            tracing::warn!(%method, %url, %status, "unexpected kanbanery response status");
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                code: status.as_u16(),
                status: status.to_string(),
                body: serde_json::from_str(&text).ok(),
            });
        }

        let server_time = response
            .headers()
            .get(DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);
        let value: Value = response.json().await?;
        let mut payload = Payload::from_value(value)?;
        if let Some(server_time) = server_time {
            for record in payload.records_mut() {
                rectify_time(record, server_time);
            }
        }
        Ok(payload)
    }
}

fn check_parameters(url: &str, options: &RequestOptions) -> Result<()> {
    if !url.starts_with('/') {
        return Err(Error::InvalidParameter(
            "url must be a path starting with '/'.".into(),
        ));
    }
    if let Some(body) = &options.body {
        if !body.is_object() {
            return Err(Error::InvalidParameter(
                "options body must be a JSON object.".into(),
            ));
        }
    }
    Ok(())
}

/// Build an error from a field -> messages response body, falling back to
/// the bare message for any other shape.
pub fn invalid_response_error(msg: &str, response: &Value) -> Error {
    let Some(fields) = response.as_object() else {
        return Error::InvalidResponse(msg.to_string());
    };

    let mut parts = Vec::new();
    for (field, messages) in fields {
        let Some(messages) = messages.as_array() else {
            return Error::InvalidResponse(msg.to_string());
        };
        for message in messages {
            let text = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            parts.push(format!("{field} {text}"));
        }
    }

    if parts.is_empty() {
        Error::InvalidResponse(msg.to_string())
    } else {
        Error::InvalidResponse(format!("{msg} {}", parts.join(", ")))
    }
}

#[cfg(test)]
mod tests;
