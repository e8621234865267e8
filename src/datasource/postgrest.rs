//! PostgREST client for the hosted store

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{DataSource, Query};
use crate::{
    config::DataConfig,
    error::{AppError, AppResult},
    session::SessionReader,
};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Talks to `{url}/rest/v1`, authenticating as the signed-in user when there is one
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    rest_url: String,
    anon_key: String,
    session: SessionReader,
}

impl PostgrestClient {
    pub fn new(config: &DataConfig, session: SessionReader) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            session,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let token = self
            .session
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, format!("{}/{}", self.rest_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<PostgrestError>(&body).ok();
        let code = error
            .as_ref()
            .and_then(|e| e.code.clone())
            .or_else(|| Some(status.as_u16().to_string()));
        let message = match error {
            Some(PostgrestError {
                message: Some(message),
                details,
                ..
            }) => match details {
                Some(details) => format!("{} ({})", message, details),
                None => message,
            },
            _ if body.is_empty() => status.to_string(),
            _ => body,
        };
        Err(AppError::remote(code, message))
    }
}

#[async_trait]
impl DataSource for PostgrestClient {
    async fn select(&self, query: &Query) -> AppResult<Vec<Value>> {
        tracing::debug!(table = %query.table, "select");
        let request = self
            .request(reqwest::Method::GET, &query.table)
            .query(&query.select_params());
        Ok(self.send(request).await?.json().await?)
    }

    async fn select_single(&self, query: &Query) -> AppResult<Value> {
        tracing::debug!(table = %query.table, "select single");
        let request = self
            .request(reqwest::Method::GET, &query.table)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .query(&query.select_params());
        Ok(self.send(request).await?.json().await?)
    }

    async fn insert(&self, table: &str, row: &Value) -> AppResult<Vec<Value>> {
        tracing::debug!(table = %table, "insert");
        let request = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(row);
        Ok(self.send(request).await?.json().await?)
    }

    async fn update(&self, query: &Query, changes: &Value) -> AppResult<Vec<Value>> {
        tracing::debug!(table = %query.table, "update");
        let request = self
            .request(reqwest::Method::PATCH, &query.table)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&query.filter_params())
            .json(changes);
        Ok(self.send(request).await?.json().await?)
    }

    async fn delete(&self, query: &Query) -> AppResult<Vec<Value>> {
        tracing::debug!(table = %query.table, "delete");
        let request = self
            .request(reqwest::Method::DELETE, &query.table)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&query.filter_params());
        Ok(self.send(request).await?.json().await?)
    }

    async fn rpc(&self, function: &str, args: &Value) -> AppResult<Value> {
        tracing::debug!(function = %function, "rpc");
        let request = self
            .request(reqwest::Method::POST, &format!("rpc/{}", function))
            .json(args);
        Ok(self.send(request).await?.json().await?)
    }
}
