use anyhow::Context;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use url::Url;

/// Thin HTTP client for the changes endpoints
pub struct ChangesClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ListQuery {
    pub item_type: Option<String>,
    pub item_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ChangesClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server URL: {}", server))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("cannot build URL for {}", path))
    }

    pub async fn list(&self, query: &ListQuery) -> anyhow::Result<Value> {
        let mut url = self.endpoint("/changes")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(t) = &query.item_type {
                pairs.append_pair("type", t);
            }
            if let Some(id) = query.item_id {
                pairs.append_pair("id", &id.to_string());
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(per_page) = query.per_page {
                pairs.append_pair("per_page", &per_page.to_string());
            }
        }
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn show(&self, id: i64) -> anyhow::Result<Value> {
        let url = self.endpoint(&format!("/changes/{}", id))?;
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn revert(&self, id: i64) -> anyhow::Result<Value> {
        let url = self.endpoint(&format!("/changes/{}", id))?;
        self.send(self.request(Method::PUT, url)).await
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and return the JSON envelope; non-2xx statuses become errors
    /// carrying the server's message.
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await.context("request failed")?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("server answered {} without a JSON body", status))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            anyhow::bail!("{} ({})", message, status);
        }
        Ok(body)
    }
}
