//! Generic REST client for the hosted relational store (PostgREST-style API).
//!
//! Every table operation is a single HTTP call against `/rest/v1/<table>`
//! with filters encoded as query parameters. No retries, no timeouts; a
//! failed call surfaces as a `StoreError` for the handler boundary.

use log::debug;
use serde::Serialize;
use serde_json::Value;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid store configuration: {0}")]
    Config(String),
}

/// Handle to the remote store; constructed once at startup and injected
/// through Rocket managed state.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base", &self.base.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl StoreClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let base = Url::parse(base_url).map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(StoreClient {
            http: reqwest::Client::new(),
            base,
            api_key: api_key.to_string(),
        })
    }

    pub fn table(&self, name: &str) -> TableRequest<'_> {
        TableRequest {
            client: self,
            table: name.to_string(),
            params: Vec::new(),
            columns: "*".to_string(),
        }
    }

    fn endpoint(&self, table: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config("store URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// One pending table operation: filters accumulate, then a verb executes it.
pub struct TableRequest<'a> {
    client: &'a StoreClient,
    table: String,
    params: Vec<(String, String)>,
    columns: String,
}

impl<'a> TableRequest<'a> {
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn in_list(mut self, column: &str, values: &[String]) -> Self {
        self.params
            .push((column.to_string(), format!("in.({})", values.join(","))));
        self
    }

    /// Raw disjunction filter, e.g. `(channel_id.is.null,channel_id.eq.X)`
    pub fn or_filter(mut self, expression: &str) -> Self {
        self.params.push(("or".to_string(), expression.to_string()));
        self
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.params
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    pub fn limit(mut self, count: u32) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    fn url(&self, extra: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = self.client.endpoint(&self.table)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in extra {
                pairs.append_pair(key, value);
            }
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn select(self) -> Result<Vec<Value>, StoreError> {
        let url = self.url(&[("select", self.columns.as_str())])?;
        debug!("store select: {url}");
        let response = self
            .client
            .request(reqwest::Method::GET, url)
            .send()
            .await?;
        rows_from(response).await
    }

    /// Select exactly one row; zero rows is `None`, not an error.
    pub async fn select_one(self) -> Result<Option<Value>, StoreError> {
        let url = self.url(&[("select", self.columns.as_str())])?;
        debug!("store select one: {url}");
        let response = self
            .client
            .request(reqwest::Method::GET, url)
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await?;
        if response.status().as_u16() == 406 {
            return Ok(None);
        }
        let response = check_status(response).await?;
        Ok(Some(response.json::<Value>().await?))
    }

    pub async fn insert<T: Serialize + ?Sized>(self, body: &T) -> Result<Vec<Value>, StoreError> {
        let url = self.url(&[])?;
        debug!("store insert: {url}");
        let response = self
            .client
            .request(reqwest::Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        rows_from(response).await
    }

    /// Insert-or-update keyed on the declared conflict target columns.
    pub async fn upsert<T: Serialize + ?Sized>(
        self,
        body: &T,
        on_conflict: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let url = self.url(&[("on_conflict", on_conflict)])?;
        debug!("store upsert: {url}");
        let response = self
            .client
            .request(reqwest::Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(body)
            .send()
            .await?;
        rows_from(response).await
    }

    pub async fn update<T: Serialize + ?Sized>(self, body: &T) -> Result<Vec<Value>, StoreError> {
        let url = self.url(&[])?;
        debug!("store update: {url}");
        let response = self
            .client
            .request(reqwest::Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        rows_from(response).await
    }

    pub async fn delete(self) -> Result<(), StoreError> {
        let url = self.url(&[])?;
        debug!("store delete: {url}");
        let response = self
            .client
            .request(reqwest::Method::DELETE, url)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

async fn rows_from(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
    let response = check_status(response).await?;
    if response.content_length() == Some(0) {
        return Ok(Vec::new());
    }
    Ok(response.json::<Vec<Value>>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StoreClient {
        StoreClient::new("https://store.example.com", "test-key").unwrap()
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("test-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn builds_table_endpoint() {
        let store = client();
        let url = store.endpoint("videos").unwrap();
        assert_eq!(url.as_str(), "https://store.example.com/rest/v1/videos");
    }

    #[test]
    fn encodes_eq_and_order_filters() {
        let store = client();
        let request = store
            .table("videos")
            .eq("query_key", "seo basics")
            .order("published_at", true)
            .limit(9);
        let url = request.url(&[("select", "*")]).unwrap();
        assert_eq!(
            url.query().unwrap(),
            "select=*&query_key=eq.seo+basics&order=published_at.desc&limit=9"
        );
    }

    #[test]
    fn encodes_membership_filter() {
        let store = client();
        let request = store
            .table("videos")
            .in_list("video_id", &["a".to_string(), "b".to_string()]);
        let url = request.url(&[]).unwrap();
        assert_eq!(url.query().unwrap(), "video_id=in.%28a%2Cb%29");
    }

    #[test]
    fn encodes_disjunction_filter() {
        let store = client();
        let request = store
            .table("user_topics")
            .eq("user_id", "u1")
            .or_filter("(channel_id.is.null,channel_id.eq.UC123)");
        let url = request.url(&[]).unwrap();
        let query = url.query().unwrap();
        assert!(query.starts_with("user_id=eq.u1&or="));
        assert!(query.contains("channel_id.is.null"));
        assert!(query.contains("channel_id.eq.UC123"));
    }

    #[test]
    fn upsert_url_carries_conflict_target() {
        let store = client();
        let request = store.table("videos");
        let url = request.url(&[("on_conflict", "video_id")]).unwrap();
        assert_eq!(url.query().unwrap(), "on_conflict=video_id");
    }
}
