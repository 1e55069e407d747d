//! REST client for the hosted store.
//!
//! Table reads go to `{store}/rest/v1/{table}` with `column=eq.value`
//! filters. Every request carries the project's public key in `apikey` and
//! the user's token as a bearer credential, so row-level policies apply.

use serde::de::DeserializeOwned;
use skyfarm_api::{ClientConfig, Session};
use skyfarm_area_models::{AreaRow, AreaSummary, MetricRow, MetricSeries, ProjectRow, SavedQuery};

use crate::{ReportStore, SignedUrl, StoreError};

/// Media type asking the REST layer for exactly one object.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Status the REST layer answers a single-object read with when the row
/// count isn't exactly one.
const NOT_ACCEPTABLE: u16 = 406;

/// [`ReportStore`] over the store's REST and object storage endpoints.
pub struct StoreClient {
    base_url: String,
    api_key: String,
    bucket: String,
    signed_url_ttl_secs: u64,
    client: reqwest::Client,
}

impl StoreClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Setup`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, StoreError> {
        Ok(Self::with_client(config, config.http_client()?))
    }

    /// Creates a client around an existing `reqwest` client.
    #[must_use]
    pub fn with_client(config: &ClientConfig, client: reqwest::Client) -> Self {
        Self {
            base_url: config.store_base().to_string(),
            api_key: config.store_key.clone(),
            bucket: config.image_bucket.clone(),
            signed_url_ttl_secs: config.signed_url_ttl_secs,
            client,
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(session.access_token())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, &str)],
        session: &Session,
    ) -> Result<T, StoreError> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let query = select_query(columns, filters);
        log::debug!("GET {url} {query:?}");

        let resp = self
            .request(reqwest::Method::GET, &url, session)
            .query(&query)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        parse_response(status, &body)
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        session: &Session,
    ) -> Result<T, StoreError> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        log::debug!("GET {url} id={id}");

        let resp = self
            .request(reqwest::Method::GET, &url, session)
            .header("Accept", SINGLE_OBJECT)
            .query(&select_query("*", &[("id", id)]))
            .send()
            .await?;
        let status = resp.status().as_u16();
        if status == NOT_ACCEPTABLE {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        let body = resp.text().await?;
        parse_response(status, &body)
    }
}

#[async_trait::async_trait]
impl ReportStore for StoreClient {
    async fn projects(&self, session: &Session) -> Result<Vec<ProjectRow>, StoreError> {
        let filters: Vec<(&str, &str)> = session
            .user_id()
            .map(|user_id| vec![("user_id", user_id)])
            .unwrap_or_default();
        self.select("projects", "id,name,user_id,created_at", &filters, session)
            .await
    }

    async fn areas_for_project(
        &self,
        project_id: &str,
        session: &Session,
    ) -> Result<Vec<AreaSummary>, StoreError> {
        self.select(
            "areas",
            "id,name,created_at",
            &[("project_id", project_id)],
            session,
        )
        .await
    }

    async fn area(&self, area_id: &str, session: &Session) -> Result<AreaRow, StoreError> {
        self.select_one("areas", area_id, session).await
    }

    async fn metrics(&self, area_id: &str, session: &Session) -> Result<MetricSeries, StoreError> {
        let rows: Vec<MetricRow> = self
            .select("metrics", "id,name,value", &[("area_id", area_id)], session)
            .await?;
        log::debug!("Read {} metric rows for area {area_id}", rows.len());
        Ok(MetricSeries::new(area_id, rows))
    }

    async fn saved_queries(&self, session: &Session) -> Result<Vec<SavedQuery>, StoreError> {
        self.select(
            "saved",
            "name,created_at,metrics,aggregation,project_id",
            &[],
            session,
        )
        .await
    }

    async fn signed_urls(
        &self,
        paths: &[String],
        session: &Session,
    ) -> Result<Vec<SignedUrl>, StoreError> {
        let url = format!("{}/storage/v1/object/sign/{}", self.base_url, self.bucket);
        log::debug!("POST {url} ({} paths)", paths.len());

        let resp = self
            .request(reqwest::Method::POST, &url, session)
            .json(&serde_json::json!({
                "expiresIn": self.signed_url_ttl_secs,
                "paths": paths,
            }))
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        let entries: Vec<SignedUrl> = parse_response(status, &body)?;

        Ok(entries
            .into_iter()
            .map(|entry| SignedUrl {
                signed_url: entry
                    .signed_url
                    .as_deref()
                    .map(|raw| resolve_signed_url(&self.base_url, raw)),
                ..entry
            })
            .collect())
    }
}

fn select_query(columns: &str, filters: &[(&str, &str)]) -> Vec<(String, String)> {
    std::iter::once(("select".to_string(), columns.to_string()))
        .chain(
            filters
                .iter()
                .map(|(column, value)| ((*column).to_string(), format!("eq.{value}"))),
        )
        .collect()
}

/// Parses a store response body, turning non-success statuses into
/// [`StoreError::Status`].
///
/// # Errors
///
/// * [`StoreError::Status`] for non-2xx statuses
/// * [`StoreError::Json`] if the body doesn't match `T`
pub fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, StoreError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        log::warn!("Store request failed with {status}: {message}");
        return Err(StoreError::Status { status, message });
    }
    Ok(serde_json::from_str(body)?)
}

/// Makes a signed URL absolute. The storage service returns URLs relative
/// to `{store}/storage/v1`.
#[must_use]
pub fn resolve_signed_url(store_base: &str, raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    let base = store_base.trim_end_matches('/');
    if raw.starts_with('/') {
        format!("{base}/storage/v1{raw}")
    } else {
        format!("{base}/storage/v1/{raw}")
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn relative_signed_urls_are_resolved_against_storage() {
        assert_eq!(
            resolve_signed_url(
                "https://store.example.com/",
                "/object/sign/projects/p1/a1/ndvi.png?token=t"
            ),
            "https://store.example.com/storage/v1/object/sign/projects/p1/a1/ndvi.png?token=t"
        );
        assert_eq!(
            resolve_signed_url("https://store.example.com", "https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn status_error_uses_body_message() {
        let err = parse_response::<Vec<ProjectRow>>(401, r#"{"message":"JWT expired"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Status { status: 401, ref message } if message == "JWT expired"
        ));
    }

    #[test]
    fn parses_project_rows() {
        let rows: Vec<ProjectRow> = parse_response(
            200,
            r#"[{"id":7,"name":"Farm A","created_at":"2024-03-01T12:00:00+00:00"}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].id, "7");
        assert_eq!(rows[0].user_id, None);
    }

    #[test]
    fn shape_mismatch_is_a_json_error() {
        assert!(matches!(
            parse_response::<Vec<ProjectRow>>(200, r#"{"id":1}"#),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn select_query_prefixes_filters() {
        assert_eq!(
            select_query("id,name", &[("project_id", "p 1")]),
            vec![
                ("select".to_string(), "id,name".to_string()),
                ("project_id".to_string(), "eq.p 1".to_string()),
            ]
        );
    }

    fn config(store_url: &str) -> ClientConfig {
        ClientConfig {
            api_url: "http://unused".to_string(),
            store_url: store_url.to_string(),
            store_key: "anon-key".to_string(),
            image_bucket: "projects".to_string(),
            signed_url_ttl_secs: 60,
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn builds_from_shared_client_config() {
        let store = StoreClient::new(&config("http://store.test/")).unwrap();
        assert_eq!(store.base_url, "http://store.test");
    }

    #[test]
    fn setup_errors_keep_the_api_error() {
        let err = StoreError::from(skyfarm_api::ApiError::Config {
            message: "store_url is empty".to_string(),
        });
        assert!(matches!(
            err,
            StoreError::Setup(skyfarm_api::ApiError::Config { .. })
        ));
        assert_eq!(
            err.to_string(),
            "Client setup error: Configuration error: store_url is empty"
        );
    }

    /// Answers one request with `response` and hands back the raw request.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0_u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });
        (base, handle)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn single_area_read_sends_object_accept_and_keys() {
        let body = r#"{"id":"a1","project_id":"p1","name":"North","coords":{"type":"Polygon","coordinates":[]},"datefrom":"2024-01-01","dateto":"2024-02-25","size":2500000,"aggregation":5}"#;
        let (base, server) = serve_once(http_response("200 OK", body)).await;
        let store = StoreClient::with_client(&config(&base), reqwest::Client::new());

        let area = store.area("a1", &Session::new("user-token")).await.unwrap();
        assert_eq!(area.name, "North");
        assert_eq!(area.area_m2, Some(2_500_000.0));

        let raw = server.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("GET /rest/v1/areas?select=*&id=eq.a1 HTTP/1.1"));
        assert!(lower.contains("apikey: anon-key"));
        assert!(lower.contains("authorization: bearer user-token"));
        assert!(lower.contains("accept: application/vnd.pgrst.object+json"));
    }

    #[tokio::test]
    async fn missing_area_is_not_found() {
        let (base, _server) = serve_once(http_response(
            "406 Not Acceptable",
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        ))
        .await;
        let store = StoreClient::with_client(&config(&base), reqwest::Client::new());

        let err = store.area("nope", &Session::new("t")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref id, .. } if id == "nope"));
    }

    #[tokio::test]
    async fn signs_paths_and_resolves_urls() {
        let body = r#"[{"path":"p1/a1/ndvi.png","signedURL":"/object/sign/projects/p1/a1/ndvi.png?token=x","error":null},{"path":"p1/a1/lai.png","signedURL":null,"error":"Either the object does not exist or you do not have access to it"}]"#;
        let (base, server) = serve_once(http_response("200 OK", body)).await;
        let store = StoreClient::with_client(&config(&base), reqwest::Client::new());

        let paths = vec!["p1/a1/ndvi.png".to_string(), "p1/a1/lai.png".to_string()];
        let urls = store.signed_urls(&paths, &Session::new("t")).await.unwrap();
        assert_eq!(
            urls[0].signed_url.as_deref(),
            Some(format!("{base}/storage/v1/object/sign/projects/p1/a1/ndvi.png?token=x").as_str())
        );
        assert!(urls[1].signed_url.is_none());

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /storage/v1/object/sign/projects HTTP/1.1"));
        assert!(raw.contains("\"expiresIn\":60"));
        assert!(raw.contains("\"paths\":[\"p1/a1/ndvi.png\",\"p1/a1/lai.png\"]"));
    }
}
