//! Remote WebDAV/HTTP backend
//!
//! The vault blob is fetched with `GET` and stored with `PUT` against a
//! single URL using HTTP basic auth. Reads time out after 10 seconds and
//! writes after 15 so a stalled server cannot hang the session.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::crypto::SecureString;
use crate::error::{VaultError, VaultResult};

use super::Backend;

/// Timeout for fetching the vault
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for uploading the vault
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Vault blob stored on a remote HTTP server
pub struct HttpBackend {
    client: Client,
    url: Url,
    username: String,
    password: SecureString,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl HttpBackend {
    /// Create a backend for `url`, authenticating as `username`
    pub fn new(
        url: &str,
        username: impl Into<String>,
        password: SecureString,
    ) -> VaultResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| VaultError::Config(format!("Invalid remote URL '{}': {}", url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(VaultError::Config(format!(
                "Remote URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| VaultError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            username: username.into(),
            password,
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        })
    }

    #[cfg(test)]
    fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }
}

impl Backend for HttpBackend {
    fn read(&self) -> VaultResult<Vec<u8>> {
        let response = self
            .client
            .get(self.url.clone())
            .basic_auth(&self.username, Some(self.password.as_str()))
            .timeout(self.read_timeout)
            .send()
            .map_err(|e| VaultError::Backend(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(VaultError::backend_not_found(self.url.to_string()));
        }
        if status != StatusCode::OK {
            warn!(%status, url = %self.url, "remote read rejected");
            return Err(VaultError::Backend(format!(
                "Server returned {} for {}",
                status, self.url
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| VaultError::Backend(format!("Failed to read response body: {}", e)))?;

        debug!(url = %self.url, bytes = body.len(), "fetched remote vault");
        Ok(body.to_vec())
    }

    fn write(&self, data: &[u8]) -> VaultResult<()> {
        let response = self
            .client
            .put(self.url.clone())
            .basic_auth(&self.username, Some(self.password.as_str()))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .timeout(self.write_timeout)
            .send()
            .map_err(|e| VaultError::Backend(format!("Upload to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
        ) {
            warn!(%status, url = %self.url, "remote write rejected");
            return Err(VaultError::Backend(format!(
                "Server returned {} for {}",
                status, self.url
            )));
        }

        debug!(url = %self.url, bytes = data.len(), "uploaded remote vault");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("remote store {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Envelope, KeyDerivationParams};
    use crate::vault::{LoadOutcome, VaultPersistence};
    use wiremock::matchers::{basic_auth, body_bytes, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VAULT_PATH: &str = "/dav/vault.enc";

    async fn backend_for(server: &MockServer) -> HttpBackend {
        let url = format!("{}{}", server.uri(), VAULT_PATH);
        blocking(move || HttpBackend::new(&url, "alice", SecureString::new("s3cret")).unwrap()).await
    }

    /// The blocking client must not run on the async test runtime
    async fn blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    async fn mount_get(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(VAULT_PATH))
            .and(basic_auth("alice", "s3cret"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    async fn mount_put(server: &MockServer, status: u16) {
        Mock::given(method("PUT"))
            .and(path(VAULT_PATH))
            .and(basic_auth("alice", "s3cret"))
            .and(body_bytes(b"sealed".to_vec()))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_rejects_invalid_url() {
        let result = HttpBackend::new("not a url", "user", SecureString::new("pw"));
        assert!(matches!(result, Err(VaultError::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = HttpBackend::new("ftp://example.com/vault.enc", "user", SecureString::new("pw"));
        assert!(matches!(result, Err(VaultError::Config(_))));
    }

    #[test]
    fn test_describe_hides_credentials() {
        let backend = HttpBackend::new(
            "https://dav.example.com/vault.enc",
            "alice",
            SecureString::new("s3cret"),
        )
        .unwrap();
        let described = backend.describe();
        assert!(described.contains("dav.example.com"));
        assert!(!described.contains("s3cret"));
    }

    #[test]
    fn test_unreachable_server_is_retryable_backend_error() {
        // Port 9 on loopback (discard) is closed on test machines
        let backend =
            HttpBackend::new("http://127.0.0.1:9/vault.enc", "user", SecureString::new("pw")).unwrap();

        let err = backend.read().unwrap_err();
        assert!(matches!(err, VaultError::Backend(_)));
        assert!(err.is_retryable());

        let err = backend.write(b"blob").unwrap_err();
        assert!(matches!(err, VaultError::Backend(_)));
    }

    #[tokio::test]
    async fn test_read_returns_body() {
        let server = MockServer::start().await;
        mount_get(&server, ResponseTemplate::new(200).set_body_bytes(b"sealed".to_vec())).await;

        let backend = backend_for(&server).await;
        let body = blocking(move || backend.read()).await.unwrap();
        assert_eq!(body, b"sealed");
    }

    #[tokio::test]
    async fn test_read_404_is_not_found_and_loads_fresh() {
        let server = MockServer::start().await;
        mount_get(&server, ResponseTemplate::new(404)).await;

        let backend = backend_for(&server).await;
        let err = blocking(move || backend.read()).await.unwrap_err();
        assert!(err.is_not_found());

        let backend = backend_for(&server).await;
        let outcome = blocking(move || {
            VaultPersistence::load(
                Box::new(backend),
                Envelope::new(KeyDerivationParams::fast()),
                b"master",
            )
            .map(|(_, outcome)| outcome)
        })
        .await
        .unwrap();
        assert_eq!(outcome, LoadOutcome::Fresh);
    }

    #[tokio::test]
    async fn test_read_error_status_is_retryable() {
        for status in [204u16, 401, 500, 503] {
            let server = MockServer::start().await;
            mount_get(&server, ResponseTemplate::new(status)).await;

            let backend = backend_for(&server).await;
            let err = blocking(move || backend.read()).await.unwrap_err();
            assert!(matches!(err, VaultError::Backend(_)), "status {}", status);
            assert!(err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_write_accepts_success_statuses() {
        for status in [200u16, 201, 204] {
            let server = MockServer::start().await;
            mount_put(&server, status).await;

            let backend = backend_for(&server).await;
            blocking(move || backend.write(b"sealed")).await.unwrap();
            server.verify().await;
        }
    }

    #[tokio::test]
    async fn test_write_rejects_other_statuses() {
        for status in [202u16, 400, 403, 409, 500] {
            let server = MockServer::start().await;
            mount_put(&server, status).await;

            let backend = backend_for(&server).await;
            let err = blocking(move || backend.write(b"sealed")).await.unwrap_err();
            assert!(matches!(err, VaultError::Backend(_)), "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        let slow = ResponseTemplate::new(200).set_delay(Duration::from_millis(800));
        mount_get(&server, slow.clone()).await;
        Mock::given(method("PUT"))
            .and(path(VAULT_PATH))
            .respond_with(slow)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await
            .with_timeouts(Duration::from_millis(100), Duration::from_millis(100));
        let (read, write) = blocking(move || (backend.read(), backend.write(b"sealed"))).await;

        let read = read.unwrap_err();
        assert!(matches!(read, VaultError::Backend(_)));
        assert!(read.is_retryable());
        assert!(matches!(write.unwrap_err(), VaultError::Backend(_)));
    }

    #[test]
    fn test_default_timeouts() {
        let backend = HttpBackend::new(
            "https://dav.example.com/vault.enc",
            "alice",
            SecureString::new("pw"),
        )
        .unwrap();
        assert_eq!(backend.read_timeout, Duration::from_secs(10));
        assert_eq!(backend.write_timeout, Duration::from_secs(15));
    }
}
