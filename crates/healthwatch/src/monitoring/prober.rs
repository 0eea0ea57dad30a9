use async_trait::async_trait;
use reqwest::{Client, redirect};
use tokio::time::Instant;
use tracing::debug;

use crate::config::ProbeConfig;

/// Result of one probe: did any attempt get an HTTP response, and how long it took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub elapsed_ms: u64,
}

/// The request flavours tried, in order, by [`HttpProber`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    /// Lightweight connectivity check
    Head,
    /// Full content fetch
    Get,
    /// GET that ignores certificate problems and does not follow redirects
    Permissive,
}

impl ProbeMethod {
    pub const CHAIN: [ProbeMethod; 3] = [ProbeMethod::Head, ProbeMethod::Get, ProbeMethod::Permissive];
}

/// Reachability probe for a single URL
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// HTTP prober.
///
/// Any response with a status line counts as reachable, 4xx and 5xx included.
/// Only transport failures (timeout, DNS, refused connection, TLS handshake)
/// make an attempt fail, and the chain stops at the first attempt that does not.
pub struct HttpProber {
    strict: Client,
    permissive: Client,
}

impl HttpProber {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let strict = Client::builder().timeout(config.timeout()).user_agent(&config.user_agent).build()?;

        // A response that only a lenient client can get means the network path
        // works and a security policy objected; that still counts as reachable.
        let permissive = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { strict, permissive })
    }

    async fn attempt(&self, method: ProbeMethod, url: &str) -> Result<u16, reqwest::Error> {
        let request = match method {
            ProbeMethod::Head => self.strict.head(url),
            ProbeMethod::Get => self.strict.get(url),
            ProbeMethod::Permissive => self.permissive.get(url),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();

        if method != ProbeMethod::Head {
            // The status line already proved reachability; a broken body does not undo that.
            if let Err(e) = response.bytes().await {
                debug!(%url, ?method, error = %e, "ignoring body read failure");
            }
        }

        Ok(status)
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();

        for method in ProbeMethod::CHAIN {
            match self.attempt(method, url).await {
                Ok(status) => {
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    debug!(%url, ?method, status, elapsed_ms, "probe reached service");
                    return ProbeOutcome { reachable: true, elapsed_ms };
                }
                Err(e) => debug!(%url, ?method, error = %e, "probe attempt failed"),
            }
        }

        ProbeOutcome { reachable: false, elapsed_ms: start.elapsed().as_millis() as u64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prober() -> HttpProber {
        HttpProber::new(&ProbeConfig { timeout_secs: 2, ..Default::default() }).unwrap()
    }

    #[tokio::test]
    async fn server_errors_still_count_as_reachable() {
        let mut server = mockito::Server::new_async().await;
        let head = server.mock("HEAD", "/health").with_status(503).create_async().await;
        let get = server.mock("GET", "/health").expect(0).create_async().await;

        let outcome = prober().probe(&format!("{}/health", server.url())).await;

        assert!(outcome.reachable);
        head.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn client_errors_count_as_reachable() {
        let mut server = mockito::Server::new_async().await;
        server.mock("HEAD", "/missing").with_status(404).create_async().await;

        let outcome = prober().probe(&format!("{}/missing", server.url())).await;
        assert!(outcome.reachable);
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let outcome = prober().probe("http://127.0.0.1:1/").await;
        assert!(!outcome.reachable);
    }

    #[tokio::test]
    async fn malformed_url_is_unreachable() {
        let outcome = prober().probe("not a url").await;
        assert!(!outcome.reachable);
    }
}
