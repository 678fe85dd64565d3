use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::outbound::{ProbeOutcome, UrlProbe};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Checks reachability with a HEAD request.
pub struct ReqwestUrlProbe {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReqwestUrlProbe {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl UrlProbe for ReqwestUrlProbe {
    async fn check(&self, url: &str) -> ProbeOutcome {
        let result = self.http.head(url).timeout(self.timeout).send().await;

        match result {
            Ok(response) if response.status().is_success() => ProbeOutcome::Reachable,
            Ok(response) => ProbeOutcome::Unreachable {
                status: response.status().as_u16(),
            },
            Err(err) if err.is_timeout() => ProbeOutcome::TimedOut,
            Err(err) => ProbeOutcome::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn probe(timeout: Duration) -> ReqwestUrlProbe {
        ReqwestUrlProbe::new(reqwest::Client::new(), timeout)
    }

    #[tokio::test]
    async fn success_status_is_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = probe(DEFAULT_PROBE_TIMEOUT)
            .check(&format!("{}/a.png", server.uri()))
            .await;

        assert_eq!(outcome, ProbeOutcome::Reachable);
    }

    #[tokio::test]
    async fn error_status_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = probe(DEFAULT_PROBE_TIMEOUT)
            .check(&format!("{}/a.png", server.uri()))
            .await;

        assert_eq!(outcome, ProbeOutcome::Unreachable { status: 404 });
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let outcome = probe(Duration::from_millis(50))
            .check(&format!("{}/a.png", server.uri()))
            .await;

        assert_eq!(outcome, ProbeOutcome::TimedOut);
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        let outcome = probe(DEFAULT_PROBE_TIMEOUT).check("http://127.0.0.1:1/a.png").await;

        assert!(matches!(outcome, ProbeOutcome::Failed(_)));
    }
}
