use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable { status: u16 },
    TimedOut,
    Failed(String),
}

/// Reachability check for stored avatar URLs.
#[async_trait]
pub trait UrlProbe: Send + Sync + 'static {
    async fn check(&self, url: &str) -> ProbeOutcome;
}
