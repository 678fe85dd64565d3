use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use url::Url;

use crate::domain::{ports::outbound::FileSource, AvatarError};

/// Reads picked files from `data:` URIs, http(s) URLs, `file://` URIs or plain
/// local paths. Never buffers more than the caller's limit.
pub struct UriFileSource {
    http: reqwest::Client,
}

impl UriFileSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch(&self, url: Url, limit: usize) -> Result<Bytes, AvatarError> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| AvatarError::Source(err.to_string()))?;

        let expected = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0);
        let mut body = BytesMut::with_capacity(expected.min(limit));
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| AvatarError::Source(err.to_string()))?
        {
            let room = limit - body.len();
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() == limit {
                break;
            }
        }

        Ok(body.freeze())
    }
}

fn decode_data_uri(uri: &str, limit: usize) -> Result<Bytes, AvatarError> {
    let rest = uri.trim_start_matches("data:");
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AvatarError::Source("data URI has no payload".to_string()))?;

    let mut bytes = if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|err| AvatarError::Source(format!("invalid base64 payload: {err}")))?
    } else {
        payload.as_bytes().to_vec()
    };
    bytes.truncate(limit);

    Ok(Bytes::from(bytes))
}

async fn read_local(path: PathBuf, limit: u64) -> Result<Bytes, AvatarError> {
    let source_error = |err: std::io::Error| AvatarError::Source(format!("{}: {err}", path.display()));

    let file = tokio::fs::File::open(&path).await.map_err(source_error)?;
    let mut body = Vec::new();
    file.take(limit)
        .read_to_end(&mut body)
        .await
        .map_err(source_error)?;

    Ok(Bytes::from(body))
}

#[async_trait]
impl FileSource for UriFileSource {
    async fn read(&self, uri: &str, limit: u64) -> Result<Bytes, AvatarError> {
        let buffer_limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if uri.starts_with("data:") {
            return decode_data_uri(uri, buffer_limit);
        }

        match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch(url, buffer_limit).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| AvatarError::Source(format!("not a local file: {uri}")))?;
                read_local(path, limit).await
            }
            Ok(url) if url.scheme().len() > 1 => Err(AvatarError::Source(format!(
                "unsupported uri scheme: {}",
                url.scheme()
            ))),
            // relative paths and windows drive letters
            _ => read_local(PathBuf::from(uri), limit).await,
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

    const LIMIT: u64 = 1024;

    fn source() -> UriFileSource {
        UriFileSource::new(reqwest::Client::new())
    }

    async fn temp_file(contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("avatar-{}.png", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn decodes_base64_data_uri() {
        let bytes = source()
            .read("data:image/png;base64,aGVsbG8=", LIMIT)
            .await
            .unwrap();

        assert_eq!(bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn rejects_broken_data_uri() {
        assert!(matches!(
            source().read("data:image/png;base64,@@@", LIMIT).await,
            Err(AvatarError::Source(_))
        ));
        assert!(matches!(
            source().read("data:image/png;base64", LIMIT).await,
            Err(AvatarError::Source(_))
        ));
    }

    #[tokio::test]
    async fn reads_file_uri_and_plain_path() {
        let path = temp_file(b"pixels").await;
        let uri = Url::from_file_path(&path).unwrap().to_string();

        assert_eq!(source().read(&uri, LIMIT).await.unwrap(), Bytes::from_static(b"pixels"));
        assert_eq!(
            source().read(path.to_str().unwrap(), LIMIT).await.unwrap(),
            Bytes::from_static(b"pixels")
        );

        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn local_reads_stop_at_the_limit() {
        let path = temp_file(&vec![7u8; 4096]).await;

        let bytes = source().read(path.to_str().unwrap(), LIMIT).await.unwrap();

        assert_eq!(bytes.len() as u64, LIMIT);
        tokio::fs::remove_file(path).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn endless_device_is_cut_at_the_limit() {
        let bytes = source().read("/dev/zero", LIMIT).await.unwrap();

        assert_eq!(bytes.len() as u64, LIMIT);
    }

    #[tokio::test]
    async fn large_remote_body_is_cut_at_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 64 * 1024]))
            .mount(&server)
            .await;

        let bytes = source()
            .read(&format!("{}/huge.png", server.uri()), LIMIT)
            .await
            .unwrap();

        assert_eq!(bytes.len() as u64, LIMIT);
    }

    #[tokio::test]
    async fn data_uri_is_cut_at_the_limit() {
        let bytes = source().read("data:image/png;base64,aGVsbG8=", 3).await.unwrap();

        assert_eq!(bytes, Bytes::from_static(b"hel"));
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let err = source().read("/definitely/not/here.png", LIMIT).await.unwrap_err();

        assert!(matches!(err, AvatarError::Source(_)));
    }

    #[tokio::test]
    async fn fetches_http_uri() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/picked.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote".to_vec()))
            .mount(&server)
            .await;

        let bytes = source()
            .read(&format!("{}/picked.png", server.uri()), LIMIT)
            .await
            .unwrap();

        assert_eq!(bytes, Bytes::from_static(b"remote"));
    }

    #[tokio::test]
    async fn http_error_status_is_a_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = source()
            .read(&format!("{}/gone.png", server.uri()), LIMIT)
            .await
            .unwrap_err();

        assert!(matches!(err, AvatarError::Source(_)));
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let err = source().read("content://media/external/1", LIMIT).await.unwrap_err();

        assert!(matches!(err, AvatarError::Source(message) if message.contains("content")));
    }
}
