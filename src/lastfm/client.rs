//! Last.fm HTTP client
//!
//! Talks to the 2.0 JSON API. Every call is a GET against the configured
//! base URL with `method`, `api_key`, `format=json` and `autocorrect=1`
//! plus the lookup parameters.
//!
//! API: https://www.last.fm/api

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{AlbumResponse, ArtistResponse, Envelope, TrackResponse};
use super::{LastFmError, RemoteAlbum, RemoteArtist, RemoteTrack, adapter};
use crate::config::LastFmConfig;

const USER_AGENT: &str = concat!("cover-scout/", env!("CARGO_PKG_VERSION"));

/// Last.fm API client
///
/// One instance is created at startup and shared by every search; the
/// underlying connection pool is reused across calls.
pub struct LastFmClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LastFmClient {
    pub fn new(config: &LastFmConfig) -> Result<Self, LastFmError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LastFmError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// `album.getinfo`
    pub async fn album_info(&self, artist: &str, album: &str) -> Result<RemoteAlbum, LastFmError> {
        let response: AlbumResponse = self
            .get_json("album.getinfo", &[("artist", artist), ("album", album)])
            .await?;
        Ok(adapter::album(response))
    }

    /// `track.getinfo`
    pub async fn track_info(&self, artist: &str, track: &str) -> Result<RemoteTrack, LastFmError> {
        let response: TrackResponse = self
            .get_json("track.getinfo", &[("artist", artist), ("track", track)])
            .await?;
        Ok(adapter::track(response))
    }

    /// `artist.getinfo`
    pub async fn artist_info(&self, artist: &str) -> Result<RemoteArtist, LastFmError> {
        let response: ArtistResponse = self
            .get_json("artist.getinfo", &[("artist", artist)])
            .await?;
        Ok(adapter::artist(response))
    }

    /// Download raw image bytes.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, LastFmError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| LastFmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LastFmError::Http(status.as_u16()));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| LastFmError::Network(e.to_string()))?;

        Ok(data.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, LastFmError> {
        if self.api_key.trim().is_empty() {
            return Err(LastFmError::MissingApiKey);
        }

        let mut query: Vec<(&str, &str)> = vec![
            ("method", method),
            ("api_key", self.api_key.as_str()),
            ("format", "json"),
            ("autocorrect", "1"),
        ];
        query.extend_from_slice(params);

        debug!("Last.fm {} {:?}", method, params);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| LastFmError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LastFmError::Network(e.to_string()))?;

        // Error payloads also come with 4xx statuses; prefer their message.
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(Envelope::Error(err)) => Err(LastFmError::Api {
                code: err.error,
                message: err.message,
            }),
            Ok(Envelope::Ok(value)) if status.is_success() => Ok(value),
            Ok(Envelope::Ok(_)) => Err(LastFmError::Http(status.as_u16())),
            Err(_) if !status.is_success() => Err(LastFmError::Http(status.as_u16())),
            Err(e) => Err(LastFmError::Parse(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> LastFmConfig {
        LastFmConfig {
            api_key: "test-key".to_string(),
            base_url,
            request_timeout_secs: 5,
        }
    }

    async fn client_for(server: &MockServer) -> LastFmClient {
        LastFmClient::new(&config(format!("{}/2.0/", server.uri()))).unwrap()
    }

    #[tokio::test]
    async fn test_album_info_sends_expected_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2.0/"))
            .and(query_param("method", "album.getinfo"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("format", "json"))
            .and(query_param("autocorrect", "1"))
            .and(query_param("artist", "Radiohead"))
            .and(query_param("album", "OK Computer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "album": {
                    "name": "OK Computer",
                    "artist": "Radiohead",
                    "image": [
                        {"#text": "https://img.example/small.png", "size": "small"},
                        {"#text": "https://img.example/big.png", "size": "extralarge"}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let album = client.album_info("Radiohead", "OK Computer").await.unwrap();
        assert_eq!(album.name, "OK Computer");
        assert_eq!(album.images.largest(), Some("https://img.example/big.png"));
    }

    #[tokio::test]
    async fn test_error_payload_with_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": 6,
                "message": "Album not found"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.album_info("Nobody", "Nothing").await.unwrap_err();
        assert!(matches!(err, LastFmError::Api { code: 6, .. }));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_error_payload_with_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": 10,
                "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.artist_info("Radiohead").await.unwrap_err();
        assert!(matches!(err, LastFmError::Api { code: 10, .. }));
    }

    #[tokio::test]
    async fn test_server_error_without_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.track_info("Radiohead", "Airbag").await.unwrap_err();
        assert!(matches!(err, LastFmError::Http(503)));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.album_info("Radiohead", "OK Computer").await.unwrap_err();
        assert!(matches!(err, LastFmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = config(format!("{}/2.0/", server.uri()));
        config.api_key = String::new();
        let client = LastFmClient::new(&config).unwrap();
        let err = client.artist_info("Radiohead").await.unwrap_err();
        assert!(matches!(err, LastFmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cover.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let data = client
            .download(&format!("{}/cover.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);

        let err = client
            .download(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, LastFmError::Http(404)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = LastFmClient::new(&config("http://127.0.0.1:9/2.0/".to_string())).unwrap();
        let err = client.artist_info("Radiohead").await.unwrap_err();
        assert!(err.is_transport());
    }
}
