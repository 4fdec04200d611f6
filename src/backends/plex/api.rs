use std::time::Duration as StdDuration;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{DirectoriesContainer, MetadataContainer, PlexContainer};
use crate::backends::retry::with_retry;
use crate::error::{KinoError, Result};

const PLEX_PRODUCT: &str = "kino";
const PLEX_CLIENT_IDENTIFIER: &str = "kino-tui";
const PLEX_PLATFORM: &str = "Linux";

/// Thin HTTP client for the Plex XML/JSON-hybrid API, scoped to one server
/// and one auth token.
#[derive(Clone)]
pub struct PlexApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl PlexApi {
    pub fn new(base_url: String, token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .expect("failed to build Plex HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Plex-Token",
            HeaderValue::from_str(&self.token).expect("token must be header-safe"),
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Plex-Client-Identifier",
            HeaderValue::from_static(PLEX_CLIENT_IDENTIFIER),
        );
        headers.insert("X-Plex-Product", HeaderValue::from_static(PLEX_PRODUCT));
        headers.insert("X-Plex-Platform", HeaderValue::from_static(PLEX_PLATFORM));
        headers
    }

    async fn get_json_retrying(
        &self,
        cancel: &CancellationToken,
        op_name: &str,
        path: &str,
    ) -> Result<serde_json::Value> {
        with_retry(cancel, op_name, || async {
            let response = self
                .client
                .get(self.build_url(path))
                .headers(self.headers())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KinoError::from_status(status.as_u16(), body));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(KinoError::from)
        })
        .await
    }

    pub async fn get_libraries(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, String, String, i64)>> {
        let value = self
            .get_json_retrying(cancel, "plex_get_libraries", "/library/sections")
            .await?;
        let container: PlexContainer<DirectoriesContainer> = serde_json::from_value(value)?;
        Ok(container
            .media_container
            .directory
            .into_iter()
            .map(|dir| (dir.key, dir.title, dir.kind, dir.updated_at))
            .collect())
    }

    pub async fn get_section_content(
        &self,
        cancel: &CancellationToken,
        library_key: &str,
        offset: u32,
        limit: u32,
        type_filter: Option<u8>,
    ) -> Result<MetadataContainer> {
        let size = if limit == 0 { 50 } else { limit };
        let type_query = type_filter.map(|t| format!("&type={t}")).unwrap_or_default();
        let path = format!(
            "/library/sections/{library_key}/all?X-Plex-Container-Start={offset}&X-Plex-Container-Size={size}{type_query}"
        );
        let value = self
            .get_json_retrying(cancel, "plex_get_section_content", &path)
            .await?;
        let container: PlexContainer<MetadataContainer> = serde_json::from_value(value)?;
        Ok(container.media_container)
    }

    pub async fn get_children(
        &self,
        cancel: &CancellationToken,
        rating_key: &str,
    ) -> Result<MetadataContainer> {
        let path = format!("/library/metadata/{rating_key}/children");
        let value = self
            .get_json_retrying(cancel, "plex_get_children", &path)
            .await?;
        let container: PlexContainer<MetadataContainer> = serde_json::from_value(value)?;
        Ok(container.media_container)
    }

    pub async fn get_metadata(
        &self,
        cancel: &CancellationToken,
        rating_key: &str,
    ) -> Result<MetadataContainer> {
        let path = format!("/library/metadata/{rating_key}");
        let value = self
            .get_json_retrying(cancel, "plex_get_metadata", &path)
            .await?;
        let container: PlexContainer<MetadataContainer> = serde_json::from_value(value)?;
        Ok(container.media_container)
    }

    /// `{base}{partKey}?X-Plex-Token={t}` per the protocol contract.
    pub fn build_stream_url(&self, part_key: &str) -> String {
        format!("{}{}?X-Plex-Token={}", self.base_url, part_key, self.token)
    }

    pub fn build_image_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}?X-Plex-Token={}", self.base_url, path, self.token)
        }
    }

    pub async fn set_played(
        &self,
        cancel: &CancellationToken,
        rating_key: &str,
        played: bool,
    ) -> Result<()> {
        let action = if played { "scrobble" } else { "unscrobble" };
        let path = format!(
            "/:/{action}?key={rating_key}&identifier=com.plexapp.plugins.library"
        );
        with_retry(cancel, "plex_set_played", || async {
            let response = self
                .client
                .get(self.build_url(&path))
                .headers(self.headers())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KinoError::from_status(status.as_u16(), body));
            }
            Ok(())
        })
        .await?;
        debug!(rating_key, played, "set play state on Plex");
        Ok(())
    }

    pub async fn get_playlists(&self, cancel: &CancellationToken) -> Result<MetadataContainer> {
        let value = self
            .get_json_retrying(cancel, "plex_get_playlists", "/playlists?playlistType=video")
            .await?;
        let container: PlexContainer<MetadataContainer> = serde_json::from_value(value)?;
        Ok(container.media_container)
    }

    pub async fn get_playlist_items(
        &self,
        cancel: &CancellationToken,
        playlist_key: &str,
    ) -> Result<MetadataContainer> {
        let path = format!("/playlists/{playlist_key}/items");
        let value = self
            .get_json_retrying(cancel, "plex_get_playlist_items", &path)
            .await?;
        let container: PlexContainer<MetadataContainer> = serde_json::from_value(value)?;
        Ok(container.media_container)
    }

    /// Plex requires at least one initial item to create a playlist.
    pub async fn create_playlist(
        &self,
        cancel: &CancellationToken,
        title: &str,
        first_item_uri: &str,
    ) -> Result<MetadataContainer> {
        let path = format!(
            "/playlists?type=video&title={}&smart=0&uri={}",
            percent_encoding::utf8_percent_encode(title, percent_encoding::NON_ALPHANUMERIC),
            percent_encoding::utf8_percent_encode(first_item_uri, percent_encoding::NON_ALPHANUMERIC),
        );
        with_retry(cancel, "plex_create_playlist", || async {
            let response = self
                .client
                .post(self.build_url(&path))
                .headers(self.headers())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KinoError::from_status(status.as_u16(), body));
            }
            response.json::<serde_json::Value>().await.map_err(KinoError::from)
        })
        .await
        .and_then(|v| {
            let container: PlexContainer<MetadataContainer> = serde_json::from_value(v)?;
            Ok(container.media_container)
        })
    }

    pub async fn add_to_playlist(
        &self,
        cancel: &CancellationToken,
        playlist_key: &str,
        item_uri: &str,
    ) -> Result<()> {
        let path = format!(
            "/playlists/{playlist_key}/items?uri={}",
            percent_encoding::utf8_percent_encode(item_uri, percent_encoding::NON_ALPHANUMERIC),
        );
        with_retry(cancel, "plex_add_to_playlist", || async {
            let response = self
                .client
                .put(self.build_url(&path))
                .headers(self.headers())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KinoError::from_status(status.as_u16(), body));
            }
            Ok(())
        })
        .await
    }

    pub async fn remove_from_playlist(
        &self,
        cancel: &CancellationToken,
        playlist_key: &str,
        playlist_item_id: &str,
    ) -> Result<()> {
        let path = format!("/playlists/{playlist_key}/items/{playlist_item_id}");
        with_retry(cancel, "plex_remove_from_playlist", || async {
            let response = self
                .client
                .delete(self.build_url(&path))
                .headers(self.headers())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KinoError::from_status(status.as_u16(), body));
            }
            Ok(())
        })
        .await
    }

    pub async fn delete_playlist(
        &self,
        cancel: &CancellationToken,
        playlist_key: &str,
    ) -> Result<()> {
        let path = format!("/playlists/{playlist_key}");
        with_retry(cancel, "plex_delete_playlist", || async {
            let response = self
                .client
                .delete(self.build_url(&path))
                .headers(self.headers())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KinoError::from_status(status.as_u16(), body));
            }
            Ok(())
        })
        .await
    }
}
