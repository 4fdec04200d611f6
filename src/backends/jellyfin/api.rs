use std::time::Duration as StdDuration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::types::{ItemsResponse, JellyfinItem, PlaybackInfoResponse, ViewsResponse};
use crate::backends::retry::with_retry;
use crate::error::{KinoError, Result};

const JELLYFIN_CLIENT_NAME: &str = "kino";
const JELLYFIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Thin HTTP client for the Jellyfin JSON API, scoped to one server, one
/// user, and one API key.
#[derive(Clone)]
pub struct JellyfinApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    user_id: String,
    device_id: String,
}

impl JellyfinApi {
    pub fn new(base_url: String, api_key: String, user_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .expect("failed to build Jellyfin HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            user_id,
            device_id: Uuid::new_v4().to_string(),
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!(
            r#"MediaBrowser Client="{}", Device="Linux", DeviceId="{}", Version="{}", Token="{}""#,
            JELLYFIN_CLIENT_NAME, self.device_id, JELLYFIN_VERSION, self.api_key
        )
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
                .header("X-Emby-Authorization", self.auth_header())
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

    pub async fn get_libraries(&self, cancel: &CancellationToken) -> Result<Vec<(String, String, Option<String>)>> {
        let path = format!("/Users/{}/Views", self.user_id);
        let value = self.get_json_retrying(cancel, "jellyfin_get_libraries", &path).await?;
        let parsed: ViewsResponse = serde_json::from_value(value)?;
        Ok(parsed
            .items
            .into_iter()
            .map(|v| (v.id, v.name, v.collection_type))
            .collect())
    }

    /// `include_types` is a comma-joined Jellyfin item-type filter (e.g.
    /// `"Movie"`, `"Episode"`). `limit = 0` means "server default".
    pub async fn get_items(
        &self,
        cancel: &CancellationToken,
        parent_id: &str,
        include_types: &str,
        start_index: u32,
        limit: u32,
    ) -> Result<ItemsResponse> {
        let page_size = if limit == 0 { 50 } else { limit };
        let path = format!(
            "/Users/{}/Items?ParentId={}&IncludeItemTypes={}&Recursive=true&Fields=Overview,DateCreated&StartIndex={}&Limit={}",
            self.user_id, parent_id, include_types, start_index, page_size
        );
        let value = self.get_json_retrying(cancel, "jellyfin_get_items", &path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_seasons(&self, cancel: &CancellationToken, show_id: &str) -> Result<ItemsResponse> {
        let path = format!("/Shows/{}/Seasons?userId={}&Fields=ItemCounts", show_id, self.user_id);
        let value = self.get_json_retrying(cancel, "jellyfin_get_seasons", &path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_item(&self, cancel: &CancellationToken, item_id: &str) -> Result<JellyfinItem> {
        let path = format!(
            "/Users/{}/Items/{}?Fields=Overview,DateCreated",
            self.user_id, item_id
        );
        let value = self.get_json_retrying(cancel, "jellyfin_get_item", &path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_playback_info(
        &self,
        cancel: &CancellationToken,
        item_id: &str,
    ) -> Result<PlaybackInfoResponse> {
        let path = format!(
            "/Items/{}/PlaybackInfo?UserId={}&StartTimeTicks=0",
            item_id, self.user_id
        );
        with_retry(cancel, "jellyfin_get_playback_info", || async {
            let response = self
                .client
                .post(self.build_url(&path))
                .header("X-Emby-Authorization", self.auth_header())
                .header("Content-Type", "application/json")
                .json(&serde_json::json!({
                    "DeviceProfile": {
                        "MaxStreamingBitrate": 120_000_000,
                        "DirectPlayProfiles": [{
                            "Container": "mp4,m4v,mkv,webm",
                            "Type": "Video",
                            "VideoCodec": "h264,hevc,vp8,vp9,av1",
                            "AudioCodec": "aac,mp3,opus,flac",
                        }],
                    }
                }))
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
        .and_then(|v| Ok(serde_json::from_value(v)?))
    }

    pub fn build_stream_url(&self, item_id: &str, media_source_id: &str) -> String {
        format!(
            "{}/Videos/{}/stream?Static=true&mediaSourceId={}&api_key={}",
            self.base_url, item_id, media_source_id, self.api_key
        )
    }

    pub fn build_image_url(&self, item_id: &str, tag: Option<&str>) -> Option<String> {
        tag.map(|t| format!("{}/Items/{}/Images/Primary?tag={}", self.base_url, item_id, t))
    }

    pub async fn mark_as_watched(&self, cancel: &CancellationToken, item_id: &str) -> Result<()> {
        let path = format!("/Users/{}/PlayedItems/{}", self.user_id, item_id);
        with_retry(cancel, "jellyfin_mark_watched", || async {
            let response = self
                .client
                .post(self.build_url(&path))
                .header("X-Emby-Authorization", self.auth_header())
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

    pub async fn mark_as_unwatched(&self, cancel: &CancellationToken, item_id: &str) -> Result<()> {
        let path = format!("/Users/{}/PlayedItems/{}", self.user_id, item_id);
        with_retry(cancel, "jellyfin_mark_unwatched", || async {
            let response = self
                .client
                .delete(self.build_url(&path))
                .header("X-Emby-Authorization", self.auth_header())
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

    pub async fn get_playlists(&self, cancel: &CancellationToken) -> Result<ItemsResponse> {
        let path = format!(
            "/Users/{}/Items?IncludeItemTypes=Playlist&Recursive=true",
            self.user_id
        );
        let value = self.get_json_retrying(cancel, "jellyfin_get_playlists", &path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_playlist_items(
        &self,
        cancel: &CancellationToken,
        playlist_id: &str,
    ) -> Result<ItemsResponse> {
        let path = format!("/Playlists/{}/Items?userId={}", playlist_id, self.user_id);
        let value = self
            .get_json_retrying(cancel, "jellyfin_get_playlist_items", &path)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Jellyfin allows creating a playlist with zero initial items.
    pub async fn create_playlist(
        &self,
        cancel: &CancellationToken,
        name: &str,
        item_ids: &[String],
    ) -> Result<String> {
        #[derive(Serialize)]
        struct CreatePlaylistRequest<'a> {
            #[serde(rename = "Name")]
            name: &'a str,
            #[serde(rename = "Ids")]
            ids: &'a [String],
            #[serde(rename = "UserId")]
            user_id: &'a str,
        }

        #[derive(serde::Deserialize)]
        struct CreatePlaylistResponse {
            #[serde(rename = "Id")]
            id: String,
        }

        let body = CreatePlaylistRequest {
            name,
            ids: item_ids,
            user_id: &self.user_id,
        };

        let response: CreatePlaylistResponse = with_retry(cancel, "jellyfin_create_playlist", || async {
            let response = self
                .client
                .post(self.build_url("/Playlists"))
                .header("X-Emby-Authorization", self.auth_header())
                .header("Content-Type", "application/json")
                .json(&body)
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
        .and_then(|v| Ok(serde_json::from_value(v)?))?;

        debug!(playlist_id = %response.id, "created Jellyfin playlist");
        Ok(response.id)
    }

    /// `item_ids` is comma-joined into a single `ids` query parameter.
    pub async fn add_to_playlist(
        &self,
        cancel: &CancellationToken,
        playlist_id: &str,
        item_ids: &[String],
    ) -> Result<()> {
        let joined = item_ids.join(",");
        let path = format!(
            "/Playlists/{}/Items?ids={}&userId={}",
            playlist_id, joined, self.user_id
        );
        with_retry(cancel, "jellyfin_add_to_playlist", || async {
            let response = self
                .client
                .post(self.build_url(&path))
                .header("X-Emby-Authorization", self.auth_header())
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
        playlist_id: &str,
        entry_id: &str,
    ) -> Result<()> {
        let path = format!("/Playlists/{}/Items?entryIds={}", playlist_id, entry_id);
        with_retry(cancel, "jellyfin_remove_from_playlist", || async {
            let response = self
                .client
                .delete(self.build_url(&path))
                .header("X-Emby-Authorization", self.auth_header())
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

    pub async fn delete_item(&self, cancel: &CancellationToken, item_id: &str) -> Result<()> {
        let path = format!("/Items/{}", item_id);
        with_retry(cancel, "jellyfin_delete_item", || async {
            let response = self
                .client
                .delete(self.build_url(&path))
                .header("X-Emby-Authorization", self.auth_header())
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
