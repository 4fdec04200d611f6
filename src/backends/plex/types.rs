use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlexContainer<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

#[derive(Debug, Deserialize, Default)]
pub struct DirectoriesContainer {
    #[serde(rename = "Directory", default)]
    pub directory: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
pub struct PlexDirectory {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlexMetadata>,
    #[serde(rename = "totalSize", default)]
    pub total_size: Option<u32>,
    #[serde(rename = "size", default)]
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlexMedia {
    #[serde(rename = "Part", default)]
    pub part: Vec<PlexPart>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlexPart {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlexMetadata {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    pub title: String,
    #[serde(rename = "titleSort", default)]
    pub title_sort: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(rename = "viewOffset", default)]
    pub view_offset: Option<i64>,
    #[serde(rename = "viewCount", default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub art: Option<String>,
    #[serde(rename = "addedAt", default)]
    pub added_at: Option<i64>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<i64>,
    #[serde(rename = "parentRatingKey", default)]
    pub parent_rating_key: Option<String>,
    #[serde(rename = "parentTitle", default)]
    pub parent_title: Option<String>,
    #[serde(rename = "parentIndex", default)]
    pub parent_index: Option<i64>,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(rename = "leafCount", default)]
    pub leaf_count: Option<i64>,
    #[serde(rename = "viewedLeafCount", default)]
    pub viewed_leaf_count: Option<i64>,
    #[serde(rename = "childCount", default)]
    pub child_count: Option<i64>,
    #[serde(default)]
    pub smart: Option<i64>,
    #[serde(rename = "Media", default)]
    pub media: Vec<PlexMedia>,
}

#[derive(Debug, Deserialize)]
pub struct PlexIdentityResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexIdentity,
}

#[derive(Debug, Deserialize)]
pub struct PlexIdentity {
    #[serde(rename = "machineIdentifier")]
    pub machine_identifier: String,
}
