use crate::models::{LibraryId, PlaylistId, SeasonId, ShowId};

/// Logical namespace a key lives under (spec §3.3). Each bucket maps to one
/// SQL partition in the persistent store and one prefix in the in-memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Libraries,
    Content,
    Seasons,
    Episodes,
    Playlists,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Libraries => "libraries",
            Bucket::Content => "content",
            Bucket::Seasons => "seasons",
            Bucket::Episodes => "episodes",
            Bucket::Playlists => "playlists",
        }
    }
}

pub fn libraries_list() -> String {
    "list".to_string()
}

pub fn content_movies(library_id: &LibraryId) -> String {
    format!("lib:{library_id}:movies")
}

pub fn content_shows(library_id: &LibraryId) -> String {
    format!("lib:{library_id}:shows")
}

pub fn content_mixed(library_id: &LibraryId) -> String {
    format!("lib:{library_id}:mixed")
}

pub fn content_ts(library_id: &LibraryId) -> String {
    format!("lib:{library_id}:ts")
}

pub fn library_prefix(library_id: &LibraryId) -> String {
    format!("lib:{library_id}:")
}

pub fn seasons_for_show(library_id: &LibraryId, show_id: &ShowId) -> String {
    format!("lib:{library_id}:show:{show_id}")
}

pub fn show_prefix(library_id: &LibraryId, show_id: &ShowId) -> String {
    format!("lib:{library_id}:show:{show_id}")
}

pub fn season_prefix(library_id: &LibraryId, show_id: &ShowId) -> String {
    format!("lib:{library_id}:show:{show_id}:season:")
}

pub fn episodes_for_season(library_id: &LibraryId, show_id: &ShowId, season_number: u32) -> String {
    format!("lib:{library_id}:show:{show_id}:season:{season_number}")
}

pub fn playlists_list() -> String {
    "list".to_string()
}

pub fn playlist_items(playlist_id: &PlaylistId) -> String {
    format!("items:{playlist_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_keys_follow_the_spec_key_space() {
        let lib = LibraryId::new("5");
        assert_eq!(content_movies(&lib), "lib:5:movies");
        assert_eq!(content_ts(&lib), "lib:5:ts");
    }

    #[test]
    fn season_prefix_matches_episode_key_prefix() {
        let lib = LibraryId::new("5");
        let show = ShowId::new("9");
        let key = episodes_for_season(&lib, &show, 2);
        assert!(key.starts_with(&season_prefix(&lib, &show)));
    }

    #[test]
    fn show_prefix_is_a_prefix_of_seasons_key() {
        let lib = LibraryId::new("5");
        let show = ShowId::new("9");
        assert_eq!(seasons_for_show(&lib, &show), show_prefix(&lib, &show));
    }
}
