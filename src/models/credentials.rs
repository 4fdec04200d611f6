use serde::{Deserialize, Serialize};

/// The opaque credential blob produced by the (out-of-scope) auth flow and
/// consumed by an adapter. The adapter layer is the only place that knows
/// what shape a given backend's blob takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Credentials {
    Plex { token: String },
    Jellyfin {
        access_token: String,
        user_id: String,
    },
}

impl Credentials {
    pub fn token(&self) -> &str {
        match self {
            Credentials::Plex { token } => token,
            Credentials::Jellyfin { access_token, .. } => access_token,
        }
    }
}
