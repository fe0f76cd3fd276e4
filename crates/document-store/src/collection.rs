use serde::{Deserialize, Serialize};

/// The collections of the platform, one per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Videos,
    Comments,
    Likes,
    Subscriptions,
    Playlists,
    Tweets,
}

impl Collection {
    /// All collections, in schema order.
    pub const ALL: [Collection; 7] = [
        Collection::Users,
        Collection::Videos,
        Collection::Comments,
        Collection::Likes,
        Collection::Subscriptions,
        Collection::Playlists,
        Collection::Tweets,
    ];

    /// Returns the persisted collection name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Videos => "videos",
            Collection::Comments => "comments",
            Collection::Likes => "likes",
            Collection::Subscriptions => "subscriptions",
            Collection::Playlists => "playlists",
            Collection::Tweets => "tweets",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
