//! Video feed, watch history and liked videos.

use document_store::{
    CREATED_AT_FIELD, Collection, Document, DocumentId, DocumentStore, Filter, ID_FIELD,
};
use serde_json::Value;

use crate::engine::QueryEngine;
use crate::join::Lookup;
use crate::pagination::{Page, PageRequest, SortDirection, SortSpec};
use crate::pipeline::{Pipeline, Stage};
use crate::projection::{FieldSpec, Projection};
use crate::views::owner_summary;
use crate::{QueryError, Result};

/// Keys the feed may be sorted by.
pub const FEED_SORT_KEYS: &[&str] = &["createdAt", "updatedAt", "views", "duration", "title"];

/// Parameters of the public video feed.
#[derive(Debug, Clone, Default)]
pub struct VideoFeedQuery {
    /// Case-insensitive search over title and description.
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: SortDirection,
    /// Restricts the feed to one channel.
    pub user_id: Option<DocumentId>,
    pub page: PageRequest,
}

impl VideoFeedQuery {
    /// Resolves the sort, rejecting keys outside [`FEED_SORT_KEYS`].
    pub fn sort(&self) -> Result<SortSpec> {
        let key = self
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(CREATED_AT_FIELD);
        if !FEED_SORT_KEYS.contains(&key) {
            return Err(QueryError::InvalidInput(format!(
                "cannot sort videos by {key}"
            )));
        }
        Ok(SortSpec::new(key, self.sort_type))
    }
}

/// Published videos only. The owner summary is joined after paging.
pub fn feed_pipeline(query: &VideoFeedQuery) -> Result<Pipeline> {
    let mut filter = Filter::new().eq("isPublished", true);
    if let Some(owner) = query.user_id {
        filter = filter.eq("owner", owner.to_string());
    }
    if let Some(needle) = query.query.as_deref().map(str::trim)
        && !needle.is_empty()
    {
        filter = filter.text_search(["title", "description"], needle);
    }

    Ok(Pipeline::new(Collection::Videos)
        .filter(filter)
        .paginate(query.sort()?, query.page)
        .lookup(owner_summary("owner", "owner")))
}

/// One video with its owner summary, like count and whether `viewer` liked it.
pub fn video_details_pipeline(video: DocumentId, viewer: Option<DocumentId>) -> Pipeline {
    let is_liked = match viewer {
        Some(viewer) => FieldSpec::contains("isLiked", "likes.likedBy", viewer.to_string()),
        None => FieldSpec::literal("isLiked", false),
    };

    Pipeline::new(Collection::Videos)
        .filter(Filter::by_id(video))
        .lookup(
            Lookup::many(Collection::Likes, ID_FIELD, "target.id", "likes")
                .with_stage(Stage::Match(Filter::new().eq("target.kind", "video"))),
        )
        .lookup(owner_summary("owner", "owner"))
        .add_fields(vec![FieldSpec::size("likesCount", "likes"), is_liked])
        .project(Projection::new().without("likes"))
}

/// Videos in the user's watch history, most recent first, each with its owner summary.
pub fn watch_history_pipeline(user: DocumentId) -> Pipeline {
    Pipeline::new(Collection::Users)
        .filter(Filter::by_id(user))
        .lookup(
            Lookup::many(Collection::Videos, "watchHistory", ID_FIELD, "watchHistory")
                .with_stage(Stage::Lookup(owner_summary("owner", "owner"))),
        )
        .project(Projection::including(["watchHistory"]))
}

/// Videos the user liked, most recently liked first.
pub fn liked_videos_pipeline(user: DocumentId) -> Pipeline {
    Pipeline::new(Collection::Likes)
        .filter(
            Filter::new()
                .eq("likedBy", user.to_string())
                .eq("target.kind", "video"),
        )
        .lookup(
            Lookup::reference(Collection::Videos, "target.id", "video")
                .with_stage(Stage::Lookup(owner_summary("owner", "owner"))),
        )
        .matching(Filter::new().exists("video"))
        .sort(SortSpec::newest_first())
        .project(
            Projection::new()
                .field(FieldSpec::include("video"))
                .field(FieldSpec::rename("likedAt", CREATED_AT_FIELD)),
        )
}

impl<S: DocumentStore> QueryEngine<S> {
    pub async fn video_feed(&self, query: &VideoFeedQuery) -> Result<Page<Document>> {
        self.run_paged(&feed_pipeline(query)?).await
    }

    /// Fails with `NotFound` when the video does not exist.
    pub async fn video_details(
        &self,
        video: DocumentId,
        viewer: Option<DocumentId>,
    ) -> Result<Document> {
        self.run_one(&video_details_pipeline(video, viewer))
            .await?
            .ok_or_else(|| QueryError::NotFound("video".to_string()))
    }

    /// An unknown user has an empty history.
    pub async fn watch_history(&self, user: DocumentId) -> Result<Vec<Document>> {
        let Some(mut doc) = self.run_one(&watch_history_pipeline(user)).await? else {
            return Ok(Vec::new());
        };
        let history = match doc.remove("watchHistory") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        history
            .into_iter()
            .map(|v| Document::from_value(v).map_err(QueryError::from))
            .collect()
    }

    pub async fn liked_videos(&self, user: DocumentId) -> Result<Vec<Document>> {
        self.run(&liked_videos_pipeline(user)).await
    }
}
