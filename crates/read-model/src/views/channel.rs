//! Channel profile, dashboard stats and the channel's own video list.

use document_store::{Collection, Document, DocumentId, DocumentStore, Filter, ID_FIELD};
use serde::{Deserialize, Serialize};

use crate::aggregation::Group;
use crate::engine::QueryEngine;
use crate::join::Lookup;
use crate::pagination::{Page, PageRequest, SortSpec};
use crate::pipeline::Pipeline;
use crate::projection::{FieldSpec, Projection};
use crate::{QueryError, Result};

/// Dashboard totals for one channel. Every field is 0 for an empty channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_views: i64,
    pub total_videos: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

/// A user's public channel page with subscription counts.
///
/// `isSubscribed` reports whether `viewer` subscribes to the channel; it is
/// false for anonymous viewers.
pub fn profile_pipeline(username: &str, viewer: Option<DocumentId>) -> Pipeline {
    let is_subscribed = match viewer {
        Some(viewer) => {
            FieldSpec::contains("isSubscribed", "subscribers.subscriber", viewer.to_string())
        }
        None => FieldSpec::literal("isSubscribed", false),
    };

    Pipeline::new(Collection::Users)
        .filter(Filter::new().eq("username", username.trim().to_lowercase()))
        .lookup(Lookup::many(
            Collection::Subscriptions,
            ID_FIELD,
            "channel",
            "subscribers",
        ))
        .lookup(Lookup::many(
            Collection::Subscriptions,
            ID_FIELD,
            "subscriber",
            "subscribedTo",
        ))
        .add_fields(vec![
            FieldSpec::size("subscribersCount", "subscribers"),
            FieldSpec::size("channelsSubscribedToCount", "subscribedTo"),
            is_subscribed,
        ])
        .project(Projection::including([
            "fullName",
            "username",
            "avatar",
            "coverImage",
            "subscribersCount",
            "channelsSubscribedToCount",
            "isSubscribed",
        ]))
}

pub fn video_totals_pipeline(channel: DocumentId) -> Pipeline {
    Pipeline::new(Collection::Videos)
        .filter(Filter::new().eq("owner", channel.to_string()))
        .group(
            Group::global()
                .sum("totalViews", "views")
                .count("totalVideos"),
        )
}

pub fn subscriber_total_pipeline(channel: DocumentId) -> Pipeline {
    Pipeline::new(Collection::Subscriptions)
        .filter(Filter::new().eq("channel", channel.to_string()))
        .group(Group::global().count("totalSubscribers"))
}

/// Likes on any of the channel's videos: Like -> Video, then filter by owner.
pub fn like_total_pipeline(channel: DocumentId) -> Pipeline {
    Pipeline::new(Collection::Likes)
        .filter(Filter::new().eq("target.kind", "video"))
        .lookup(Lookup::reference(Collection::Videos, "target.id", "video"))
        .matching(Filter::new().eq("video.owner", channel.to_string()))
        .group(Group::global().count("totalLikes"))
}

pub fn channel_videos_pipeline(channel: DocumentId, page: PageRequest) -> Pipeline {
    Pipeline::new(Collection::Videos)
        .filter(Filter::new().eq("owner", channel.to_string()))
        .paginate(SortSpec::newest_first(), page)
}

impl<S: DocumentStore> QueryEngine<S> {
    /// Fails with `NotFound` when no user has the username.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<DocumentId>,
    ) -> Result<Document> {
        self.run_one(&profile_pipeline(username, viewer))
            .await?
            .ok_or_else(|| QueryError::NotFound("channel".to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn channel_stats(&self, channel: DocumentId) -> Result<ChannelStats> {
        let videos = self.rollup(&video_totals_pipeline(channel)).await?;
        let subscribers = self.rollup(&subscriber_total_pipeline(channel)).await?;
        let likes = self.rollup(&like_total_pipeline(channel)).await?;

        Ok(ChannelStats {
            total_views: videos.get_i64("totalViews").unwrap_or(0),
            total_videos: videos.get_i64("totalVideos").unwrap_or(0),
            total_subscribers: subscribers.get_i64("totalSubscribers").unwrap_or(0),
            total_likes: likes.get_i64("totalLikes").unwrap_or(0),
        })
    }

    /// Every video the channel owns, published or not, newest first.
    pub async fn channel_videos(
        &self,
        channel: DocumentId,
        page: PageRequest,
    ) -> Result<Page<Document>> {
        self.run_paged(&channel_videos_pipeline(channel, page)).await
    }
}
