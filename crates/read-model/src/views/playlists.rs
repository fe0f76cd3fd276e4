use document_store::{Collection, Document, DocumentId, DocumentStore, Filter, ID_FIELD};

use crate::engine::QueryEngine;
use crate::join::Lookup;
use crate::pagination::SortSpec;
use crate::pipeline::{Pipeline, Stage};
use crate::projection::{FieldSpec, Projection};
use crate::views::owner_summary;
use crate::{QueryError, Result};

/// Playlist videos keep the playlist's order; deleted videos are skipped.
fn with_videos(pipeline: Pipeline) -> Pipeline {
    pipeline
        .add_fields(vec![FieldSpec::size("totalVideos", "videos")])
        .lookup(owner_summary("owner", "createdBy"))
        .lookup(
            Lookup::many(Collection::Videos, "videos", ID_FIELD, "videos")
                .with_stage(Stage::Lookup(owner_summary("owner", "owner")))
                .with_stage(Stage::Project(Projection::including([
                    "title",
                    "description",
                    "thumbnail",
                    "duration",
                    "views",
                    "owner",
                ]))),
        )
        .project(Projection::including([
            "name",
            "description",
            "videos",
            "totalVideos",
            "createdBy",
            "createdAt",
            "updatedAt",
        ]))
}

pub fn playlist_pipeline(playlist: DocumentId) -> Pipeline {
    with_videos(Pipeline::new(Collection::Playlists).filter(Filter::by_id(playlist)))
}

pub fn user_playlists_pipeline(user: DocumentId) -> Pipeline {
    with_videos(
        Pipeline::new(Collection::Playlists)
            .filter(Filter::new().eq("owner", user.to_string()))
            .sort(SortSpec::newest_first()),
    )
}

impl<S: DocumentStore> QueryEngine<S> {
    pub async fn playlist_with_videos(&self, playlist: DocumentId) -> Result<Document> {
        self.run_one(&playlist_pipeline(playlist))
            .await?
            .ok_or_else(|| QueryError::NotFound("playlist".to_string()))
    }

    pub async fn user_playlists(&self, user: DocumentId) -> Result<Vec<Document>> {
        self.run(&user_playlists_pipeline(user)).await
    }
}
