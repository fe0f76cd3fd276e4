use document_store::{Collection, Document, DocumentId, DocumentStore, Filter, ID_FIELD};

use crate::Result;
use crate::engine::QueryEngine;
use crate::join::Lookup;
use crate::pagination::SortSpec;
use crate::pipeline::{Pipeline, Stage};
use crate::projection::{FieldSpec, Projection};
use crate::views::owner_summary;

/// A user's tweets, newest first, with like counts.
pub fn user_tweets_pipeline(user: DocumentId) -> Pipeline {
    Pipeline::new(Collection::Tweets)
        .filter(Filter::new().eq("owner", user.to_string()))
        .sort(SortSpec::newest_first())
        .lookup(
            Lookup::many(Collection::Likes, ID_FIELD, "target.id", "likes")
                .with_stage(Stage::Match(Filter::new().eq("target.kind", "tweet"))),
        )
        .lookup(owner_summary("owner", "owner"))
        .add_fields(vec![FieldSpec::size("likesCount", "likes")])
        .project(Projection::new().without("likes"))
}

impl<S: DocumentStore> QueryEngine<S> {
    pub async fn user_tweets(&self, user: DocumentId) -> Result<Vec<Document>> {
        self.run(&user_tweets_pipeline(user)).await
    }
}
