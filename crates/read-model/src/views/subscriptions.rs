//! Both directions of the subscription edge.

use document_store::{
    CREATED_AT_FIELD, Collection, Document, DocumentId, DocumentStore, Filter, ID_FIELD,
};

use crate::Result;
use crate::engine::QueryEngine;
use crate::join::Lookup;
use crate::pagination::SortSpec;
use crate::pipeline::{Pipeline, Stage};
use crate::projection::{FieldSpec, Projection};
use crate::views::OWNER_SUMMARY_FIELDS;

/// Joins the user on the other end of the edge and emits
/// `{_id, <as_field>: {...}, subscribedAt}`. Edges to deleted users vanish.
fn edge_pipeline(match_field: &str, user: DocumentId, other_field: &str) -> Pipeline {
    Pipeline::new(Collection::Subscriptions)
        .filter(Filter::new().eq(match_field, user.to_string()))
        .lookup(
            Lookup::many(Collection::Users, other_field, ID_FIELD, other_field)
                .with_stage(Stage::Project(Projection::including(OWNER_SUMMARY_FIELDS))),
        )
        .unwind(other_field)
        .sort(SortSpec::newest_first())
        .project(
            Projection::including([other_field])
                .field(FieldSpec::rename("subscribedAt", CREATED_AT_FIELD)),
        )
}

pub fn channel_subscribers_pipeline(channel: DocumentId) -> Pipeline {
    edge_pipeline("channel", channel, "subscriber")
}

pub fn subscribed_channels_pipeline(subscriber: DocumentId) -> Pipeline {
    edge_pipeline("subscriber", subscriber, "channel")
}

impl<S: DocumentStore> QueryEngine<S> {
    pub async fn channel_subscribers(&self, channel: DocumentId) -> Result<Vec<Document>> {
        self.run(&channel_subscribers_pipeline(channel)).await
    }

    pub async fn subscribed_channels(&self, subscriber: DocumentId) -> Result<Vec<Document>> {
        self.run(&subscribed_channels_pipeline(subscriber)).await
    }
}
