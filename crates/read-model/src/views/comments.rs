use document_store::{Collection, Document, DocumentId, DocumentStore, Filter};

use crate::Result;
use crate::engine::QueryEngine;
use crate::join::Lookup;
use crate::pagination::{Page, PageRequest, SortSpec};
use crate::pipeline::Pipeline;
use crate::projection::{FieldSpec, Projection};

/// Comments on a video, newest first, with a flattened owner sub-document.
///
/// The owner join runs after paging so only the window is joined.
pub fn video_comments_pipeline(video: DocumentId, page: PageRequest) -> Pipeline {
    Pipeline::new(Collection::Comments)
        .filter(Filter::new().eq("video", video.to_string()))
        .paginate(SortSpec::newest_first(), page)
        .lookup(Lookup::reference(Collection::Users, "owner", "ownerDetails"))
        .project(
            Projection::including(["content", "video", "createdAt", "updatedAt"])
                .field(FieldSpec::rename("owner._id", "ownerDetails._id"))
                .field(FieldSpec::rename("owner.fullName", "ownerDetails.fullName"))
                .field(FieldSpec::rename("owner.username", "ownerDetails.username"))
                .field(FieldSpec::rename("owner.avatar", "ownerDetails.avatar")),
        )
}

impl<S: DocumentStore> QueryEngine<S> {
    pub async fn video_comments(
        &self,
        video: DocumentId,
        page: PageRequest,
    ) -> Result<Page<Document>> {
        self.run_paged(&video_comments_pipeline(video, page)).await
    }
}
