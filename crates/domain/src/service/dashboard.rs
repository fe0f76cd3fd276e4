use document_store::{Document, DocumentId, DocumentStore};
use read_model::{ChannelStats, Page, PageRequest, QueryEngine};

use crate::error::Result;

/// Channel statistics for the signed-in owner.
#[derive(Clone)]
pub struct DashboardService<S: DocumentStore + Clone> {
    engine: QueryEngine<S>,
}

impl<S: DocumentStore + Clone> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self {
            engine: QueryEngine::new(store),
        }
    }

    pub async fn channel_stats(&self, channel: DocumentId) -> Result<ChannelStats> {
        Ok(self.engine.channel_stats(channel).await?)
    }

    pub async fn channel_videos(
        &self,
        channel: DocumentId,
        page: PageRequest,
    ) -> Result<Page<Document>> {
        Ok(self.engine.channel_videos(channel, page).await?)
    }
}
