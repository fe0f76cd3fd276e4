use chrono::Utc;
use document_store::{Document, DocumentId, DocumentStore, Filter};
use read_model::QueryEngine;
use serde::Deserialize;

use crate::auth::authorize;
use crate::error::{DomainError, Result};
use crate::model::{Playlist, User, Video};
use crate::repository::Repository;
use crate::service::required;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePlaylist {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Fields left out are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlaylist {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct PlaylistService<S: DocumentStore + Clone> {
    repo: Repository<S>,
    engine: QueryEngine<S>,
}

impl<S: DocumentStore + Clone> PlaylistService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            engine: QueryEngine::new(store),
        }
    }

    /// Creates a playlist. Names are unique per owner.
    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, owner: DocumentId, request: CreatePlaylist) -> Result<Playlist> {
        let name = required("name", &request.name)?;
        self.ensure_name_free(owner, &name, None).await?;

        let now = Utc::now();
        let playlist = Playlist {
            id: DocumentId::new(),
            name,
            description: request.description.trim().to_string(),
            owner,
            videos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&playlist).await
    }

    /// The playlist with its videos (each with its owner) in playlist order.
    pub async fn get(&self, playlist: DocumentId) -> Result<Document> {
        Ok(self.engine.playlist_with_videos(playlist).await?)
    }

    pub async fn user_playlists(&self, user: DocumentId) -> Result<Vec<Document>> {
        self.repo.ensure_exists::<User>(user).await?;
        Ok(self.engine.user_playlists(user).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_video(
        &self,
        requester: DocumentId,
        playlist_id: DocumentId,
        video: DocumentId,
    ) -> Result<Playlist> {
        let mut playlist = self.repo.require::<Playlist>(playlist_id).await?;
        authorize(requester, &playlist)?;
        self.repo.ensure_exists::<Video>(video).await?;

        if !playlist.add_video(video) {
            return Err(DomainError::Conflict(
                "video is already in the playlist".to_string(),
            ));
        }
        self.repo.save(&playlist).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_video(
        &self,
        requester: DocumentId,
        playlist_id: DocumentId,
        video: DocumentId,
    ) -> Result<Playlist> {
        let mut playlist = self.repo.require::<Playlist>(playlist_id).await?;
        authorize(requester, &playlist)?;

        if !playlist.remove_video(video) {
            return Err(DomainError::not_found("video in playlist"));
        }
        self.repo.save(&playlist).await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        requester: DocumentId,
        playlist_id: DocumentId,
        request: UpdatePlaylist,
    ) -> Result<Playlist> {
        let mut playlist = self.repo.require::<Playlist>(playlist_id).await?;
        authorize(requester, &playlist)?;

        if request.name.is_none() && request.description.is_none() {
            return Err(DomainError::invalid("name or description is required"));
        }
        if let Some(name) = request.name.as_deref() {
            let name = required("name", name)?;
            if name != playlist.name {
                self.ensure_name_free(playlist.owner, &name, Some(playlist.id))
                    .await?;
            }
            playlist.name = name;
        }
        if let Some(description) = request.description {
            playlist.description = description.trim().to_string();
        }
        self.repo.save(&playlist).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, requester: DocumentId, playlist_id: DocumentId) -> Result<()> {
        let playlist = self.repo.require::<Playlist>(playlist_id).await?;
        authorize(requester, &playlist)?;
        self.repo.delete::<Playlist>(playlist_id).await?;
        Ok(())
    }

    async fn ensure_name_free(
        &self,
        owner: DocumentId,
        name: &str,
        except: Option<DocumentId>,
    ) -> Result<()> {
        let filter = Filter::new()
            .eq("owner", owner.to_string())
            .eq("name", name);
        match self.repo.find_one::<Playlist>(&filter).await? {
            Some(existing) if Some(existing.id) != except => Err(DomainError::Conflict(format!(
                "a playlist named {name} already exists"
            ))),
            _ => Ok(()),
        }
    }
}
