//! Registration, sessions and profile maintenance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use document_store::{Collection, Document, DocumentId, DocumentStore, Filter, Update};
use media::{BlobStore, LocalFile, UploadBatch, release};
use read_model::{Pipeline, QueryEngine, Redaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::{hash_password, verify_password};
use crate::error::{DomainError, Result};
use crate::model::User;
use crate::repository::Repository;
use crate::service::required;
use crate::session::{SessionService, TokenPair};

/// Avatar and cover image are files already staged on this host.
#[derive(Debug, Clone, Default)]
pub struct RegisterUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<LocalFile>,
    pub cover_image: Option<LocalFile>,
}

/// Either identifier may be used; the username wins when both are given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    pub full_name: String,
    pub email: String,
}

/// A user as returned to its owner: everything except credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub watch_history: Vec<DocumentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            watch_history: user.watch_history,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedIn {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct UserService<S: DocumentStore + Clone> {
    repo: Repository<S>,
    engine: QueryEngine<S>,
    blobs: Arc<dyn BlobStore>,
    sessions: Arc<dyn SessionService>,
}

impl<S: DocumentStore + Clone> UserService<S> {
    pub fn new(store: S, blobs: Arc<dyn BlobStore>, sessions: Arc<dyn SessionService>) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            engine: QueryEngine::new(store),
            blobs,
            sessions,
        }
    }

    /// Returns the session collaborator, used to authenticate requests.
    pub fn sessions(&self) -> &Arc<dyn SessionService> {
        &self.sessions
    }

    /// Creates an account after uploading its avatar and optional cover image.
    ///
    /// Uploaded assets are deleted again if the account cannot be stored.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterUser) -> Result<UserProfile> {
        let full_name = required("fullName", &request.full_name)?;
        let username = required("username", &request.username)?.to_lowercase();
        let email = required("email", &request.email)?;
        let password = required("password", &request.password)?;
        let Some(avatar_file) = request.avatar.as_ref() else {
            return Err(DomainError::invalid("avatar file is required"));
        };

        let taken = Filter::new().eq("username", username.as_str());
        if self.repo.find_one::<User>(&taken).await?.is_some() {
            return Err(DomainError::Conflict("username is already taken".to_string()));
        }
        let taken = Filter::new().eq("email", email.as_str());
        if self.repo.find_one::<User>(&taken).await?.is_some() {
            return Err(DomainError::Conflict("email is already registered".to_string()));
        }

        let mut batch = UploadBatch::new(self.blobs.as_ref());
        let avatar = batch.upload(avatar_file).await?;
        let cover = batch.upload_optional(request.cover_image.as_ref()).await?;

        let now = Utc::now();
        let user = User {
            id: DocumentId::new(),
            username,
            email,
            full_name,
            avatar: avatar.url,
            cover_image: cover.map(|c| c.url),
            password: hash_password(&password)?,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        match self.repo.insert(&user).await {
            Ok(user) => {
                batch.commit();
                tracing::info!(user = %user.id, "user registered");
                Ok(user.into())
            }
            Err(e) => {
                batch.abort().await;
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoggedIn> {
        let filter = match (request.username.as_deref(), request.email.as_deref()) {
            (Some(username), _) if !username.trim().is_empty() => {
                Filter::new().eq("username", username.trim().to_lowercase())
            }
            (_, Some(email)) if !email.trim().is_empty() => {
                Filter::new().eq("email", email.trim())
            }
            _ => return Err(DomainError::invalid("username or email is required")),
        };
        let user = self
            .repo
            .find_one::<User>(&filter)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))?;

        if !verify_password(&request.password, &user.password)? {
            return Err(DomainError::Unauthorized("invalid user credentials".to_string()));
        }

        let tokens = self.sessions.issue(user.id)?;
        let rotate = Update::new().set("refreshToken", tokens.refresh_token.as_str());
        let user = self.repo.update::<User>(user.id, &rotate).await?;
        tracing::info!(user = %user.id, "user logged in");
        Ok(LoggedIn {
            user: user.into(),
            tokens,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn logout(&self, user_id: DocumentId) -> Result<()> {
        let clear = Update::new().set("refreshToken", Value::Null);
        self.repo.update::<User>(user_id, &clear).await?;
        Ok(())
    }

    /// Exchanges a refresh token for a new pair.
    ///
    /// The presented token must be the one stored on the user; each refresh
    /// swaps it in the same write that checks it, so a token can be used once.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let user_id = self.sessions.verify_refresh(refresh_token)?;
        let tokens = self.sessions.issue(user_id)?;

        let current = Filter::by_id(user_id).eq("refreshToken", refresh_token);
        let rotate = Update::new().set("refreshToken", tokens.refresh_token.as_str());
        let rotated = self.repo.update_where::<User>(&current, &rotate).await?;
        if rotated.is_some() {
            return Ok(tokens);
        }
        if self.repo.load::<User>(user_id).await?.is_none() {
            return Err(DomainError::Unauthorized("invalid refresh token".to_string()));
        }
        Err(DomainError::Unauthorized("refresh token is expired or used".to_string()))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: DocumentId,
        request: ChangePassword,
    ) -> Result<()> {
        let user = self.repo.require::<User>(user_id).await?;
        if !verify_password(&request.old_password, &user.password)? {
            return Err(DomainError::invalid("invalid old password"));
        }
        let new_password = required("newPassword", &request.new_password)?;
        let update = Update::new().set("password", hash_password(&new_password)?);
        self.repo.update::<User>(user_id, &update).await?;
        Ok(())
    }

    /// The requester's own profile, including their email.
    pub async fn current_user(&self, user_id: DocumentId) -> Result<Document> {
        let pipeline = Pipeline::new(Collection::Users)
            .filter(Filter::by_id(user_id))
            .redaction(Redaction::SelfProfile);
        self.engine
            .run_one(&pipeline)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_account(
        &self,
        user_id: DocumentId,
        request: UpdateAccount,
    ) -> Result<UserProfile> {
        let update = Update::new()
            .set("fullName", required("fullName", &request.full_name)?)
            .set("email", required("email", &request.email)?);
        Ok(self.repo.update::<User>(user_id, &update).await?.into())
    }

    pub async fn update_avatar(
        &self,
        user_id: DocumentId,
        file: &LocalFile,
    ) -> Result<UserProfile> {
        let previous = self.repo.require::<User>(user_id).await?.avatar;
        let mut batch = UploadBatch::new(self.blobs.as_ref());
        let asset = batch.upload(file).await?;

        let update = Update::new().set("avatar", asset.url);
        let user = self.commit_replacement(batch, user_id, &update).await?;
        release(self.blobs.as_ref(), &previous).await;
        Ok(user.into())
    }

    pub async fn update_cover_image(
        &self,
        user_id: DocumentId,
        file: &LocalFile,
    ) -> Result<UserProfile> {
        let previous = self.repo.require::<User>(user_id).await?.cover_image;
        let mut batch = UploadBatch::new(self.blobs.as_ref());
        let asset = batch.upload(file).await?;

        let update = Update::new().set("coverImage", asset.url);
        let user = self.commit_replacement(batch, user_id, &update).await?;
        if let Some(previous) = previous {
            release(self.blobs.as_ref(), &previous).await;
        }
        Ok(user.into())
    }

    async fn commit_replacement(
        &self,
        batch: UploadBatch<'_, dyn BlobStore>,
        user_id: DocumentId,
        update: &Update,
    ) -> Result<User> {
        match self.repo.update::<User>(user_id, update).await {
            Ok(user) => {
                batch.commit();
                Ok(user)
            }
            Err(e) => {
                batch.abort().await;
                Err(e)
            }
        }
    }

    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<DocumentId>,
    ) -> Result<Document> {
        let username = required("username", username)?;
        Ok(self.engine.channel_profile(&username, viewer).await?)
    }

    pub async fn watch_history(&self, user_id: DocumentId) -> Result<Vec<Document>> {
        Ok(self.engine.watch_history(user_id).await?)
    }
}
