use std::sync::Arc;

use derive_new::new;
use snafu::{ensure, Location, OptionExt, ResultExt, Snafu};
use tracing::instrument;

use crate::model::{Comment, MetadataPatch, NewVideo, VideoId, VideoRecord};
use crate::store::{StoreError, VideoStore};

pub type Result<T, E = EngagementError> = std::result::Result<T, E>;

/// Engagement operations over the video library.
///
/// Every state change goes through [`VideoStore::mutate`], so effects are
/// all-or-nothing: a failed operation leaves the record exactly as it was.
#[derive(Debug, Clone, new)]
pub struct Engagement {
    store: Arc<VideoStore>,
}

impl Engagement {
    #[instrument(skip(self))]
    pub async fn publish(&self, video: NewVideo) -> Result<VideoRecord> {
        let record = self.store.insert(video).await.context(StorageSnafu)?;
        tracing::info!(video = %record.id, "published video `{}`", record.title);

        Ok(record)
    }

    pub async fn list_videos(&self) -> Vec<VideoRecord> {
        self.store.all().await
    }

    pub async fn get_video(&self, id: &VideoId) -> Result<VideoRecord> {
        self.store
            .get(id)
            .await
            .context(VideoNotFoundSnafu { id: id.clone() })
    }

    /// Records one playback. Every call counts, replays included; the
    /// counter is deliberately not idempotent.
    #[instrument(skip(self))]
    pub async fn increment_view(&self, id: &VideoId) -> Result<VideoRecord> {
        let record = self.mutate_record(id, |record| record.views += 1).await?;
        tracing::debug!(video = %id, views = record.views, "view recorded");

        Ok(record)
    }

    /// Records one like tap. Repeated taps keep counting; nothing tracks
    /// who already liked what.
    #[instrument(skip(self))]
    pub async fn increment_like(&self, id: &VideoId) -> Result<VideoRecord> {
        let record = self.mutate_record(id, |record| record.likes += 1).await?;
        tracing::debug!(video = %id, likes = record.likes, "like recorded");

        Ok(record)
    }

    /// Validates and prepends a comment, newest first. Returns the stored
    /// comment with its assigned id and timestamp.
    #[instrument(skip(self))]
    pub async fn add_comment(
        &self,
        id: &VideoId,
        author_id: String,
        author_name: String,
        text: String,
    ) -> Result<Comment> {
        let text = text.trim();
        ensure!(!text.is_empty(), EmptyCommentSnafu);

        let comment = Comment::new(author_id, author_name, text.to_string());

        self.mutate_record(id, |record| record.comments.insert(0, comment.clone()))
            .await?;
        tracing::info!(video = %id, comment = %comment.id, "comment added");

        Ok(comment)
    }

    #[instrument(skip(self))]
    pub async fn edit_metadata(&self, id: &VideoId, patch: MetadataPatch) -> Result<VideoRecord> {
        let record = self.mutate_record(id, |record| patch.apply(record)).await?;
        tracing::info!(video = %id, "metadata updated");

        Ok(record)
    }

    /// Removes the video. Reports `false` when there was nothing to remove,
    /// so repeated deletes stay harmless.
    #[instrument(skip(self))]
    pub async fn delete_video(&self, id: &VideoId) -> Result<bool> {
        let removed = self.store.remove(id).await.context(StorageSnafu)?;

        if removed {
            tracing::info!(video = %id, "video deleted");
        }

        Ok(removed)
    }

    async fn mutate_record(
        &self,
        id: &VideoId,
        apply: impl FnOnce(&mut VideoRecord),
    ) -> Result<VideoRecord> {
        match self.store.mutate(id, apply).await {
            Ok(record) => Ok(record),
            Err(StoreError::RecordNotFound { .. }) => VideoNotFoundSnafu { id: id.clone() }.fail(),
            Err(source) => Err(source).context(StorageSnafu),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum EngagementError {
    #[snafu(display("Video `{id}` was not found"))]
    VideoNotFound {
        id: VideoId,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Comment text must not be empty"))]
    EmptyComment {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Storage failed: {source}"))]
    Storage {
        source: StoreError,
        #[snafu(implicit)]
        location: Location,
    },
}
