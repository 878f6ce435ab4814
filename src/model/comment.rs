use derive_new::new;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{now, Timestamp};

/// Identifier of a single comment, unique across all videos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A viewer comment on a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct Comment {
    #[new(value = "CommentId::random()")]
    pub id: CommentId,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    #[new(value = "now()")]
    pub timestamp: Timestamp,
}
