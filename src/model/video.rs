use derive_new::new;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use uuid::Uuid;

use super::{now, Comment, Timestamp};

/// Identifier of a published video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(Uuid);

impl VideoId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> &Uuid {
        &self.0
    }
}

impl std::str::FromStr for VideoId {
    type Err = ParseVideoId;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input
            .parse()
            .map(VideoId)
            .map_err(|_| ParseVideoId::new(input.to_string()))
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Snafu, new)]
#[snafu(display("Failed to parse video id: {}", text))]
pub struct ParseVideoId {
    pub text: String,
}

/// A published video together with its engagement state.
///
/// `comments` is kept newest-first. Records written before comments existed
/// may lack the field entirely; `serde(default)` folds those into the empty
/// list on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct VideoRecord {
    #[new(value = "VideoId::random()")]
    pub id: VideoId,
    pub title: String,
    pub topic: String,
    pub media_ref: String,
    pub author_id: String,
    pub author_name: String,
    #[new(default)]
    pub views: u64,
    #[new(default)]
    pub likes: u64,
    #[new(value = "now()")]
    pub created_at: Timestamp,
    #[serde(default)]
    #[new(default)]
    pub comments: Vec<Comment>,
}

/// Payload for publishing a new video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct NewVideo {
    pub title: String,
    pub topic: String,
    pub media_ref: String,
    pub author_id: String,
    pub author_name: String,
}

impl From<NewVideo> for VideoRecord {
    fn from(new: NewVideo) -> Self {
        VideoRecord::new(
            new.title,
            new.topic,
            new.media_ref,
            new.author_id,
            new.author_name,
        )
    }
}

/// Partial update of the describable fields; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, new)]
pub struct MetadataPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl MetadataPatch {
    pub fn apply(&self, record: &mut VideoRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }

        if let Some(topic) = &self.topic {
            record.topic = topic.clone();
        }
    }
}
