use std::path::PathBuf;

use snafu::{Location, Snafu};

use crate::model::VideoId;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum StoreError {
    #[snafu(display("No record for video `{id}`"))]
    RecordNotFound {
        id: VideoId,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to create the store directory `{}`: {source}", path.display()))]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to scan the store directory `{}`: {source}", path.display()))]
    ScanDir {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to read the record file `{}`: {source}", path.display()))]
    ReadRecord {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to encode the record for video `{id}`: {source}"))]
    EncodeRecord {
        id: VideoId,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to write the record file `{}`: {source}", path.display()))]
    WriteRecord {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to remove the record file `{}`: {source}", path.display()))]
    RemoveRecord {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}
