use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod error;
mod state;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/api/videos", get(videos::list).post(videos::publish))
        .route(
            "/api/videos/:id",
            get(videos::info)
                .put(videos::edit)
                .delete(videos::delete),
        )
        .route("/api/videos/:id/view", post(videos::view))
        .route("/api/videos/:id/like", post(videos::like))
        .route("/api/videos/:id/comments", post(videos::comment))
        .route("/api/videos/:id/overlay", get(videos::overlay))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

mod videos {
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use itertools::Itertools;
    use serde::{Deserialize, Serialize};
    use tracing::instrument;

    use crate::model::{Comment, MetadataPatch, NewVideo, VideoId, VideoRecord};
    use crate::overlay::{self, LanePolicy, LayoutParams, OverlayEvent};

    use super::{App, Result};

    /// Newest first, the original client's default ordering.
    #[instrument(skip(app))]
    pub async fn list(State(app): State<App>) -> Json<Vec<VideoRecord>> {
        let videos = app
            .list_videos()
            .await
            .into_iter()
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
            .collect();

        Json(videos)
    }

    #[instrument(skip(app))]
    pub async fn publish(
        State(app): State<App>,
        Json(video): Json<NewVideo>,
    ) -> Result<(StatusCode, Json<VideoRecord>)> {
        let record = app.publish(video).await?;

        Ok((StatusCode::CREATED, Json(record)))
    }

    #[instrument(skip(app))]
    pub async fn info(
        State(app): State<App>,
        Path(id): Path<VideoId>,
    ) -> Result<Json<VideoRecord>> {
        let record = app.get_video(&id).await?;

        Ok(Json(record))
    }

    #[instrument(skip(app))]
    pub async fn view(
        State(app): State<App>,
        Path(id): Path<VideoId>,
    ) -> Result<Json<VideoRecord>> {
        let record = app.increment_view(&id).await?;

        Ok(Json(record))
    }

    #[instrument(skip(app))]
    pub async fn like(
        State(app): State<App>,
        Path(id): Path<VideoId>,
    ) -> Result<Json<VideoRecord>> {
        let record = app.increment_like(&id).await?;

        Ok(Json(record))
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NewComment {
        pub author_id: String,
        pub author_name: String,
        pub text: String,
    }

    #[instrument(skip(app))]
    pub async fn comment(
        State(app): State<App>,
        Path(id): Path<VideoId>,
        Json(payload): Json<NewComment>,
    ) -> Result<(StatusCode, Json<Comment>)> {
        let comment = app
            .add_comment(&id, payload.author_id, payload.author_name, payload.text)
            .await?;

        Ok((StatusCode::CREATED, Json(comment)))
    }

    #[instrument(skip(app))]
    pub async fn edit(
        State(app): State<App>,
        Path(id): Path<VideoId>,
        Json(patch): Json<MetadataPatch>,
    ) -> Result<Json<VideoRecord>> {
        let record = app.edit_metadata(&id, patch).await?;

        Ok(Json(record))
    }

    #[derive(Debug, Serialize)]
    pub struct Removed {
        pub removed: bool,
    }

    #[instrument(skip(app))]
    pub async fn delete(State(app): State<App>, Path(id): Path<VideoId>) -> Result<Json<Removed>> {
        let removed = app.delete_video(&id).await?;

        Ok(Json(Removed { removed }))
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct OverlayQuery {
        pub lanes: Option<usize>,
        pub policy: Option<LanePolicy>,
    }

    /// Lays out the video's comment backlog with the configured defaults,
    /// letting the caller override the lane count and collision policy.
    #[instrument(skip(app))]
    pub async fn overlay(
        State(app): State<App>,
        Path(id): Path<VideoId>,
        Query(query): Query<OverlayQuery>,
    ) -> Result<Json<Vec<OverlayEvent>>> {
        let record = app.get_video(&id).await?;

        let params = LayoutParams {
            lanes: query.lanes.unwrap_or(app.overlay.lanes),
            policy: query.policy.unwrap_or(app.overlay.policy),
            ..(*app.overlay).clone()
        };

        let events = overlay::layout(&record.comments, &params, &mut rand::thread_rng());

        Ok(Json(events))
    }
}
