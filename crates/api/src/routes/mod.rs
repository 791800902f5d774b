pub mod health;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;

/// Build the application route tree.
///
/// Route hierarchy:
///
/// ```text
/// /upload-image/               ingest one annotated image (POST)
///
/// /images/                     list stored record summaries
/// /images/{id}                 one record summary (404 if incomplete)
///
/// /download/dataset            raw zip of the whole dataset tree
/// /download/dataset/report     zip of spreadsheet + images
/// /download/dataset/excel      spreadsheet alone
///
/// /dataset/images/*            static image files
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/upload-image/", post(handlers::upload::upload_image))
        // The history UI requests `/images`, older clients `/images/`;
        // axum does not normalize trailing slashes, so both are mounted.
        .route("/images", get(handlers::records::list_records))
        .route("/images/", get(handlers::records::list_records))
        .route("/images/{id}", get(handlers::records::get_record))
        .route(
            "/download/dataset",
            get(handlers::downloads::download_dataset),
        )
        .route(
            "/download/dataset/report",
            get(handlers::downloads::download_report),
        )
        .route(
            "/download/dataset/excel",
            get(handlers::downloads::download_spreadsheet),
        )
        .nest_service(
            "/dataset/images",
            ServeDir::new(state.store.images_dir()),
        )
}
