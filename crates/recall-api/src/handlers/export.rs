//! Bookmark export.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use recall_core::{bookmarks_to_csv, export_filename, ExportFormat};

use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// `json` (default) or `csv`
    pub format: Option<String>,
}

/// Export all of the caller's bookmarks, newest first.
///
/// # Query Parameters
/// - `format`: `json` or `csv` (default `json`)
///
/// CSV responses are sent as an attachment named
/// `bookmarks_export_YYYY-MM-DD.csv`.
pub async fn export_bookmarks(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref().filter(|f| !f.is_empty()) {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };
    let bookmarks = state.bookmarks.export(&auth.principal).await?;

    tracing::info!(
        subsystem = "api",
        component = "export",
        user_id = %auth.principal.user_id,
        format = ?format,
        result_count = bookmarks.len(),
        "Bookmarks exported"
    );

    match format {
        ExportFormat::Json => Ok(Json(bookmarks).into_response()),
        ExportFormat::Csv => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                export_filename(Utc::now().date_naive())
            );
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bookmarks_to_csv(&bookmarks),
            )
                .into_response())
        }
    }
}
