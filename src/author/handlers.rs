use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument};

use super::types::SelectOption;
use crate::shared::{ApiResult, AppState, JsonResponse};

/// HTTP handler listing authors as select options
///
/// POST /admin/authors/all
/// Returns `[{value, text}, ...]`
#[instrument(name = "authors_all", skip(state))]
pub async fn authors_all(State(state): State<AppState>) -> ApiResult<Vec<SelectOption>> {
    let options: Vec<SelectOption> = state
        .author_repository
        .list_authors()
        .await?
        .into_iter()
        .map(SelectOption::from)
        .collect();

    info!(author_count = options.len(), "Authors listed successfully");

    Ok((StatusCode::OK, Json(JsonResponse::data(options))))
}
