//! Room analysis API.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::ApiUser;
use crate::routes::room::read_room_form;
use crate::services::room::{RoomReport, RoomService};
use crate::state::AppState;

fn report_body(report: &RoomReport) -> Value {
    json!({
        "success": true,
        "suggestions": report.suggestions,
        "total_cost": report.total_cost,
        "room_type": report.room_type,
        "style_preference": report.style,
        "style_analysis": report.style_analysis,
    })
}

/// Analyze a room photo sent as `multipart/form-data` with `image`,
/// `room_type` and `style_preference` fields.
///
/// POST /api/ai-analysis
///
/// # Errors
///
/// 400 when the image is missing, of the wrong type or too large;
/// 401 without authentication.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn analyze(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    multipart: Multipart,
) -> Result<Json<Value>> {
    let max_upload_bytes = state.config().shop.max_upload_bytes;
    let form = read_room_form(multipart, max_upload_bytes).await?;

    let report = RoomService::new(state.catalog(), max_upload_bytes)
        .analyze(form.upload())
        .await?;
    tracing::info!(
        suggestions = report.suggestions.len(),
        "Room analysis complete"
    );

    Ok(Json(report_body(&report)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use furnish_core::room::{self, ImageKind, RoomType, Style};

    #[test]
    fn test_report_body_shape() {
        let analysis = room::analyze(RoomType::Bedroom, Style::Scandinavian);
        let report = RoomReport {
            image: ImageKind::Jpeg,
            room_type: analysis.room_type,
            style: analysis.style,
            suggestions: Vec::new(),
            total_cost: analysis.total_cost,
            style_analysis: analysis.style_analysis.clone(),
        };
        let body = report_body(&report);

        assert_eq!(body["success"], true);
        assert_eq!(body["room_type"], "bedroom");
        assert_eq!(body["style_preference"], "Scandinavian");
        assert!(body["suggestions"].as_array().unwrap().is_empty());
        assert!(!body["style_analysis"].as_str().unwrap().is_empty());
    }
}
