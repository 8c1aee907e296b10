//! Room assistant route handlers.
//!
//! The page takes a photo, a room type and a style; the analysis comes
//! back as an HTMX fragment with suggestions and matching products.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use furnish_core::room::{RoomType, Style, UploadError};

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::routes::products::ProductView;
use crate::services::room::{RoomError, RoomReport, RoomService, RoomUpload};
use crate::state::AppState;

/// A `<select>` option.
#[derive(Clone)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
}

/// One suggestion with its catalog matches.
#[derive(Clone)]
pub struct SuggestionView {
    pub name: String,
    pub category: &'static str,
    pub color: &'static str,
    pub material: &'static str,
    pub placement: &'static str,
    pub price: String,
    pub products: Vec<ProductView>,
}

/// A finished analysis for the results fragment.
#[derive(Clone)]
pub struct RoomReportView {
    pub room_label: &'static str,
    pub style_name: &'static str,
    pub style_analysis: String,
    pub total_cost: String,
    pub suggestions: Vec<SuggestionView>,
    /// First in-stock match of each suggestion, comma-separated, for "add all".
    pub add_all_ids: String,
}

impl From<&RoomReport> for RoomReportView {
    fn from(report: &RoomReport) -> Self {
        let add_all_ids = report
            .suggestions
            .iter()
            .filter_map(|s| s.matching_products.iter().find(|p| p.in_stock()))
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            room_label: report.room_type.label(),
            style_name: report.style.name(),
            style_analysis: report.style_analysis.clone(),
            total_cost: report.total_cost.to_string(),
            suggestions: report
                .suggestions
                .iter()
                .map(|s| SuggestionView {
                    name: s.ai_suggestion.name.clone(),
                    category: s.ai_suggestion.category,
                    color: s.ai_suggestion.color,
                    material: s.ai_suggestion.material,
                    placement: s.ai_suggestion.placement,
                    price: s.estimated_price.to_string(),
                    products: s.matching_products.iter().map(ProductView::from).collect(),
                })
                .collect(),
            add_all_ids,
        }
    }
}

/// Room assistant page template.
#[derive(Template, WebTemplate)]
#[template(path = "room.html")]
pub struct RoomTemplate {
    pub current_user: Option<CurrentUser>,
    pub room_types: Vec<OptionView>,
    pub styles: Vec<OptionView>,
    pub max_mb: usize,
}

/// Analysis results fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/room_results.html")]
pub struct RoomResultsTemplate {
    pub report: Option<RoomReportView>,
    pub error: Option<String>,
}

/// A room upload read from a multipart form.
#[derive(Debug, Default)]
pub struct RoomForm {
    pub content_type: Option<String>,
    pub image_len: usize,
    pub room_type: String,
    pub style_preference: String,
}

impl RoomForm {
    /// Borrowed view for [`RoomService::analyze`].
    #[must_use]
    pub fn upload(&self) -> RoomUpload<'_> {
        RoomUpload {
            content_type: self.content_type.as_deref(),
            len: self.image_len,
            room_type: &self.room_type,
            style_preference: &self.style_preference,
        }
    }
}

/// Read the `image`, `room_type` and `style_preference` fields.
///
/// Only the image's declared type and size are kept; the bytes are
/// dropped as soon as they have been counted.
///
/// # Errors
///
/// Returns `AppError::Room` when the body exceeds the upload limit and
/// `AppError::BadRequest` for a malformed body.
pub async fn read_room_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<RoomForm, AppError> {
    let mut form = RoomForm::default();
    let multipart_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Room(RoomError::Upload(UploadError::TooLarge {
                max_mb: max_upload_bytes / (1024 * 1024),
            }))
        } else {
            AppError::BadRequest(e.body_text())
        }
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                form.content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                form.image_len = bytes.len();
            }
            Some("room_type") => {
                form.room_type = field
                    .text()
                    .await
                    .map_err(multipart_error)?;
            }
            Some("style_preference") => {
                form.style_preference = field
                    .text()
                    .await
                    .map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Display the room assistant page.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> impl IntoResponse {
    RoomTemplate {
        current_user,
        room_types: RoomType::ALL
            .iter()
            .map(|r| OptionView {
                value: r.code(),
                label: r.label(),
            })
            .collect(),
        styles: Style::ALL
            .iter()
            .map(|s| OptionView {
                value: s.name(),
                label: s.name(),
            })
            .collect(),
        max_mb: state.config().shop.max_upload_bytes / (1024 * 1024),
    }
}

/// Analyze an uploaded room photo (HTMX).
#[instrument(skip(state, multipart))]
pub async fn analyze(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    let max_upload_bytes = state.config().shop.max_upload_bytes;
    let form = match read_room_form(multipart, max_upload_bytes).await {
        Ok(form) => form,
        Err(AppError::Room(RoomError::Upload(e))) => {
            return RoomResultsTemplate {
                report: None,
                error: Some(e.to_string()),
            };
        }
        Err(e) => {
            tracing::warn!("Unreadable room upload: {e}");
            return RoomResultsTemplate {
                report: None,
                error: Some("The upload could not be read. Please try another image.".to_string()),
            };
        }
    };

    let service = RoomService::new(state.catalog(), max_upload_bytes);
    match service.analyze(form.upload()).await {
        Ok(report) => RoomResultsTemplate {
            report: Some(RoomReportView::from(&report)),
            error: None,
        },
        Err(RoomError::Upload(e)) => RoomResultsTemplate {
            report: None,
            error: Some(e.to_string()),
        },
        Err(e) => {
            tracing::error!("Room analysis failed: {e}");
            RoomResultsTemplate {
                report: None,
                error: Some("Failed to analyze image".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furnish_core::room::ImageKind;

    #[test]
    fn test_report_view_without_matches() {
        let analysis = furnish_core::room::analyze(RoomType::Office, Style::Minimalist);
        let report = RoomReport {
            image: ImageKind::Png,
            room_type: analysis.room_type,
            style: analysis.style,
            suggestions: Vec::new(),
            total_cost: analysis.total_cost,
            style_analysis: analysis.style_analysis.clone(),
        };
        let view = RoomReportView::from(&report);
        assert_eq!(view.room_label, "Office");
        assert_eq!(view.style_name, "Minimalist");
        assert!(view.add_all_ids.is_empty());
        assert_eq!(view.total_cost, analysis.total_cost.to_string());
    }

    #[test]
    fn test_room_form_upload_view() {
        let form = RoomForm {
            content_type: Some("image/png".to_string()),
            image_len: 2048,
            room_type: "bedroom".to_string(),
            style_preference: "Classic".to_string(),
        };
        let upload = form.upload();
        assert_eq!(upload.content_type, Some("image/png"));
        assert_eq!(upload.len, 2048);
        assert_eq!(upload.room_type, "bedroom");
    }
}
