//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct which generates the OpenAPI specification
//! for the REST API: every HTTP endpoint from the inbound layer, the wire
//! DTO schemas, and the session cookie security scheme. The generated
//! specification backs Swagger UI in debug builds and is exported via
//! `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Canvassing backend API",
        description = "HTTP interface for procurement tickets, canvass submissions, \
            reviewer approvals, comments, notifications, and dashboards."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::me,
        crate::inbound::http::users::list_users,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::apply_ticket_action,
        crate::inbound::http::tickets::share_ticket,
        crate::inbound::http::tickets::ticket_history,
        crate::inbound::http::reviews::list_approvals,
        crate::inbound::http::reviews::record_review,
        crate::inbound::http::canvass::stage_upload,
        crate::inbound::http::canvass::submit_canvass,
        crate::inbound::http::canvass::download_attachment,
        crate::inbound::http::canvass::sweep_uploads,
        crate::inbound::http::drafts::get_draft,
        crate::inbound::http::drafts::save_draft,
        crate::inbound::http::drafts::discard_draft,
        crate::inbound::http::comments::list_comments,
        crate::inbound::http::comments::post_comment,
        crate::inbound::http::comments::edit_comment,
        crate::inbound::http::comments::delete_comment,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::dashboard::dashboard,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::domain::dashboard::DashboardSummary,
        crate::domain::dashboard::StatusCount,
        crate::domain::ticket::TicketStatus,
        crate::domain::ticket::TicketAction,
        crate::domain::approval::ApprovalStatus,
        crate::domain::approval::ReviewDecision,
        crate::domain::canvass::AttachmentKind,
        crate::inbound::http::dto::UserResponse,
        crate::inbound::http::dto::TicketResponse,
        crate::inbound::http::dto::TicketPageResponse,
        crate::inbound::http::dto::TicketDetailResponse,
        crate::inbound::http::dto::ApprovalResponse,
        crate::inbound::http::dto::AttachmentResponse,
        crate::inbound::http::dto::CanvassFormResponse,
        crate::inbound::http::dto::HistoryEntryResponse,
        crate::inbound::http::dto::DraftResponse,
        crate::inbound::http::dto::CommentResponse,
        crate::inbound::http::dto::CommentPageResponse,
        crate::inbound::http::dto::NotificationResponse,
        crate::inbound::http::dto::NotificationFeedResponse,
        crate::inbound::http::users::LoginRequest,
        crate::inbound::http::tickets::CreateTicketRequest,
        crate::inbound::http::tickets::TicketActionRequest,
        crate::inbound::http::tickets::ShareRequest,
        crate::inbound::http::reviews::ReviewRequest,
        crate::inbound::http::reviews::ReviewReceiptResponse,
        crate::inbound::http::canvass::UploadResponse,
        crate::inbound::http::canvass::SubmitCanvassRequest,
        crate::inbound::http::canvass::SweepRequest,
        crate::inbound::http::canvass::SweepResponse,
        crate::inbound::http::drafts::SaveDraftRequest,
        crate::inbound::http::comments::PostCommentRequest,
        crate::inbound::http::comments::EditCommentRequest,
        crate::inbound::http::notifications::ReadAllResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Document generation coverage.
    use rstest::rstest;
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[rstest]
    fn the_document_contains_the_workflow_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/tickets"));
        assert!(
            paths
                .iter()
                .any(|p| p.as_str() == "/api/v1/tickets/{ticket_id}/review")
        );
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/notifications"));
    }

    #[rstest]
    fn the_document_serialises_to_json() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("serialise document");
        assert!(json.contains("Canvassing backend API"));
    }
}
