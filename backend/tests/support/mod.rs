//! Shared helpers and port doubles for HTTP integration tests.
//!
//! Handler tests exercise the real routing, session middleware, extractors,
//! and error mapping, with the domain behind deterministic doubles.

pub mod doubles;

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use canvassing_backend::domain::user::{DisplayName, EmailAddress, Role, User, UserId};
use canvassing_backend::inbound::http::state::HttpState;
use canvassing_backend::inbound::http::test_utils::test_session_middleware;
use canvassing_backend::inbound::http::{
    canvass, comments, dashboard, drafts, notifications, reviews, tickets, users,
};

use self::doubles::{
    StubCanvassWorkflow, StubCommentWorkflow, StubDashboardQuery, StubDraftWorkflow,
    StubLoginService, StubNotificationFeed, StubReviewWorkflow, StubTicketWorkflow,
    StubUserRepository,
};

/// Password every stub account accepts.
pub const TEST_PASSWORD: &str = "hunter2";

/// Build a user profile for tests.
pub fn profile(email: &str, role: Role) -> User {
    User::new(
        UserId::random(),
        DisplayName::new("Test User").expect("valid name"),
        EmailAddress::new(email).expect("valid email"),
        role,
    )
}

/// Mutable bundle of doubles wired into the test app.
pub struct TestHarness {
    /// Accounts known to login and the directory.
    pub users: Vec<User>,
    /// Ticket workflow double.
    pub tickets: StubTicketWorkflow,
    /// Review workflow double.
    pub reviews: StubReviewWorkflow,
    /// Draft workflow double.
    pub drafts: StubDraftWorkflow,
    /// Comment workflow double.
    pub comments: StubCommentWorkflow,
    /// Canvass workflow double.
    pub canvass: StubCanvassWorkflow,
}

impl TestHarness {
    /// A harness with one purchaser account and permissive defaults.
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            tickets: StubTicketWorkflow::default(),
            reviews: StubReviewWorkflow::default(),
            drafts: StubDraftWorkflow::default(),
            comments: StubCommentWorkflow::default(),
            canvass: StubCanvassWorkflow::default(),
        }
    }

    fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(StubLoginService {
                users: self.users.clone(),
            }),
            users: Arc::new(StubUserRepository { users: self.users }),
            tickets: Arc::new(self.tickets),
            reviews: Arc::new(self.reviews),
            canvass: Arc::new(self.canvass),
            drafts: Arc::new(self.drafts),
            comments: Arc::new(self.comments),
            notifications: Arc::new(StubNotificationFeed::default()),
            dashboard: Arc::new(StubDashboardQuery::default()),
        }
    }
}

/// Build the full `/api/v1` test app over the harness doubles.
pub async fn test_app(
    harness: TestHarness,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let state = web::Data::new(harness.into_state());
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(users::login)
                    .service(users::logout)
                    .service(users::me)
                    .service(users::list_users)
                    .service(tickets::create_ticket)
                    .service(tickets::list_tickets)
                    .service(tickets::get_ticket)
                    .service(tickets::apply_ticket_action)
                    .service(tickets::share_ticket)
                    .service(tickets::ticket_history)
                    .service(reviews::list_approvals)
                    .service(reviews::record_review)
                    .service(canvass::stage_upload)
                    .service(canvass::submit_canvass)
                    .service(canvass::download_attachment)
                    .service(canvass::sweep_uploads)
                    .service(drafts::get_draft)
                    .service(drafts::save_draft)
                    .service(drafts::discard_draft)
                    .service(comments::list_comments)
                    .service(comments::post_comment)
                    .service(comments::edit_comment)
                    .service(comments::delete_comment)
                    .service(notifications::list_notifications)
                    .service(notifications::mark_read)
                    .service(notifications::mark_all_read)
                    .service(dashboard::dashboard),
            ),
    )
    .await
}

/// Log in as `user` and return the session cookie.
pub async fn login_as<S, B>(app: &S, user: &User) -> actix_web::cookie::Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(serde_json::json!({
                "email": user.email.as_ref(),
                "password": TEST_PASSWORD,
            }))
            .to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "login failed: {}",
        response.status()
    );
    response
        .response()
        .cookies()
        .next()
        .expect("session cookie present")
        .into_owned()
}
