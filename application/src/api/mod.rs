//! HTTP API definitions.

pub mod announcement;
pub mod booking;
pub mod user;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::define_error;

/// Builds the [`Router`] serving the whole HTTP API.
///
/// [`Service`] is expected to be provided as an [`Extension`] layer.
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    Router::new()
        .route("/registration/", post(user::register))
        .route("/login/", post(user::login))
        .route("/user-detail/", get(user::detail))
        .route(
            "/announcement/",
            get(announcement::list).post(announcement::create),
        )
        .route(
            "/announcement/:id/",
            get(announcement::retrieve).patch(announcement::update_activity),
        )
        .route("/booking/", get(booking::list).post(booking::create))
        .route("/booking/history/", get(booking::history))
        .route(
            "/booking/:id/",
            get(booking::retrieve)
                .put(booking::update)
                .patch(booking::update)
                .delete(booking::delete),
        )
        .route("/booking/approve/:id/", patch(booking::approve))
        .route("/booking/canceled/:id/", patch(booking::cancel))
}

define_error! {
    enum PaginationError {
        #[code = "INVALID_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "`first` must be in 1..=100 range"]
        InvalidFirst,
    }
}

/// Default number of items on a page.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// A page of a cursor-paginated list.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PageView<C, T> {
    /// Items on this page.
    pub results: Vec<T>,

    /// Cursor to request the next page with, if any.
    pub next_cursor: Option<C>,

    /// Indicator whether more items follow this page.
    pub has_more: bool,
}

impl<C: Clone, N, T: From<N>> From<common::pagination::Connection<C, N>>
    for PageView<C, T>
{
    fn from(page: common::pagination::Connection<C, N>) -> Self {
        let info = page.page_info();
        Self {
            results: page.edges.into_iter().map(|e| e.node.into()).collect(),
            next_cursor: info.has_next_page.then_some(info.end_cursor).flatten(),
            has_more: info.has_next_page,
        }
    }
}

/// Builds pagination [`Arguments`] out of the raw `first` and `after` query
/// parameters.
///
/// # Errors
///
/// With a [`PaginationError`] if `first` is out of range.
///
/// [`Arguments`]: common::pagination::Arguments
fn arguments<C>(
    first: Option<u32>,
    after: Option<C>,
) -> Result<common::pagination::Arguments<C>, PaginationError> {
    common::pagination::Arguments::new(first, after, DEFAULT_PAGE_SIZE)
        .ok_or(PaginationError::InvalidFirst)
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use axum::{body, Extension, Router};
    use service::infra::Postgres;
    use tower::ServiceExt as _;

    use crate::Service;

    /// [`Router`] backed by a lazily connected [`Postgres`], so only requests
    /// rejected before touching the database may be sent.
    fn app() -> Router {
        let postgres =
            Postgres::new(&crate::config::Postgres::default().into()).unwrap();
        let service = Service::new(
            service::Config::new(b"secret", Duration::from_secs(60)),
            postgres,
        );
        super::router().layer(Extension(service))
    }

    async fn send(
        req: http::Request<body::Body>,
    ) -> (http::StatusCode, serde_json::Value) {
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> http::request::Builder {
        http::Request::get(uri)
    }

    #[tokio::test]
    async fn requires_authorization() {
        let (status, body) = send(
            get("/user-detail/").body(body::Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTHORIZATION_REQUIRED");
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let (status, body) = send(
            get("/booking/")
                .header(http::header::AUTHORIZATION, "Bearer not.a.jwt")
                .body(body::Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let (status, body) = send(
            http::Request::post("/registration/")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body::Body::from("{\"username\":"))
                .unwrap(),
        )
        .await;

        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn rejects_invalid_registration_before_storing() {
        let (status, body) = send(
            http::Request::post("/registration/")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body::Body::from(
                    r#"{
                        "username": "anna",
                        "name": "Anna",
                        "surname": "Schmidt",
                        "email": "not-an-email",
                        "password": "secret123",
                        "re_password": "secret123"
                    }"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_EMAIL");
    }

    #[tokio::test]
    async fn rejects_invalid_pagination() {
        let (status, body) = send(
            get("/announcement/?first=0")
                .body(body::Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_PAGINATION_ARGUMENTS");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (status, body) = send(
            get("/announcement/not-a-uuid/")
                .body(body::Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, http::StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
