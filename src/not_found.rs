//! The 404 Not Found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
};

/// Marker type for rendering the 404 Not Found page as a response.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        let content = html! {
            main class=(PAGE_CONTAINER_STYLE)
            {
                h1 class="text-4xl font-bold mb-4" { "404" }

                p class="mb-4" { "The page you are looking for does not exist." }

                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Back to the dashboard" }
            }
        };

        (StatusCode::NOT_FOUND, base("Not Found", &[], &content)).into_response()
    }
}

/// The fallback route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
