//! The 500 Internal Server Error page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
};

/// Renders the internal server error page with a short description of what
/// went wrong and how the user might fix it.
pub struct InternalServerError<'a> {
    /// A short description of the error.
    pub description: &'a str,
    /// A suggestion for how to resolve the error.
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Something went wrong",
            fix: "An unexpected error occurred. Try again, and check the server \
            logs if the problem persists.",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let content = html! {
            main class=(PAGE_CONTAINER_STYLE)
            {
                h1 class="text-4xl font-bold mb-4" { "500" }

                h2 class="text-xl font-semibold mb-2" { (self.description) }

                p class="mb-4" { (self.fix) }

                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Back to the dashboard" }
            }
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            base("Error", &[], &content),
        )
            .into_response()
    }
}
