//! Alert fragments for displaying success and error messages to users.

use maud::{Markup, html};

const ALERT_SUCCESS_STYLE: &str = "p-4 mb-4 text-sm rounded border \
    text-green-800 border-green-300 bg-green-50 dark:bg-gray-800 \
    dark:text-green-400 dark:border-green-800";

const ALERT_ERROR_STYLE: &str = "p-4 mb-4 text-sm rounded border \
    text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 \
    dark:text-red-400 dark:border-red-800";

/// An alert message to be rendered as an HTML fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Confirmation that an operation succeeded.
    Success {
        /// The headline of the alert.
        message: String,
        /// Supporting detail shown under the headline.
        details: String,
    },
    /// Notification that an operation failed.
    Error {
        /// The headline of the alert.
        message: String,
        /// Supporting detail shown under the headline.
        details: String,
    },
}

impl Alert {
    /// Render the alert as HTML.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (ALERT_SUCCESS_STYLE, message, details),
            Alert::Error { message, details } => (ALERT_ERROR_STYLE, message, details),
        };

        html! {
            div class=(style) role="alert"
            {
                span class="font-medium" { (message) }

                @if !details.is_empty() {
                    p { (details) }
                }
            }
        }
    }
}
