//! Alert fragments for displaying success and error messages to users.
//!
//! Alerts render with an out-of-band swap targeting the `#alert-container`
//! element in the page shell, so htmx endpoints can show a message without
//! replacing the element that triggered the request.

use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertType {
    Success,
    Error,
}

/// Renders alert messages with appropriate styling
pub struct AlertTemplate<'a> {
    pub alert_type: AlertType,
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> AlertTemplate<'a> {
    /// Create a new success alert
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    pub fn into_markup(self) -> Markup {
        let (container_style, icon) = match self.alert_type {
            AlertType::Success => (
                "flex items-start gap-3 rounded border border-green-300 \
                bg-green-50 px-4 py-3 text-sm text-green-800 shadow \
                dark:border-green-800 dark:bg-gray-800 dark:text-green-400",
                "✓",
            ),
            AlertType::Error => (
                "flex items-start gap-3 rounded border border-red-300 \
                bg-red-50 px-4 py-3 text-sm text-red-800 shadow \
                dark:border-red-800 dark:bg-gray-800 dark:text-red-400",
                "✕",
            ),
        };

        html!(
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    span aria-hidden="true" { (icon) }

                    div
                    {
                        p class="font-medium" { (self.message) }

                        @if !self.details.is_empty() {
                            p { (self.details) }
                        }
                    }

                    button
                        type="button"
                        class="ml-auto font-bold"
                        aria-label="Dismiss"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        )
    }
}
