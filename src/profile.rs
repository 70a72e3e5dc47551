//! The profile page for viewing the signed-in user's details and changing
//! their display name.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    auth::{UserID, get_user_by_id, update_user_name},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    shared_templates::render,
};

/// The state needed for the profile page and its update endpoint.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the profile page.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;

    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Profile" }

            form
                hx-put=(endpoints::PROFILE_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                div
                {
                    label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                    input
                        type="email"
                        id="email"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=(user.email)
                        disabled;
                }

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        type="text"
                        name="name"
                        id="name"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required
                        value=(user.name);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Save Changes"
                }
            }
        }
    );

    Ok(base("Profile", &[], &content).into_response())
}

/// The form data for updating the user's details.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    /// The new display name.
    pub name: String,
}

/// A route handler for updating the signed-in user's display name, responds
/// with an alert.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return render(
            StatusCode::BAD_REQUEST,
            AlertTemplate::error("Invalid name", "Enter a name.").into_markup(),
        );
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_user_name(user_id, name, &connection) {
        Ok(rows_affected) if rows_affected != 0 => render(
            StatusCode::OK,
            AlertTemplate::success("Profile updated", "").into_markup(),
        ),
        Ok(_) => Error::NotFound.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not update user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
