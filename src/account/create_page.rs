//! Defines the route handler for the page for creating an account.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    account::{Account, AccountKind},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
};

/// The shared form body for creating and editing an account.
///
/// `account` pre-fills the fields when editing; `submit_label` is the text on
/// the submit button. The caller wraps this in a form element with the
/// appropriate htmx attributes.
pub(super) fn account_form_fields(account: Option<&Account>, submit_label: &str) -> Markup {
    let name = account.map(|account| account.name.as_str()).unwrap_or("");
    let kind = account
        .map(|account| account.kind)
        .unwrap_or(AccountKind::Bank);
    let balance = account.map(|account| account.balance).unwrap_or(0.0);

    html!(
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                type="text"
                name="name"
                id="name"
                placeholder="e.g. Everyday Checking"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus
                value=(name);
        }

        fieldset
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for account_kind in AccountKind::ALL {
                    div class="flex items-center"
                    {
                        input
                            type="radio"
                            name="kind"
                            id=(account_kind.as_str())
                            value=(account_kind.as_str())
                            class=(FORM_RADIO_INPUT_STYLE)
                            checked[account_kind == kind];

                        label
                            for=(account_kind.as_str())
                            class=(FORM_RADIO_LABEL_STYLE)
                        {
                            (account_kind.label())
                        }
                    }
                }
            }
        }

        div
        {
            label for="balance" class=(FORM_LABEL_STYLE) { "Balance" }

            div class="input-wrapper w-full"
            {
                input
                    type="number"
                    name="balance"
                    id="balance"
                    step="0.01"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(balance);
            }
        }

        button type="submit" class=(BUTTON_PRIMARY_STYLE)
        {
            (submit_label)
        }
    )
}

/// Renders the page for creating an account.
pub async fn get_create_account_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "New Account" }

            form
                hx-post=(endpoints::ACCOUNTS_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                (account_form_fields(None, "Create Account"))
            }
        }
    );

    base("New Account", &[dollar_input_styles()], &content).into_response()
}
