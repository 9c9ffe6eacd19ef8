//! Consent state machine.
//!
//! Three states keyed entirely by query parameters; the only persistence is
//! the client-side consent cookie:
//!
//! - **Initial** — no form parameters, `RelayState` present: render the form
//!   pre-filled from the cookie (or configured defaults).
//! - **Redirect** — form parameters together with `RelayState`: persist the
//!   choices into the cookie and continue to the relay target.
//! - **Edit** — no `RelayState` (direct navigation): render the form,
//!   submitting back to the referring page.

use crate::error::SpResult;
use crate::models::{
    decode_consent_cookie, encode_consent_cookie, is_affirmative, render_consent_form,
    ConsentState,
};
use crate::router::SpState;
use crate::saml::relay;
use axum::{
    extract::{Query, State},
    http::header::REFERER,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::BTreeMap;

#[utoipa::path(
    get,
    path = "/saml/consent",
    responses(
        (status = 200, description = "Consent form"),
        (status = 303, description = "Choices stored, redirecting to relay target"),
    ),
    tag = "SAML"
)]
pub async fn consent(
    State(state): State<SpState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> SpResult<Response> {
    let consent_config = state.config.consent.clone().unwrap_or_default();

    let mut submitted = params;
    let relay_token = submitted.remove("RelayState");

    let stored = jar
        .get(&state.config.consent_cookie)
        .map(|cookie| decode_consent_cookie(cookie.value()))
        .unwrap_or_default();

    match (submitted.is_empty(), relay_token) {
        // Redirect: persist the submitted choices, then continue.
        (false, Some(token)) => {
            let target = relay::decode(&token)?;
            let target = relay::safe_target(&target)?.to_string();

            let stay_signed_in = submitted
                .get("stay_signed_in")
                .is_some_and(|v| is_affirmative(v));

            let mut cookie = Cookie::build((
                state.config.consent_cookie.clone(),
                encode_consent_cookie(&submitted),
            ))
            .path("/")
            .same_site(SameSite::Lax);
            if stay_signed_in {
                cookie =
                    cookie.max_age(time::Duration::days(consent_config.cookie_max_age_days));
            }

            tracing::info!(stay_signed_in, "Consent choices stored");
            Ok((jar.add(cookie.build()), Redirect::to(&target)).into_response())
        }
        // Initial: fresh form carrying the relay token forward.
        (true, Some(token)) => {
            let mut form_state = ConsentState::from_config(&consent_config);
            form_state.merge_cookie(&stored);
            let action = state.config.consent_path();
            Ok(Html(render_consent_form(&form_state, &action, Some(&token))).into_response())
        }
        // Edit: direct navigation, submit back to the referring page.
        (_, None) => {
            let mut form_state = ConsentState::from_config(&consent_config);
            form_state.merge_cookie(&stored);
            let action = headers
                .get(REFERER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(&state.config.consent_path())
                .to_string();
            Ok(Html(render_consent_form(&form_state, &action, None)).into_response())
        }
    }
}
