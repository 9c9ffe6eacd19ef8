//! SP-initiated login flow: the IdP redirect and the response consumer.

use crate::error::{AuthError, SpResult};
use crate::models::{LoginQuery, LoginResponseForm};
use crate::router::SpState;
use crate::saml::{assertions, relay, ValidationPolicy};
use crate::session::{SamlSession, Session, SessionContext};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

/// Request phase: build an authentication request, park it in a fresh
/// session, and redirect the browser to the IdP.
#[utoipa::path(
    get,
    path = "/saml/login",
    params(LoginQuery),
    responses(
        (status = 302, description = "Redirect to the IdP with SAMLRequest and RelayState"),
    ),
    tag = "SAML"
)]
pub async fn login_redirect(
    State(state): State<SpState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> SpResult<Response> {
    let relay_target = state.config.relay_or_default(query.relay_state.as_deref());
    let request = state.toolkit.build_request(&state.config)?;

    let key = Uuid::new_v4().to_string();
    let session = Session {
        saml: Some(SamlSession {
            request: Some(request.xml.clone()),
            relay_state: Some(relay_target.clone()),
            ..Default::default()
        }),
        ..Default::default()
    };
    state
        .sessions
        .put(&key, session, state.config.session_ttl())
        .await?;

    let jar = jar.add(session_cookie(&state, key.clone()));

    let separator = if state.config.idp_sso_url.contains('?') {
        '&'
    } else {
        '?'
    };
    let location = format!(
        "{}{}SAMLRequest={}&RelayState={}",
        state.config.idp_sso_url,
        separator,
        relay::query_escape(&request.encoded),
        relay::encode(&relay_target),
    );

    tracing::info!(
        request_id = %request.id,
        relay_state = %relay_target,
        "SAML authentication request issued"
    );

    Ok((
        jar,
        (StatusCode::FOUND, [(header::LOCATION, location)]),
    )
        .into_response())
}

/// Response phase: decode and validate the IdP response, merge the
/// normalized assertions into the session, then continue to consent or to
/// the relay target.
#[utoipa::path(
    post,
    path = "/saml/login",
    request_body = LoginResponseForm,
    responses(
        (status = 303, description = "Redirect to consent or the relay target"),
        (status = 400, description = "Malformed response payload"),
        (status = 403, description = "Response failed validation"),
    ),
    tag = "SAML"
)]
pub async fn login_response(
    State(state): State<SpState>,
    Extension(ctx): Extension<SessionContext>,
    jar: CookieJar,
    Form(form): Form<LoginResponseForm>,
) -> SpResult<Response> {
    let decoded = STANDARD
        .decode(form.saml_response.as_bytes())
        .map_err(|e| AuthError::MalformedResponse(format!("base64 decode failed: {e}")))?;
    let response_xml = String::from_utf8(decoded)
        .map_err(|e| AuthError::MalformedResponse(format!("invalid UTF-8: {e}")))?;

    let policy = ValidationPolicy {
        audience: state.config.entity_id.clone(),
        acs_url: state.config.acs_url.clone(),
        idp_certificate: state.config.idp_certificate.clone(),
        sp_private_key: state.config.sp_private_key.clone(),
    };
    let response = state.toolkit.validate(&response_xml, &policy)?;
    let assertion_set = assertions::normalize(&state.toolkit.extract_assertions(&response));

    // Resume the pending session when the cookie resolved; an unsolicited
    // (IdP-initiated) response gets a fresh one.
    let (key, mut session) = match (ctx.key, ctx.session) {
        (Some(key), Some(session)) => (key, session),
        _ => (Uuid::new_v4().to_string(), Session::default()),
    };

    let saml = session.saml.get_or_insert_with(SamlSession::default);
    saml.response = Some(response.xml);
    saml.assertions = Some(assertion_set);

    // Posted RelayState (a token round-tripped through the IdP) wins over
    // the target stored at request time.
    let relay_target = match form.relay_state.as_deref().filter(|s| !s.is_empty()) {
        Some(token) => relay::decode(token)?,
        None => saml
            .relay_state
            .clone()
            .unwrap_or_else(|| state.config.relay_or_default(None)),
    };
    let relay_target = relay::safe_target(&relay_target)?.to_string();

    state
        .sessions
        .put(&key, session, state.config.session_ttl())
        .await?;

    tracing::info!(
        in_response_to = ?response.in_response_to,
        relay_state = %relay_target,
        "SAML response accepted, session established"
    );

    let needs_consent =
        state.config.consent.is_some() && !stay_signed_in_marker(&jar, &state);
    let jar = jar.add(session_cookie(&state, key));

    // 303: the browser must follow with a GET.
    let location = if needs_consent {
        format!(
            "{}?RelayState={}",
            state.config.consent_path(),
            relay::encode(&relay_target)
        )
    } else {
        relay_target
    };

    Ok((jar, Redirect::to(&location)).into_response())
}

/// Whether the visitor's consent cookie carries an affirmative
/// "stay signed in" choice, which skips the consent interposition.
fn stay_signed_in_marker(jar: &CookieJar, state: &SpState) -> bool {
    jar.get(&state.config.consent_cookie)
        .map(|cookie| crate::models::decode_consent_cookie(cookie.value()))
        .and_then(|stored| stored.get("stay_signed_in").cloned())
        .is_some_and(|v| crate::models::is_affirmative(&v))
}

/// The session cookie: long-lived absolute lifetime, independent of the
/// server-side sliding TTL.
fn session_cookie(state: &SpState, key: String) -> Cookie<'static> {
    Cookie::build((state.config.session_cookie.clone(), key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(state.config.cookie_max_age_days))
        .build()
}
