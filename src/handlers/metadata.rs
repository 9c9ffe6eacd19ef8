//! SP metadata endpoint.

use crate::error::SpResult;
use crate::router::SpState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Return SP metadata XML rendered by the toolkit.
#[utoipa::path(
    get,
    path = "/saml/meta",
    responses(
        (status = 200, description = "SP metadata XML"),
        (status = 500, description = "Metadata rendering failed"),
    ),
    tag = "SAML"
)]
pub async fn metadata(State(state): State<SpState>) -> SpResult<Response> {
    let xml = state.toolkit.render_metadata(&state.config)?;
    tracing::debug!("SP metadata requested");
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        xml,
    )
        .into_response())
}
