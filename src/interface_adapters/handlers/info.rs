use axum::extract::State;
use std::sync::Arc;

use crate::interface_adapters::api_errors::{ApiError, NOT_LOGGED_IN};
use crate::interface_adapters::caller::Caller;
use crate::interface_adapters::protocol::{
    AdministratorPayload, ApiResponse, ProductInfo, ServerInfo, ServerInfoResponse, SiteInfo,
};
use crate::interface_adapters::state::AppState;

const PRODUCT_NAME: &str = "Review Board";

// Handler describing the product and the site it is deployed at.
#[tracing::instrument(skip_all)]
pub async fn server_info(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<ApiResponse<ServerInfoResponse>, ApiError> {
    if caller.is_none() && !state.site.allow_anonymous {
        return Err(ApiError::new(NOT_LOGGED_IN));
    }

    let version = env!("CARGO_PKG_VERSION");
    let administrators = state
        .site
        .administrators
        .iter()
        .map(|admin| AdministratorPayload {
            name: admin.name.clone(),
            email: admin.email.clone(),
        })
        .collect();

    Ok(ApiResponse::ok(ServerInfoResponse {
        info: ServerInfo {
            product: ProductInfo {
                name: PRODUCT_NAME,
                version,
                package_version: version,
                is_release: !version.contains('-'),
            },
            site: SiteInfo {
                url: state.site.url.to_string(),
                administrators,
            },
        },
    }))
}
