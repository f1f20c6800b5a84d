use std::sync::Arc;

use crate::{
    controller::{cors::CorsPolicy, json_response, Context, ErrorDetail, Request, Response, Route},
    error::Error,
};
use http::StatusCode;
use serde::Serialize;

pub const ROUTE: Route = Route {
    name: "healthz",
    cors: CorsPolicy::Disabled,
    detail: ErrorDetail::Generic,
};

#[derive(Serialize)]
struct HealthzResponse {
    pub hello: String,
    pub build_at: String,
    pub commit_version: String,
}

pub async fn controller(_req: Request, _ctx: Arc<Context>) -> Result<Response, Error> {
    json_response(
        StatusCode::OK,
        &HealthzResponse {
            hello: "sim-feed api".to_string(),
            build_at: option_env!("SIM_FEED_BUILD_AT")
                .unwrap_or("UNKNOWN")
                .to_string(),
            commit_version: option_env!("SIM_FEED_CURRENT_COMMIT_ID")
                .unwrap_or("UNKNOWN")
                .to_string(),
        },
    )
}
