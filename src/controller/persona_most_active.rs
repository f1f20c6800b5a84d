use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::CorsPolicy, json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::Error,
    model::persona,
};

pub const ROUTE: Route = Route {
    name: "personas.most_active",
    cors: CorsPolicy::Disabled,
    detail: ErrorDetail::Generic,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let limit = params::limit(&req)?;
    let limit = limit.value;
    let agents = ctx
        .query(move |exec| persona::find_most_active(exec, limit))
        .await?;
    json_response(StatusCode::OK, &agents)
}
