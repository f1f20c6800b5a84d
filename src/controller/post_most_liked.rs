use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::CorsPolicy, json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::Error,
    model::post,
};

pub const ROUTE: Route = Route {
    name: "posts.most_liked",
    cors: CorsPolicy::Disabled,
    detail: ErrorDetail::Generic,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let limit = params::limit(&req)?;
    let limit = limit.raw.to_string();
    let posts = ctx
        .query(move |exec| post::find_most_liked(exec, &limit))
        .await?;
    json_response(StatusCode::OK, &posts)
}
