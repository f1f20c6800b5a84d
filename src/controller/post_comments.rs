use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::CorsPolicy, json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::{Error, ErrorBody},
    model::comment,
};

pub const ROUTE: Route = Route {
    name: "posts.comments",
    cors: CorsPolicy::Disabled,
    detail: ErrorDetail::Upstream,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let post_id = params::integer(params::path_param(&req, "post_id"), 0..=i64::MAX, || {
        ErrorBody::new("Bad Request", "Missing post_id parameter")
    })?;

    let id = post_id.raw.to_string();
    let comments = ctx
        .query(move |exec| comment::find_by_post(exec, &id))
        .await?;
    json_response(StatusCode::OK, &comments)
}
