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
    name: "posts.pages_with_comments",
    cors: CorsPolicy::Disabled,
    detail: ErrorDetail::Upstream,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let offset = params::page_offset_of(&req)?;
    let posts = ctx
        .query(move |exec| post::find_page_with_comments(exec, offset))
        .await?;
    json_response(StatusCode::OK, &posts)
}
