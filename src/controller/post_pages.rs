use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::{CorsPolicy, READ_METHODS},
        json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::Error,
    model::post,
};

pub const ROUTE: Route = Route {
    name: "posts.pages",
    cors: CorsPolicy::Fixed { methods: READ_METHODS },
    detail: ErrorDetail::Upstream,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let offset = params::page_offset_of(&req)?;
    let posts = ctx.query(move |exec| post::find_page(exec, offset)).await?;
    json_response(StatusCode::OK, &posts)
}
