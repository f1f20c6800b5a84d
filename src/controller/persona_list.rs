use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::{CorsPolicy, READ_METHODS},
        json_response, Context, ErrorDetail, Request, Response, Route,
    },
    error::Error,
    model::persona,
};

pub const ROUTE: Route = Route {
    name: "personas.list",
    cors: CorsPolicy::Fixed { methods: READ_METHODS },
    detail: ErrorDetail::Generic,
};

pub async fn controller(_req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let personas = ctx.query(persona::find_all).await?;
    json_response(StatusCode::OK, &personas)
}
