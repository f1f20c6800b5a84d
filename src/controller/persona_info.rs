use std::sync::Arc;

use http::StatusCode;

use crate::{
    controller::{
        cors::{CorsPolicy, READ_METHODS},
        json_response, params, Context, ErrorDetail, Request, Response, Route,
    },
    error::{Error, ErrorBody},
    model::persona,
};

pub const ROUTE: Route = Route {
    name: "personas.info",
    cors: CorsPolicy::Fixed { methods: READ_METHODS },
    detail: ErrorDetail::Upstream,
};

pub async fn controller(req: Request, ctx: Arc<Context>) -> Result<Response, Error> {
    let persona_id = params::persona_id(&req, 0)?;

    let id = persona_id.raw.to_string();
    match ctx.query(move |exec| persona::find_by_id(exec, &id)).await? {
        Some(found) => json_response(StatusCode::OK, &found),
        None => Err(Error::NotFound(ErrorBody::new(
            "Not Found",
            format!("Persona with ID {} not found", persona_id.raw),
        ))),
    }
}
