//! Local HTTP server running the same handlers as the Lambda entrypoint.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Server,
};
use log::{error, info};

use crate::{
    controller::{dispatch, fatal_response, Context, Request, Response},
    error::Error,
};

async fn into_request(req: hyper::Request<Body>) -> Result<Request, Error> {
    let (parts, body) = req.into_parts();
    let bytes = hyper::body::to_bytes(body).await?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&bytes).into_owned())
    };
    Ok(http::Request::from_parts(parts, body))
}

fn into_response(resp: Response) -> hyper::Response<Body> {
    let (parts, body) = resp.into_parts();
    hyper::Response::from_parts(parts, Body::from(body))
}

/// Serve one request. Fatal errors become a plain 500 here since there is no
/// runtime in front of us to report them.
pub async fn handle(
    req: hyper::Request<Body>,
    ctx: Arc<Context>,
) -> Result<hyper::Response<Body>, Infallible> {
    let resp = match into_request(req).await {
        Ok(req) => dispatch(req, ctx).await,
        Err(err) => Err(err),
    };
    Ok(into_response(resp.unwrap_or_else(|err| {
        error!("{}", err);
        fatal_response()
    })))
}

pub async fn serve(addr: SocketAddr, ctx: Arc<Context>) -> Result<(), Error> {
    let make_svc = make_service_fn(move |_conn| {
        let ctx = ctx.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| handle(req, ctx.clone()))) }
    });

    info!("Listening on http://{}", addr);
    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}
