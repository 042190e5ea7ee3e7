//! A minimal hyper server wired up to a [`Receiver`].
//!
//! This is a convenience for embedders that don't already run their own
//! HTTP stack; anyone with an existing server can call
//! [`Receiver::receive`] directly instead.

use crate::{Receiver, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use corvid_model::application::{Interaction, InteractionResponse};
use hyper::{
    body::to_bytes,
    header::CONTENT_TYPE,
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc};
use tracing::warn;

/// Runs a webhook server on `addr` until the process is stopped, answering
/// every request with `handler`'s response once signature verification
/// succeeds.
pub async fn serve<F, Fut>(
    addr: SocketAddr,
    receiver: Arc<Receiver>,
    handler: F,
) -> hyper::Result<()>
where
    F: Fn(Interaction) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = InteractionResponse> + Send,
{
    let make_service = make_service_fn(move |_conn| {
        let receiver = Arc::clone(&receiver);
        let handler = handler.clone();

        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let receiver = Arc::clone(&receiver);
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(respond(req, &receiver, handler).await) }
            }))
        }
    });

    Server::bind(&addr).serve(make_service).await
}

async fn respond<F, Fut>(req: Request<Body>, receiver: &Receiver, handler: F) -> Response<Body>
where
    F: Fn(Interaction) -> Fut,
    Fut: Future<Output = InteractionResponse>,
{
    if req.method() != Method::POST {
        return status(StatusCode::METHOD_NOT_ALLOWED);
    }

    let (timestamp, signature) = match headers(&req) {
        Some(pair) => pair,
        None => return status(StatusCode::BAD_REQUEST),
    };

    let body = match to_bytes(req.into_body()).await {
        Ok(body) => body,
        Err(err) => {
            warn!(%err, "failed to read webhook request body");
            return status(StatusCode::BAD_REQUEST);
        }
    };

    match receiver.verify(&timestamp, &signature, &body) {
        Ok(()) => {}
        Err(err) => {
            warn!(%err, "interaction webhook signature rejected");
            return status(StatusCode::UNAUTHORIZED);
        }
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(err) => {
            warn!(%err, "interaction webhook body did not decode");
            return status(StatusCode::BAD_REQUEST);
        }
    };

    let response = if matches!(
        interaction.kind,
        corvid_model::application::InteractionType::Ping
    ) {
        InteractionResponse::Pong
    } else {
        handler(interaction).await
    };

    match serde_json::to_vec(&response) {
        Ok(json) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json))
            .unwrap_or_else(|_| status(StatusCode::INTERNAL_SERVER_ERROR)),
        Err(err) => {
            warn!(%err, "failed to serialize interaction response");
            status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn headers(req: &Request<Body>) -> Option<(String, String)> {
    let timestamp = req.headers().get(TIMESTAMP_HEADER)?.to_str().ok()?.to_owned();
    let signature = req.headers().get(SIGNATURE_HEADER)?.to_str().ok()?.to_owned();
    Some((timestamp, signature))
}

fn status(code: StatusCode) -> Response<Body> {
    Response::builder()
        .status(code)
        .body(Body::empty())
        .unwrap_or_default()
}
