use std::convert::Infallible;
use std::fmt::Debug;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use opentelemetry::trace::TraceContextExt;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::pin;
use tracing::{debug, error, info, instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::command::server::error::Error;
use crate::command::server::route::Route;
use crate::command::server::{router, ServerContext};
use crate::metrics_provider::{IN_FLIGHT_REQUESTS, METRICS_PROVIDER};

const GREETING: &str = "Hello World";

fn update_in_flight_gauge() {
    METRICS_PROVIDER.metric_http_request_in_flight.set(
        i64::try_from(IN_FLIGHT_REQUESTS.load(Ordering::Relaxed)).unwrap_or(i64::MAX),
    );
}

pub async fn serve_request<S>(
    stream: TokioIo<S>,
    context: Arc<ServerContext>,
    timeouts: Arc<[Duration; 2]>,
) where
    S: Unpin + AsyncWrite + AsyncRead + Send + Debug + 'static,
{
    let conn = http1::Builder::new().serve_connection(
        stream,
        service_fn(move |request| handle_request(Arc::clone(&context), request)),
    );
    pin!(conn);

    IN_FLIGHT_REQUESTS.fetch_add(1, Ordering::Relaxed);
    update_in_flight_gauge();

    for (iter, sleep_duration) in timeouts.iter().enumerate() {
        debug!("iter = {iter} sleep_duration = {sleep_duration:?}");
        tokio::select! {
            res = conn.as_mut() => {
                match res {
                    Ok(()) => debug!("after polling conn, no error"),
                    Err(error) =>  debug!("error serving connection: {error}"),
                }
                break;
            }
            () = tokio::time::sleep(*sleep_duration) => {
                // first deadline asks the connection to close, second one drops it
                debug!("iter = {iter} got timeout_interval, calling conn.graceful_shutdown");
                conn.as_mut().graceful_shutdown();
            }
        }
    }

    IN_FLIGHT_REQUESTS.fetch_sub(1, Ordering::Relaxed);
    update_in_flight_gauge();
}

#[instrument(skip(context, request))]
async fn handle_request(
    context: Arc<ServerContext>,
    request: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start_time = Instant::now();
    let (parts, _incoming) = request.into_parts();
    let route = router::parse(&parts.method, &parts.uri);
    let route_action = route.action_name();

    let trace_id = {
        let context = Span::current().context();
        let span = context.span();
        let span_context = span.span_context();
        if span_context.is_valid() {
            Some(span_context.trace_id().to_string())
        } else {
            None
        }
    };

    let response = respond(&context, route, &parts, trace_id.as_ref()).await;
    let (method, path) = (&parts.method, parts.uri.path());

    #[allow(clippy::cast_precision_loss)]
    let elapsed = start_time.elapsed().as_millis() as f64;
    let status = response.status();

    METRICS_PROVIDER
        .metric_http_request_total
        .with_label_values(&[method.as_str(), route_action, status.as_str()])
        .inc();
    METRICS_PROVIDER
        .metric_http_request_duration
        .with_label_values(&[method.as_str(), route_action])
        .observe(elapsed);

    let log = if let Some(trace_id) = trace_id {
        format!("{trace_id} {elapsed:?} - {status} {method} {path}")
    } else {
        format!("{elapsed:?} - {status} {method} {path}")
    };

    if status.is_server_error() {
        error!("{log}");
    } else {
        info!("{log}");
    }

    Ok(response)
}

async fn respond(
    context: &ServerContext,
    route: Route<'_>,
    parts: &Parts,
    request_id: Option<&String>,
) -> Response<Full<Bytes>> {
    let response = match dispatch_route(context, route, parts).await {
        Ok(response) => response,
        Err(error) => error_to_response(&error, request_id),
    };

    if parts.method == Method::HEAD {
        without_body(response)
    } else {
        response
    }
}

// HEAD answers carry the headers of the equivalent GET, including its length
fn without_body(response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let length = response.body().size_hint().exact();
    let (mut parts, _) = response.into_parts();

    if let Some(length) = length {
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }

    Response::from_parts(parts, Full::new(Bytes::new()))
}

#[instrument(skip(context, parts))]
async fn dispatch_route(
    context: &ServerContext,
    route: Route<'_>,
    parts: &Parts,
) -> Result<Response<Full<Bytes>>, Error> {
    match route {
        Route::Unknown => handle_unknown_route(parts),
        Route::Greeting => handle_greeting(),
        Route::ListCharacters => handle_list_characters(context).await,
        Route::GetCharacter { id } => handle_get_character(context, id).await,
        Route::Healthz => handle_healthz(),
        Route::Metrics => handle_metrics(),
    }
}

fn handle_unknown_route(parts: &Parts) -> Result<Response<Full<Bytes>>, Error> {
    if [Method::GET, Method::HEAD].contains(&parts.method) {
        let msg = format!("unknown route: {} {}", parts.method, parts.uri);
        Err(Error::NotFound(msg))
    } else {
        let msg = format!("unsupported route: {} {}", parts.method, parts.uri);
        Err(Error::BadRequest(msg))
    }
}

fn handle_greeting() -> Result<Response<Full<Bytes>>, Error> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from_static(GREETING.as_bytes())))
        .map_err(|e| Error::Internal(format!("Failed to build greeting response: {e}")))
}

async fn handle_list_characters(context: &ServerContext) -> Result<Response<Full<Bytes>>, Error> {
    let characters = context.store.list_characters().await?;
    json_response(&characters)
}

async fn handle_get_character(
    context: &ServerContext,
    id: &str,
) -> Result<Response<Full<Bytes>>, Error> {
    let character = context.store.get_character(id).await?;
    json_response(&character)
}

fn json_response(value: &Value) -> Result<Response<Full<Bytes>>, Error> {
    let body = serde_json::to_vec(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize response: {e}")))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| Error::Internal(format!("Failed to build response: {e}")))
}

fn handle_healthz() -> Result<Response<Full<Bytes>>, Error> {
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(r#"{"status":"ok"}"#)));

    match response {
        Ok(resp) => Ok(resp),
        Err(e) => {
            let msg = format!("Failed to build healthz response: {e}");
            Err(Error::Internal(msg))
        }
    }
}

fn handle_metrics() -> Result<Response<Full<Bytes>>, Error> {
    let (content_type, metrics) = METRICS_PROVIDER.gather()?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(metrics)));

    match response {
        Ok(resp) => Ok(resp),
        Err(e) => {
            let msg = format!("Failed to build metrics response: {e}");
            Err(Error::Internal(msg))
        }
    }
}

pub fn error_to_response(error: &Error, request_id: Option<&String>) -> Response<Full<Bytes>> {
    let content_type = HeaderValue::from_str(error.content_type())
        .unwrap_or_else(|_| HeaderValue::from_static("application/json"));

    let mut response = Response::new(Full::new(error.body(request_id)));
    *response.status_mut() = error.status_code();
    response.headers_mut().insert(CONTENT_TYPE, content_type);

    response
}
