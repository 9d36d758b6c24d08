//! HTTP server: tokio + hyper HTTP/1. Each request is collected, handed to `App::handle`,
//! and the buffered `Response` is written back. Stops on ctrl-c.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::app::App;
use crate::config::ServerConfig;
use crate::response::{ErrorPayload, Response};
use crate::CoreError;

/// Bind `config.addr()` and serve `app` until ctrl-c. Blocks on its own runtime.
pub fn run(app: App, config: &ServerConfig) -> Result<(), CoreError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        let listener = TcpListener::bind(config.addr()).await?;
        serve(listener, Arc::new(app), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    })
}

/// Accept loop on an already bound listener; returns when `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, app: Arc<App>, shutdown: F) -> Result<(), CoreError>
where
    F: Future<Output = ()>,
{
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!(addr = %local, "listening");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let app = Arc::clone(&app);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let app = Arc::clone(&app);
                        async move { Ok::<_, Infallible>(handle_hyper(&app, req).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::warn!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

async fn handle_hyper(app: &App, req: Request<hyper::body::Incoming>) -> http::Response<Full<Bytes>> {
    let method = req.method().to_string();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| "/".to_owned());
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or("").to_owned()))
        .collect();
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read request body");
            let mut res = Response::new();
            ErrorPayload::new(400, format!("failed to read request body: {e}")).write_to(&mut res);
            return res.into_hyper_response();
        }
    };
    let res = app.handle(&method, &target, &headers, &body);
    tracing::debug!(%method, %target, status = res.status_code, "handled");
    res.into_hyper_response()
}
