// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cache::{CachedFile, DownloadCache};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::listing::render_folder;
use crate::path::RequestPath;
use crate::resolver::PathResolver;
use crate::upload::UploadCoordinator;
use anyhow::Context;
use bytes::Bytes;
use diagnostics::*;
use futures::TryStreamExt;
use remotefs::Session;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use warp::Filter;
use warp::http::{HeaderValue, StatusCode, header};
use warp::hyper::Body;
use warp::path::FullPath;
use warp::reply::Response;

/// What a GET resolves to
#[derive(Debug)]
pub enum GetOutcome {
    Listing(String),
    File(CachedFile),
}

/// The request-level operations, independent of HTTP
#[derive(Debug, Clone)]
pub struct Gateway {
    resolver: PathResolver,
    cache: DownloadCache,
    uploader: UploadCoordinator,
}

impl Gateway {
    pub fn new<P: Into<PathBuf>>(
        session: Session,
        cache_root: P,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        let resolver = PathResolver::new(session.clone(), cache_root);
        Self {
            cache: DownloadCache::new(session, poll_interval, max_wait),
            uploader: UploadCoordinator::new(resolver.clone()),
            resolver,
        }
    }

    #[must_use]
    pub fn from_config(session: Session, config: &GatewayConfig) -> Self {
        Self::new(
            session,
            config.cache_dir.clone(),
            config.poll_interval,
            config.max_wait,
        )
    }

    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    #[must_use]
    pub fn cache(&self) -> &DownloadCache {
        &self.cache
    }

    /// A folder yields its listing; a file yields its cached copy
    pub async fn get(&self, path: &RequestPath) -> Result<GetOutcome> {
        let node = self.resolver.resolve(path).await?;
        if node.is_folder() {
            let html = render_folder(self.resolver.session(), &node, path).await?;
            return Ok(GetOutcome::Listing(html));
        }
        let cache_path = self.resolver.cache_path(path);
        let cached = self.cache.fetch(&node, &cache_path, path.as_str()).await?;
        Ok(GetOutcome::File(cached))
    }

    pub async fn put(&self, path: &RequestPath, body: &[u8]) -> Result<()> {
        let _ = self.uploader.store(path, body).await?;
        Ok(())
    }
}

/// The complete HTTP surface: GET, PUT, and 405 for everything else.
///
/// The 405 fallback matches anything, so the combined filter never rejects.
pub fn routes(
    gateway: Gateway,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let with_gateway = warp::any().map(move || gateway.clone());

    let get = warp::get()
        .and(warp::path::full())
        .and(with_gateway.clone())
        .and_then(handle_get);

    let put = warp::put()
        .and(warp::path::full())
        .and(warp::body::bytes())
        .and(with_gateway)
        .and_then(handle_put);

    let other = warp::any().map(|| empty(StatusCode::METHOD_NOT_ALLOWED));

    get.or(put)
        .unify()
        .or(other)
        .unify()
        .with(warp::log::custom(log_request))
}

async fn handle_get(full: FullPath, gateway: Gateway) -> std::result::Result<Response, Infallible> {
    let path = match RequestPath::parse(full.as_str()) {
        Ok(path) => path,
        Err(e) => return Ok(error_response(&e)),
    };
    Ok(match gateway.get(&path).await {
        Ok(GetOutcome::Listing(html)) => html_response(html),
        Ok(GetOutcome::File(cached)) => file_response(cached),
        Err(e) => error_response(&e),
    })
}

async fn handle_put(
    full: FullPath,
    body: Bytes,
    gateway: Gateway,
) -> std::result::Result<Response, Infallible> {
    let path = match RequestPath::parse(full.as_str()) {
        Ok(path) => path,
        Err(e) => return Ok(error_response(&e)),
    };
    Ok(match gateway.put(&path, &body).await {
        Ok(()) => empty(StatusCode::OK),
        Err(e) => error_response(&e),
    })
}

fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn html_response(html: String) -> Response {
    let mut response = Response::new(Body::from(html));
    let _ = response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn file_response(cached: CachedFile) -> Response {
    let CachedFile { file, len, path } = cached;
    let label = path.display().to_string();
    // The cache entry is already complete; a failed send only affects this client.
    let stream = ReaderStream::new(file).inspect_err(move |e| {
        let err = e.to_string();
        warn!("streaming {label} failed: {reason}", label: label, reason: err);
    });

    let mut response = Response::new(Body::wrap_stream(stream));
    let headers = response.headers_mut();
    let _ = headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let _ = headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

fn error_response(err: &GatewayError) -> Response {
    let status = err.status();
    let message = err.to_string();
    match err {
        GatewayError::NotFound(_) => debug!("{message}", message: message),
        GatewayError::InvalidPath(_) | GatewayError::DownloadTimeout { .. } => {
            warn!("{message}", message: message)
        }
        _ => error!("{message}", message: message),
    }

    let body = if status.is_client_error() {
        format!("{}\n", message)
    } else {
        format!("{}\n", status.canonical_reason().unwrap_or("Error"))
    };
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let _ = response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn log_request(req: warp::log::Info<'_>) {
    let method = req.method().to_string();
    let path = req.path().to_string();
    let status = req.status().as_u16();
    let elapsed_ms = u64::try_from(req.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        "{method} {target_path} {status} {elapsed_ms}ms",
        method: method,
        target_path: path,
        status: status,
        elapsed_ms: elapsed_ms
    );
}

/// Binds the gateway and returns the bound address with the server future.
///
/// The future completes once `shutdown` resolves and in-flight requests end.
pub fn bind<S>(
    gateway: Gateway,
    addr: SocketAddr,
    shutdown: S,
) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)>
where
    S: Future<Output = ()> + Send + 'static,
{
    warp::serve(routes(gateway))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .with_context(|| format!("Failed to bind {}", addr))
}

/// Serves until Ctrl-C
pub async fn serve(gateway: Gateway, addr: SocketAddr) -> anyhow::Result<()> {
    let (bound, server) = bind(gateway, addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })?;
    let bound = bound.to_string();
    info!("cachegate listening on {bound}", bound: bound);
    server.await;
    info!("cachegate stopped");
    Ok(())
}
