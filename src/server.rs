//! # Spec Server
//!
//! Serves the generated document on every `OpenAPIHandler` route of the route
//! table. Each request re-derives the document from the route table and the
//! current handler sources.

use crate::config::{Application, OPENAPI_HANDLER};
use crate::document::{generate, OutputFormat};
use crate::error::AppError;
use crate::naming::normalize_pattern;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use serde::Deserialize;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{error, info};

/// Per-route state of an `OpenAPIHandler` entry.
#[derive(Debug)]
struct SpecRoute {
    app: Arc<Application>,
    key: String,
    format: OutputFormat,
}

/// Query string accepted by the document endpoint.
#[derive(Debug, Deserialize)]
pub struct SpecQuery {
    /// `json` or `yaml`; overrides the route's `kwargs.format`.
    pub format: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Registers one GET resource per `OpenAPIHandler` entry.
pub fn configure(app: Arc<Application>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        for (key, url) in app
            .config
            .url
            .iter()
            .filter(|(_, url)| url.handler == OPENAPI_HANDLER)
        {
            let route = SpecRoute {
                app: Arc::clone(&app),
                key: key.clone(),
                format: url
                    .kwargs
                    .format
                    .as_deref()
                    .and_then(OutputFormat::from_name)
                    .unwrap_or_default(),
            };
            cfg.service(
                web::resource(normalize_pattern(&url.pattern))
                    .app_data(web::Data::new(route))
                    .route(web::get().to(openapi_spec)),
            );
        }
    }
}

/// Number of routes `configure` will register.
pub fn spec_routes(app: &Application) -> usize {
    app.config
        .url
        .values()
        .filter(|url| url.handler == OPENAPI_HANDLER)
        .count()
}

async fn openapi_spec(
    route: web::Data<SpecRoute>,
    query: web::Query<SpecQuery>,
) -> Result<HttpResponse, AppError> {
    let format = query
        .format
        .as_deref()
        .and_then(OutputFormat::from_name)
        .unwrap_or(route.format);

    // Handler sources are read from disk, so generation runs on the blocking pool.
    let state = route.clone();
    let body = web::block(move || {
        generate(&state.app, Some(&state.key)).and_then(|document| format.render(&document))
    })
    .await
    .map_err(AppError::from)
    .and_then(|generated| generated)
    .map_err(|e| {
        error!(url = %route.key, error = %e, "failed to generate OpenAPI document");
        e
    })?;

    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .body(body))
}

/// Builds the HTTP server on an already bound listener.
pub fn build_server(
    listener: TcpListener,
    app: Arc<Application>,
) -> std::io::Result<actix_web::dev::Server> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, routes = spec_routes(&app), "serving OpenAPI document");
    }
    Ok(
        HttpServer::new(move || App::new().configure(configure(Arc::clone(&app))))
            .listen(listener)?
            .run(),
    )
}
