//! HTTP surface (feature `server`).
//!
//! ```text
//! GET  /health                      {"status": "ok"}
//! POST {prefix}/extract             ExtractionResult
//! POST {prefix}/extract-and-save    {message, saved_path, extraction}
//! POST {prefix}/warmup              {message}
//! POST {prefix}/batch-extract       BatchResult
//! POST {prefix}/extract-json        {content: {markdown, tables}, metadata}
//! POST {prefix}/extract-html        text/html
//! POST {prefix}/extract-text        text/plain
//! ```
//!
//! `prefix` is `api_v1_str` from the settings (default `/api/v1`).
//!
//! [`serve`] binds an address and runs until Ctrl+C or SIGTERM;
//! [`serve_with_shutdown`] takes a bound listener and any shutdown future.

pub mod error;
pub mod form;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorType};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let api = Router::new()
        .route("/extract", post(routes::extract))
        .route("/extract-and-save", post(routes::extract_and_save))
        .route("/warmup", post(routes::warmup))
        .route("/batch-extract", post(routes::batch_extract))
        .route("/extract-json", post(routes::extract_json))
        .route("/extract-html", post(routes::extract_html))
        .route("/extract-text", post(routes::extract_text));

    let prefix = settings.api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(prefix, api)
    };

    app.route("/health", get(routes::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes()))
        .layer(cors_layer(&settings.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve the router until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Serve the router on `listener` until `shutdown` completes, then drain
/// in-flight requests.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Starting docex-server on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o.trim() == "*") {
        return base.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceSettings;
    use crate::extract::Extractor;
    use crate::testing::{StubFactory, FAILING_INPUT};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "docexboundary";

    enum Part<'a> {
        File {
            field: &'a str,
            filename: Option<&'a str>,
            bytes: &'a [u8],
        },
        Text(&'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File {
                    field,
                    filename,
                    bytes,
                } => {
                    let disposition = match filename {
                        Some(name) => {
                            format!("form-data; name=\"{field}\"; filename=\"{name}\"")
                        }
                        None => format!("form-data; name=\"{field}\""),
                    };
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn file<'a>(filename: &'a str, bytes: &'a [u8]) -> Part<'a> {
        Part::File {
            field: "file",
            filename: Some(filename),
            bytes,
        }
    }

    fn app_with(settings: ServiceSettings, stub: &StubFactory) -> Router {
        let extractor = Extractor::with_factory(Arc::new(settings), Arc::new(stub.clone()));
        router(AppState::with_extractor(extractor))
    }

    fn app(stub: &StubFactory) -> Router {
        app_with(ServiceSettings::default(), stub)
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn health_is_at_root() {
        let response = app(&StubFactory::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn serves_over_tcp_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let extractor = Extractor::with_factory(
            Arc::new(ServiceSettings::default()),
            Arc::new(StubFactory::default()),
        );
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve_with_shutdown(
            listener,
            AppState::with_extractor(extractor),
            async {
                stopped.await.ok();
            },
        ));

        let health: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({"status": "ok"}));

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn extract_returns_canonical_result() {
        let stub = StubFactory::with_pages(&["# Test Document"]);
        let response = app(&stub)
            .oneshot(post("/api/v1/extract", &[file("test.pdf", b"dummy content")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["markdown"], "# Test Document");
        assert_eq!(v["metadata"]["filename"], "test.pdf");
        assert_eq!(v["metadata"]["page_count"], 1);
        assert_eq!(v["tables"], json!([]));
    }

    #[tokio::test]
    async fn form_options_reach_the_engine() {
        let stub = StubFactory::default();
        let response = app(&stub)
            .oneshot(post(
                "/api/v1/extract",
                &[
                    file("scan.png", b"img"),
                    Part::Text("ocr_enabled", "false"),
                    Part::Text("table_extraction_enabled", "0"),
                    Part::Text("vlm_mode", "LOCAL"),
                    Part::Text("vlm_model_id", "string"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let config = &stub.calls()[0].config;
        assert!(!config.do_ocr);
        assert!(!config.do_table_structure);
        assert_eq!(
            config.picture_description.as_ref().map(|p| p.model.as_str()),
            Some(crate::pipeline::DEFAULT_LOCAL_VLM_MODEL)
        );
    }

    #[tokio::test]
    async fn missing_filename_is_400() {
        let stub = StubFactory::default();
        let response = app(&stub)
            .oneshot(post(
                "/api/v1/extract",
                &[Part::File {
                    field: "file",
                    filename: None,
                    bytes: b"x",
                }],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let v = body_json(response).await;
        assert_eq!(v["error"]["message"], "No filename provided");
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn bad_vlm_mode_is_400() {
        let response = app(&StubFactory::default())
            .oneshot(post(
                "/api/v1/extract",
                &[file("a.pdf", b"x"), Part::Text("vlm_mode", "cloud")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn engine_failure_is_500_with_message() {
        let response = app(&StubFactory::default())
            .oneshot(post("/api/v1/extract", &[file("bad.pdf", FAILING_INPUT)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let v = body_json(response).await;
        assert_eq!(v["error"]["type"], "server_error");
        assert!(v["error"]["message"].as_str().unwrap().contains("bad.pdf"));
    }

    #[tokio::test]
    async fn extract_and_save_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ServiceSettings::builder()
            .storage_dir(dir.path())
            .build()
            .unwrap();
        let stub = StubFactory::with_pages(&["saved body"]);
        let response = app_with(settings, &stub)
            .oneshot(post("/api/v1/extract-and-save", &[file("memo.txt", b"x")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["message"], "Extraction successful and file saved.");
        assert_eq!(v["extraction"]["markdown"], "saved body");
        let saved = v["saved_path"].as_str().unwrap();
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "saved body");
        assert!(saved.contains("memo_"));
    }

    #[tokio::test]
    async fn warmup_needs_no_file() {
        let stub = StubFactory::default();
        let response = app(&stub)
            .oneshot(post("/api/v1/warmup", &[Part::Text("vlm_mode", "none")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Warmup completed successfully"})
        );
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn batch_reports_per_file_outcomes() {
        let stub = StubFactory::default();
        let response = app(&stub)
            .oneshot(post(
                "/api/v1/batch-extract",
                &[
                    Part::File {
                        field: "files",
                        filename: Some("a.pdf"),
                        bytes: b"1",
                    },
                    Part::File {
                        field: "files",
                        filename: None,
                        bytes: b"2",
                    },
                    Part::File {
                        field: "files",
                        filename: Some("c.pdf"),
                        bytes: FAILING_INPUT,
                    },
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["total_files"], 3);
        assert_eq!(v["successful"], 1);
        assert_eq!(v["failed"], 2);
        assert_eq!(v["results"][0]["status"], "success");
        assert_eq!(v["results"][0]["markdown"], "stub content");
        assert_eq!(v["results"][1]["filename"], "unknown");
        assert_eq!(v["results"][1]["error"], "No filename provided");
        assert_eq!(v["results"][2]["filename"], "c.pdf");
        assert_eq!(v["results"][2]["status"], "error");
    }

    #[tokio::test]
    async fn json_html_and_text_renderings() {
        let stub = StubFactory::with_pages(&["# Title\n**bold** [link](http://x)"]);
        let router = app(&stub);

        let v = body_json(
            router
                .clone()
                .oneshot(post("/api/v1/extract-json", &[file("t.md", b"x")]))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(v["content"]["markdown"], "# Title\n**bold** [link](http://x)");
        assert_eq!(v["metadata"]["filename"], "t.md");

        let html = router
            .clone()
            .oneshot(post("/api/v1/extract-html", &[file("t.md", b"x")]))
            .await
            .unwrap();
        assert!(html.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let html = body_string(html).await;
        assert!(html.contains("<title>t.md</title>"));
        assert!(html.contains("<h1>Title</h1>"));

        let text = router
            .oneshot(post("/api/v1/extract-text", &[file("t.md", b"x")]))
            .await
            .unwrap();
        assert!(text.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_string(text).await, "Title\nbold link");
    }

    #[tokio::test]
    async fn custom_prefix() {
        let settings = ServiceSettings::builder().api_prefix("/v2").build().unwrap();
        let response = app_with(settings, &StubFactory::default())
            .oneshot(post("/v2/extract", &[file("a.pdf", b"x")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
