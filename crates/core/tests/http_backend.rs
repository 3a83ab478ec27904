use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use codedash_api::models::{FunctionId, ItemKind};
use codedash_api::{AnalysisBackend, ApiError};
use codedash_core::{Dashboard, DashboardConfig, HttpBackend};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

async fn serve(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

fn fake_api() -> Router {
    Router::new()
        .route(
            "/stats/progress",
            get(|| async {
                Json(json!({
                    "total_chunks": 100,
                    "enriched_chunks": 40,
                    "pending_chunks": 60,
                    "avg_complexity": 0.42,
                    "avg_impact": null
                }))
            }),
        )
        .route(
            "/functions",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("include_stats").map(String::as_str), Some("true"));
                let limit: usize = params["limit"].parse().unwrap();
                let rows: Vec<Value> = (0..limit.min(3))
                    .map(|i| {
                        json!({
                            "function_name": format!("f{}", i),
                            "filepath": "src/lib.ext",
                            "avg_complexity": 0.1 * i as f64,
                            "avg_impact": null
                        })
                    })
                    .collect();
                Json(Value::Array(rows))
            }),
        )
        .route(
            "/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!([
                    {
                        "type": "chunk",
                        "function_name": params["q"],
                        "summary": format!("limit={} fuzzy={}", params["limit"], params["fuzzy"]),
                        "start_line": 3,
                        "end_line": 9
                    },
                    {"type": "advert", "text": "ignored"}
                ]))
            }),
        )
        .route(
            "/analyze",
            post(|Json(body): Json<Value>| async move {
                let trace = body["stacktrace"].as_str().unwrap_or_default().to_string();
                Json(json!([
                    {"type": "function_summary", "function_name": trace, "filepath": "a.ext", "function_id": 5},
                    {"type": "missing", "summary": "No function found: Z::z"}
                ]))
            }),
        )
        .route(
            "/code/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "404" {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(Json(json!({
                    "function_name": format!("fn_{}", id),
                    "parameters": "[{\"name\": \"a\"}, {\"name\": \"b\", \"default\": 1}]",
                    "code": "{\n  return a + b;\n}",
                    "start_line": 20,
                    "end_line": 22
                })))
            }),
        )
}

fn client(base: Url) -> HttpBackend {
    HttpBackend::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_progress_and_functions() {
    let backend = client(serve(fake_api()).await);

    let progress = backend.progress().await.unwrap();
    assert_eq!(progress.enriched_chunks, 40);
    assert_eq!(progress.avg_impact, None);

    let functions = backend.functions(2).await.unwrap();
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[1].function_name, "f1");
}

#[tokio::test]
async fn test_search_sends_query_parameters() {
    let backend = client(serve(fake_api()).await);

    let items = backend.search("parse token", 20, true).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].function_name(), Some("parse token"));
    match &items[0] {
        codedash_api::ResultItem::Chunk(hit) => {
            assert_eq!(hit.summary.as_deref(), Some("limit=20 fuzzy=true"));
        }
        other => panic!("expected chunk, got {:?}", other),
    }
    assert_eq!(items[1].kind(), None);
}

#[tokio::test]
async fn test_analyze_posts_stacktrace() {
    let backend = client(serve(fake_api()).await);

    let items = backend.analyze("App::Auth::login").await.unwrap();
    assert_eq!(items[0].function_name(), Some("App::Auth::login"));
    assert_eq!(items[0].function_id(), Some(&FunctionId::from(5_i64)));
    assert_eq!(items[1].kind(), Some(ItemKind::Error));
}

#[tokio::test]
async fn test_function_code_and_not_found() {
    let backend = client(serve(fake_api()).await);

    let doc = backend.function_code(&FunctionId::from("17")).await.unwrap();
    assert_eq!(doc.function_name, "fn_17");
    assert_eq!(doc.signature(), "fn_17(a, b = 1)");
    assert_eq!(doc.anchor(), 20);

    let err = backend.function_code(&FunctionId::from("404")).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let app = Router::new().route("/stats/progress", get(|| async { "not json" }));
    let backend = client(serve(app).await);

    let err = backend.progress().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = client(Url::parse(&format!("http://{}/", addr)).unwrap());

    let err = backend.search("x", 1, false).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
}

#[tokio::test]
async fn test_dashboard_over_http() {
    let base = serve(fake_api()).await;
    let config = DashboardConfig {
        api_url: base,
        ..Default::default()
    };
    let backend = Arc::new(HttpBackend::from_config(&config).unwrap());
    let dash = Dashboard::new(backend, config);

    dash.load().await.unwrap();
    dash.query("Foo::bar", false).await.unwrap();
    dash.open_tree_leaf(0).await.unwrap();

    let state = dash.state();
    assert_eq!(state.functions.len(), 3);
    assert_eq!(state.view.summaries.len(), 2);
    assert!(!state.view.summaries[1].is_resolved());
    assert_eq!(state.current_start_line, 20);
    let pane = dash.code_pane().unwrap();
    assert_eq!(pane.rows()[0].text, "fn_5(a, b = 1) {");
}
