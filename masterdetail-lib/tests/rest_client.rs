//! RestClient against a local HTTP server.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use masterdetail_lib::DataSource;
use masterdetail_lib::RestClient;
use masterdetail_lib::error::ApiError;
use masterdetail_lib::query::PageRequest;
use masterdetail_lib::query::PaginationModel;
use masterdetail_lib::query::SortModel;
use tokio::net::TcpListener;

const USERS: &str = r#"[
    {"id": 1, "name": "Leanne Graham"},
    {"id": 2, "name": "Ervin Howell"},
    {"id": 3, "name": "Clementine Bauch"},
    {"id": 4, "name": "Patricia Lebsack"},
    {"id": 5, "name": "Chelsey Dietrich"}
]"#;

/// Serves canned responses by path and records every request target.
async fn serve() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    log.lock().unwrap().push(req.uri().to_string());
                    let response = match req.uri().path() {
                        "/users" => Response::builder()
                            .header("content-type", "application/json")
                            .header("x-total-count", "12")
                            .body(Full::new(Bytes::from(USERS))),
                        "/users/7/posts" => Response::builder()
                            .header("content-type", "application/json")
                            .body(Full::new(Bytes::from(r#"[{"id": 61, "userId": 7}]"#))),
                        "/broken" => Response::builder()
                            .status(StatusCode::INTERNAL_SERVER_ERROR)
                            .body(Full::new(Bytes::from("boom"))),
                        "/not-json" => Response::builder()
                            .header("x-total-count", "3")
                            .body(Full::new(Bytes::from("<html></html>"))),
                        _ => Response::builder()
                            .status(StatusCode::NOT_FOUND)
                            .body(Full::new(Bytes::new())),
                    };
                    async move { Ok::<_, Infallible>(response.unwrap()) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    (addr, seen)
}

fn client(addr: SocketAddr) -> RestClient {
    RestClient::builder()
        .base_url(format!("http://{}", addr))
        .build()
        .unwrap()
}

fn first_page(size: usize) -> PageRequest {
    PageRequest::new(PaginationModel::first(size), SortModel::none())
}

#[tokio::test]
async fn test_first_page_with_total_count() {
    let (addr, seen) = serve().await;
    let page = client(addr).fetch_page("users", &first_page(5)).await.unwrap();

    assert_eq!(page.len(), 5);
    assert_eq!(page.total_count(), 12);
    assert_eq!(*seen.lock().unwrap(), vec!["/users?_page=1&_limit=5".to_string()]);
}

#[tokio::test]
async fn test_sort_parameters() {
    let (addr, seen) = serve().await;
    let request = PageRequest::new(PaginationModel::new(2, 10), SortModel::desc("name"));
    client(addr).fetch_page("/users", &request).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["/users?_page=3&_limit=10&_sort=name&_order=desc".to_string()]
    );
}

#[tokio::test]
async fn test_missing_total_count_is_zero() {
    let (addr, _) = serve().await;
    let page = client(addr).fetch_page("users/7/posts", &first_page(5)).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.total_count(), 0);
}

#[tokio::test]
async fn test_server_error() {
    let (addr, _) = serve().await;
    let err = client(addr).fetch_page("broken", &first_page(5)).await.unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 500, .. }));
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn test_non_json_body() {
    let (addr, _) = serve().await;
    let err = client(addr).fetch_page("not-json", &first_page(5)).await.unwrap_err();

    match err {
        ApiError::Parse { body, .. } => assert_eq!(body.as_deref(), Some("<html></html>")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).fetch_page("users", &first_page(5)).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
