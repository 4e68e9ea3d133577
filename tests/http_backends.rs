//! Microservice and Firebase backends against a local mock server.

use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;

use banter_uploader::availability::AvailabilityCache;
use banter_uploader::backend::{
    AssetBackend, BackendError, FirebaseBackend, MicroserviceBackend, ReachabilityProbe,
};
use banter_uploader::config::{AvailabilityConfig, FirebaseConfig, MicroserviceConfig, UploadConfig};
use banter_uploader::resilience::RetryPolicy;
use banter_uploader::upload::{content_hash, UploadError, UploadRequest, Uploader};

mod common;
use common::{closed_port_url, MockServer};

const API_KEY: &str = "AIza-SECRET-KEY-123";
const GLB: &[u8] = b"glTF\x02\0\0\0\x0c\0\0\0";

fn upload_config() -> UploadConfig {
    UploadConfig {
        timeout_secs: 10,
        base_delay_ms: 10,
        max_delay_ms: 50,
        ..UploadConfig::default()
    }
}

fn microservice(url: &str) -> Arc<MicroserviceBackend> {
    let config = MicroserviceConfig {
        server_url: url.to_string(),
        username: "artist".into(),
        secret: "hunter2".into(),
    };
    Arc::new(
        MicroserviceBackend::new(&config, &upload_config(), &AvailabilityConfig::default()).unwrap(),
    )
}

fn firebase(url: &str) -> Arc<FirebaseBackend> {
    let config = FirebaseConfig {
        api_key: API_KEY.into(),
        project_id: "demo".into(),
        storage_bucket: "demo.appspot.com".into(),
        database_url: url.to_string(),
        space_id: "lobby".into(),
        storage_endpoint: url.to_string(),
        ..FirebaseConfig::default()
    };
    Arc::new(FirebaseBackend::new(&config, &upload_config(), &AvailabilityConfig::default()).unwrap())
}

fn uploader(backend: Arc<dyn AssetBackend>, max_retries: u32) -> Uploader {
    Uploader::new(backend, RetryPolicy::new(max_retries, 10, 50), 1024 * 1024)
}

#[tokio::test]
async fn test_microservice_multipart_upload() {
    let server = MockServer::start(|req| match req.path.as_str() {
        "/api/store_glb" => (200, r#"{"hash": "abc123"}"#.into()),
        _ => (404, String::new()),
    })
    .await;

    let outcome = uploader(microservice(&server.url()), 3)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap();

    assert_eq!(outcome.location, "abc123");
    assert_eq!(outcome.component_id, None);
    assert_eq!(outcome.content_hash, content_hash(GLB));

    let requests = server.requests_to("/api/store_glb");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::POST);
    assert!(request
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with("multipart/form-data"));

    let body = request.body_text();
    assert!(body.contains(r#"name="file"; filename="model.glb""#));
    assert!(body.contains("model/gltf-binary"));
    assert!(body.contains(r#"name="username""#) && body.contains("artist"));
    assert!(body.contains(r#"name="secret""#) && body.contains("hunter2"));
    assert!(body.contains(r#"name="mesh_name""#) && body.contains("Chair"));
}

#[tokio::test]
async fn test_microservice_413_is_rejected_once() {
    let server = MockServer::start(|_| (413, String::new())).await;

    let err = uploader(microservice(&server.url()), 3)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        UploadError::Rejected { status: 413, message: "upload: file too large for server".into() }
    );
    assert_eq!(server.requests_to("/api/store_glb").len(), 1);
}

#[tokio::test]
async fn test_microservice_error_detail_and_bad_json() {
    let server = MockServer::start(|_| (400, r#"{"detail": "not a GLB"}"#.into())).await;
    let err = uploader(microservice(&server.url()), 1)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();
    assert_eq!(err, UploadError::Rejected { status: 400, message: "upload: not a GLB".into() });

    let server = MockServer::start(|_| (200, "<html>ok</html>".into())).await;
    let err = uploader(microservice(&server.url()), 3)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidResponse(_)));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_refused_connection_is_retried_transport_error() {
    let url = closed_port_url().await;

    let err = uploader(microservice(&url), 2)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();

    match err {
        UploadError::Transport { attempts, message } => {
            assert_eq!(attempts, 2);
            assert_eq!(message, "upload: cannot connect to server");
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_microservice_probe() {
    let server = MockServer::start(|req| match req.path.as_str() {
        "/" => (404, String::new()),
        _ => (500, String::new()),
    })
    .await;
    let backend = microservice(&server.url());
    assert_eq!(backend.probe().await, Ok(true));

    let failing = MockServer::start(|_| (503, String::new())).await;
    assert_eq!(microservice(&failing.url()).probe().await, Ok(false));

    let closed = microservice(&closed_port_url().await);
    assert!(matches!(closed.probe().await, Err(BackendError::Transport(_))));
}

#[tokio::test]
async fn test_firebase_publish_writes_storage_component_entity() {
    let server = MockServer::start(|req| {
        if req.path.starts_with("/v0/b/") {
            (200, r#"{"name": "glbs/x.glb"}"#.into())
        } else {
            (200, "null".into())
        }
    })
    .await;
    let backend = firebase(&server.url());

    let outcome = uploader(backend, 3)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap();

    let hash = content_hash(GLB);
    let object = format!("/v0/b/demo.appspot.com/o/glbs%2F{}.glb", hash);
    assert_eq!(
        outcome.location,
        format!("{}{}?alt=media", server.url(), object)
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 3);

    let store = &requests[0];
    assert_eq!(store.method, Method::POST);
    assert_eq!(store.path, object);
    assert_eq!(store.query.as_deref(), Some(format!("uploadType=media&key={}", API_KEY).as_str()));
    assert_eq!(store.content_type.as_deref(), Some("model/gltf-binary"));
    assert_eq!(&store.body[..], GLB);

    let id = outcome.component_id.unwrap();
    let component = &requests[1];
    assert_eq!(component.method, Method::PUT);
    assert_eq!(component.path, format!("/space/lobby/components/{}.json", id));
    assert_eq!(component.query.as_deref(), Some(format!("auth={}", API_KEY).as_str()));
    let body: Value = serde_json::from_slice(&component.body).unwrap();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["url"], outcome.location.as_str());

    let entity = &requests[2];
    assert_eq!(entity.path, "/space/lobby/Scene/Chair.json");
    let body: Value = serde_json::from_slice(&entity.body).unwrap();
    let meta = &body["__meta"];
    assert_eq!(meta["active"], true);
    assert_eq!(meta["components"][id.as_str()], true);
    assert_eq!(meta["localRotation"]["w"], 1.0);
    assert_eq!(meta["localScale"]["x"], 1.0);
}

#[tokio::test]
async fn test_firebase_component_403_stops_before_entity() {
    let server = MockServer::start(|req| {
        if req.path.starts_with("/space/lobby/components/") {
            (403, r#"{"error": "Permission denied"}"#.into())
        } else {
            (200, "{}".into())
        }
    })
    .await;

    let err = uploader(firebase(&server.url()), 3)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();

    match &err {
        UploadError::ComponentRegistration { location, message } => {
            assert!(location.contains("glbs%2F"));
            assert_eq!(message, "component registration: Permission denied");
        }
        other => panic!("expected component registration failure, got {:?}", other),
    }
    assert!(!err.to_string().contains(API_KEY));
    assert!(server.requests_to("/space/lobby/Scene/").is_empty());
    assert_eq!(server.requests_to("/v0/b/").len(), 1);
}

#[tokio::test]
async fn test_firebase_errors_never_contain_api_key() {
    let server = MockServer::start(|_| (401, r#"{"error": {"message": "Invalid API key"}}"#.into())).await;
    let err = uploader(firebase(&server.url()), 1)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();
    assert_eq!(err, UploadError::Rejected { status: 401, message: "storage upload: Invalid API key".into() });
    assert!(!format!("{} {:?}", err, err).contains(API_KEY));

    let err = uploader(firebase(&closed_port_url().await), 2)
        .publish(UploadRequest::new("Chair", GLB))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Transport { attempts: 2, .. }));
    assert!(!format!("{} {:?}", err, err).contains(API_KEY));
}

#[tokio::test]
async fn test_firebase_reachability_is_unauthenticated() {
    let server = MockServer::start(|req| match req.query.as_deref() {
        Some(q) if q.contains(API_KEY) => (200, r#"{"space": true}"#.into()),
        _ => (401, String::new()),
    })
    .await;
    let backend = firebase(&server.url());

    // Reachability is checked without credentials; 401 still means reachable.
    let cache = AvailabilityCache::default();
    assert!(cache.get_status(backend.as_ref()).await);
    assert!(cache.get_status(backend.as_ref()).await);
    assert_eq!(server.requests().len(), 1);

    let requests = server.requests();
    let reachability = &requests[0];
    assert_eq!(reachability.method, Method::GET);
    assert_eq!(reachability.path, "/.json");
    assert!(!reachability.query.as_deref().unwrap_or_default().contains(API_KEY));

    let report = backend.test_connection().await;
    assert!(report.ok);
    assert_eq!(report.message, "Firebase connection successful");
    let requests = server.requests();
    assert!(requests[1].query.as_deref().unwrap_or_default().contains(&format!("auth={}", API_KEY)));

    let denied = MockServer::start(|_| (401, String::new())).await;
    let report = firebase(&denied.url()).test_connection().await;
    assert!(!report.ok);
    assert_eq!(report.message, "Firebase authentication failed - check API key");
}
