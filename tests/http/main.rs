//! HTTP surface integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

#![cfg(feature = "http")]

use reqwest::StatusCode;
use serde_json::{json, Value};

use movie_catalog::{http, InMemorySink, FlushWorkerThread, MovieInput, MovieStore};

/// Bind to port 0 and return the actual address.
async fn start_server(store: MovieStore) -> String {
    let app = http::router(store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn dune() -> Value {
    json!({ "name": "Dune", "genre": "Sci-Fi", "year": 2021, "imageUrl": "u" })
}

#[tokio::test]
async fn dune_scenario_over_http() {
    let base = start_server(MovieStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client.post(format!("{base}/movies")).json(&dune()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "id": 1, "name": "Dune", "genre": "Sci-Fi", "year": 2021, "imageUrl": "u" })
    );

    let resp = client.post(format!("{base}/movies")).json(&dune()).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], 2);

    let body: Value = client
        .get(format!("{base}/movies?page=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert_eq!(body["movies"][0]["id"], 1);
    assert_eq!(body["movies"][1]["id"], 2);

    let resp = client.delete(format!("{base}/movies/1")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.bytes().await.unwrap().is_empty());

    let body: Value = client
        .get(format!("{base}/movies"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["movies"], json!([{ "id": 2, "name": "Dune", "genre": "Sci-Fi", "year": 2021, "imageUrl": "u" }]));

    let resp = client
        .put(format!("{base}/movies/2"))
        .json(&json!({ "year": 2022 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "id": 2, "name": "Dune", "genre": "Sci-Fi", "year": 2022, "imageUrl": "u" })
    );
}

#[tokio::test]
async fn page_defaults_and_bounds() {
    let store = MovieStore::new();
    for n in 0..20 {
        store
            .create(MovieInput::new(format!("m{n}"), "Drama", 2000, ""))
            .unwrap();
    }
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    for query in ["", "?page=abc", "?page=0", "?page=-2", "?page=1&page=2"] {
        let resp = client.get(format!("{base}/movies{query}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "query {query:?}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["page"], 1, "query {query:?}");
        assert_eq!(body["movies"].as_array().unwrap().len(), 15);
    }

    let body: Value = client
        .get(format!("{base}/movies?page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["movies"].as_array().unwrap().len(), 5);
    assert_eq!(body["movies"][0]["id"], 16);

    let body: Value = client
        .get(format!("{base}/movies?page=9"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "page": 9, "movies": [] }));

    let resp = client
        .get(format!("{base}/movies?page=99999999999999999999999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movies"], json!([]));
}

#[tokio::test]
async fn serve_stops_when_shutdown_resolves() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(http::serve(listener, MovieStore::new(), async {
        let _ = stop_rx.await;
    }));

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_ids_return_404_with_message() {
    let base = start_server(MovieStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{base}/movies/42"))
        .json(&dune())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Movie not found" }));

    let resp = client.delete(format!("{base}/movies/42")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client.delete(format!("{base}/movies/abc")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Movie not found");
}

#[tokio::test]
async fn invalid_bodies_return_400() {
    let store = MovieStore::new();
    let base = start_server(store.clone()).await;
    let client = reqwest::Client::new();

    let missing_year = json!({ "name": "Dune", "genre": "Sci-Fi", "imageUrl": "u" });
    let resp = client.post(format!("{base}/movies")).json(&missing_year).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());

    let bad_year = json!({ "name": "Dune", "genre": "Sci-Fi", "year": 20210, "imageUrl": "u" });
    let resp = client.post(format!("{base}/movies")).json(&bad_year).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base}/movies"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(store.is_empty().unwrap());

    let movie = store.create(MovieInput::new("Dune", "Sci-Fi", 2021, "u")).unwrap();
    let resp = client
        .put(format!("{base}/movies/{}", movie.id))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.get(movie.id).unwrap(), Some(movie));
}

#[tokio::test]
async fn mutations_reach_the_sink() {
    let sink = InMemorySink::new();
    let worker = FlushWorkerThread::spawn(sink.clone());
    let store = MovieStore::new().with_flush_queue(worker.queue());
    let base = start_server(store.clone()).await;
    let client = reqwest::Client::new();

    client.post(format!("{base}/movies")).json(&dune()).send().await.unwrap();
    client
        .put(format!("{base}/movies/1"))
        .json(&json!({ "genre": "Epic" }))
        .send()
        .await
        .unwrap();
    store.sync().unwrap();

    let latest = sink.latest().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].genre, "Epic");
    worker.stop();
}

#[tokio::test]
async fn health_and_api_docs() {
    let store = MovieStore::new();
    store.create(MovieInput::new("Dune", "Sci-Fi", 2021, "u")).unwrap();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "ok": true, "movies": 1 }));

    let resp = client.get(format!("{base}/api-docs")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["openapi"], "3.0.0");
    assert!(doc["paths"]["/movies/{id}"]["delete"].is_object());
}

#[tokio::test]
async fn cors_headers_and_preflight() {
    let base = start_server(MovieStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/movies")).send().await.unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{base}/movies/3"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "PUT")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(resp.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("PUT"));
}
