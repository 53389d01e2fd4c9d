use axum::http::StatusCode as UpstreamStatus;
use axum::{routing::get, Json, Router};
use clap::Parser;
use country_exchange_lib::api::{cors_layer, ApiServer};
use country_exchange_lib::config::{AppConfig, Cli};
use country_exchange_lib::state::AppState;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route(
            "/countries",
            get(|| async {
                Json(json!([
                    {
                        "name": "Nigeria",
                        "capital": "Abuja",
                        "region": "Africa",
                        "population": 206139587,
                        "flag": "https://flagcdn.com/ng.svg",
                        "currencies": [{"code": "NGN", "name": "Nigerian naira", "symbol": "₦"}]
                    },
                    {
                        "name": "Ghana",
                        "capital": "Accra",
                        "region": "Africa",
                        "population": 31072945,
                        "flag": "https://flagcdn.com/gh.svg",
                        "currencies": [{"code": "GHS"}]
                    },
                    {
                        "name": "Antarctica",
                        "region": "Polar",
                        "population": 1000,
                        "currencies": []
                    }
                ]))
            }),
        )
        .route(
            "/rates",
            get(|| async { Json(json!({"result": "success", "rates": {"USD": 1.0, "NGN": 1600.23}})) }),
        )
        .route("/broken", get(|| async { UpstreamStatus::BAD_GATEWAY }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_service(data_dir: &Path, upstream: SocketAddr, rates_path: &str) -> (ApiServer, String) {
    let cli = Cli::try_parse_from([
        "country-exchange".to_string(),
        "--host".to_string(),
        "127.0.0.1".to_string(),
        "--port".to_string(),
        "0".to_string(),
        "--data-dir".to_string(),
        data_dir.display().to_string(),
        "--countries-url".to_string(),
        format!("http://{}/countries", upstream),
        "--rates-url".to_string(),
        format!("http://{}{}", upstream, rates_path),
        "--fetch-timeout-secs".to_string(),
        "5".to_string(),
    ])
    .unwrap();
    let config = AppConfig::try_from(cli).unwrap();

    let state = Arc::new(AppState::new(&config).unwrap());
    let mut server = ApiServer::new(state, cors_layer(&config.cors_origins).unwrap());
    let addr = server.start(config.listen_addr).await.unwrap();

    (server, format!("http://{}", addr))
}

#[tokio::test]
async fn test_refresh_read_delete_and_image() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let (server, base) = start_service(dir.path(), upstream, "/rates").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/countries/refresh", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let countries: Vec<Value> = client
        .get(format!("{}/countries?sort=gdp_desc", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<_> = countries.iter().map(|c| c["name"].as_str().unwrap()).collect();
    // nigeria has a positive GDP, antarctica 0, ghana has no rate
    assert_eq!(names, vec!["nigeria", "antarctica", "ghana"]);

    let ghana = &countries[2];
    assert_eq!(ghana["currency_code"], "GHS");
    assert!(ghana["exchange_rate"].is_null());
    assert!(ghana["estimated_gdp"].is_null());

    let antarctica = &countries[1];
    assert!(antarctica["currency_code"].is_null());
    assert_eq!(antarctica["estimated_gdp"].as_f64(), Some(0.0));

    let nigeria: Value = client
        .get(format!("{}/countries/NIGERIA", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(nigeria["capital"], "abuja");
    assert_eq!(nigeria["exchange_rate"].as_f64(), Some(1600.23));
    let gdp = nigeria["estimated_gdp"].as_f64().unwrap();
    let population = 206139587.0;
    assert!(gdp >= population * 1000.0 / 1600.23 && gdp < population * 2000.0 / 1600.23);

    let status: Value = client
        .get(format!("{}/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["total_countries"], 3);
    assert_eq!(status["last_refreshed_at"], nigeria["last_refreshed_at"]);

    // The summary is written in the background after the refresh commits
    let mut image = None;
    for _ in 0..50 {
        let response = client
            .get(format!("{}/countries/image", base))
            .send()
            .await
            .unwrap();
        if response.status() == StatusCode::OK {
            image = Some(response);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let image = image.expect("summary image was never generated");
    assert_eq!(image.headers()["content-type"], "image/svg+xml");
    let svg = image.text().await.unwrap();
    assert!(svg.contains("Nigeria"));

    let response = client
        .delete(format!("{}/countries/ghana", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/countries/ghana", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.shutdown().await;
}

#[tokio::test]
async fn test_upstream_failure_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let client = reqwest::Client::new();

    let (server, base) = start_service(dir.path(), upstream, "/rates").await;
    let response = client
        .post(format!("{}/countries/refresh", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let before: Value = client
        .get(format!("{}/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    server.shutdown().await;

    let (server, base) = start_service(dir.path(), upstream, "/broken").await;
    let response = client
        .post(format!("{}/countries/refresh", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["details"], json!(["rates"]));

    let after: Value = client
        .get(format!("{}/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after, before);

    server.shutdown().await;
}
