//! `RemoteSheet` against a local stand-in for the token and Sheets endpoints.
//!
//! The store uses the blocking HTTP client, so every call (construction and
//! drop included) happens inside `spawn_blocking` while the stand-in server
//! runs on the test runtime.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde_json::{Value, json};

use guestbook_db::{RemoteSheet, RowStore, ServiceAccountKey, StoreError};

const PRIVATE_KEY: &str = include_str!("fixtures/service_account_key.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/service_account_pub.pem");
const ACCESS_TOKEN: &str = "ya29.local-test-token";

#[derive(Debug, Clone)]
struct AppendCall {
    spreadsheet: String,
    range: String,
    query: HashMap<String, String>,
    authorization: Option<String>,
    body: Value,
}

#[derive(Default)]
struct Recorded {
    token_forms: Vec<HashMap<String, String>>,
    appends: Vec<AppendCall>,
    reads: Vec<Option<String>>,
}

type Shared = Arc<Mutex<Recorded>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn token(State(recorded): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    recorded.lock().unwrap().token_forms.push(form);
    Json(json!({ "access_token": ACCESS_TOKEN, "expires_in": 3600, "token_type": "Bearer" }))
}

async fn read_values(
    State(recorded): State<Shared>,
    Path((spreadsheet, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    recorded.lock().unwrap().reads.push(bearer(&headers));
    match spreadsheet.as_str() {
        "guestbook" => Json(json!({
            "range": format!("{}!A1:D2", range),
            "majorDimension": "ROWS",
            "values": [
                ["名字", "留言內容", "你現在的心情", "時間"],
                ["Alice", "Hello world", "😊 開心", "2024-05-01 10:00:00"]
            ]
        }))
        .into_response(),
        // the API leaves out `values` for an empty range
        "blank" => Json(json!({ "range": range, "majorDimension": "ROWS" })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn append_values(
    State(recorded): State<Shared>,
    Path((spreadsheet, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let found = spreadsheet != "missing";
    recorded.lock().unwrap().appends.push(AppendCall {
        spreadsheet,
        range,
        query,
        authorization: bearer(&headers),
        body,
    });
    if found {
        Json(json!({ "updates": { "updatedRows": 1 } })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn spawn_stub() -> (SocketAddr, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/token", post(token))
        .route(
            "/v4/spreadsheets/{spreadsheet}/values/{range}",
            get(read_values).post(append_values),
        )
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}

fn key_for(addr: SocketAddr) -> ServiceAccountKey {
    let json = json!({
        "type": "service_account",
        "client_email": "guestbook@test-project.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY,
        "token_uri": format!("http://{}/token", addr),
    });
    ServiceAccountKey::from_json(&json.to_string()).unwrap()
}

/// Build a store pointed at the stub and run `f` with it off the runtime.
async fn with_sheet<T, F>(addr: SocketAddr, spreadsheet: &str, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&RemoteSheet) -> T + Send + 'static,
{
    let key = key_for(addr);
    let spreadsheet = spreadsheet.to_string();
    tokio::task::spawn_blocking(move || {
        let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        let sheet = RemoteSheet::new(key, &spreadsheet, "Sheet1")
            .unwrap()
            .with_client(client)
            .with_base_url(&format!("http://{}/", addr))
            .unwrap();
        f(&sheet)
    })
    .await
    .unwrap()
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct Assertion {
    iss: String,
    scope: String,
    aud: String,
}

#[tokio::test(flavor = "multi_thread")]
async fn append_sends_one_raw_row_with_bearer_token() {
    let (addr, recorded) = spawn_stub().await;

    let result = with_sheet(addr, "guestbook", |sheet| {
        sheet.append_row(&row(&["Alice", "Hello world", "😊 開心", "2024-05-01 10:00:00"]))
    })
    .await;
    assert!(result.is_ok(), "{:?}", result);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.appends.len(), 1);
    let call = &recorded.appends[0];
    assert_eq!(call.spreadsheet, "guestbook");
    assert_eq!(call.range, "Sheet1:append");
    assert_eq!(call.query.get("valueInputOption").map(String::as_str), Some("RAW"));
    assert_eq!(call.query.get("insertDataOption").map(String::as_str), Some("INSERT_ROWS"));
    assert_eq!(call.authorization.as_deref(), Some(format!("Bearer {}", ACCESS_TOKEN).as_str()));
    assert_eq!(
        call.body,
        json!({ "values": [["Alice", "Hello world", "😊 開心", "2024-05-01 10:00:00"]] })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn token_exchange_posts_a_signed_jwt_bearer_assertion() {
    let (addr, recorded) = spawn_stub().await;

    with_sheet(addr, "guestbook", |sheet| sheet.read_all_rows())
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.token_forms.len(), 1);
    let form = &recorded.token_forms[0];
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );

    let token_uri = format!("http://{}/token", addr);
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[token_uri.as_str()]);
    let claims = decode::<Assertion>(
        form.get("assertion").unwrap(),
        &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
        &validation,
    )
    .unwrap()
    .claims;
    assert_eq!(claims.iss, "guestbook@test-project.iam.gserviceaccount.com");
    assert_eq!(claims.aud, token_uri);
    assert_eq!(claims.scope, "https://www.googleapis.com/auth/spreadsheets");
}

#[tokio::test(flavor = "multi_thread")]
async fn read_returns_every_row_and_reuses_the_token() {
    let (addr, recorded) = spawn_stub().await;

    let (first, second) = with_sheet(addr, "guestbook", |sheet| {
        (sheet.read_all_rows(), sheet.read_all_rows())
    })
    .await;

    let rows = first.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], row(&["名字", "留言內容", "你現在的心情", "時間"]));
    assert_eq!(rows[1], row(&["Alice", "Hello world", "😊 開心", "2024-05-01 10:00:00"]));
    assert_eq!(second.unwrap(), rows);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.token_forms.len(), 1);
    assert_eq!(recorded.reads.len(), 2);
    assert!(recorded
        .reads
        .iter()
        .all(|auth| auth.as_deref() == Some(format!("Bearer {}", ACCESS_TOKEN).as_str())));
}

#[tokio::test(flavor = "multi_thread")]
async fn range_without_values_is_an_empty_sheet() {
    let (addr, _) = spawn_stub().await;

    let rows = with_sheet(addr, "blank", |sheet| sheet.read_all_rows())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_spreadsheet_is_sheet_not_found() {
    let (addr, _) = spawn_stub().await;

    let (read, append) = with_sheet(addr, "missing", |sheet| {
        (sheet.read_all_rows(), sheet.append_row(&row(&["a", "b", "c", "d"])))
    })
    .await;
    assert!(matches!(read, Err(StoreError::SheetNotFound(id)) if id == "missing"));
    assert!(matches!(append, Err(StoreError::SheetNotFound(_))));
}
