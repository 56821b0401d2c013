use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{RowStore, StoreError};

const SHEETS_API: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before they actually expire.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// The fields of a Google service-account key file that the store needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Auth(format!("bad service account key: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Auth(format!("reading credentials {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: [&'a [String]; 1],
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Row store backed by a Google spreadsheet, talked to through the Sheets v4
/// values API with a service account.
///
/// Uses the blocking HTTP client: call it from `spawn_blocking`, and build it
/// there too.
pub struct RemoteSheet {
    client: Client,
    key: ServiceAccountKey,
    base: Url,
    spreadsheet_id: String,
    range: String,
    token: Mutex<Option<CachedToken>>,
}

impl RemoteSheet {
    pub fn new(key: ServiceAccountKey, spreadsheet_id: &str, range: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let base = Url::parse(SHEETS_API).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!(
            "Remote sheet {} (range '{}') as {}",
            spreadsheet_id, range, key.client_email
        );
        Ok(Self {
            client,
            key,
            base,
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point the store at another API host (an emulator or proxy).
    pub fn with_base_url(mut self, base: &str) -> Result<Self, StoreError> {
        self.base = Url::parse(base).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(self)
    }

    /// Swap in a preconfigured HTTP client (custom proxy or TLS settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, suffix: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("cannot use '{}' as API base", self.base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", self.range, suffix));
        Ok(url)
    }

    fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self
            .token
            .lock()
            .map_err(|e| StoreError::Auth(format!("token lock poisoned: {}", e)))?;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_SLACK {
                return Ok(token.value.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("bad private key: {}", e)))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| StoreError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| StoreError::Decode(format!("token response: {}", e)))?;
        debug!("Fetched sheet access token valid for {}s", token.expires_in);

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }
}

/// Map non-success HTTP statuses onto store errors.
fn check_status(response: Response, spreadsheet_id: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!("Sheets API returned {} for {}", status, spreadsheet_id);
    Err(error_for_status(status, spreadsheet_id))
}

fn error_for_status(status: StatusCode, spreadsheet_id: &str) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Auth(format!("{} for spreadsheet {}", status, spreadsheet_id))
        }
        StatusCode::NOT_FOUND => StoreError::SheetNotFound(spreadsheet_id.to_string()),
        _ => StoreError::Unavailable(format!("Sheets API returned {}", status)),
    }
}

impl RowStore for RemoteSheet {
    fn append_row(&self, row: &[String]) -> Result<(), StoreError> {
        let token = self.access_token()?;
        let mut url = self.values_url(":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&AppendBody { values: [row] })
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        check_status(response, &self.spreadsheet_id)?;
        Ok(())
    }

    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let token = self.access_token()?;
        let url = self.values_url("")?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let range: ValueRange = check_status(response, &self.spreadsheet_id)?
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(range.values)
    }
}
