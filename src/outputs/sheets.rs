//! Google Sheets sink.
//!
//! Authenticates as a service account (RS256-signed JWT exchanged for an
//! OAuth access token), then clears the named worksheet, or adds it when it
//! does not exist yet, and writes the header plus every row starting at `A1`.
//! All cells are sent as strings.

use crate::error::EtlError;
use crate::models::Table;
use crate::outputs::{ensure_has_rows, ensure_present};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, instrument};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Size of a newly added worksheet.
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLS: u32 = 20;

/// The fields we need from a service account key file.
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
    pub fn from_file(path: &Path) -> Result<Self, EtlError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EtlError::Sheets(format!("credentials {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| EtlError::Sheets(format!("credentials {}: {e}", path.display())))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

fn api_error(context: &str, e: impl std::fmt::Display) -> EtlError {
    EtlError::Sheets(format!("{context}: {e}"))
}

/// Sign the JWT assertion for the token exchange, issued at `now` (unix secs).
pub fn build_assertion(key: &ServiceAccountKey, now: i64) -> Result<String, EtlError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| api_error("invalid service account private key", e))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| api_error("failed to sign JWT", e))
}

fn quoted_sheet_name(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// Range covering every cell of `worksheet`, URL-encoded for a request path.
pub fn whole_sheet_range(worksheet: &str) -> String {
    urlencoding::encode(&quoted_sheet_name(worksheet)).into_owned()
}

/// A1 range anchored at the top-left cell of `worksheet`, URL-encoded for a
/// request path.
pub fn worksheet_range(worksheet: &str) -> String {
    let a1 = format!("{}!A1", quoted_sheet_name(worksheet));
    urlencoding::encode(&a1).into_owned()
}

/// Header row followed by every row, all cells stringified.
pub fn values_payload(table: &Table) -> Vec<Vec<String>> {
    std::iter::once(table.columns().to_vec())
        .chain(
            table
                .rows()
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect()),
        )
        .collect()
}

/// Authenticated client bound to one spreadsheet.
struct SheetsClient {
    http: Client,
    token: String,
    spreadsheet_url: String,
}

impl SheetsClient {
    async fn connect(key: &ServiceAccountKey, spreadsheet_id: &str) -> Result<Self, EtlError> {
        let http = Client::new();
        let assertion = build_assertion(key, Utc::now().timestamp())?;
        let token: TokenResponse = http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| api_error("token exchange failed", e))?
            .json()
            .await
            .map_err(|e| api_error("token response", e))?;
        debug!(client_email = %key.client_email, "Obtained access token");

        Ok(Self {
            http,
            token: token.access_token,
            spreadsheet_url: format!("{SHEETS_API}/{}", urlencoding::encode(spreadsheet_id)),
        })
    }

    async fn worksheet_titles(&self) -> Result<Vec<String>, EtlError> {
        let meta: SpreadsheetMeta = self
            .http
            .get(&self.spreadsheet_url)
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(&self.token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| api_error("failed to open spreadsheet", e))?
            .json()
            .await
            .map_err(|e| api_error("spreadsheet metadata", e))?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn clear(&self, worksheet: &str) -> Result<(), EtlError> {
        self.http
            .post(format!(
                "{}/values/{}:clear",
                self.spreadsheet_url,
                whole_sheet_range(worksheet)
            ))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| api_error("failed to clear worksheet", e))?;
        Ok(())
    }

    async fn add_worksheet(&self, worksheet: &str) -> Result<(), EtlError> {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": worksheet,
                        "gridProperties": { "rowCount": NEW_SHEET_ROWS, "columnCount": NEW_SHEET_COLS }
                    }
                }
            }]
        });
        self.http
            .post(format!("{}:batchUpdate", self.spreadsheet_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| api_error("failed to add worksheet", e))?;
        Ok(())
    }

    async fn write_values(&self, worksheet: &str, values: Vec<Vec<String>>) -> Result<(), EtlError> {
        self.http
            .put(format!(
                "{}/values/{}",
                self.spreadsheet_url,
                worksheet_range(worksheet)
            ))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&json!({ "majorDimension": "ROWS", "values": values }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| api_error("failed to write values", e))?;
        Ok(())
    }
}

/// Clear-and-rewrite `worksheet_name` in `spreadsheet_id` with `table`,
/// creating the worksheet if absent.
///
/// # Errors
///
/// - [`EtlError::InvalidArgument`] if the table is empty or any identifier is
///   blank (checked before reading credentials)
/// - [`EtlError::Sheets`] for credential, auth or API failures
#[instrument(level = "info", skip_all, fields(%spreadsheet_id, %worksheet_name, rows = table.len()))]
pub async fn save(
    table: &Table,
    spreadsheet_id: &str,
    worksheet_name: &str,
    credentials_path: &str,
) -> Result<(), EtlError> {
    ensure_has_rows(table, "Google Sheets")?;
    ensure_present(&[
        ("spreadsheet_id", spreadsheet_id),
        ("worksheet_name", worksheet_name),
        ("credentials_path", credentials_path),
    ])?;

    let key = ServiceAccountKey::from_file(Path::new(credentials_path))?;
    let client = SheetsClient::connect(&key, spreadsheet_id).await?;

    if client
        .worksheet_titles()
        .await?
        .iter()
        .any(|t| t == worksheet_name)
    {
        client.clear(worksheet_name).await?;
    } else {
        info!("Worksheet not found; adding it");
        client.add_worksheet(worksheet_name).await?;
    }

    client.write_values(worksheet_name, values_payload(table)).await?;
    info!("Wrote worksheet");
    Ok(())
}
