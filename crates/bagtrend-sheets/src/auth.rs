//! Service-account credential resolution for the remote store.
//!
//! Credentials come from exactly one of two places, selected by the injected
//! [`CredentialSource`]: the hosting application's secret store (surfaced as
//! environment variables) or a local JSON credential file. Token minting and
//! refresh happen outside this process; the resolved token is presented
//! as-is in a bearer header.

use std::path::Path;

use bagtrend_core::CredentialSource;
use serde::Deserialize;

use crate::error::StoreError;

/// Resolved service-account credentials for the remote store.
#[derive(Clone, Deserialize)]
pub struct SheetCredentials {
    /// Identifier of the spreadsheet document holding all tables.
    pub document_id: String,
    /// Pre-issued access token, sent as `Authorization: Bearer …`.
    pub access_token: String,
    /// Service-account identity, for operator-facing logs only.
    #[serde(default)]
    pub client_email: Option<String>,
}

impl std::fmt::Debug for SheetCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetCredentials")
            .field("document_id", &self.document_id)
            .field("access_token", &"[redacted]")
            .field("client_email", &self.client_email)
            .finish()
    }
}

/// Resolve credentials from the configured source.
///
/// # Errors
///
/// Returns [`StoreError::Credentials`] if required environment variables are
/// missing (listing all of them) or the credential file cannot be read or
/// parsed.
pub fn resolve_credentials(source: &CredentialSource) -> Result<SheetCredentials, StoreError> {
    match source {
        CredentialSource::AppSecrets => from_app_secrets(),
        CredentialSource::File(path) => from_file(path),
    }
}

fn from_app_secrets() -> Result<SheetCredentials, StoreError> {
    let get = |key: &str| -> Option<String> { std::env::var(key).ok() };

    let document_id = get("BAGTREND_SHEETS_DOCUMENT_ID");
    let access_token = get("BAGTREND_SHEETS_ACCESS_TOKEN");
    let client_email = get("BAGTREND_SHEETS_CLIENT_EMAIL");

    let mut missing = Vec::new();
    if document_id.is_none() {
        missing.push("BAGTREND_SHEETS_DOCUMENT_ID");
    }
    if access_token.is_none() {
        missing.push("BAGTREND_SHEETS_ACCESS_TOKEN");
    }
    if !missing.is_empty() {
        return Err(StoreError::Credentials(format!(
            "missing app-secret env vars: {}",
            missing.join(", ")
        )));
    }

    Ok(SheetCredentials {
        document_id: document_id.unwrap_or_default(),
        access_token: access_token.unwrap_or_default(),
        client_email,
    })
}

fn from_file(path: &Path) -> Result<SheetCredentials, StoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        StoreError::Credentials(format!(
            "cannot read credential file {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        StoreError::Credentials(format!(
            "cannot parse credential file {}: {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_credentials_parse() {
        let dir = std::env::temp_dir().join("bagtrend-auth-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("credentials.json");
        std::fs::write(
            &path,
            r#"{
                "document_id": "doc-123",
                "access_token": "tok-456",
                "client_email": "collector@project.iam.example.com"
            }"#,
        )
        .unwrap();

        let creds = resolve_credentials(&CredentialSource::File(path.clone())).unwrap();
        assert_eq!(creds.document_id, "doc-123");
        assert_eq!(creds.access_token, "tok-456");
        assert_eq!(
            creds.client_email.as_deref(),
            Some("collector@project.iam.example.com")
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_a_credential_error() {
        let result = resolve_credentials(&CredentialSource::File(
            Path::new("/nonexistent/credentials.json").to_path_buf(),
        ));
        assert!(matches!(result, Err(StoreError::Credentials(_))));
    }

    #[test]
    fn debug_redacts_access_token() {
        let creds = SheetCredentials {
            document_id: "doc".to_string(),
            access_token: "super-secret".to_string(),
            client_email: None,
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
