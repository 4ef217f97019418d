//! Infisical HTTP API client

use crate::backend::{
    BackendError, BackendResult, BackendSecret, Credentials, SecretScope, SecretsBackend, Session,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const LOGIN_PATH: &str = "/api/v1/auth/universal-auth/login";
const SECRETS_PATH: &str = "/api/v3/secrets/raw";
const SHARED: &str = "shared";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct ImportedFolder {
    #[serde(default)]
    secrets: Vec<BackendSecret>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    secrets: Vec<BackendSecret>,
    #[serde(default)]
    imports: Vec<ImportedFolder>,
}

#[derive(Deserialize)]
struct SecretResponse {
    secret: BackendSecret,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// [`SecretsBackend`] speaking the Infisical REST API
#[derive(Debug, Clone)]
pub struct InfisicalClient {
    http: reqwest::Client,
}

impl InfisicalClient {
    pub fn new(timeout: Duration) -> BackendResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("secretact/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    fn secret_url(site_url: &str, name: &str) -> String {
        format!("{}{}/{}", site_url, SECRETS_PATH, urlencoding::encode(name))
    }

    fn authed(&self, method: Method, url: &str, session: &Session) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&session.access_token)
    }

    async fn send<T: DeserializeOwned>(url: &str, request: RequestBuilder) -> BackendResult<T> {
        let response = request
            .send()
            .await
            .map_err(|source| BackendError::Http { url: url.to_string(), source })?;
        let response = Self::check_status(url, response).await?;
        response.json::<T>().await.map_err(|e| BackendError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn check_status(url: &str, response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);
        Err(BackendError::Status { url: url.to_string(), status: status.as_u16(), message })
    }

    async fn write_secret(
        &self,
        method: Method,
        session: &Session,
        scope: &SecretScope,
        name: &str,
        value: Option<&str>,
    ) -> BackendResult<BackendSecret> {
        let url = Self::secret_url(&session.site_url, name);
        let mut body = json!({
            "workspaceId": scope.project_id,
            "environment": scope.environment,
            "secretPath": scope.secret_path,
            "type": SHARED,
        });
        if let Some(value) = value {
            body["secretValue"] = json!(value);
        }
        debug!(%method, secret = name, "writing secret");
        let request = self.authed(method, &url, session).json(&body);
        let response: SecretResponse = Self::send(&url, request).await?;
        Ok(response.secret)
    }
}

#[async_trait]
impl SecretsBackend for InfisicalClient {
    async fn login(&self, site_url: &str, credentials: &Credentials) -> BackendResult<Session> {
        let url = format!("{}{}", site_url, LOGIN_PATH);
        let request = self.http.post(&url).json(&json!({
            "clientId": credentials.client_id,
            "clientSecret": credentials.client_secret,
        }));
        let login: LoginResponse = Self::send(&url, request).await?;
        Ok(Session {
            site_url: site_url.to_string(),
            access_token: login.access_token,
            expires_in: login.expires_in,
        })
    }

    async fn list_secrets(
        &self,
        session: &Session,
        scope: &SecretScope,
    ) -> BackendResult<Vec<BackendSecret>> {
        let url = format!("{}{}", session.site_url, SECRETS_PATH);
        let include_imports = if scope.include_imports { "true" } else { "false" };
        let request = self.authed(Method::GET, &url, session).query(&[
            ("workspaceId", scope.project_id.as_str()),
            ("environment", scope.environment.as_str()),
            ("secretPath", scope.secret_path.as_str()),
            ("include_imports", include_imports),
        ]);
        let listed: ListResponse = Self::send(&url, request).await?;

        // Directly defined secrets shadow imported ones with the same key
        let mut seen: HashSet<String> =
            listed.secrets.iter().map(|s| s.secret_key.clone()).collect();
        let mut secrets = listed.secrets;
        for folder in listed.imports {
            for secret in folder.secrets {
                if seen.insert(secret.secret_key.clone()) {
                    secrets.push(secret);
                }
            }
        }
        Ok(secrets)
    }

    async fn create_secret(
        &self,
        session: &Session,
        scope: &SecretScope,
        name: &str,
        value: &str,
    ) -> BackendResult<BackendSecret> {
        self.write_secret(Method::POST, session, scope, name, Some(value)).await
    }

    async fn update_secret(
        &self,
        session: &Session,
        scope: &SecretScope,
        name: &str,
        value: &str,
    ) -> BackendResult<BackendSecret> {
        self.write_secret(Method::PATCH, session, scope, name, Some(value)).await
    }

    async fn delete_secret(
        &self,
        session: &Session,
        scope: &SecretScope,
        name: &str,
    ) -> BackendResult<BackendSecret> {
        self.write_secret(Method::DELETE, session, scope, name, None).await
    }

    fn backend_type(&self) -> &'static str {
        "infisical"
    }
}
