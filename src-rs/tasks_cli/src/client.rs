use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::CliError;
use crate::models::{
    LoginRequest, MessageResponse, Profile, SignupRequest, TaskInfo, TitleRequest, TokenResponse,
};

/// Everything the views need from the server.
pub trait TaskApi: Sync {
    fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), CliError>;
    fn login(&self, email: &str, password: &str) -> Result<String, CliError>;
    fn profile(&self) -> Result<Profile, CliError>;
    fn list_tasks(&self) -> Result<Vec<TaskInfo>, CliError>;
    fn create_task(&self, title: &str) -> Result<TaskInfo, CliError>;
    fn update_task(&self, id: &str, title: &str) -> Result<TaskInfo, CliError>;
    fn delete_task(&self, id: &str) -> Result<(), CliError>;
    /// Revokes the current token on the server.
    fn logout(&self) -> Result<(), CliError>;
}

pub struct HttpClient {
    pub base_url: String,
    pub token: Option<String>,
    client: Client,
}

impl HttpClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, CliError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, CliError> {
        let resp = self.authorized(builder).send()?;
        let resp = check(resp)?;
        Ok(resp.json::<T>()?)
    }
}

/// Turns a non-success response into `CliError::Http`, preferring the
/// server's `{message}` body over raw text.
fn check(resp: Response) -> Result<Response, CliError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<MessageResponse>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    tracing::debug!(status = status.as_u16(), %message, "request rejected");
    Err(CliError::Http {
        status: status.as_u16(),
        message,
    })
}

impl TaskApi for HttpClient {
    fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), CliError> {
        let req = SignupRequest {
            name,
            email,
            password,
        };
        let _: MessageResponse = self.send(self.client.post(self.url("/auth/signup")).json(&req))?;
        Ok(())
    }

    fn login(&self, email: &str, password: &str) -> Result<String, CliError> {
        let req = LoginRequest { email, password };
        let resp: TokenResponse = self.send(self.client.post(self.url("/auth/login")).json(&req))?;
        Ok(resp.token)
    }

    fn profile(&self) -> Result<Profile, CliError> {
        self.send(self.client.get(self.url("/auth/profile")))
    }

    fn list_tasks(&self) -> Result<Vec<TaskInfo>, CliError> {
        self.send(self.client.get(self.url("/tasks")))
    }

    fn create_task(&self, title: &str) -> Result<TaskInfo, CliError> {
        self.send(
            self.client
                .post(self.url("/tasks"))
                .json(&TitleRequest { title }),
        )
    }

    fn update_task(&self, id: &str, title: &str) -> Result<TaskInfo, CliError> {
        self.send(
            self.client
                .put(self.url(&format!("/tasks/{}", id)))
                .json(&TitleRequest { title }),
        )
    }

    fn delete_task(&self, id: &str) -> Result<(), CliError> {
        let _: MessageResponse = self.send(self.client.delete(self.url(&format!("/tasks/{}", id))))?;
        Ok(())
    }

    fn logout(&self) -> Result<(), CliError> {
        let _: MessageResponse = self.send(self.client.post(self.url("/auth/logout")))?;
        Ok(())
    }
}
