use reqwest::{redirect, Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::job::{AccessCredential, Job};

const SEARCH_JOBS_PATH: &str = "api/profiles/v2/search/jobs.json";
const USER_INFO_PATH: &str = "api/auth/v1/info.json";

/// One page of a job search. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery<'a> {
    pub query: &'a str,
    pub start: u32,
    pub end: u32,
}

impl JobQuery<'_> {
    fn paging(&self) -> String {
        format!("{};{}", self.start, self.end)
    }
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub auth_user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct JobsClient {
    http: Client,
    base: Url,
}

impl JobsClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = ClientBuilder::new()
            .redirect(redirect::Policy::limited(5))
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(http, &config.base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub async fn search_jobs(
        &self,
        access: &AccessCredential,
        query: &JobQuery<'_>,
    ) -> Result<Vec<Job>, ApiError> {
        let url = self.base.join(SEARCH_JOBS_PATH)?;
        let paging = query.paging();
        debug!(q = query.query, paging = %paging, "requesting jobs");
        let response = self
            .http
            .get(url)
            .bearer_auth(&access.access_token)
            .query(&[("q", query.query), ("paging", paging.as_str())])
            .send()
            .await?;
        let body: JobsResponse = decode(response).await?;
        info!(count = body.jobs.len(), q = query.query, "retrieved jobs");
        Ok(body.jobs)
    }

    pub async fn user_info(&self, access: &AccessCredential) -> Result<UserInfo, ApiError> {
        let url = self.base.join(USER_INFO_PATH)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&access.access_token)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_sends_start_and_end() {
        let first = JobQuery {
            query: "rust",
            start: 0,
            end: 20,
        };
        assert_eq!(first.paging(), "0;20");

        let second = JobQuery {
            query: "rust",
            start: 20,
            end: 40,
        };
        assert_eq!(second.paging(), "20;40");
    }

    #[test]
    fn base_url_keeps_sub_path() {
        let client = JobsClient::with_client(Client::new(), "http://localhost:9000/proxy").unwrap();
        assert_eq!(
            client.base.join(SEARCH_JOBS_PATH).unwrap().as_str(),
            "http://localhost:9000/proxy/api/profiles/v2/search/jobs.json"
        );
    }
}
