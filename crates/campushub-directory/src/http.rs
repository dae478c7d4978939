//! HTTP implementation of the directory store against the portal backend.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use campushub_core::config::directory::DirectoryConfig;
use campushub_core::types::id::{CourseId, PrincipalId};
use campushub_core::{AppError, AppResult};
use campushub_entity::{Principal, Role};

use super::store::{DirectoryStore, MembershipSnapshot};

/// Directory store backed by the portal backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
}

/// Wire format of `GET /principals/{id}`.
#[derive(Debug, Deserialize)]
struct PrincipalDto {
    id: PrincipalId,
    display_name: String,
    role: Role,
    department: String,
    courses: HashSet<CourseId>,
    active: bool,
}

/// Wire format of `GET /principals/{id}/memberships`.
#[derive(Debug, Deserialize)]
struct MembershipDto {
    department: String,
    courses: HashSet<CourseId>,
}

/// Wire format of `GET /courses/{id}` and `GET /courses` entries.
#[derive(Debug, Deserialize)]
struct CourseDto {
    id: CourseId,
    label: String,
}

impl HttpDirectory {
    /// Creates a new client from directory configuration.
    pub fn new(config: &DirectoryConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Directory client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issues a GET and deserializes the body, mapping transport failures
    /// to `StoreUnavailable` and 404s to `NotFound`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> AppResult<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Directory query");
        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::with_source(
                campushub_core::error::ErrorKind::StoreUnavailable,
                format!("Directory store unreachable: {e}"),
                e,
            )
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.json::<T>().await.map_err(|e| {
                    AppError::with_source(
                        campushub_core::error::ErrorKind::Serialization,
                        format!("Directory response decode failed: {e}"),
                        e,
                    )
                })?;
                Ok(Some(body))
            }
            status if status.is_server_error() => Err(AppError::store_unavailable(format!(
                "Directory store returned {status} for {path}"
            ))),
            status => Err(AppError::internal(format!(
                "Unexpected directory response {status} for {path}"
            ))),
        }
    }
}

#[async_trait]
impl DirectoryStore for HttpDirectory {
    async fn fetch_principal(&self, id: PrincipalId) -> AppResult<Principal> {
        let dto: PrincipalDto = self
            .get_json(&format!("/principals/{id}"))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Principal not found: {id}")))?;

        Ok(Principal {
            id: dto.id,
            display_name: dto.display_name,
            role: dto.role,
            department: dto.department,
            courses: dto.courses,
            active: dto.active,
        })
    }

    async fn membership_snapshot(&self, id: PrincipalId) -> AppResult<MembershipSnapshot> {
        let dto: MembershipDto = self
            .get_json(&format!("/principals/{id}/memberships"))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Principal not found: {id}")))?;

        Ok(MembershipSnapshot {
            department: dto.department,
            courses: dto.courses,
        })
    }

    async fn course_exists(&self, id: CourseId) -> AppResult<bool> {
        Ok(self
            .get_json::<CourseDto>(&format!("/courses/{id}"))
            .await?
            .is_some())
    }

    async fn course_label(&self, id: CourseId) -> AppResult<Option<String>> {
        Ok(self
            .get_json::<CourseDto>(&format!("/courses/{id}"))
            .await?
            .map(|c| c.label))
    }

    async fn all_course_ids(&self) -> AppResult<Vec<CourseId>> {
        let courses: Vec<CourseDto> = self
            .get_json("/courses")
            .await?
            .unwrap_or_default();
        Ok(courses.into_iter().map(|c| c.id).collect())
    }
}
