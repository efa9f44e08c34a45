use anyhow::{bail, Context, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Project, ProjectData, Task};
use crate::runtime;

pub const BASE_URL: &str = "https://api.ticktick.com";

/// The two reads the TUI needs, in blocking form so loader threads can call them.
pub trait TaskService: Send + Sync {
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn project_bundle(&self, project_id: &str) -> Result<ProjectData>;
}

/// Bearer-token client for the TickTick open API.
#[derive(Clone)]
pub struct TickTickClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl TickTickClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(BASE_URL, access_token)
    }

    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        tracing::debug!(%method, endpoint, "api request");
        let mut request = self
            .client
            .request(method.clone(), format!("{}{}", self.base_url, endpoint))
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .with_context(|| format!("Failed to send {} {}", method, endpoint))
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        accept_created: bool,
    ) -> Result<T> {
        let response = Self::check_status(response, accept_created).await?;
        response.json().await.context("Failed to decode response")
    }

    async fn check_status(response: Response, accept_created: bool) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::OK || (accept_created && status == StatusCode::CREATED) {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "api error");
        if body.trim().is_empty() {
            bail!("API error: {}", status.as_u16());
        }
        bail!("API error: {}: {}", status.as_u16(), body.trim())
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        let resp = self.send::<()>(Method::GET, "/open/v1/project", None).await?;
        Self::read_json(resp, false).await
    }

    #[allow(dead_code)]
    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        let endpoint = format!("/open/v1/project/{project_id}");
        let resp = self.send::<()>(Method::GET, &endpoint, None).await?;
        Self::read_json(resp, false).await
    }

    pub async fn get_project_data(&self, project_id: &str) -> Result<ProjectData> {
        let endpoint = format!("/open/v1/project/{project_id}/data");
        let resp = self.send::<()>(Method::GET, &endpoint, None).await?;
        Self::read_json(resp, false).await
    }

    pub async fn create_project(&self, project: &Project) -> Result<Project> {
        let resp = self
            .send(Method::POST, "/open/v1/project", Some(project))
            .await?;
        Self::read_json(resp, true).await
    }

    pub async fn update_project(&self, project_id: &str, project: &Project) -> Result<Project> {
        let endpoint = format!("/open/v1/project/{project_id}");
        let resp = self.send(Method::POST, &endpoint, Some(project)).await?;
        Self::read_json(resp, true).await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let endpoint = format!("/open/v1/project/{project_id}");
        let resp = self.send::<()>(Method::DELETE, &endpoint, None).await?;
        Self::check_status(resp, true).await.map(|_| ())
    }

    pub async fn get_task(&self, project_id: &str, task_id: &str) -> Result<Task> {
        let endpoint = format!("/open/v1/project/{project_id}/task/{task_id}");
        let resp = self.send::<()>(Method::GET, &endpoint, None).await?;
        Self::read_json(resp, false).await
    }

    pub async fn create_task(&self, task: &Task) -> Result<Task> {
        let resp = self.send(Method::POST, "/open/v1/task", Some(task)).await?;
        Self::read_json(resp, true).await
    }

    pub async fn update_task(&self, task_id: &str, task: &Task) -> Result<Task> {
        let endpoint = format!("/open/v1/task/{task_id}");
        let resp = self.send(Method::POST, &endpoint, Some(task)).await?;
        Self::read_json(resp, true).await
    }

    pub async fn complete_task(&self, project_id: &str, task_id: &str) -> Result<()> {
        let endpoint = format!("/open/v1/project/{project_id}/task/{task_id}/complete");
        let resp = self.send::<()>(Method::POST, &endpoint, None).await?;
        Self::check_status(resp, true).await.map(|_| ())
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<()> {
        let endpoint = format!("/open/v1/project/{project_id}/task/{task_id}");
        let resp = self.send::<()>(Method::DELETE, &endpoint, None).await?;
        Self::check_status(resp, true).await.map(|_| ())
    }
}

impl TaskService for TickTickClient {
    fn list_projects(&self) -> Result<Vec<Project>> {
        runtime::block_on(self.get_projects())
    }

    fn project_bundle(&self, project_id: &str) -> Result<ProjectData> {
        runtime::block_on(self.get_project_data(project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    #[tokio::test]
    async fn get_projects_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/open/v1/project")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"p1","name":"Inbox","sortOrder":5},{"id":"p2","name":"Work","closed":true}]"#)
            .create_async()
            .await;

        let client = TickTickClient::with_base_url(server.url(), "tok-1");
        let projects = client.get_projects().await.unwrap();

        mock.assert_async().await;
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].sort_order, 5);
        assert!(projects[1].closed);
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/open/v1/project/p9/data")
            .with_status(404)
            .with_body("project not found")
            .create_async()
            .await;

        let client = TickTickClient::with_base_url(server.url(), "tok");
        let err = client.get_project_data("p9").await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("404"), "{msg}");
        assert!(msg.contains("project not found"), "{msg}");
    }

    #[tokio::test]
    async fn create_task_accepts_created_and_posts_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/open/v1/task")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"projectId":"p1","title":"Buy milk","priority":3}"#.to_string(),
            ))
            .with_status(201)
            .with_body(r#"{"id":"t1","projectId":"p1","title":"Buy milk","priority":3}"#)
            .create_async()
            .await;

        let client = TickTickClient::with_base_url(server.url(), "tok");
        let task = Task {
            project_id: "p1".into(),
            title: "Buy milk".into(),
            priority: Priority::Medium,
            ..Task::default()
        };
        let created = client.create_task(&task).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, "t1");
    }

    #[tokio::test]
    async fn get_requests_reject_created() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/open/v1/project/p1")
            .with_status(201)
            .with_body(r#"{"id":"p1","name":"x"}"#)
            .create_async()
            .await;

        let client = TickTickClient::with_base_url(server.url(), "tok");
        assert!(client.get_project("p1").await.is_err());
    }

    #[tokio::test]
    async fn complete_and_delete_hit_task_paths() {
        let mut server = mockito::Server::new_async().await;
        let complete = server
            .mock("POST", "/open/v1/project/p1/task/t1/complete")
            .with_status(200)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/open/v1/project/p1/task/t1")
            .with_status(200)
            .create_async()
            .await;

        let client = TickTickClient::with_base_url(server.url(), "tok");
        client.complete_task("p1", "t1").await.unwrap();
        client.delete_task("p1", "t1").await.unwrap();

        complete.assert_async().await;
        delete.assert_async().await;
    }

    #[test]
    fn blocking_service_reads_project_bundle() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/open/v1/project/p1/data")
            .with_status(200)
            .with_body(r#"{"project":{"id":"p1","name":"Inbox"},"tasks":[{"id":"t1","projectId":"p1","title":"A"}],"columns":[]}"#)
            .create();

        let client = TickTickClient::with_base_url(server.url(), "tok");
        let data = client.project_bundle("p1").unwrap();
        assert_eq!(data.project.name, "Inbox");
        assert_eq!(data.tasks[0].title, "A");
    }
}
