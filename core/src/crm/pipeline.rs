//! Read-only access to pipelines and their stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::crm::object_type::ObjectKind;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::check_success;
use crate::types::Page;

const PIPELINES_API_VERSION: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Timestamps and any other fields the API adds.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pipeline {
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct PipelineFactory {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl PipelineFactory {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: format!("{}/v{PIPELINES_API_VERSION}/pipelines", config.crm_base()),
            headers: config.auth_headers(),
        }
    }

    pub fn build_list_pipelines(&self, kind: ObjectKind) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            format!("{}/{}", self.base_url, kind.type_name()),
            self.headers.clone(),
        )
    }

    pub fn parse_list_pipelines(&self, response: HttpResponse) -> Result<Vec<Pipeline>, ApiError> {
        check_success(&response)?;
        let page: Page<Pipeline> =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        Ok(page.results)
    }
}
