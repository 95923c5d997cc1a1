//! File uploads.
//!
//! Uploaded files can be associated like any CRM record: they travel under
//! the `files` type name and share the engagement association identity.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::crm::associations::{Associable, ObjectRef};
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{check_success, send, Transport};

const ACCESS_VALUES: &[&str] = &["PRIVATE", "PUBLIC_INDEXABLE", "PUBLIC_NOT_INDEXABLE"];
const DUPLICATE_STRATEGY_VALUES: &[&str] = &["REJECT", "RETURN_EXISTING", "NONE"];
const DUPLICATE_SCOPE_VALUES: &[&str] = &["ENTIRE_PORTAL", "EXACT_FOLDER"];

/// A file stored in HubSpot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct File {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Associable for File {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::file(self.id.clone())
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<File {} {}>",
            self.name.as_deref().unwrap_or("?"),
            self.file_type.as_deref().unwrap_or("?")
        )
    }
}

/// Upload options. String-valued options are validated case-insensitively
/// and sent upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUploadOptions {
    /// One of PRIVATE, PUBLIC_INDEXABLE, PUBLIC_NOT_INDEXABLE.
    pub access: String,
    pub ttl: Option<String>,
    pub overwrite: Option<bool>,
    /// One of REJECT, RETURN_EXISTING, NONE.
    pub duplicate_validation_strategy: Option<String>,
    /// One of ENTIRE_PORTAL, EXACT_FOLDER.
    pub duplicate_validation_scope: Option<String>,
}

impl FileUploadOptions {
    pub fn new(access: &str) -> Self {
        Self {
            access: access.to_string(),
            ..Self::default()
        }
    }

    /// Validate every option and render the `options` form part. All
    /// problems are reported together.
    pub fn to_json(&self) -> Result<String, ApiError> {
        let mut errors = Vec::new();
        let mut options = Map::new();

        match normalize(&self.access, ACCESS_VALUES) {
            Some(access) => {
                options.insert("access".into(), Value::String(access));
            }
            None => errors.push(format!("access must be one of {}", ACCESS_VALUES.join(", "))),
        }
        if let Some(ttl) = &self.ttl {
            options.insert("ttl".into(), Value::String(ttl.clone()));
        }
        if let Some(overwrite) = self.overwrite {
            options.insert("overwrite".into(), Value::Bool(overwrite));
        }
        if let Some(strategy) = &self.duplicate_validation_strategy {
            match normalize(strategy, DUPLICATE_STRATEGY_VALUES) {
                Some(strategy) => {
                    options.insert("duplicateValidationStrategy".into(), Value::String(strategy));
                }
                None => errors.push(format!(
                    "duplicate_validation_strategy must be one of {}",
                    DUPLICATE_STRATEGY_VALUES.join(", ")
                )),
            }
        }
        if let Some(scope) = &self.duplicate_validation_scope {
            match normalize(scope, DUPLICATE_SCOPE_VALUES) {
                Some(scope) => {
                    options.insert("duplicateValidationScope".into(), Value::String(scope));
                }
                None => errors.push(format!(
                    "duplicate_validation_scope must be one of {}",
                    DUPLICATE_SCOPE_VALUES.join(", ")
                )),
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::InvalidFileOptions(errors));
        }
        serde_json::to_string(&options).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

fn normalize(value: &str, allowed: &[&str]) -> Option<String> {
    let upper = value.to_ascii_uppercase();
    allowed.contains(&upper.as_str()).then_some(upper)
}

/// Destination folder, by id or by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Folder {
    Id(u64),
    Path(String),
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub data: Vec<u8>,
    pub file_name: String,
    pub folder: Folder,
    pub charset_hunch: Option<String>,
    pub options: FileUploadOptions,
}

/// Builds upload requests and parses their responses.
#[derive(Debug, Clone)]
pub struct FileFactory {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl FileFactory {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: format!("{}/files/v3/files", config.base_url),
            headers: config.auth_headers(),
        }
    }

    pub fn build_upload_file(&self, upload: FileUpload) -> Result<HttpRequest, ApiError> {
        let options = upload.options.to_json()?;
        let mut form = vec![
            FormPart::file("file", upload.file_name.clone(), upload.data),
            FormPart::text("fileName", upload.file_name),
            FormPart::text("options", options),
        ];
        form.push(match upload.folder {
            Folder::Id(id) => FormPart::text("folderId", id.to_string()),
            Folder::Path(path) => FormPart::text("folderPath", path),
        });
        if let Some(charset) = upload.charset_hunch {
            form.push(FormPart::text("charsetHunch", charset));
        }
        Ok(HttpRequest::new(HttpMethod::Post, self.base_url.clone(), self.headers.clone()).multipart(form))
    }

    pub fn parse_upload_file(&self, response: HttpResponse) -> Result<File, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

/// Executes uploads through the shared transport.
#[derive(Clone)]
pub struct Files {
    transport: Arc<dyn Transport>,
    factory: FileFactory,
}

impl Files {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            factory: FileFactory::new(config),
        }
    }

    pub fn factory(&self) -> &FileFactory {
        &self.factory
    }

    pub fn upload(&self, upload: FileUpload) -> Result<File, ApiError> {
        let request = self.factory.build_upload_file(upload)?;
        let response = send(self.transport.as_ref(), request)?;
        self.factory.parse_upload_file(response)
    }
}

impl fmt::Debug for Files {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Files")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}
