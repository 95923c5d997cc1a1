//! CRM records: request building for CRUD, list and search, plus the live
//! [`Record`] handle.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::crm::associations::{Associable, Definer, ObjectRef};
use crate::crm::object_type::ObjectKind;
use crate::crm::Crm;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::check_success;
use crate::types::{ObjectDocument, ObjectProperties, Page};

const TIMESTAMP_PROPERTY: &str = "hs_timestamp";
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Options for [`Crm::list_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Page size.
    pub limit: u32,
    /// Properties to return for each record; server defaults when empty.
    pub properties: Vec<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            properties: Vec::new(),
        }
    }
}

/// Query string of a list request.
#[derive(Serialize)]
struct ListQuery<'a> {
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<String>,
}

/// Builds object CRUD, list and search requests and parses their responses.
#[derive(Debug, Clone)]
pub struct ObjectFactory {
    crm_base: String,
    headers: Vec<(String, String)>,
}

impl ObjectFactory {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            crm_base: config.crm_base(),
            headers: config.auth_headers(),
        }
    }

    fn collection_path(&self, kind: ObjectKind) -> String {
        let descriptor = kind.descriptor();
        format!(
            "{}/v{}/objects/{}",
            self.crm_base, descriptor.api_version, descriptor.type_name
        )
    }

    fn object_path(&self, kind: ObjectKind, id: &str) -> String {
        format!("{}/{}", self.collection_path(kind), urlencoding::encode(id))
    }

    fn json_body<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
        serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// Build the POST creating a `kind` record.
    ///
    /// Engagements get `hs_timestamp` set to the current UTC time when the
    /// caller leaves it out. Any other missing required property is an error.
    pub fn build_new_object(
        &self,
        kind: ObjectKind,
        mut properties: Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        let descriptor = kind.descriptor();
        if descriptor.read_only {
            return Err(ApiError::ReadOnlyType(descriptor.type_name));
        }
        if descriptor.required_properties.contains(&TIMESTAMP_PROPERTY)
            && !properties.contains_key(TIMESTAMP_PROPERTY)
        {
            let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
            properties.insert(TIMESTAMP_PROPERTY.to_string(), Value::String(now));
        }
        let missing: Vec<String> = descriptor
            .required_properties
            .iter()
            .filter(|name| !properties.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::MissingRequiredProperties {
                type_name: descriptor.type_name,
                missing,
            });
        }

        let body = Self::json_body(&ObjectProperties { properties })?;
        Ok(HttpRequest::new(HttpMethod::Post, self.collection_path(kind), self.headers.clone()).json(body))
    }

    pub fn build_get_object(&self, kind: ObjectKind, id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.object_path(kind, id), self.headers.clone())
    }

    pub fn build_update_object(
        &self,
        kind: ObjectKind,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        let descriptor = kind.descriptor();
        if descriptor.read_only {
            return Err(ApiError::ReadOnlyType(descriptor.type_name));
        }
        let body = Self::json_body(&ObjectProperties {
            properties: properties.clone(),
        })?;
        Ok(HttpRequest::new(HttpMethod::Patch, self.object_path(kind, id), self.headers.clone()).json(body))
    }

    pub fn build_archive_object(&self, kind: ObjectKind, id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.object_path(kind, id), self.headers.clone())
    }

    /// Build the GET for one page. `after` is the opaque cursor from the
    /// previous page and is percent-encoded like every other query value.
    pub fn build_list_objects(
        &self,
        kind: ObjectKind,
        options: &ListOptions,
        after: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let query = ListQuery {
            limit: options.limit,
            after,
            properties: (!options.properties.is_empty()).then(|| options.properties.join(",")),
        };
        let query = serde_urlencoded::to_string(&query).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let path = format!("{}?{query}", self.collection_path(kind));
        Ok(HttpRequest::new(HttpMethod::Get, path, self.headers.clone()))
    }

    pub fn build_search(
        &self,
        kind: ObjectKind,
        filters: &Map<String, Value>,
        after: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let mut body = filters.clone();
        if let Some(after) = after {
            body.insert("after".to_string(), Value::String(after.to_string()));
        }
        let body = Self::json_body(&body)?;
        Ok(HttpRequest::new(
            HttpMethod::Post,
            format!("{}/search", self.collection_path(kind)),
            self.headers.clone(),
        )
        .json(body))
    }

    pub fn parse_object(&self, response: HttpResponse) -> Result<ObjectDocument, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_page(&self, response: HttpResponse) -> Result<Page<ObjectDocument>, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_archive_object(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)?;
        Ok(())
    }
}

/// A CRM record with its last known properties.
///
/// Mutating calls (`update`, `archive`) go to the server first and only
/// touch local state once the server accepted them.
#[derive(Clone)]
pub struct Record {
    kind: ObjectKind,
    id: String,
    archived: bool,
    properties: Map<String, Value>,
    crm: Crm,
}

impl Record {
    pub(crate) fn from_document(crm: Crm, kind: ObjectKind, document: ObjectDocument) -> Self {
        Self {
            kind,
            id: document.id,
            archived: document.archived,
            properties: document.properties,
            crm,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn archived(&self) -> bool {
        self.archived
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Update the record on the server and merge the echoed properties.
    pub fn update(&mut self, properties: Map<String, Value>) -> Result<(), ApiError> {
        let document = self.crm.update_object(self.kind, &self.id, &properties)?;
        self.properties.extend(document.properties);
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), ApiError> {
        self.crm.archive_object(self.kind, &self.id)?;
        self.archived = true;
        Ok(())
    }

    /// Associate this record to `other` with an inferred HubSpot-defined type.
    pub fn associate(&self, other: &dyn Associable) -> Result<Value, ApiError> {
        self.crm
            .create_association(self, other, Definer::HubspotDefined.as_str(), None)
    }

    pub fn associate_with(
        &self,
        other: &dyn Associable,
        definer: &str,
        association_type_id: Option<u32>,
    ) -> Result<Value, ApiError> {
        self.crm
            .create_association(self, other, definer, association_type_id)
    }

    pub fn remove_association(&self, other: &dyn Associable) -> Result<(), ApiError> {
        self.crm.remove_association(self, other)
    }
}

impl Associable for Record {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind, self.id.clone())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.kind, self.id)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("archived", &self.archived)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PageQuery {
    List(ListOptions),
    Search(Map<String, Value>),
}

#[derive(Debug)]
enum Cursor {
    Start,
    After(String),
    Done,
}

/// Iterator over every record of a listing or search, fetching pages on
/// demand.
#[derive(Debug)]
pub struct Records {
    crm: Crm,
    kind: ObjectKind,
    query: PageQuery,
    buffered: VecDeque<ObjectDocument>,
    cursor: Cursor,
}

impl Records {
    pub(crate) fn new(crm: Crm, kind: ObjectKind, query: PageQuery) -> Self {
        Self {
            crm,
            kind,
            query,
            buffered: VecDeque::new(),
            cursor: Cursor::Start,
        }
    }
}

impl Iterator for Records {
    type Item = Result<Record, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(document) = self.buffered.pop_front() {
                return Some(Ok(Record::from_document(self.crm.clone(), self.kind, document)));
            }
            let after = match &self.cursor {
                Cursor::Done => return None,
                Cursor::Start => None,
                Cursor::After(after) => Some(after.as_str()),
            };
            match self.crm.fetch_page(self.kind, &self.query, after) {
                Ok(page) => {
                    self.cursor = match page.next_after() {
                        Some(next) => Cursor::After(next.to_string()),
                        None => Cursor::Done,
                    };
                    self.buffered.extend(page.results);
                }
                Err(err) => {
                    self.cursor = Cursor::Done;
                    return Some(Err(err));
                }
            }
        }
    }
}
