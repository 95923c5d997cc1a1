//! Association request builder and response parser.
//!
//! # Design
//! `Associations` is stateless apart from the base URL and auth headers. All
//! validation (definer, type id, inference) happens while building the
//! request, so a rejected association never reaches the transport. Inference
//! uses each side's association identity; the wire path uses each side's own
//! type name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::crm::matrix;
use crate::crm::object_type::{descriptor_of, AssociationIdentity, ObjectKind, FILE_TYPE_NAME};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::check_success;
use crate::types::AssociationSpec;

/// Whose catalogue an association type id belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Definer {
    #[default]
    HubspotDefined,
    UserDefined,
    IntegratorDefined,
}

impl Definer {
    pub fn as_str(self) -> &'static str {
        match self {
            Definer::HubspotDefined => "HUBSPOT_DEFINED",
            Definer::UserDefined => "USER_DEFINED",
            Definer::IntegratorDefined => "INTEGRATOR_DEFINED",
        }
    }
}

impl fmt::Display for Definer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Definer {
    type Err = ApiError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HUBSPOT_DEFINED" => Ok(Definer::HubspotDefined),
            "USER_DEFINED" => Ok(Definer::UserDefined),
            "INTEGRATOR_DEFINED" => Ok(Definer::IntegratorDefined),
            _ => Err(ApiError::InvalidDefiner(s.to_string())),
        }
    }
}

/// One side of an association: wire type name, record id, and the identity
/// used for matrix lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub type_name: &'static str,
    pub id: String,
    pub identity: AssociationIdentity,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: impl Into<String>) -> Self {
        Self {
            type_name: kind.type_name(),
            id: id.into(),
            identity: kind.association_identity(),
        }
    }

    pub fn file(id: impl Into<String>) -> Self {
        Self {
            type_name: FILE_TYPE_NAME,
            id: id.into(),
            identity: AssociationIdentity::EngagementOrFile,
        }
    }

    /// Build a reference from a wire type name; `files` is accepted.
    pub fn parse(type_name: &str, id: impl Into<String>) -> Result<Self, ApiError> {
        if type_name == FILE_TYPE_NAME {
            return Ok(Self::file(id));
        }
        let descriptor = descriptor_of(type_name)?;
        Ok(Self::new(descriptor.kind, id))
    }
}

/// Record ids are server-assigned numbers; anything else would escape its
/// path segment.
pub fn validate_record_id(id: &str) -> Result<(), ApiError> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidRecordId(id.to_string()));
    }
    Ok(())
}

/// Anything that can sit on either end of an association.
pub trait Associable {
    fn object_ref(&self) -> ObjectRef;
}

impl Associable for ObjectRef {
    fn object_ref(&self) -> ObjectRef {
        self.clone()
    }
}

/// A validated association with its type id resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRequest {
    pub from: ObjectRef,
    pub to: ObjectRef,
    pub definer: Definer,
    pub association_type_id: u32,
}

impl AssociationRequest {
    /// Validate the definer and type id, inferring the id from the matrix
    /// when it is absent and the definer is HUBSPOT_DEFINED.
    pub fn resolve(
        from: ObjectRef,
        to: ObjectRef,
        definer: &str,
        association_type_id: Option<u32>,
    ) -> Result<Self, ApiError> {
        let definer: Definer = definer.parse()?;

        let association_type_id = match (definer, association_type_id) {
            (Definer::HubspotDefined, Some(id)) if !matrix::is_hubspot_defined(id) => {
                return Err(ApiError::InvalidAssociationType(id));
            }
            (_, Some(id)) => id,
            (Definer::HubspotDefined, None) => {
                let id = matrix::infer_association_type_id(from.identity, to.identity)?;
                tracing::debug!(
                    from = %from.identity,
                    to = %to.identity,
                    association_type_id = id,
                    "inferred association type"
                );
                id
            }
            (other, None) => return Err(ApiError::MissingAssociationType(other)),
        };

        Ok(Self {
            from,
            to,
            definer,
            association_type_id,
        })
    }

    pub fn spec(&self) -> AssociationSpec {
        AssociationSpec {
            association_category: self.definer,
            association_type_id: self.association_type_id,
        }
    }
}

/// Builds association create/remove requests and parses their responses.
#[derive(Debug, Clone)]
pub struct Associations {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl Associations {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: format!("{}/v4/objects", config.crm_base()),
            headers: config.auth_headers(),
        }
    }

    fn association_path(&self, from: &ObjectRef, to: &ObjectRef) -> Result<String, ApiError> {
        validate_record_id(&from.id)?;
        validate_record_id(&to.id)?;
        Ok(format!(
            "{}/{}/{}/associations/{}/{}",
            self.base_url, from.type_name, from.id, to.type_name, to.id
        ))
    }

    /// Build the PUT that links `from` to `to`.
    ///
    /// `definer` is matched case-insensitively. With `None` as the type id
    /// and a HUBSPOT_DEFINED definer the id is inferred from the ordered
    /// identity pair, so swapping `from` and `to` can change it. Both record
    /// ids must be numeric.
    pub fn build_create_association(
        &self,
        from: &dyn Associable,
        to: &dyn Associable,
        definer: &str,
        association_type_id: Option<u32>,
    ) -> Result<HttpRequest, ApiError> {
        let request = AssociationRequest::resolve(from.object_ref(), to.object_ref(), definer, association_type_id)?;
        self.build_association_request(&request)
    }

    pub fn build_association_request(&self, request: &AssociationRequest) -> Result<HttpRequest, ApiError> {
        let path = self.association_path(&request.from, &request.to)?;
        let body =
            serde_json::to_string(&[request.spec()]).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Put, path, self.headers.clone()).json(body))
    }

    pub fn build_remove_association(&self, from: &dyn Associable, to: &dyn Associable) -> Result<HttpRequest, ApiError> {
        let path = self.association_path(&from.object_ref(), &to.object_ref())?;
        Ok(HttpRequest::new(HttpMethod::Delete, path, self.headers.clone()))
    }

    /// Returns the response body as JSON (`Null` when the body is empty).
    pub fn parse_create_association(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_success(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_remove_association(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)?;
        Ok(())
    }
}
