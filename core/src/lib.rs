//! Synchronous HubSpot CRM client core.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). Executing operations hand
//! each request to a caller-supplied [`Transport`], so the core stays
//! deterministic and testable.
//!
//! # Design
//! - Object kinds are a closed enum with a static descriptor table; engagement
//!   kinds and files collapse to one association identity.
//! - The association matrix is fixed data. Association type ids are validated
//!   or inferred before any request exists; invalid input never reaches the
//!   transport.
//! - Each area is split into a pure factory (`build_*` / `parse_*`) and an
//!   executing facade ([`Crm`], [`Files`]), so the I/O boundary is explicit.
//! - Transport failures are surfaced unchanged; the core never retries.

pub mod client;
pub mod config;
pub mod crm;
pub mod error;
pub mod files;
pub mod http;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::HubSpotClient;
pub use config::ClientConfig;
pub use crm::associations::{Associable, AssociationRequest, Associations, Definer, ObjectRef};
pub use crm::matrix::{infer_association_type_id, is_reserved_slot, ASSOCIATION_MATRIX};
pub use crm::object_type::{
    association_identity_of, descriptor_of, AssociationIdentity, ObjectDescriptor, ObjectKind,
    FILE_TYPE_NAME,
};
pub use crm::pipeline::{Pipeline, Stage};
pub use crm::record::{ListOptions, Record, Records};
pub use crm::Crm;
pub use error::ApiError;
pub use files::{File, FileUpload, FileUploadOptions, Files, Folder};
pub use http::{FormPart, FormValue, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError};
