//! Wire DTOs shared by the CRM endpoints.
//!
//! # Design
//! These mirror HubSpot's JSON shapes and are defined independently from the
//! mock-server crate; integration tests catch schema drift between the two.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crm::associations::Definer;

/// A CRM object as returned by the objects endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectDocument {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub archived: bool,
}

/// Request payload for creating or updating an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectProperties {
    pub properties: Map<String, Value>,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> Page<T> {
    /// Cursor for the following page, if there is one.
    pub fn next_after(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .map(|n| n.after.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<NextPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextPage {
    pub after: String,
}

/// One element of the association PUT body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssociationSpec {
    pub association_category: Definer,
    pub association_type_id: u32,
}
