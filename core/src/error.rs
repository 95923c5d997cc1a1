//! Error types for the HubSpot client.
//!
//! # Design
//! Association validation failures each get their own variant so callers can
//! tell "fix the arguments" apart from "the server said no". All of them are
//! raised before any request is built. Server and network failures arrive as
//! [`TransportError`] and are passed through untouched.

use thiserror::Error;

use crate::crm::associations::Definer;
use crate::crm::object_type::AssociationIdentity;
use crate::transport::TransportError;

/// Errors returned by the client's build, parse and executing methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The definer is not one of the three association categories.
    #[error("invalid association definer {0:?}: expected HUBSPOT_DEFINED, USER_DEFINED or INTEGRATOR_DEFINED")]
    InvalidDefiner(String),

    /// A HUBSPOT_DEFINED association named an id outside the built-in
    /// catalogue, or one of the reserved ids.
    #[error("association type {0} is not a HubSpot-defined association type")]
    InvalidAssociationType(u32),

    #[error("no default association exists from {from} to {to}; supply an explicit association type")]
    NoMatrixEntry {
        from: AssociationIdentity,
        to: AssociationIdentity,
    },

    #[error("{0} associations require an explicit association type")]
    MissingAssociationType(Definer),

    #[error("unknown object type {0:?}")]
    UnknownType(String),

    /// A record id that is empty or not made of ASCII digits.
    #[error("invalid record id {0:?}: expected a numeric id")]
    InvalidRecordId(String),

    #[error("missing required properties for {type_name}: {}", .missing.join(", "))]
    MissingRequiredProperties {
        type_name: &'static str,
        missing: Vec<String>,
    },

    #[error("{0} records are read-only")]
    ReadOnlyType(&'static str),

    #[error("invalid file upload options: {}", .0.join(" | "))]
    InvalidFileOptions(Vec<String>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// True for failures detected locally, before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidDefiner(_)
                | ApiError::InvalidAssociationType(_)
                | ApiError::NoMatrixEntry { .. }
                | ApiError::MissingAssociationType(_)
                | ApiError::UnknownType(_)
                | ApiError::InvalidRecordId(_)
                | ApiError::MissingRequiredProperties { .. }
                | ApiError::ReadOnlyType(_)
                | ApiError::InvalidFileOptions(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            ApiError::InvalidAssociationType(22).to_string(),
            "association type 22 is not a HubSpot-defined association type"
        );
        assert_eq!(
            ApiError::NoMatrixEntry {
                from: AssociationIdentity::Product,
                to: AssociationIdentity::Contact,
            }
            .to_string(),
            "no default association exists from products to contacts; supply an explicit association type"
        );
        assert_eq!(
            ApiError::MissingAssociationType(Definer::UserDefined).to_string(),
            "USER_DEFINED associations require an explicit association type"
        );
        assert_eq!(
            ApiError::MissingRequiredProperties {
                type_name: "tickets",
                missing: vec!["hs_pipeline_stage".into()],
            }
            .to_string(),
            "missing required properties for tickets: hs_pipeline_stage"
        );
        assert_eq!(
            ApiError::InvalidFileOptions(vec!["a".into(), "b".into()]).to_string(),
            "invalid file upload options: a | b"
        );
    }

    #[test]
    fn transport_errors_display_unchanged() {
        let inner = TransportError::Status {
            status: 404,
            body: "not found".into(),
        };
        let err = ApiError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        assert!(!err.is_validation());
        assert!(ApiError::InvalidDefiner("BOGUS".into()).is_validation());
        assert!(ApiError::InvalidRecordId("1/2".into()).is_validation());
    }
}
