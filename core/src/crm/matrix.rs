//! HubSpot's default association-type catalogue.
//!
//! Slot `i` (1-based) of [`ASSOCIATION_MATRIX`] holds the ordered identity
//! pair whose HUBSPOT_DEFINED association type id is `i`. Order matters:
//! `(Contact, Company)` and `(Company, Contact)` are distinct types, and for
//! company-to-company links the first company is the parent.

use std::ops::RangeInclusive;

use crate::crm::object_type::AssociationIdentity;
use crate::error::ApiError;

use crate::crm::object_type::AssociationIdentity::{
    Company, Contact, Deal, EngagementOrFile, LineItem, Ticket,
};

pub type IdentityPair = (AssociationIdentity, AssociationIdentity);

/// Ids reserved by HubSpot. Never inferred, never accepted as HUBSPOT_DEFINED.
pub const RESERVED_TYPE_IDS: RangeInclusive<u32> = 21..=24;

pub const ASSOCIATION_MATRIX: [Option<IdentityPair>; 28] = [
    Some((Contact, Company)),
    Some((Company, Contact)),
    Some((Deal, Contact)),
    Some((Contact, Deal)),
    Some((Deal, Company)),
    Some((Company, Deal)),
    Some((Company, EngagementOrFile)),
    Some((EngagementOrFile, Company)),
    Some((Contact, EngagementOrFile)),
    Some((EngagementOrFile, Contact)),
    Some((Deal, EngagementOrFile)),
    Some((EngagementOrFile, Deal)),
    // parent to child
    Some((Company, Company)),
    // child to parent
    Some((Company, Company)),
    Some((Contact, Ticket)),
    Some((Ticket, Contact)),
    Some((Ticket, EngagementOrFile)),
    Some((EngagementOrFile, Ticket)),
    Some((Deal, LineItem)),
    Some((LineItem, Deal)),
    None,
    None,
    None,
    None,
    Some((Company, Ticket)),
    Some((Ticket, Company)),
    Some((Deal, Ticket)),
    Some((Ticket, Deal)),
];

/// The pair stored at 1-based slot `id`, if the slot exists and is assigned.
pub fn slot(id: u32) -> Option<IdentityPair> {
    let index = usize::try_from(id).ok()?.checked_sub(1)?;
    ASSOCIATION_MATRIX.get(index).copied().flatten()
}

pub fn is_reserved_slot(id: u32) -> bool {
    RESERVED_TYPE_IDS.contains(&id)
}

/// True when `id` may be sent with the HUBSPOT_DEFINED category.
pub fn is_hubspot_defined(id: u32) -> bool {
    (1..=ASSOCIATION_MATRIX.len() as u32).contains(&id) && !is_reserved_slot(id)
}

/// Default association type id for linking `from` to `to`, in that order.
///
/// Returns the first matching slot; reserved slots never match.
pub fn infer_association_type_id(
    from: AssociationIdentity,
    to: AssociationIdentity,
) -> Result<u32, ApiError> {
    ASSOCIATION_MATRIX
        .iter()
        .position(|entry| *entry == Some((from, to)))
        .map(|index| index as u32 + 1)
        .ok_or(ApiError::NoMatrixEntry { from, to })
}
