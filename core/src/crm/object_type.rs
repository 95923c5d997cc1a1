//! The closed set of CRM object kinds and their descriptors.
//!
//! # Design
//! Every kind owns a descriptor used to shape its CRUD endpoints. For
//! association purposes the kinds are coarsened into an
//! [`AssociationIdentity`]: the five engagement kinds and files all share
//! `EngagementOrFile`, every other kind maps to itself.

use std::fmt;
use std::str::FromStr;

use crate::crm::associations::Associable;
use crate::error::ApiError;

/// Type name used on the wire for uploaded files.
pub const FILE_TYPE_NAME: &str = "files";

const ENGAGEMENT_API_VERSION: u8 = 4;
const ENGAGEMENT_REQUIRED_PROPERTIES: &[&str] = &["hs_timestamp"];

/// Static facts about one object kind.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub kind: ObjectKind,
    /// Wire identifier, e.g. `companies`.
    pub type_name: &'static str,
    pub friendly_name: &'static str,
    pub api_version: u8,
    /// Properties that must be present when creating the object.
    pub required_properties: &'static [&'static str],
    pub read_only: bool,
}

const fn standard(kind: ObjectKind, type_name: &'static str, friendly_name: &'static str) -> ObjectDescriptor {
    ObjectDescriptor {
        kind,
        type_name,
        friendly_name,
        api_version: 3,
        required_properties: &[],
        read_only: false,
    }
}

const fn engagement(kind: ObjectKind, type_name: &'static str, friendly_name: &'static str) -> ObjectDescriptor {
    ObjectDescriptor {
        kind,
        type_name,
        friendly_name,
        api_version: ENGAGEMENT_API_VERSION,
        required_properties: ENGAGEMENT_REQUIRED_PROPERTIES,
        read_only: false,
    }
}

static COMPANY: ObjectDescriptor = standard(ObjectKind::Company, "companies", "Company");
static CONTACT: ObjectDescriptor = standard(ObjectKind::Contact, "contacts", "Contact");
static DEAL: ObjectDescriptor = standard(ObjectKind::Deal, "deals", "Deal");
static FEEDBACK_SUBMISSION: ObjectDescriptor = ObjectDescriptor {
    read_only: true,
    ..standard(
        ObjectKind::FeedbackSubmission,
        "feedback_submissions",
        "Feedback Submission",
    )
};
static LINE_ITEM: ObjectDescriptor = standard(ObjectKind::LineItem, "line_items", "Line Item");
static PRODUCT: ObjectDescriptor = standard(ObjectKind::Product, "products", "Product");
static TICKET: ObjectDescriptor = ObjectDescriptor {
    required_properties: &["hs_pipeline_stage"],
    ..standard(ObjectKind::Ticket, "tickets", "Ticket")
};
static CALL: ObjectDescriptor = engagement(ObjectKind::Call, "calls", "Call");
static EMAIL: ObjectDescriptor = engagement(ObjectKind::Email, "emails", "Email");
static MEETING: ObjectDescriptor = engagement(ObjectKind::Meeting, "meetings", "Meeting");
static NOTE: ObjectDescriptor = engagement(ObjectKind::Note, "notes", "Note");
static TASK: ObjectDescriptor = engagement(ObjectKind::Task, "tasks", "Task");

/// A concrete CRM record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Company,
    Contact,
    Deal,
    FeedbackSubmission,
    LineItem,
    Product,
    Ticket,
    Call,
    Email,
    Meeting,
    Note,
    Task,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 12] = [
        ObjectKind::Company,
        ObjectKind::Contact,
        ObjectKind::Deal,
        ObjectKind::FeedbackSubmission,
        ObjectKind::LineItem,
        ObjectKind::Product,
        ObjectKind::Ticket,
        ObjectKind::Call,
        ObjectKind::Email,
        ObjectKind::Meeting,
        ObjectKind::Note,
        ObjectKind::Task,
    ];

    pub const ENGAGEMENTS: [ObjectKind; 5] = [
        ObjectKind::Call,
        ObjectKind::Email,
        ObjectKind::Meeting,
        ObjectKind::Note,
        ObjectKind::Task,
    ];

    pub fn descriptor(self) -> &'static ObjectDescriptor {
        match self {
            ObjectKind::Company => &COMPANY,
            ObjectKind::Contact => &CONTACT,
            ObjectKind::Deal => &DEAL,
            ObjectKind::FeedbackSubmission => &FEEDBACK_SUBMISSION,
            ObjectKind::LineItem => &LINE_ITEM,
            ObjectKind::Product => &PRODUCT,
            ObjectKind::Ticket => &TICKET,
            ObjectKind::Call => &CALL,
            ObjectKind::Email => &EMAIL,
            ObjectKind::Meeting => &MEETING,
            ObjectKind::Note => &NOTE,
            ObjectKind::Task => &TASK,
        }
    }

    pub fn type_name(self) -> &'static str {
        self.descriptor().type_name
    }

    pub fn is_engagement(self) -> bool {
        Self::ENGAGEMENTS.contains(&self)
    }

    pub fn association_identity(self) -> AssociationIdentity {
        match self {
            ObjectKind::Company => AssociationIdentity::Company,
            ObjectKind::Contact => AssociationIdentity::Contact,
            ObjectKind::Deal => AssociationIdentity::Deal,
            ObjectKind::FeedbackSubmission => AssociationIdentity::FeedbackSubmission,
            ObjectKind::LineItem => AssociationIdentity::LineItem,
            ObjectKind::Product => AssociationIdentity::Product,
            ObjectKind::Ticket => AssociationIdentity::Ticket,
            ObjectKind::Call
            | ObjectKind::Email
            | ObjectKind::Meeting
            | ObjectKind::Note
            | ObjectKind::Task => AssociationIdentity::EngagementOrFile,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().friendly_name)
    }
}

impl FromStr for ObjectKind {
    type Err = ApiError;

    /// Parse a wire type name such as `companies`.
    fn from_str(type_name: &str) -> Result<Self, Self::Err> {
        descriptor_of(type_name).map(|d| d.kind)
    }
}

/// Look up the descriptor for a wire type name.
pub fn descriptor_of(type_name: &str) -> Result<&'static ObjectDescriptor, ApiError> {
    ObjectKind::ALL
        .iter()
        .map(|kind| kind.descriptor())
        .find(|d| d.type_name == type_name)
        .ok_or_else(|| ApiError::UnknownType(type_name.to_string()))
}

/// Classification used only for association matrix lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationIdentity {
    Company,
    Contact,
    Deal,
    FeedbackSubmission,
    LineItem,
    Product,
    Ticket,
    /// Calls, emails, meetings, notes, tasks and files.
    EngagementOrFile,
}

impl fmt::Display for AssociationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssociationIdentity::Company => "companies",
            AssociationIdentity::Contact => "contacts",
            AssociationIdentity::Deal => "deals",
            AssociationIdentity::FeedbackSubmission => "feedback_submissions",
            AssociationIdentity::LineItem => "line_items",
            AssociationIdentity::Product => "products",
            AssociationIdentity::Ticket => "tickets",
            AssociationIdentity::EngagementOrFile => "engagements",
        };
        f.write_str(name)
    }
}

/// The identity `target` is looked up under in the association matrix.
pub fn association_identity_of<A: Associable + ?Sized>(target: &A) -> AssociationIdentity {
    target.object_ref().identity
}
