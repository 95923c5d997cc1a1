//! Entry point tying configuration, transport and the API areas together.
//!
//! # Design
//! `HubSpotClient` owns nothing but an explicitly constructed
//! [`ClientConfig`] and the caller's [`Transport`]. Dropping the client (and
//! every `Record` cloned from it) releases the transport.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::crm::associations::Associable;
use crate::crm::object_type::ObjectKind;
use crate::crm::record::Record;
use crate::crm::Crm;
use crate::error::ApiError;
use crate::files::{File, Files};
use crate::transport::Transport;

const ATTACHMENT_IDS_PROPERTY: &str = "hs_attachment_ids";

#[derive(Debug, Clone)]
pub struct HubSpotClient {
    config: ClientConfig,
    crm: Crm,
    files: Files,
}

impl HubSpotClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            crm: Crm::new(&config, transport.clone()),
            files: Files::new(&config, transport),
            config,
        }
    }

    /// Build a client from `HUBSPOT_*` environment variables.
    pub fn from_env(transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::from_env()?, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn crm(&self) -> &Crm {
        &self.crm
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    /// Attach uploaded files to a CRM record through a note.
    ///
    /// Creates a note whose `hs_attachment_ids` lists the files, then
    /// associates the note to `record` with an inferred HubSpot-defined type.
    /// `timestamp` sets the note's `hs_timestamp`; it defaults to now.
    pub fn attach_files(
        &self,
        files: &[File],
        record: &dyn Associable,
        timestamp: Option<&str>,
    ) -> Result<Record, ApiError> {
        if files.is_empty() {
            return Err(ApiError::MissingRequiredProperties {
                type_name: ObjectKind::Note.type_name(),
                missing: vec![ATTACHMENT_IDS_PROPERTY.to_string()],
            });
        }

        let attachment_ids = files.iter().map(|f| f.id.as_str()).collect::<Vec<_>>().join(";");
        let mut properties = Map::new();
        properties.insert(ATTACHMENT_IDS_PROPERTY.to_string(), Value::String(attachment_ids));
        if let Some(timestamp) = timestamp {
            properties.insert("hs_timestamp".to_string(), Value::String(timestamp.to_string()));
        }

        let note = self.crm.new_object(ObjectKind::Note, properties)?;
        note.associate(record)?;
        Ok(note)
    }
}
