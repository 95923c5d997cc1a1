//! CRM objects, associations and pipelines.
//!
//! # Design
//! Each area has a pure factory (`Associations`, `ObjectFactory`,
//! `PipelineFactory`) that builds `HttpRequest` values and parses
//! `HttpResponse` values. [`Crm`] pairs those factories with a shared
//! [`Transport`] and runs build, execute and parse in one call. It is cheap
//! to clone; every [`Record`] keeps one so it can update, archive and
//! associate itself.

pub mod associations;
pub mod matrix;
pub mod object_type;
pub mod pipeline;
pub mod record;

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{send, Transport};
use crate::types::ObjectDocument;

use associations::{Associable, Associations};
use object_type::ObjectKind;
use pipeline::{Pipeline, PipelineFactory};
use record::{ListOptions, ObjectFactory, PageQuery, Record, Records};

#[derive(Clone)]
pub struct Crm {
    transport: Arc<dyn Transport>,
    associations: Associations,
    objects: ObjectFactory,
    pipelines: PipelineFactory,
}

impl Crm {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            associations: Associations::new(config),
            objects: ObjectFactory::new(config),
            pipelines: PipelineFactory::new(config),
        }
    }

    pub fn associations(&self) -> &Associations {
        &self.associations
    }

    pub fn objects(&self) -> &ObjectFactory {
        &self.objects
    }

    pub fn pipelines(&self) -> &PipelineFactory {
        &self.pipelines
    }

    /// Link `from` to `to` and return the server's response body.
    ///
    /// See [`Associations::build_create_association`] for how the definer
    /// and type id are validated. Validation failures are returned before
    /// anything is sent.
    pub fn create_association(
        &self,
        from: &dyn Associable,
        to: &dyn Associable,
        definer: &str,
        association_type_id: Option<u32>,
    ) -> Result<Value, ApiError> {
        let request = self
            .associations
            .build_create_association(from, to, definer, association_type_id)?;
        let response = send(self.transport.as_ref(), request)?;
        self.associations.parse_create_association(response)
    }

    pub fn remove_association(&self, from: &dyn Associable, to: &dyn Associable) -> Result<(), ApiError> {
        let request = self.associations.build_remove_association(from, to)?;
        let response = send(self.transport.as_ref(), request)?;
        self.associations.parse_remove_association(response)
    }

    pub fn new_object(&self, kind: ObjectKind, properties: Map<String, Value>) -> Result<Record, ApiError> {
        let request = self.objects.build_new_object(kind, properties)?;
        let response = send(self.transport.as_ref(), request)?;
        let document = self.objects.parse_object(response)?;
        Ok(Record::from_document(self.clone(), kind, document))
    }

    pub fn get_object(&self, kind: ObjectKind, id: &str) -> Result<Record, ApiError> {
        let request = self.objects.build_get_object(kind, id);
        let response = send(self.transport.as_ref(), request)?;
        let document = self.objects.parse_object(response)?;
        Ok(Record::from_document(self.clone(), kind, document))
    }

    /// Lazily walk every page of `kind`. A failed page ends the iteration
    /// after yielding its error.
    pub fn list_objects(&self, kind: ObjectKind, options: ListOptions) -> Records {
        Records::new(self.clone(), kind, PageQuery::List(options))
    }

    /// Lazily walk every page of search results. `filters` is the search
    /// body (`filterGroups`, `sorts`, `properties`, `limit`...).
    pub fn search(&self, kind: ObjectKind, filters: Map<String, Value>) -> Records {
        Records::new(self.clone(), kind, PageQuery::Search(filters))
    }

    pub fn list_pipelines(&self, kind: ObjectKind) -> Result<Vec<Pipeline>, ApiError> {
        let request = self.pipelines.build_list_pipelines(kind);
        let response = send(self.transport.as_ref(), request)?;
        self.pipelines.parse_list_pipelines(response)
    }

    pub(crate) fn update_object(
        &self,
        kind: ObjectKind,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<ObjectDocument, ApiError> {
        let request = self.objects.build_update_object(kind, id, properties)?;
        let response = send(self.transport.as_ref(), request)?;
        self.objects.parse_object(response)
    }

    pub(crate) fn archive_object(&self, kind: ObjectKind, id: &str) -> Result<(), ApiError> {
        let request = self.objects.build_archive_object(kind, id);
        let response = send(self.transport.as_ref(), request)?;
        self.objects.parse_archive_object(response)
    }

    pub(crate) fn fetch_page(
        &self,
        kind: ObjectKind,
        query: &PageQuery,
        after: Option<&str>,
    ) -> Result<crate::types::Page<ObjectDocument>, ApiError> {
        let request = match query {
            PageQuery::List(options) => self.objects.build_list_objects(kind, options, after)?,
            PageQuery::Search(filters) => self.objects.build_search(kind, filters, after)?,
        };
        let response = send(self.transport.as_ref(), request)?;
        self.objects.parse_page(response)
    }
}

impl fmt::Debug for Crm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crm")
            .field("associations", &self.associations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::associations::ObjectRef;
    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::RecordingTransport;
    use crate::transport::TransportError;

    fn crm(transport: &Arc<RecordingTransport>) -> Crm {
        let config = ClientConfig::new("token").base_url("http://hub.test");
        Crm::new(&config, transport.clone())
    }

    #[test]
    fn create_association_sends_one_put() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(200, r#"{"labels":[]}"#);
        let contact = ObjectRef::new(ObjectKind::Contact, "1");
        let company = ObjectRef::new(ObjectKind::Company, "2");

        let value = crm(&transport)
            .create_association(&contact, &company, "HUBSPOT_DEFINED", None)
            .unwrap();
        assert_eq!(value, json!({"labels": []}));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(
            sent[0].path,
            "http://hub.test/crm/v4/objects/contacts/1/associations/companies/2"
        );
    }

    #[test]
    fn validation_failures_never_reach_the_transport() {
        let transport = Arc::new(RecordingTransport::new());
        let crm = crm(&transport);
        let deal_a = ObjectRef::new(ObjectKind::Deal, "1");
        let deal_b = ObjectRef::new(ObjectKind::Deal, "2");

        let cases = [
            crm.create_association(&deal_a, &deal_b, "BOGUS", None),
            crm.create_association(&deal_a, &deal_b, "HUBSPOT_DEFINED", Some(21)),
            crm.create_association(&deal_a, &deal_b, "HUBSPOT_DEFINED", None),
            crm.create_association(&deal_a, &deal_b, "USER_DEFINED", None),
        ];
        for result in cases {
            assert!(result.unwrap_err().is_validation());
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn explicit_hubspot_ids_reach_the_transport() {
        let transport = Arc::new(RecordingTransport::new());
        let crm = crm(&transport);
        let contact = ObjectRef::new(ObjectKind::Contact, "1");
        let company = ObjectRef::new(ObjectKind::Company, "2");
        let ids: Vec<u32> = (1..=20).chain(25..=28).collect();
        for id in &ids {
            transport.respond(200, "{}");
            crm.create_association(&contact, &company, "HUBSPOT_DEFINED", Some(*id))
                .unwrap();
        }
        assert_eq!(transport.requests().len(), ids.len());
    }

    #[test]
    fn remove_association_propagates_404_without_retry() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(404, r#"{"message":"not found"}"#);
        let contact = ObjectRef::new(ObjectKind::Contact, "1");
        let company = ObjectRef::new(ObjectKind::Company, "2");

        let err = crm(&transport).remove_association(&contact, &company).unwrap_err();
        match err {
            ApiError::Transport(inner) => assert!(inner.is_not_found()),
            other => panic!("unexpected error: {other}"),
        }

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Delete);
        assert!(sent[0].body.is_none());
    }

    #[test]
    fn transport_timeouts_surface_unchanged() {
        let transport = Arc::new(RecordingTransport::new());
        transport.fail(TransportError::Timeout);
        let contact = ObjectRef::new(ObjectKind::Contact, "1");
        let company = ObjectRef::new(ObjectKind::Company, "2");

        let err = crm(&transport)
            .create_association(&contact, &company, "HUBSPOT_DEFINED", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Timeout)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn list_pipelines_parses_stages() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            200,
            r#"{"results":[{"id":"default","label":"Sales","displayOrder":0,"archived":false,
                "stages":[{"id":"appointmentscheduled","label":"Appointment","displayOrder":0,
                "archived":false,"metadata":{"probability":"0.2"}}]}]}"#,
        );
        let pipelines = crm(&transport).list_pipelines(ObjectKind::Deal).unwrap();
        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].stages[0].id, "appointmentscheduled");
        assert_eq!(transport.requests()[0].path, "http://hub.test/crm/v3/pipelines/deals");
    }
}
