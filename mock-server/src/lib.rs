//! In-memory imitation of the HubSpot endpoints the client core talks to.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

const DEFAULT_LIMIT: usize = 10;
const FILES: &str = "files";
const ASSOCIATIONS_VERSION: &str = "v4";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrmObject {
    pub id: String,
    pub properties: Map<String, Value>,
    pub archived: bool,
}

#[derive(Deserialize)]
pub struct ObjectInput {
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssociationSpec {
    pub association_category: String,
    pub association_type_id: u32,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub after: Option<u64>,
    pub properties: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInput {
    #[serde(default)]
    pub filter_groups: Vec<FilterGroup>,
    pub limit: Option<usize>,
    pub after: Option<String>,
}

#[derive(Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// Only the `EQ` operator is understood; other filters never match.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_name: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    fn matches(&self, object: &CrmObject) -> bool {
        self.operator == "EQ" && object.properties.get(&self.property_name) == Some(&self.value)
    }
}

/// (from type, from id, to type, to id)
type AssociationKey = (String, String, String, String);

#[derive(Default)]
pub struct Store {
    next_id: u64,
    objects: HashMap<String, BTreeMap<u64, CrmObject>>,
    associations: HashMap<AssociationKey, Vec<AssociationSpec>>,
}

impl Store {
    fn live(&self, object_type: &str, id: u64) -> Option<&CrmObject> {
        self.objects
            .get(object_type)
            .and_then(|objects| objects.get(&id))
            .filter(|o| !o.archived)
    }

    /// Files are not stored by this server and always count as present.
    fn exists(&self, object_type: &str, id: &str) -> bool {
        if object_type == FILES {
            return true;
        }
        id.parse()
            .ok()
            .is_some_and(|id| self.live(object_type, id).is_some())
    }

    /// Live objects of `object_type` with an id above `after`, in id order.
    fn live_after(&self, object_type: &str, after: u64) -> Vec<CrmObject> {
        self.objects
            .get(object_type)
            .map(|objects| {
                objects
                    .range(after.saturating_add(1)..)
                    .map(|(_, o)| o)
                    .filter(|o| !o.archived)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: impl Into<String>) -> Failure {
    (status, Json(json!({"status": "error", "message": message.into()})))
}

fn parse_id(id: &str) -> Result<u64, Failure> {
    id.parse()
        .map_err(|_| failure(StatusCode::BAD_REQUEST, format!("invalid object id {id:?}")))
}

/// Cut one page out of `objects` and attach the cursor for the next one.
fn page(mut objects: Vec<CrmObject>, limit: usize) -> Value {
    let has_more = objects.len() > limit;
    objects.truncate(limit);
    let mut body = json!({ "results": objects });
    if has_more {
        if let Some(last) = objects.last() {
            body["paging"] = json!({ "next": { "after": last.id } });
        }
    }
    body
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route(
            "/crm/{version}/objects/{object_type}",
            get(list_objects).post(create_object),
        )
        .route("/crm/{version}/objects/{object_type}/search", post(search_objects))
        .route(
            "/crm/{version}/objects/{object_type}/{id}",
            get(get_object).patch(update_object).delete(archive_object),
        )
        .route(
            "/crm/{version}/objects/{object_type}/{id}/associations/{to_type}",
            get(list_associations),
        )
        .route(
            "/crm/{version}/objects/{object_type}/{id}/associations/{to_type}/{to_id}",
            put(create_association).delete(remove_association),
        )
        .route("/crm/{version}/pipelines/{object_type}", get(list_pipelines))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock HubSpot server listening");
    }
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

async fn list_objects(
    State(db): State<Db>,
    Path((_version, object_type)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let store = db.read().await;
    let mut objects = store.live_after(&object_type, query.after.unwrap_or(0));
    if let Some(wanted) = query.properties.as_deref() {
        let wanted: Vec<&str> = wanted.split(',').collect();
        for object in &mut objects {
            object.properties.retain(|name, _| wanted.contains(&name.as_str()));
        }
    }
    Json(page(objects, query.limit.unwrap_or(DEFAULT_LIMIT)))
}

async fn create_object(
    State(db): State<Db>,
    Path((_version, object_type)): Path<(String, String)>,
    Json(input): Json<ObjectInput>,
) -> (StatusCode, Json<CrmObject>) {
    let mut store = db.write().await;
    store.next_id += 1;
    let id = store.next_id;
    let mut properties = input.properties;
    properties.insert("hs_object_id".to_string(), Value::String(id.to_string()));
    let object = CrmObject {
        id: id.to_string(),
        properties,
        archived: false,
    };
    tracing::debug!(%object_type, id, "created object");
    store
        .objects
        .entry(object_type)
        .or_default()
        .insert(id, object.clone());
    (StatusCode::CREATED, Json(object))
}

async fn get_object(
    State(db): State<Db>,
    Path((_version, object_type, id)): Path<(String, String, String)>,
) -> Result<Json<CrmObject>, Failure> {
    let id = parse_id(&id)?;
    let store = db.read().await;
    store
        .live(&object_type, id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "object not found"))
}

async fn update_object(
    State(db): State<Db>,
    Path((_version, object_type, id)): Path<(String, String, String)>,
    Json(input): Json<ObjectInput>,
) -> Result<Json<CrmObject>, Failure> {
    let id = parse_id(&id)?;
    let mut store = db.write().await;
    let object = store
        .objects
        .get_mut(&object_type)
        .and_then(|objects| objects.get_mut(&id))
        .filter(|o| !o.archived)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "object not found"))?;
    object.properties.extend(input.properties);
    Ok(Json(object.clone()))
}

async fn archive_object(
    State(db): State<Db>,
    Path((_version, object_type, id)): Path<(String, String, String)>,
) -> Result<StatusCode, Failure> {
    let id = parse_id(&id)?;
    let mut store = db.write().await;
    let object = store
        .objects
        .get_mut(&object_type)
        .and_then(|objects| objects.get_mut(&id))
        .filter(|o| !o.archived)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "object not found"))?;
    object.archived = true;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_objects(
    State(db): State<Db>,
    Path((_version, object_type)): Path<(String, String)>,
    Json(input): Json<SearchInput>,
) -> Result<Json<Value>, Failure> {
    let after = match input.after.as_deref() {
        Some(after) => parse_id(after)?,
        None => 0,
    };
    let store = db.read().await;
    let objects: Vec<CrmObject> = store
        .live_after(&object_type, after)
        .into_iter()
        .filter(|object| {
            input.filter_groups.is_empty()
                || input
                    .filter_groups
                    .iter()
                    .any(|group| group.filters.iter().all(|f| f.matches(object)))
        })
        .collect();
    Ok(Json(page(objects, input.limit.unwrap_or(DEFAULT_LIMIT))))
}

// ---------------------------------------------------------------------------
// Associations
// ---------------------------------------------------------------------------

fn check_associations_version(version: &str) -> Result<(), Failure> {
    if version == ASSOCIATIONS_VERSION {
        return Ok(());
    }
    Err(failure(
        StatusCode::NOT_FOUND,
        format!("associations are served under {ASSOCIATIONS_VERSION}"),
    ))
}

fn check_endpoints(store: &Store, key: &AssociationKey) -> Result<(), Failure> {
    let (from_type, from_id, to_type, to_id) = key;
    if !store.exists(from_type, from_id) {
        return Err(failure(StatusCode::NOT_FOUND, format!("{from_type} {from_id} not found")));
    }
    if !store.exists(to_type, to_id) {
        return Err(failure(StatusCode::NOT_FOUND, format!("{to_type} {to_id} not found")));
    }
    Ok(())
}

async fn create_association(
    State(db): State<Db>,
    Path((version, from_type, from_id, to_type, to_id)): Path<(String, String, String, String, String)>,
    Json(specs): Json<Vec<AssociationSpec>>,
) -> Result<Json<Value>, Failure> {
    check_associations_version(&version)?;
    let key = (from_type, from_id, to_type, to_id);
    let mut store = db.write().await;
    check_endpoints(&store, &key)?;

    let stored = store.associations.entry(key.clone()).or_default();
    for spec in specs {
        if !stored.contains(&spec) {
            stored.push(spec);
        }
    }
    tracing::debug!(from = %key.0, to = %key.2, "stored association");

    let (from_type, from_id, to_type, to_id) = key;
    Ok(Json(json!({
        "fromObjectTypeId": from_type,
        "fromObjectId": from_id,
        "toObjectTypeId": to_type,
        "toObjectId": to_id,
        "labels": [],
    })))
}

async fn remove_association(
    State(db): State<Db>,
    Path((version, from_type, from_id, to_type, to_id)): Path<(String, String, String, String, String)>,
) -> Result<StatusCode, Failure> {
    check_associations_version(&version)?;
    let key = (from_type, from_id, to_type, to_id);
    let mut store = db.write().await;
    check_endpoints(&store, &key)?;
    store.associations.remove(&key);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_associations(
    State(db): State<Db>,
    Path((version, from_type, from_id, to_type)): Path<(String, String, String, String)>,
) -> Result<Json<Value>, Failure> {
    check_associations_version(&version)?;
    let store = db.read().await;
    if !store.exists(&from_type, &from_id) {
        return Err(failure(StatusCode::NOT_FOUND, format!("{from_type} {from_id} not found")));
    }
    let mut results: Vec<Value> = store
        .associations
        .iter()
        .filter(|((ft, fid, tt, _), _)| *ft == from_type && *fid == from_id && *tt == to_type)
        .map(|((_, _, _, to_id), specs)| {
            let types: Vec<Value> = specs
                .iter()
                .map(|s| json!({"category": s.association_category, "typeId": s.association_type_id}))
                .collect();
            json!({"toObjectId": to_id, "associationTypes": types})
        })
        .collect();
    results.sort_by(|a, b| a["toObjectId"].as_str().cmp(&b["toObjectId"].as_str()));
    Ok(Json(json!({ "results": results })))
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn stage(id: &str, label: &str, display_order: i64, metadata: Value) -> Value {
    json!({
        "id": id,
        "label": label,
        "displayOrder": display_order,
        "archived": false,
        "metadata": metadata,
    })
}

async fn list_pipelines(
    Path((_version, object_type)): Path<(String, String)>,
) -> Result<Json<Value>, Failure> {
    let pipeline = match object_type.as_str() {
        "deals" => json!({
            "id": "default",
            "label": "Sales Pipeline",
            "displayOrder": 0,
            "archived": false,
            "stages": [
                stage("appointmentscheduled", "Appointment Scheduled", 0, json!({"probability": "0.2"})),
                stage("qualifiedtobuy", "Qualified To Buy", 1, json!({"probability": "0.4"})),
                stage("closedwon", "Closed Won", 2, json!({"probability": "1.0", "isClosed": "true"})),
            ],
        }),
        "tickets" => json!({
            "id": "0",
            "label": "Support Pipeline",
            "displayOrder": 0,
            "archived": false,
            "stages": [
                stage("1", "New", 0, json!({"ticketState": "OPEN"})),
                stage("2", "Waiting on contact", 1, json!({"ticketState": "OPEN"})),
                stage("4", "Closed", 2, json!({"ticketState": "CLOSED"})),
            ],
        }),
        other => {
            return Err(failure(
                StatusCode::NOT_FOUND,
                format!("{other} does not support pipelines"),
            ))
        }
    };
    Ok(Json(json!({ "results": [pipeline] })))
}
