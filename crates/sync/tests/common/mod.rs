#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use expo_core::backend::{AssignmentLink, BackendError, MarkerBackend};
use expo_core::marker::{FieldValue, Marker, MarkerField};
use expo_core::ownership::{is_booth_marker, is_assignment_field, is_company_field, Namespace};
use expo_core::types::{DbId, EventYear, MarkerId};
use expo_events::EventBus;
use expo_sync::MarkerStore;
use tokio::sync::Notify;

pub const YEAR: EventYear = 2025;

/// Every backend call, in the order it was made.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindAssignment(MarkerId, EventYear),
    UpdateCompany(DbId, MarkerField, FieldValue),
    UpdateAssignment(MarkerId, EventYear, MarkerField, FieldValue),
    EnsureRow(Namespace, MarkerId, EventYear),
    UpdateNamespace(Namespace, MarkerId, MarkerField, FieldValue),
    DeleteAssignments(MarkerId),
    DeleteRow(Namespace, MarkerId),
    LoadMarkers(EventYear),
}

#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub link: AssignmentLink,
    pub fields: BTreeMap<MarkerField, FieldValue>,
}

#[derive(Debug, Clone)]
pub struct NamespaceRow {
    pub event_year: EventYear,
    pub fields: BTreeMap<MarkerField, FieldValue>,
}

#[derive(Default)]
struct MemoryState {
    assignments: Vec<AssignmentRow>,
    companies: HashMap<DbId, BTreeMap<MarkerField, FieldValue>>,
    rows: HashMap<(Namespace, MarkerId), NamespaceRow>,
    calls: Vec<Call>,
    next_id: DbId,
    fail_ensure: bool,
    fail_updates: HashSet<MarkerField>,
    fail_delete_assignments: bool,
    fail_delete_rows: HashSet<Namespace>,
    fail_load: bool,
}

/// In-memory [`MarkerBackend`] that records calls and can be told to fail.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    delete_gate: Mutex<Option<Arc<Notify>>>,
    pub delete_started: Notify,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // --- Seeding ---

    pub fn add_company(&self, name: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let mut fields = BTreeMap::new();
        fields.insert(MarkerField::Name, FieldValue::from(name));
        state.companies.insert(id, fields);
        id
    }

    pub fn add_assignment(&self, marker_id: MarkerId, event_year: EventYear, company_id: DbId) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.assignments.push(AssignmentRow {
            link: AssignmentLink {
                id,
                marker_id,
                event_year,
                company_id,
            },
            fields: BTreeMap::new(),
        });
    }

    /// Create all three namespace rows for `marker`, filing each field under
    /// its namespace.
    pub fn add_marker_rows(&self, marker: &Marker) {
        let mut state = self.state.lock().unwrap();
        for ns in Namespace::ALL {
            state.rows.insert(
                (ns, marker.id),
                NamespaceRow {
                    event_year: YEAR,
                    fields: BTreeMap::new(),
                },
            );
        }
        for (field, value) in &marker.fields {
            if let Some(row) = state.rows.get_mut(&(field.namespace(), marker.id)) {
                row.fields.insert(*field, value.clone());
            }
        }
    }

    // --- Failure injection ---

    pub fn fail_ensure(&self) {
        self.state.lock().unwrap().fail_ensure = true;
    }

    pub fn fail_update(&self, field: MarkerField) {
        self.state.lock().unwrap().fail_updates.insert(field);
    }

    pub fn fail_delete_assignments(&self) {
        self.state.lock().unwrap().fail_delete_assignments = true;
    }

    pub fn fail_delete_row(&self, namespace: Namespace) {
        self.state.lock().unwrap().fail_delete_rows.insert(namespace);
    }

    pub fn fail_load(&self, fail: bool) {
        self.state.lock().unwrap().fail_load = fail;
    }

    /// Make the first delete step wait until the returned gate is notified.
    pub fn gate_deletes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.delete_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    // --- Inspection ---

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn row(&self, namespace: Namespace, marker_id: MarkerId) -> Option<NamespaceRow> {
        self.state
            .lock()
            .unwrap()
            .rows
            .get(&(namespace, marker_id))
            .cloned()
    }

    pub fn company(&self, id: DbId) -> Option<BTreeMap<MarkerField, FieldValue>> {
        self.state.lock().unwrap().companies.get(&id).cloned()
    }

    pub fn assignment(&self, marker_id: MarkerId, event_year: EventYear) -> Option<AssignmentRow> {
        self.state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .find(|a| a.link.marker_id == marker_id && a.link.event_year == event_year)
            .cloned()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn failing() -> BackendError {
        BackendError::Database("forced failure".to_string())
    }
}

#[async_trait]
impl MarkerBackend for MemoryBackend {
    async fn find_assignment(
        &self,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<Option<AssignmentLink>, BackendError> {
        self.record(Call::FindAssignment(marker_id, event_year));
        Ok(self.assignment(marker_id, event_year).map(|a| a.link))
    }

    async fn update_company_field(
        &self,
        company_id: DbId,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError> {
        self.record(Call::UpdateCompany(company_id, field, value.clone()));
        let mut state = self.state.lock().unwrap();
        if state.fail_updates.contains(&field) {
            return Err(Self::failing());
        }
        if let Some(company) = state.companies.get_mut(&company_id) {
            company.insert(field, value.clone());
        }
        Ok(())
    }

    async fn update_assignment_field(
        &self,
        marker_id: MarkerId,
        event_year: EventYear,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError> {
        self.record(Call::UpdateAssignment(
            marker_id,
            event_year,
            field,
            value.clone(),
        ));
        let mut state = self.state.lock().unwrap();
        if state.fail_updates.contains(&field) {
            return Err(Self::failing());
        }
        if let Some(row) = state
            .assignments
            .iter_mut()
            .find(|a| a.link.marker_id == marker_id && a.link.event_year == event_year)
        {
            row.fields.insert(field, value.clone());
        }
        Ok(())
    }

    async fn ensure_namespace_row(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<(), BackendError> {
        self.record(Call::EnsureRow(namespace, marker_id, event_year));
        let mut state = self.state.lock().unwrap();
        if state.fail_ensure {
            return Err(Self::failing());
        }
        state
            .rows
            .entry((namespace, marker_id))
            .or_insert_with(|| {
                let mut fields = BTreeMap::new();
                fields.insert(namespace.lock_field(), FieldValue::Bool(false));
                NamespaceRow { event_year, fields }
            });
        Ok(())
    }

    async fn update_namespace_field(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError> {
        self.record(Call::UpdateNamespace(
            namespace,
            marker_id,
            field,
            value.clone(),
        ));
        let mut state = self.state.lock().unwrap();
        if state.fail_updates.contains(&field) {
            return Err(Self::failing());
        }
        if field.is_lock() && value.as_bool().is_none() {
            return Err(BackendError::TypeMismatch {
                column: field.column(),
                expected: "bool",
                actual: value.type_name(),
            });
        }
        if let Some(row) = state.rows.get_mut(&(namespace, marker_id)) {
            row.fields.insert(field, value.clone());
        }
        Ok(())
    }

    async fn delete_assignments(&self, marker_id: MarkerId) -> Result<u64, BackendError> {
        self.record(Call::DeleteAssignments(marker_id));

        let gate = self.delete_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.delete_started.notify_one();
            gate.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_delete_assignments {
            return Err(Self::failing());
        }
        let before = state.assignments.len();
        state.assignments.retain(|a| a.link.marker_id != marker_id);
        Ok((before - state.assignments.len()) as u64)
    }

    async fn delete_namespace_row(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
    ) -> Result<u64, BackendError> {
        self.record(Call::DeleteRow(namespace, marker_id));
        let mut state = self.state.lock().unwrap();
        if state.fail_delete_rows.contains(&namespace) {
            return Err(Self::failing());
        }
        Ok(u64::from(state.rows.remove(&(namespace, marker_id)).is_some()))
    }

    async fn load_markers(&self, event_year: EventYear) -> Result<Vec<Marker>, BackendError> {
        self.record(Call::LoadMarkers(event_year));
        let state = self.state.lock().unwrap();
        if state.fail_load {
            return Err(Self::failing());
        }

        let mut ids: Vec<MarkerId> = state
            .rows
            .keys()
            .filter(|(ns, _)| *ns == Namespace::Core)
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();

        let markers = ids
            .into_iter()
            .map(|id| {
                let mut marker = Marker::new(id);
                for ns in Namespace::ALL {
                    if let Some(row) = state.rows.get(&(ns, id)) {
                        for (field, value) in &row.fields {
                            let booth_owned = is_booth_marker(id)
                                && (is_company_field(*field) || is_assignment_field(*field));
                            if !booth_owned {
                                marker.fields.insert(*field, value.clone());
                            }
                        }
                    }
                }
                if is_booth_marker(id) {
                    let assignment = state
                        .assignments
                        .iter()
                        .find(|a| a.link.marker_id == id && a.link.event_year == event_year);
                    if let Some(assignment) = assignment {
                        if let Some(company) = state.companies.get(&assignment.link.company_id) {
                            for (field, value) in company {
                                marker.fields.insert(*field, value.clone());
                            }
                        }
                        for (field, value) in &assignment.fields {
                            marker.fields.insert(*field, value.clone());
                        }
                    }
                }
                marker
            })
            .collect();

        Ok(markers)
    }
}

/// A store over `backend` for [`YEAR`], with an unbounded history.
pub fn store_with(backend: &Arc<MemoryBackend>) -> MarkerStore {
    let backend: Arc<dyn MarkerBackend> = Arc::clone(backend) as Arc<dyn MarkerBackend>;
    MarkerStore::new(backend, Arc::new(EventBus::default()), YEAR, None)
}
