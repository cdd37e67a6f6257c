//! CRUD orchestration: drives dialogs against the registered collaborators, turns
//! outcomes into transient messages and refetches the current page after every mutation.
//!
//! Each entity kind owns one partition (records, sorted view, dialog slot). Only the
//! orchestrator and the pagination controller write to it; `&mut self` serializes writes.

mod messages;

pub use messages::{MessageBoard, MessageLevel, TransientMessage, MESSAGE_TTL};

use crate::api::{Capabilities, EntityRegistry};
use crate::error::EngineError;
use crate::form::{render_form, FormView, Lookups, Modal, ModalRole};
use crate::model::{record_id, Record};
use crate::pagination::{PageRequest, PaginationController, PaginationState};
use crate::schema::{EntityKind, EntitySchema, FieldKind};
use crate::table::{render_table, sort_records, TableView};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct Partition {
    /// Last fetched page, as returned by the collaborator.
    records: Vec<Record>,
    /// `records` after the active sort.
    display: Vec<Record>,
    sort: Option<(String, bool)>,
    modal: Option<Modal>,
}

pub struct Orchestrator {
    registry: EntityRegistry,
    partitions: HashMap<EntityKind, Partition>,
    pagination: PaginationController,
    messages: MessageBoard,
    request_timeout: Duration,
}

/// Run one collaborator call under the request timeout.
async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| EngineError::RequestTimedOut(limit))?
}

fn verb(role: ModalRole) -> (&'static str, &'static str) {
    match role {
        ModalRole::Add => ("add", "added"),
        ModalRole::Edit => ("edit", "edited"),
        ModalRole::Delete => ("delete", "deleted"),
    }
}

impl Orchestrator {
    pub fn new(registry: EntityRegistry) -> Self {
        Self::with_timeout(registry, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(registry: EntityRegistry, request_timeout: Duration) -> Self {
        Self {
            registry,
            partitions: HashMap::new(),
            pagination: PaginationController::new(),
            messages: MessageBoard::new(),
            request_timeout,
        }
    }

    fn caps(&self, kind: EntityKind) -> Result<Capabilities, EngineError> {
        self.registry.get(kind).cloned()
    }

    fn partition(&mut self, kind: EntityKind) -> &mut Partition {
        self.partitions.entry(kind).or_default()
    }

    fn modal_mut(&mut self, kind: EntityKind) -> Result<&mut Modal, EngineError> {
        self.partitions
            .get_mut(&kind)
            .and_then(|p| p.modal.as_mut())
            .ok_or(EngineError::NoActiveModal(kind))
    }

    fn ensure_idle(&self, kind: EntityKind) -> Result<(), EngineError> {
        match self.partitions.get(&kind).and_then(|p| p.modal.as_ref()) {
            Some(_) => Err(EngineError::ModalBusy(kind)),
            None => Ok(()),
        }
    }

    fn displayed(&self, kind: EntityKind, id: i64) -> Result<Record, EngineError> {
        self.partitions
            .get(&kind)
            .and_then(|p| p.display.iter().find(|r| record_id(r) == Some(id)))
            .cloned()
            .ok_or_else(|| EngineError::validation("id", format!("{} with Id: {} is not on the current page", kind, id)))
    }

    /// Fetch the current page of `kind`, replacing the partition's records wholesale.
    /// A failure is posted as the kind's transient error message.
    pub async fn refresh(&mut self, kind: EntityKind) -> Result<(), EngineError> {
        let caps = self.caps(kind)?;
        if let Err(e) = self.load_page(kind, &caps).await {
            let text = match e.server_message() {
                Some(m) => format!("Failed to fetch {} {}", kind.path_segment(), m),
                None => format!("Failed to fetch {}", kind.path_segment()),
            };
            self.messages.post(kind, MessageLevel::Error, text);
            return Err(e);
        }
        Ok(())
    }

    /// Fetch and store the current page without touching the message board.
    async fn load_page(&mut self, kind: EntityKind, caps: &Capabilities) -> Result<(), EngineError> {
        let request = self.pagination.request(kind);
        tracing::debug!(kind = %kind, page = request.page_number, size = request.page_size, "fetching page");
        let page = bounded(self.request_timeout, caps.api.fetch_page(request))
            .await
            .inspect_err(|e| tracing::warn!(kind = %kind, error = %e, "fetch failed"))?;
        self.pagination.set_total_count(kind, page.total_count);
        let part = self.partition(kind);
        part.display = match &part.sort {
            Some((key, asc)) => {
                sort_records(&page.records, key, *asc, caps.schema).unwrap_or_else(|| page.records.clone())
            }
            None => page.records.clone(),
        };
        part.records = page.records;
        Ok(())
    }

    pub async fn change_page(&mut self, kind: EntityKind, page: u32) -> Result<(), EngineError> {
        self.caps(kind)?;
        self.pagination.set_current_page(kind, page);
        self.refresh(kind).await
    }

    /// A new page size starts over from page 1.
    pub async fn change_page_size(&mut self, kind: EntityKind, size: u32) -> Result<(), EngineError> {
        self.caps(kind)?;
        self.pagination.set_page_size(kind, size);
        self.pagination.set_current_page(kind, 1);
        self.refresh(kind).await
    }

    /// Re-order the displayed page. On `SortUnavailable` the previous view stays.
    pub fn sort(&mut self, kind: EntityKind, key: &str, ascending: bool) -> Result<(), EngineError> {
        let caps = self.caps(kind)?;
        let part = self.partition(kind);
        match sort_records(&part.display, key, ascending, caps.schema) {
            Some(sorted) => {
                part.display = sorted;
                part.sort = Some((key.to_string(), ascending));
                Ok(())
            }
            None => {
                tracing::warn!(kind = %kind, key, "sort unavailable; keeping previous order");
                Err(EngineError::SortUnavailable(format!("{} by '{}'", kind, key)))
            }
        }
    }

    /// Open the Add dialog. Reference fields load their option lists first; if that
    /// fails the dialog stays open with the reference fields disabled.
    pub async fn open_add(&mut self, kind: EntityKind) -> Result<(), EngineError> {
        let caps = self.caps(kind)?;
        self.ensure_idle(kind)?;
        self.partition(kind).modal = Some(Modal::add(caps.schema));
        self.attach_lookups(kind, caps.schema, None).await
    }

    /// Open the Edit dialog over a displayed record.
    pub async fn open_edit(&mut self, kind: EntityKind, id: i64) -> Result<(), EngineError> {
        let caps = self.caps(kind)?;
        self.ensure_idle(kind)?;
        let target = self.displayed(kind, id)?;
        self.partition(kind).modal = Some(Modal::edit(caps.schema, &target));
        self.attach_lookups(kind, caps.schema, Some(&target)).await
    }

    pub fn open_delete(&mut self, kind: EntityKind, id: i64) -> Result<(), EngineError> {
        let caps = self.caps(kind)?;
        self.ensure_idle(kind)?;
        let target = self.displayed(kind, id)?;
        self.partition(kind).modal = Some(Modal::delete(caps.schema, &target));
        Ok(())
    }

    async fn attach_lookups(
        &mut self,
        kind: EntityKind,
        schema: &'static EntitySchema,
        selected: Option<&Record>,
    ) -> Result<(), EngineError> {
        if schema.reference_fields().next().is_none() {
            return Ok(());
        }
        match self.load_lookups(schema, selected).await {
            Ok(lookups) => {
                self.modal_mut(kind)?.attach_lookups(lookups);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "reference options unavailable");
                self.messages.post(
                    kind,
                    MessageLevel::Error,
                    format!("Failed to load options for {}. Please try again in sometime.", kind),
                );
                Err(e)
            }
        }
    }

    /// Each target kind is read in full: a one-row page for the total count, then one
    /// page that holds everything. Any failure fails the whole set.
    async fn load_lookups(
        &self,
        schema: &'static EntitySchema,
        selected: Option<&Record>,
    ) -> Result<Lookups, EngineError> {
        let unavailable = |target: EntityKind, e: EngineError| match e {
            EngineError::LookupUnavailable(_) => e,
            other => EngineError::LookupUnavailable(format!("{}: {}", target, other)),
        };
        let mut lookups = Lookups::new();
        for field in schema.reference_fields() {
            let FieldKind::Reference(target) = field.kind else {
                continue;
            };
            let api = self.caps(target).map_err(|e| unavailable(target, e))?.api;
            let probe = bounded(self.request_timeout, api.fetch_page(PageRequest::new(1, 1)))
                .await
                .map_err(|e| unavailable(target, e))?;
            let size = u32::try_from(probe.total_count.max(1)).unwrap_or(u32::MAX);
            let all = bounded(self.request_timeout, api.fetch_page(PageRequest::new(1, size)))
                .await
                .map_err(|e| unavailable(target, e))?;
            lookups.insert(target, Lookups::options_from_records(&all.records));

            if let Some(current) = selected {
                let id = field
                    .id_key
                    .and_then(|k| current.get(k))
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                lookups.put_selected_first(target, id)?;
            }
        }
        Ok(lookups)
    }

    pub fn update_field(&mut self, kind: EntityKind, key: &str, raw: &str) -> Result<(), EngineError> {
        self.caps(kind)?;
        self.modal_mut(kind)?.set_field(key, raw)
    }

    pub fn select_reference(&mut self, kind: EntityKind, key: &str, id: i64) -> Result<(), EngineError> {
        self.caps(kind)?;
        self.modal_mut(kind)?.select_reference(key, id)
    }

    /// Submit the open dialog.
    ///
    /// A client-side validation failure returns early with the dialog still in `Draft`
    /// and nothing sent. Otherwise the request runs, a success or error message is
    /// posted, the dialog is closed either way and the current page is refetched.
    pub async fn submit(&mut self, kind: EntityKind) -> Result<(), EngineError> {
        let caps = self.caps(kind)?;
        let modal = self.modal_mut(kind)?;
        let role = modal.role();
        let body = modal.begin_submit()?;
        let id = record_id(&body);
        let limit = self.request_timeout;

        let outcome = match (role, id) {
            (ModalRole::Add, _) => bounded(limit, caps.api.create(&body)).await.map(|_| ()),
            (ModalRole::Edit, Some(id)) => bounded(limit, caps.api.update(id, &body)).await.map(|_| ()),
            (ModalRole::Delete, Some(id)) => bounded(limit, caps.api.delete(id)).await.map(|_| ()),
            (_, None) => Err(EngineError::validation("id", format!("{} has no id", kind))),
        };

        let (action, done) = verb(role);
        match &outcome {
            Ok(()) => {
                tracing::info!(kind = %kind, action, "submit succeeded");
                self.messages
                    .post(kind, MessageLevel::Success, format!("{} {} successfully", kind, done));
            }
            Err(e) => {
                tracing::warn!(kind = %kind, action, error = %e, "submit failed");
                let text = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Failed to {} {}", action, kind.path_segment()));
                self.messages.post(kind, MessageLevel::Error, text);
            }
        }

        self.close_modal(kind);
        // The submit outcome stays the visible message even if the refetch fails.
        if let Err(e) = self.load_page(kind, &caps).await {
            tracing::debug!(kind = %kind, error = %e, "refetch after submit failed");
        }
        outcome
    }

    /// Close the open dialog without sending anything.
    pub fn cancel(&mut self, kind: EntityKind) -> Result<(), EngineError> {
        self.caps(kind)?;
        if self.close_modal(kind) {
            Ok(())
        } else {
            Err(EngineError::NoActiveModal(kind))
        }
    }

    fn close_modal(&mut self, kind: EntityKind) -> bool {
        match self.partition(kind).modal.take() {
            Some(mut m) => {
                m.close();
                true
            }
            None => false,
        }
    }

    pub fn table(&self, kind: EntityKind) -> Result<TableView, EngineError> {
        let caps = self.caps(kind)?;
        let records = self
            .partitions
            .get(&kind)
            .map(|p| p.display.as_slice())
            .unwrap_or(&[]);
        Ok(render_table(caps.schema, records))
    }

    /// The open dialog, if any.
    pub fn form(&self, kind: EntityKind) -> Option<FormView> {
        self.partitions
            .get(&kind)
            .and_then(|p| p.modal.as_ref())
            .map(render_form)
    }

    pub fn modal(&self, kind: EntityKind) -> Option<&Modal> {
        self.partitions.get(&kind).and_then(|p| p.modal.as_ref())
    }

    pub fn records(&self, kind: EntityKind) -> &[Record] {
        self.partitions
            .get(&kind)
            .map(|p| p.display.as_slice())
            .unwrap_or(&[])
    }

    pub fn pagination(&self, kind: EntityKind) -> PaginationState {
        self.pagination.state(kind)
    }

    pub fn message(&self, kind: EntityKind) -> Option<&TransientMessage> {
        self.messages.current(kind)
    }

    /// Drop expired messages.
    pub fn tick(&mut self) {
        self.messages.prune();
    }
}
