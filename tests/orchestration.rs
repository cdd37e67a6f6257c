//! Orchestration scenarios against an in-process collaborator.

use async_trait::async_trait;
use retail_admin::form::{Control, ModalPhase};
use retail_admin::pagination::PageRequest;
use retail_admin::table::{INVALID_RESPONSE_MESSAGE, NO_DATA_MESSAGE};
use retail_admin::{
    EngineError, EntityApi, EntityKind, EntityRegistry, MessageLevel, Orchestrator, Page, Record,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Fetch(PageRequest),
    Create(Record),
    Update(i64, Record),
    Delete(i64),
}

#[derive(Default)]
struct MockState {
    records: Vec<Record>,
    calls: Vec<Call>,
    next_id: i64,
    fetch_error: Option<EngineError>,
    write_error: Option<EngineError>,
    write_delay: Option<Duration>,
}

#[derive(Default)]
struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    fn with_records(records: Vec<Value>) -> Arc<Self> {
        let records: Vec<Record> = records.into_iter().map(rec).collect();
        let next_id = records.len() as i64 + 100;
        Arc::new(Self {
            state: Mutex::new(MockState {
                records,
                next_id,
                ..Default::default()
            }),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn configure(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.state.lock().unwrap());
    }

    async fn before_write(&self) -> Result<(), EngineError> {
        let (delay, err) = {
            let s = self.state.lock().unwrap();
            (s.write_delay, s.write_error.clone())
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        err.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl EntityApi for MockApi {
    async fn fetch_page(&self, page: PageRequest) -> Result<Page, EngineError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::Fetch(page));
        if let Some(e) = s.fetch_error.clone() {
            return Err(e);
        }
        let skip = ((page.page_number - 1) * page.page_size) as usize;
        Ok(Page {
            records: s.records.iter().skip(skip).take(page.page_size as usize).cloned().collect(),
            total_count: s.records.len() as u64,
        })
    }

    async fn create(&self, record: &Record) -> Result<Record, EngineError> {
        self.state.lock().unwrap().calls.push(Call::Create(record.clone()));
        self.before_write().await?;
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let mut stored = record.clone();
        stored.insert("id".into(), json!(s.next_id));
        s.records.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, record: &Record) -> Result<Record, EngineError> {
        self.state.lock().unwrap().calls.push(Call::Update(id, record.clone()));
        self.before_write().await?;
        let mut s = self.state.lock().unwrap();
        if let Some(slot) = s.records.iter_mut().find(|r| r["id"] == json!(id)) {
            *slot = record.clone();
        }
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<String, EngineError> {
        self.state.lock().unwrap().calls.push(Call::Delete(id));
        self.before_write().await?;
        let mut s = self.state.lock().unwrap();
        s.records.retain(|r| r["id"] != json!(id));
        Ok(format!("deleted {}", id))
    }
}

fn rec(v: Value) -> Record {
    v.as_object().cloned().expect("object literal")
}

fn engine_with(kind: EntityKind, api: Arc<MockApi>) -> Orchestrator {
    Orchestrator::new(EntityRegistry::new().register(kind, api))
}

struct SaleFixture {
    engine: Orchestrator,
    customers: Arc<MockApi>,
}

fn sale_fixture() -> SaleFixture {
    let customers = MockApi::with_records(vec![
        json!({"id": 1, "name": "Ann", "address": "1 Road"}),
        json!({"id": 2, "name": "Bob", "address": "2 Road"}),
    ]);
    let products = MockApi::with_records(vec![json!({"id": 5, "name": "Lamp", "price": 20})]);
    let stores = MockApi::with_records(vec![json!({"id": 9, "name": "Central", "address": "9 Main St"})]);
    let sales = MockApi::with_records(vec![json!({
        "id": 3, "dateSold": "2024-02-03T00:00:00",
        "customerId": 2, "customer": "Bob", "productId": 5, "product": "Lamp",
        "storeId": 9, "store": "Central"
    })]);
    let registry = EntityRegistry::new()
        .register(EntityKind::Customer, customers.clone())
        .register(EntityKind::Product, products)
        .register(EntityKind::Store, stores)
        .register(EntityKind::Sale, sales);
    SaleFixture {
        engine: Orchestrator::new(registry),
        customers,
    }
}

#[tokio::test]
async fn add_product_posts_then_refetches_first_page() {
    let api = MockApi::with_records(vec![]);
    let mut engine = engine_with(EntityKind::Product, api.clone());
    engine.refresh(EntityKind::Product).await.unwrap();

    engine.open_add(EntityKind::Product).await.unwrap();
    engine.update_field(EntityKind::Product, "name", "Widget").unwrap();
    engine.update_field(EntityKind::Product, "price", "9.99").unwrap();
    engine.submit(EntityKind::Product).await.unwrap();

    let calls = api.calls();
    let posted = calls
        .iter()
        .find_map(|c| match c {
            Call::Create(body) => Some(body.clone()),
            _ => None,
        })
        .expect("a create call");
    assert_eq!(posted["name"], json!("Widget"));
    assert_eq!(posted["price"], json!(9.99));
    assert_eq!(calls.last(), Some(&Call::Fetch(PageRequest::new(1, 10))));

    let msg = engine.message(EntityKind::Product).expect("message");
    assert_eq!(msg.level, MessageLevel::Success);
    assert_eq!(msg.text, "Product added successfully");
    assert!(engine.modal(EntityKind::Product).is_none());
    assert_eq!(engine.records(EntityKind::Product).len(), 1);
    assert_eq!(engine.pagination(EntityKind::Product).total_count, 1);
}

#[tokio::test]
async fn failed_refetch_keeps_the_submit_outcome_visible() {
    let api = MockApi::with_records(vec![]);
    let mut engine = engine_with(EntityKind::Product, api.clone());
    engine.refresh(EntityKind::Product).await.unwrap();
    api.configure(|s| s.fetch_error = Some(EngineError::request(Some(500), None)));

    engine.open_add(EntityKind::Product).await.unwrap();
    engine.update_field(EntityKind::Product, "name", "Widget").unwrap();
    engine.update_field(EntityKind::Product, "price", "9.99").unwrap();
    engine.submit(EntityKind::Product).await.unwrap();

    assert_eq!(api.calls().last(), Some(&Call::Fetch(PageRequest::new(1, 10))));
    let msg = engine.message(EntityKind::Product).expect("message");
    assert_eq!(msg.level, MessageLevel::Success);
    assert_eq!(msg.text, "Product added successfully");
    assert!(engine.modal(EntityKind::Product).is_none());
}

#[tokio::test]
async fn blocked_store_delete_shows_server_message_and_closes() {
    let api = MockApi::with_records(vec![json!({"id": 7, "name": "Central", "address": "9 Main St"})]);
    api.configure(|s| {
        s.write_error = Some(EngineError::request(
            Some(400),
            Some("Cannot delete Store, it has reference in Sale.".into()),
        ))
    });
    let mut engine = engine_with(EntityKind::Store, api.clone());
    engine.refresh(EntityKind::Store).await.unwrap();

    engine.open_delete(EntityKind::Store, 7).unwrap();
    let err = engine.submit(EntityKind::Store).await.unwrap_err();
    assert!(matches!(err, EngineError::Request { status: Some(400), .. }));

    let msg = engine.message(EntityKind::Store).expect("message");
    assert_eq!(msg.level, MessageLevel::Error);
    assert_eq!(msg.text, "Cannot delete Store, it has reference in Sale.");
    assert!(engine.modal(EntityKind::Store).is_none());
    assert!(api.calls().contains(&Call::Delete(7)));
    assert_eq!(engine.table(EntityKind::Store).unwrap().rows()[0].id, 7);
}

#[tokio::test]
async fn failed_edit_without_server_message_uses_fallback() {
    let api = MockApi::with_records(vec![json!({"id": 4, "name": "Ann Lee", "address": "1 Road"})]);
    api.configure(|s| s.write_error = Some(EngineError::request(Some(500), None)));
    let mut engine = engine_with(EntityKind::Customer, api.clone());
    engine.refresh(EntityKind::Customer).await.unwrap();

    engine.open_edit(EntityKind::Customer, 4).await.unwrap();
    engine.update_field(EntityKind::Customer, "address", "2 Road").unwrap();
    assert!(engine.submit(EntityKind::Customer).await.is_err());
    assert_eq!(engine.message(EntityKind::Customer).unwrap().text, "Failed to edit customer");
    assert!(api.calls().iter().any(|c| matches!(c, Call::Update(4, body) if body["address"] == json!("2 Road"))));
}

#[tokio::test]
async fn malformed_records_render_the_invalid_placeholder() {
    let api = MockApi::with_records(vec![json!({"id": 1, "name": "Ann"})]);
    let mut engine = engine_with(EntityKind::Customer, api);
    engine.refresh(EntityKind::Customer).await.unwrap();
    let table = engine.table(EntityKind::Customer).unwrap();
    assert_eq!(table.placeholder(), Some(INVALID_RESPONSE_MESSAGE));
    assert!(table.rows().is_empty());
}

#[tokio::test]
async fn empty_collection_renders_no_data() {
    let mut engine = engine_with(EntityKind::Store, MockApi::with_records(vec![]));
    engine.refresh(EntityKind::Store).await.unwrap();
    assert_eq!(engine.table(EntityKind::Store).unwrap().placeholder(), Some(NO_DATA_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn messages_clear_after_ten_seconds() {
    let mut engine = engine_with(EntityKind::Customer, MockApi::with_records(vec![]));
    engine.open_add(EntityKind::Customer).await.unwrap();
    engine.update_field(EntityKind::Customer, "name", "John Doe").unwrap();
    engine.update_field(EntityKind::Customer, "address", "123 Main St").unwrap();
    engine.submit(EntityKind::Customer).await.unwrap();

    tokio::time::advance(Duration::from_secs(9)).await;
    assert!(engine.message(EntityKind::Customer).is_some());
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(engine.message(EntityKind::Customer).is_none());
}

#[tokio::test(start_paused = true)]
async fn hung_submit_times_out_and_closes() {
    let api = MockApi::with_records(vec![]);
    api.configure(|s| s.write_delay = Some(Duration::from_secs(60)));
    let registry = EntityRegistry::new().register(EntityKind::Customer, api);
    let mut engine = Orchestrator::with_timeout(registry, Duration::from_secs(5));

    engine.open_add(EntityKind::Customer).await.unwrap();
    engine.update_field(EntityKind::Customer, "name", "John Doe").unwrap();
    engine.update_field(EntityKind::Customer, "address", "123 Main St").unwrap();
    let err = engine.submit(EntityKind::Customer).await.unwrap_err();
    assert_eq!(err, EngineError::RequestTimedOut(Duration::from_secs(5)));
    assert_eq!(engine.message(EntityKind::Customer).unwrap().text, "Failed to add customer");
    assert!(engine.modal(EntityKind::Customer).is_none());
}

#[tokio::test]
async fn invalid_draft_is_not_sent() {
    let api = MockApi::with_records(vec![]);
    let mut engine = engine_with(EntityKind::Customer, api.clone());
    engine.open_add(EntityKind::Customer).await.unwrap();
    engine.update_field(EntityKind::Customer, "name", " John").unwrap();
    engine.update_field(EntityKind::Customer, "address", "123 Main St").unwrap();

    let err = engine.submit(EntityKind::Customer).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "name"));
    let form = engine.form(EntityKind::Customer).expect("still open");
    assert_eq!(form.phase, ModalPhase::Draft);
    assert_eq!(form.error.map(|e| e.field), Some("name".to_string()));
    assert!(api.calls().iter().all(|c| !matches!(c, Call::Create(_))));
}

#[tokio::test]
async fn one_dialog_per_kind() {
    let product = MockApi::with_records(vec![]);
    let customer = MockApi::with_records(vec![]);
    let registry = EntityRegistry::new()
        .register(EntityKind::Product, product)
        .register(EntityKind::Customer, customer);
    let mut engine = Orchestrator::new(registry);

    engine.open_add(EntityKind::Product).await.unwrap();
    engine.update_field(EntityKind::Product, "name", "Widget").unwrap();
    assert_eq!(
        engine.open_add(EntityKind::Product).await,
        Err(EngineError::ModalBusy(EntityKind::Product))
    );
    assert_eq!(engine.modal(EntityKind::Product).unwrap().record()["name"], json!("Widget"));
    engine.open_add(EntityKind::Customer).await.unwrap();

    engine.cancel(EntityKind::Product).unwrap();
    assert!(engine.form(EntityKind::Product).is_none());
    assert_eq!(engine.cancel(EntityKind::Product), Err(EngineError::NoActiveModal(EntityKind::Product)));
}

#[tokio::test]
async fn unregistered_kind_fails_fast() {
    let api = MockApi::with_records(vec![]);
    let mut engine = engine_with(EntityKind::Product, api.clone());
    assert!(matches!(
        engine.refresh(EntityKind::Customer).await,
        Err(EngineError::UnknownEntityKind(_))
    ));
    assert!(matches!(
        engine.open_add(EntityKind::Sale).await,
        Err(EngineError::UnknownEntityKind(_))
    ));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn sale_draft_loads_every_option_list() {
    let SaleFixture { mut engine, customers } = sale_fixture();
    engine.open_add(EntityKind::Sale).await.unwrap();

    assert_eq!(
        customers.calls(),
        vec![Call::Fetch(PageRequest::new(1, 1)), Call::Fetch(PageRequest::new(1, 2))]
    );
    let form = engine.form(EntityKind::Sale).unwrap();
    match &form.controls[1] {
        Control::Reference { enabled, options, .. } => {
            assert!(*enabled);
            assert_eq!(options.len(), 2);
        }
        other => panic!("unexpected control {:?}", other),
    }

    engine.select_reference(EntityKind::Sale, "customer", 2).unwrap();
    let draft = engine.modal(EntityKind::Sale).unwrap().record();
    assert_eq!(draft["customerId"], json!(2));
    assert_eq!(draft["customer"], json!("Bob"));
}

#[tokio::test]
async fn sale_edit_puts_current_selection_first() {
    let SaleFixture { mut engine, .. } = sale_fixture();
    engine.refresh(EntityKind::Sale).await.unwrap();
    engine.open_edit(EntityKind::Sale, 3).await.unwrap();

    let form = engine.form(EntityKind::Sale).unwrap();
    match &form.controls[1] {
        Control::Reference { options, selected, .. } => {
            assert_eq!(options[0].id, 2);
            assert_eq!(*selected, Some(2));
        }
        other => panic!("unexpected control {:?}", other),
    }
    match &form.controls[0] {
        Control::Date { value, .. } => assert_eq!(value, "2024-02-03"),
        other => panic!("unexpected control {:?}", other),
    }
}

#[tokio::test]
async fn lookup_failure_keeps_references_disabled() {
    let SaleFixture { mut engine, customers } = sale_fixture();
    customers.configure(|s| s.fetch_error = Some(EngineError::request(Some(400), None)));

    let err = engine.open_add(EntityKind::Sale).await.unwrap_err();
    assert!(matches!(err, EngineError::LookupUnavailable(_)));
    assert_eq!(engine.message(EntityKind::Sale).unwrap().level, MessageLevel::Error);

    let form = engine.form(EntityKind::Sale).unwrap();
    assert!(matches!(form.controls[1], Control::Reference { enabled: false, .. }));
    assert!(matches!(
        engine.select_reference(EntityKind::Sale, "customer", 1),
        Err(EngineError::LookupUnavailable(_))
    ));
}

#[tokio::test]
async fn sorting_reorders_the_view_only() {
    let api = MockApi::with_records(vec![
        json!({"id": 1, "name": "Lamp", "price": 20}),
        json!({"id": 2, "name": "anvil", "price": 5.5}),
        json!({"id": 3, "name": "Bolt", "price": 100}),
    ]);
    let mut engine = engine_with(EntityKind::Product, api);
    engine.refresh(EntityKind::Product).await.unwrap();

    engine.sort(EntityKind::Product, "price", false).unwrap();
    let ids: Vec<i64> = engine.table(EntityKind::Product).unwrap().rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, [3, 1, 2]);

    assert!(matches!(
        engine.sort(EntityKind::Product, "colour", true),
        Err(EngineError::SortUnavailable(_))
    ));
    let ids: Vec<i64> = engine.table(EntityKind::Product).unwrap().rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, [3, 1, 2]);

    engine.sort(EntityKind::Product, "name", true).unwrap();
    let names: Vec<String> = engine.table(EntityKind::Product).unwrap().rows().iter().map(|r| r.cells[0].clone()).collect();
    assert_eq!(names, ["anvil", "Bolt", "Lamp"]);
}

#[tokio::test]
async fn paging_refetches_with_new_parameters() {
    let rows: Vec<Value> = (1..=25)
        .map(|i| json!({"id": i, "name": format!("Store {}", i), "address": "1 Main St"}))
        .collect();
    let api = MockApi::with_records(rows);
    let mut engine = engine_with(EntityKind::Store, api.clone());

    engine.change_page(EntityKind::Store, 3).await.unwrap();
    assert_eq!(api.calls().last(), Some(&Call::Fetch(PageRequest::new(3, 10))));
    assert_eq!(engine.records(EntityKind::Store).len(), 5);
    let page = engine.pagination(EntityKind::Store);
    assert_eq!(page.total_pages(), 3);
    assert!(!page.has_next());

    engine.change_page_size(EntityKind::Store, 20).await.unwrap();
    assert_eq!(api.calls().last(), Some(&Call::Fetch(PageRequest::new(1, 20))));
    assert_eq!(engine.pagination(EntityKind::Store).total_pages(), 2);
}

#[tokio::test]
async fn fetch_failure_posts_an_error_and_keeps_records() {
    let api = MockApi::with_records(vec![json!({"id": 1, "name": "Ann", "address": "1 Road"})]);
    let mut engine = engine_with(EntityKind::Customer, api.clone());
    engine.refresh(EntityKind::Customer).await.unwrap();

    api.configure(|s| s.fetch_error = Some(EngineError::request(None, None)));
    assert!(engine.refresh(EntityKind::Customer).await.is_err());
    assert_eq!(engine.message(EntityKind::Customer).unwrap().text, "Failed to fetch customer");
    assert_eq!(engine.records(EntityKind::Customer).len(), 1);
}
