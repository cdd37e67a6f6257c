//! Console client: drives the orchestration engine against a running admin server and
//! prints the first page of every kind.
//!
//! Run: `cargo run --example console` (optionally `-- add-customer "Jane Doe" "12 High St"`)

use retail_admin::table::{HeaderCell, TableView};
use retail_admin::{ClientSettings, EntityKind, EntityRegistry, Orchestrator};

fn print_table(view: &TableView) {
    let headers: Vec<&str> = view
        .headers
        .iter()
        .map(|h| match h {
            HeaderCell::Sortable { label, .. } => *label,
            HeaderCell::Action(a) => a.label(),
        })
        .collect();
    println!("== {} ==", view.kind);
    println!("{}", headers.join(" | "));
    match view.placeholder() {
        Some(message) => println!("{}", message),
        None => {
            for row in view.rows() {
                let actions: Vec<&str> = row.actions.iter().map(|a| a.label()).collect();
                println!("{} | {}", row.cells.join(" | "), actions.join(" | "));
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("retail_admin=info")),
        )
        .init();

    let settings = ClientSettings::from_env()?;
    let client = reqwest::Client::builder().build()?;
    let registry = EntityRegistry::http(client, &settings.api_base_url);
    let mut engine = Orchestrator::with_timeout(registry, settings.request_timeout);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [cmd, name, address] = args.as_slice() {
        if cmd == "add-customer" {
            engine.open_add(EntityKind::Customer).await?;
            engine.update_field(EntityKind::Customer, "name", name)?;
            engine.update_field(EntityKind::Customer, "address", address)?;
            if let Err(e) = engine.submit(EntityKind::Customer).await {
                tracing::warn!(error = %e, "add customer failed");
            }
            if let Some(m) = engine.message(EntityKind::Customer) {
                println!("{:?}: {}", m.level, m.text);
            }
        }
    }

    for kind in EntityKind::ALL {
        if let Err(e) = engine.refresh(kind).await {
            tracing::warn!(kind = %kind, error = %e, "refresh failed");
        }
        print_table(&engine.table(kind)?);
        let page = engine.pagination(kind);
        println!("page {} of {} ({} total)\n", page.current_page, page.total_pages(), page.total_count);
    }
    Ok(())
}
