//! Development Binary
//!
//! Seeds an in-memory store with the default shared categories, runs a few
//! moves on behalf of a demo user and prints the resulting tree as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin category-tree-dev
//!
//! # Verbose engine logs
//! RUST_LOG=category_tree_core=debug cargo run --bin category-tree-dev
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//! - `CATEGORY_TREE_INITIAL_KEY`, `CATEGORY_TREE_BOUNDARY_GAP`,
//!   `CATEGORY_TREE_MIN_SPACING`: ordering overrides
//! - `CATEGORY_TREE_EVENT_CAPACITY`: buffered events per subscriber
//! - `CATEGORY_TREE_DEMO_USER`: owner id for the demo requester (default: "demo-user")

use std::env;
use std::sync::Arc;

use category_tree_core::db::seed_default_categories;
use category_tree_core::{
    CategoryService, CategoryTree, DropPosition, FractionalOrderCalculator, InMemoryCategoryStore,
    Requester, TreeConfig, TreeSession,
};

fn print_tree(label: &str, tree: &[CategoryTree]) -> anyhow::Result<()> {
    println!("== {} ==", label);
    println!("{}", serde_json::to_string_pretty(tree)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = TreeConfig::from_env().map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    let calculator = FractionalOrderCalculator::new(config.ordering);
    let store = Arc::new(InMemoryCategoryStore::new());
    let service = CategoryService::with_config(store.clone(), config);

    let active = service.config();
    tracing::info!(
        "Ordering: initial key {}, boundary gap {}, min spacing {}, event capacity {}",
        active.ordering.initial_key,
        active.ordering.boundary_gap,
        active.ordering.min_spacing,
        active.event_channel_capacity
    );

    let seeded = seed_default_categories(store.as_ref(), &calculator).await?;
    tracing::info!("Seeded {} shared categories", seeded.len());

    let user = env::var("CATEGORY_TREE_DEMO_USER").unwrap_or_else(|_| "demo-user".to_string());
    let requester = Requester::user(user);

    let mut events = service.subscribe_to_events();

    let hats = service
        .create_node(&requester, "Hats", Some("Private list"), None)
        .await?;
    let caps = service
        .create_node(&requester, "Caps", None, Some(&hats.id))
        .await?;

    let mut session = TreeSession::new();
    session.set_items(service.get_tree(&requester).await?);
    session.expand_all();

    // Roots are Apparel, Electronics, Furniture, Hats: move Hats to second place
    let electronics = seeded
        .iter()
        .find(|c| c.name == "Electronics")
        .map(|c| c.id.clone());
    session
        .apply_move(
            &service,
            &requester,
            &hats.id,
            electronics.as_deref(),
            DropPosition::Before,
        )
        .await?;

    // Rejected: a category cannot move under its own child
    if let Err(e) = session
        .apply_move(
            &service,
            &requester,
            &hats.id,
            Some(&caps.id),
            DropPosition::Inside,
        )
        .await
    {
        tracing::info!("Rejected as expected: {}", e);
    }

    print_tree("Demo user", &session.get_tree())?;
    print_tree("Anonymous", &service.get_tree(&Requester::Anonymous).await?)?;

    let deleted = service
        .delete_node(&requester, &hats.id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!("Deleted {} categories", deleted.deleted_count);

    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}
