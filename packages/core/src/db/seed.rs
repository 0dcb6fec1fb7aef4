//! Default category seed data
//!
//! Inserts three shared root categories with a couple of children each, keyed
//! with the allocator's boundary gap so later drags have room to bisect.

use super::category_store::CategoryStore;
use crate::db::FractionalOrderCalculator;
use crate::models::{Category, NewCategory, VisibilityFilter};
use anyhow::Result;

const DEFAULT_TREE: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "Apparel",
        "Clothing and accessories",
        &[("Menswear", "Men's clothing"), ("Womenswear", "Women's clothing")],
    ),
    (
        "Electronics",
        "Consumer electronics",
        &[("Phones", "Smartphones"), ("Laptops", "Notebook computers")],
    ),
    ("Furniture", "Home furniture", &[]),
];

/// Seed the shared default tree when the store has no shared categories yet.
///
/// Returns the inserted categories, or an empty list if the store was already
/// seeded.
pub async fn seed_default_categories(
    store: &dyn CategoryStore,
    calculator: &FractionalOrderCalculator,
) -> Result<Vec<Category>> {
    let existing = store.list_visible(&VisibilityFilter::SharedOnly).await?;
    if !existing.is_empty() {
        tracing::info!(
            "Store already holds {} shared categories, skipping seed",
            existing.len()
        );
        return Ok(Vec::new());
    }

    let mut inserted = Vec::new();
    let mut root_keys: Vec<f64> = Vec::new();

    for (name, description, children) in DEFAULT_TREE {
        let key = calculator.allocate(&root_keys, root_keys.len());
        root_keys.push(key);

        let root = store
            .insert(NewCategory {
                owner_id: None,
                name: name.to_string(),
                description: Some(description.to_string()),
                parent_id: None,
                order_key: key,
            })
            .await?;
        store.update_path(&root.id, "").await?;

        let mut child_keys: Vec<f64> = Vec::new();
        for (child_name, child_description) in children.iter() {
            let child_key = calculator.allocate(&child_keys, child_keys.len());
            child_keys.push(child_key);

            let child = store
                .insert(NewCategory {
                    owner_id: None,
                    name: child_name.to_string(),
                    description: Some(child_description.to_string()),
                    parent_id: Some(root.id.clone()),
                    order_key: child_key,
                })
                .await?;
            store.update_path(&child.id, &root.name).await?;
            inserted.push(child);
        }

        inserted.push(root);
    }

    tracing::info!("Seeded {} default categories", inserted.len());
    Ok(inserted)
}
