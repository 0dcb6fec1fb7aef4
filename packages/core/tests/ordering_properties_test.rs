//! Ordering Property Tests
//!
//! Long move sequences against the in-memory store: sibling keys stay
//! strictly increasing, only the moved row changes, and the tree the service
//! reports matches the store.

#[cfg(test)]
mod ordering_property_tests {
    use category_tree_core::db::{seed_default_categories, CategoryStore, InMemoryCategoryStore};
    use category_tree_core::{
        CategoryService, DropPosition, FractionalOrderCalculator, Requester, VisibilityFilter,
    };
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Deterministic pseudo-random sequence (xorshift)
    struct Moves(u64);

    impl Moves {
        fn next(&mut self, bound: usize) -> usize {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 % bound as u64) as usize
        }
    }

    async fn keys_by_id(store: &InMemoryCategoryStore) -> HashMap<String, (f64, Option<String>)> {
        store
            .snapshot()
            .await
            .into_iter()
            .map(|c| (c.id, (c.order_key, c.parent_id)))
            .collect()
    }

    #[test]
    fn test_flat_reordering_keeps_strict_order() {
        tokio_test::block_on(async {
            let store = Arc::new(InMemoryCategoryStore::new());
            let service = CategoryService::new(store.clone());
            let alice = Requester::user("alice");

            let mut ids = Vec::new();
            for i in 0..8 {
                let node = service
                    .create_node(&alice, &format!("Node {}", i), None, None)
                    .await
                    .unwrap();
                ids.push(node.id);
            }

            let mut rng = Moves(0x2545_f491_4f6c_dd1d);
            for _ in 0..100 {
                let active = &ids[rng.next(ids.len())];
                let reference = &ids[rng.next(ids.len())];
                if active == reference {
                    continue;
                }
                let position = if rng.next(2) == 0 {
                    DropPosition::Before
                } else {
                    DropPosition::After
                };

                let before = keys_by_id(&store).await;
                service
                    .move_node(&alice, active, Some(reference), position)
                    .await
                    .unwrap();
                let after = keys_by_id(&store).await;

                // Exactly the moved row changed
                for (id, value) in &before {
                    if id != active {
                        assert_eq!(after.get(id), Some(value));
                    }
                }

                let siblings = store
                    .list_siblings(None, &VisibilityFilter::All)
                    .await
                    .unwrap();
                assert!(siblings
                    .windows(2)
                    .all(|pair| pair[0].order_key < pair[1].order_key));

                let index_of = |id: &str| siblings.iter().position(|c| c.id == id).unwrap();
                match position {
                    DropPosition::Before => {
                        assert_eq!(index_of(active.as_str()) + 1, index_of(reference.as_str()))
                    }
                    _ => assert_eq!(index_of(active.as_str()), index_of(reference.as_str()) + 1),
                }
            }
        });
    }

    #[tokio::test]
    async fn test_private_nodes_interleave_with_seeded_roots() {
        let store = Arc::new(InMemoryCategoryStore::new());
        let calculator = FractionalOrderCalculator::default();
        let seeded = seed_default_categories(store.as_ref(), &calculator)
            .await
            .unwrap();
        let service = CategoryService::new(store.clone());
        let alice = Requester::user("alice");
        let bob = Requester::user("bob");

        let electronics = seeded.iter().find(|c| c.name == "Electronics").unwrap();
        let mine = service.create_node(&alice, "Mine", None, None).await.unwrap();
        service.create_node(&bob, "Bobs", None, None).await.unwrap();

        service
            .move_node(&alice, &mine.id, Some(&electronics.id), DropPosition::Before)
            .await
            .unwrap();

        let alice_roots: Vec<String> = service
            .get_tree(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.category.name.clone())
            .collect();
        assert_eq!(alice_roots, vec!["Apparel", "Mine", "Electronics", "Furniture"]);

        let bob_roots: Vec<String> = service
            .get_tree(&bob)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.category.name.clone())
            .collect();
        assert_eq!(bob_roots, vec!["Apparel", "Electronics", "Furniture", "Bobs"]);
    }

    #[tokio::test]
    async fn test_repeated_bisection_never_collides_with_neighbours() {
        let store = Arc::new(InMemoryCategoryStore::new());
        let service = CategoryService::new(store.clone());
        let alice = Requester::user("alice");

        let left = service.create_node(&alice, "Left", None, None).await.unwrap();
        let right = service.create_node(&alice, "Right", None, None).await.unwrap();
        let a = service.create_node(&alice, "A", None, None).await.unwrap();
        let b = service.create_node(&alice, "B", None, None).await.unwrap();

        // Alternate two nodes into the shrinking gap after `left`
        for round in 0..60 {
            let (active, reference) = if round % 2 == 0 {
                (&a.id, &left.id)
            } else {
                (&b.id, &left.id)
            };
            let outcome = service
                .move_node(&alice, active, Some(reference), DropPosition::After)
                .await
                .unwrap();

            let left_key = store.find_by_id(&left.id).await.unwrap().unwrap().order_key;
            assert_ne!(outcome.order_key, left_key);
        }

        let roots = store
            .list_siblings(None, &VisibilityFilter::All)
            .await
            .unwrap();
        assert_eq!(roots.len(), 4);
        assert_eq!(roots[0].id, left.id);
        assert!(roots.iter().any(|c| c.id == right.id));
    }
}
