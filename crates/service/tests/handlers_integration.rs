//! Integration tests for the default handler wiring: commands in,
//! cascaded events out, collaborators observed through their in-memory
//! implementations.

use std::sync::Arc;

use adapters::{
    InMemoryAllocationsView, InMemoryEventPublisher, InMemoryNotifications, Repository,
};
use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku, Version};
use domain::{Command, Event};
use service::{
    BusConfig, InMemoryUnitOfWork, MessageBus, ServiceError, UnitOfWork, bootstrap, views,
};

struct App {
    bus: MessageBus,
    uow: Arc<InMemoryUnitOfWork>,
    notifications: Arc<InMemoryNotifications>,
    publisher: Arc<InMemoryEventPublisher>,
    view: Arc<InMemoryAllocationsView>,
}

fn bootstrap_test_app() -> App {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let notifications = Arc::new(InMemoryNotifications::new());
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let view = Arc::new(InMemoryAllocationsView::new());
    let bus = bootstrap(
        uow.clone(),
        notifications.clone(),
        publisher.clone(),
        view.clone(),
        BusConfig::fast(),
    );
    App {
        bus,
        uow,
        notifications,
        publisher,
        view,
    }
}

async fn available_quantity(app: &App, sku: &str, batchref: &str) -> i64 {
    app.uow
        .store()
        .get(&Sku::new(sku))
        .await
        .expect("product should be committed")
        .batch(&BatchRef::new(batchref))
        .expect("batch should exist")
        .available_quantity()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod add_batch {
    use super::*;

    #[tokio::test]
    async fn for_a_new_product() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("b1", "CRUNCHY-ARMCHAIR", 100, None))
            .await
            .unwrap();

        assert!(
            app.bus
                .uow()
                .products()
                .get(&Sku::new("CRUNCHY-ARMCHAIR"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(app.uow.committed());
    }

    #[tokio::test]
    async fn for_an_existing_product() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("b1", "CRUNCHY-ARMCHAIR", 100, None))
            .await
            .unwrap();
        app.bus
            .handle(Command::create_batch("b2", "CRUNCHY-ARMCHAIR", 10, None))
            .await
            .unwrap();

        let product = app
            .uow
            .store()
            .get(&Sku::new("CRUNCHY-ARMCHAIR"))
            .await
            .unwrap();
        let refs: Vec<&str> = product
            .batches()
            .iter()
            .map(|b| b.reference().as_str())
            .collect();
        assert_eq!(refs, vec!["b1", "b2"]);
    }
}

mod allocate {
    use super::*;

    #[tokio::test]
    async fn returns_the_chosen_batchref() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "COMPLICATED-LAMP", 100, None))
            .await
            .unwrap();

        let results = app
            .bus
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10))
            .await
            .unwrap();

        assert_eq!(results, vec![Some(BatchRef::new("batch1"))]);
        assert_eq!(available_quantity(&app, "COMPLICATED-LAMP", "batch1").await, 90);
    }

    #[tokio::test]
    async fn errors_for_invalid_sku() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("b1", "AREALSKU", 100, None))
            .await
            .unwrap();

        let err = app
            .bus
            .handle(Command::allocate("o1", "NONEXISTENTSKU", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSku(sku) if sku.as_str() == "NONEXISTENTSKU"));
    }

    #[tokio::test]
    async fn commits_the_transaction() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "COMPLICATED-LAMP", 100, None))
            .await
            .unwrap();
        app.bus
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10))
            .await
            .unwrap();

        assert!(app.uow.committed());
        let product = app
            .uow
            .store()
            .get(&Sku::new("COMPLICATED-LAMP"))
            .await
            .unwrap();
        assert_eq!(product.version_number(), Version::new(1));
    }

    #[tokio::test]
    async fn prefers_the_earlier_eta_regardless_of_creation_order() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch(
                "b1",
                "ROUND-TABLE",
                100,
                Some(date(2011, 1, 2)),
            ))
            .await
            .unwrap();
        app.bus
            .handle(Command::create_batch(
                "b2",
                "ROUND-TABLE",
                100,
                Some(date(2011, 1, 1)),
            ))
            .await
            .unwrap();

        let results = app
            .bus
            .handle(Command::allocate("o1", "ROUND-TABLE", 3))
            .await
            .unwrap();

        assert_eq!(results, vec![Some(BatchRef::new("b2"))]);
    }

    #[tokio::test]
    async fn sends_a_notification_when_out_of_stock() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "COMPLICATED-LAMP", 9, None))
            .await
            .unwrap();

        let results = app
            .bus
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10))
            .await
            .unwrap();

        assert_eq!(results, vec![None]);
        assert_eq!(
            app.notifications.sent_to("stock@made.com").await,
            vec!["Out of stock for COMPLICATED-LAMP".to_string()]
        );
    }

    #[tokio::test]
    async fn out_of_stock_leaves_the_version_unchanged() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "COMPLICATED-LAMP", 9, None))
            .await
            .unwrap();
        app.bus
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10))
            .await
            .unwrap();

        let product = app
            .uow
            .store()
            .get(&Sku::new("COMPLICATED-LAMP"))
            .await
            .unwrap();
        assert_eq!(product.version_number(), Version::initial());
    }

    #[tokio::test]
    async fn publishes_the_allocated_event() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "COMPLICATED-LAMP", 100, None))
            .await
            .unwrap();
        app.bus
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10))
            .await
            .unwrap();

        let published = app.publisher.on_channel("line_allocated").await;
        let [Event::Allocated(data)] = published.as_slice() else {
            panic!("expected exactly one Allocated event, got {published:?}");
        };
        assert_eq!(data.order_id, OrderId::new("o1"));
        assert_eq!(data.batchref, BatchRef::new("batch1"));
    }

    #[tokio::test]
    async fn updates_the_read_model() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "COMPLICATED-LAMP", 100, None))
            .await
            .unwrap();
        app.bus
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10))
            .await
            .unwrap();

        let rows = views::allocations(&OrderId::new("o1"), app.view.as_ref())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, Sku::new("COMPLICATED-LAMP"));
        assert_eq!(rows[0].batchref, BatchRef::new("batch1"));
    }
}

mod change_batch_quantity {
    use super::*;

    #[tokio::test]
    async fn changes_available_quantity() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("batch1", "ADORABLE-SETTEE", 100, None))
            .await
            .unwrap();
        assert_eq!(available_quantity(&app, "ADORABLE-SETTEE", "batch1").await, 100);

        app.bus
            .handle(Command::change_batch_quantity("batch1", 50))
            .await
            .unwrap();

        assert_eq!(available_quantity(&app, "ADORABLE-SETTEE", "batch1").await, 50);
    }

    #[tokio::test]
    async fn errors_for_an_unknown_batch() {
        let app = bootstrap_test_app();
        let err = app
            .bus
            .handle(Command::change_batch_quantity("no-such-batch", 50))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::UnknownBatch(reference) if reference.as_str() == "no-such-batch")
        );
    }

    #[tokio::test]
    async fn reallocates_if_necessary() {
        let app = bootstrap_test_app();
        for command in [
            Command::create_batch("batch1", "INDIFFERENT-TABLE", 50, None),
            Command::create_batch("batch2", "INDIFFERENT-TABLE", 50, Some(date(2011, 1, 1))),
            Command::allocate("order1", "INDIFFERENT-TABLE", 20),
            Command::allocate("order2", "INDIFFERENT-TABLE", 20),
        ] {
            app.bus.handle(command).await.unwrap();
        }
        assert_eq!(available_quantity(&app, "INDIFFERENT-TABLE", "batch1").await, 10);
        assert_eq!(available_quantity(&app, "INDIFFERENT-TABLE", "batch2").await, 50);

        app.bus
            .handle(Command::change_batch_quantity("batch1", 25))
            .await
            .unwrap();

        // One line is deallocated from batch1 and re-allocated to batch2
        // before the bus returns.
        assert_eq!(available_quantity(&app, "INDIFFERENT-TABLE", "batch1").await, 5);
        assert_eq!(available_quantity(&app, "INDIFFERENT-TABLE", "batch2").await, 30);
    }

    #[tokio::test]
    async fn reallocation_keeps_total_allocated_quantity() {
        let app = bootstrap_test_app();
        for command in [
            Command::create_batch("batch1", "INDIFFERENT-TABLE", 50, None),
            Command::create_batch("batch2", "INDIFFERENT-TABLE", 50, Some(date(2011, 1, 1))),
            Command::allocate("order1", "INDIFFERENT-TABLE", 20),
            Command::allocate("order2", "INDIFFERENT-TABLE", 20),
        ] {
            app.bus.handle(command).await.unwrap();
        }

        app.bus
            .handle(Command::change_batch_quantity("batch1", 25))
            .await
            .unwrap();

        let product = app
            .uow
            .store()
            .get(&Sku::new("INDIFFERENT-TABLE"))
            .await
            .unwrap();
        let total_allocated: i64 = product
            .batches()
            .iter()
            .map(|b| b.allocated_quantity())
            .sum();
        assert_eq!(total_allocated, 40);
    }

    #[tokio::test]
    async fn cascades_to_out_of_stock_when_nothing_can_reallocate() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("b1", "SOLITARY-BENCH", 50, None))
            .await
            .unwrap();
        let results = app
            .bus
            .handle(Command::allocate("o1", "SOLITARY-BENCH", 40))
            .await
            .unwrap();
        assert_eq!(results, vec![Some(BatchRef::new("b1"))]);

        app.bus
            .handle(Command::change_batch_quantity("b1", 10))
            .await
            .unwrap();

        // o1's line was deallocated; with no other batch the fresh
        // attempt ran dry and raised a notification.
        assert_eq!(
            app.notifications.sent_to("stock@made.com").await,
            vec!["Out of stock for SOLITARY-BENCH".to_string()]
        );
        let product = app.uow.store().get(&Sku::new("SOLITARY-BENCH")).await.unwrap();
        assert_eq!(
            product.batch(&BatchRef::new("b1")).unwrap().allocated_quantity(),
            0
        );
    }

    #[tokio::test]
    async fn deallocation_clears_the_read_model_row() {
        let app = bootstrap_test_app();
        app.bus
            .handle(Command::create_batch("b1", "SOLITARY-BENCH", 50, None))
            .await
            .unwrap();
        app.bus
            .handle(Command::allocate("o1", "SOLITARY-BENCH", 40))
            .await
            .unwrap();
        assert_eq!(app.view.len().await, 1);

        app.bus
            .handle(Command::change_batch_quantity("b1", 10))
            .await
            .unwrap();

        // Deallocated removed the row and the retry found no stock, so
        // nothing was re-added.
        assert!(
            views::allocations(&OrderId::new("o1"), app.view.as_ref())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn reallocation_moves_the_read_model_row() {
        let app = bootstrap_test_app();
        for command in [
            Command::create_batch("batch1", "INDIFFERENT-TABLE", 50, None),
            Command::create_batch("batch2", "INDIFFERENT-TABLE", 50, Some(date(2011, 1, 1))),
            Command::allocate("order1", "INDIFFERENT-TABLE", 20),
            Command::allocate("order2", "INDIFFERENT-TABLE", 20),
        ] {
            app.bus.handle(command).await.unwrap();
        }

        app.bus
            .handle(Command::change_batch_quantity("batch1", 25))
            .await
            .unwrap();

        let rows = views::allocations(&OrderId::new("order1"), app.view.as_ref())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].batchref, BatchRef::new("batch2"));
    }
}
