#![cfg(feature = "test-utils")]

use modstate::batch::{BatchContext, Reconciler};
use modstate::concurrency::shutdown::create_shutdown_channel;
use modstate::error::ErrorKind;
use modstate::runner::{BatchParams, run_batch};
use modstate::store::both::postgres::PostgresStore;
use modstate::store::checkpoint::MemoryCheckpointStore;
use modstate::store::entity::EntityStore;
use modstate::store::moderation::ModerationStateStore;
use modstate::test_utils::database::spawn_database;
use modstate::test_utils::entity::{node, record_for, workflow};
use modstate::types::{EntityId, RecordKey, SaveOutcome};
use modstate::workflow::ConfiguredWorkflows;
use modstate_telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn lists_ids_in_order_from_start_id() {
    init_test_tracing();

    let database = spawn_database().await;
    for id in [5, 1, 3, 4, 2] {
        database.insert_node(&node(id).build()).await;
    }
    let store = PostgresStore::new(database.pool.clone());

    let ids = store.list_ids(EntityId::new(2), None).await.unwrap();
    assert_eq!(ids, [2, 3, 4, 5].map(EntityId::new));

    let ids = store.list_ids(EntityId::new(2), Some(2)).await.unwrap();
    assert_eq!(ids, [2, 3].map(EntityId::new));

    let ids = store.list_ids(EntityId::new(6), None).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn loads_the_default_translation_of_nodes() {
    init_test_tracing();

    let database = spawn_database().await;
    let published = node(1).published(true).owner(7).build();
    let draft = node(2).bundle("page").build();
    database.insert_node(&published).await;
    database.insert_translation(&published, "fr").await;
    database.insert_node(&draft).await;
    let store = PostgresStore::new(database.pool.clone());

    let entities = store
        .load_entities(&[EntityId::new(1), EntityId::new(2), EntityId::new(3)])
        .await
        .unwrap();

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[&EntityId::new(1)], published);
    assert_eq!(entities[&EntityId::new(2)], draft);
}

#[tokio::test(flavor = "multi_thread")]
async fn saves_and_finds_state_records() {
    init_test_tracing();

    let database = spawn_database().await;
    let store = PostgresStore::new(database.pool.clone());
    let entity = node(1).build();

    let key = RecordKey::for_entity(&entity, "editorial");
    assert!(store.find_state_record(&key).await.unwrap().is_none());

    let mut record = record_for(&entity, "editorial", "draft");
    let outcome = store.save_record(&mut record).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Created);
    assert!(record.id.is_some());

    let found = store.find_state_record(&key).await.unwrap().unwrap();
    assert_eq!(found, record);

    record.moderation_state = "published".to_string();
    let outcome = store.save_record(&mut record).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Updated);

    let found = store.find_state_record(&key).await.unwrap().unwrap();
    assert_eq!(found.moderation_state, "published");
    assert_eq!(found.id, record.id);
    assert_eq!(database.count_state_records().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_keys_are_rejected() {
    init_test_tracing();

    let database = spawn_database().await;
    let store = PostgresStore::new(database.pool.clone());
    let entity = node(1).build();

    let mut first = record_for(&entity, "editorial", "draft");
    store.save_record(&mut first).await.unwrap();

    let mut duplicate = record_for(&entity, "editorial", "draft");
    let err = store.save_record(&mut duplicate).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateStateRecord);
    assert!(duplicate.id.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_rebuilds_every_node() {
    init_test_tracing();

    let database = spawn_database().await;
    for id in 10..=14 {
        database
            .insert_node(&node(id).published(id % 2 == 0).build())
            .await;
    }
    let store = PostgresStore::new(database.pool.clone());
    let reconciler = Reconciler::new(
        store.clone(),
        ConfiguredWorkflows::new(vec![workflow("editorial", None, &["article"])]),
        store.clone(),
    );
    let params = BatchParams {
        batch_size: 2,
        start_id: EntityId::new(10),
        limit: None,
        dry_run: false,
    };

    let (_tx, rx) = create_shutdown_channel();
    let summary = run_batch(&reconciler, &MemoryCheckpointStore::new(), params, rx)
        .await
        .unwrap();
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.succeeded, 5);

    let published = store
        .find_state_record(&RecordKey::for_entity(
            &node(12).published(true).build(),
            "editorial",
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(published.moderation_state, "published");

    // A second run only updates.
    let mut context = BatchContext::default();
    reconciler
        .reconcile_chunk(5, EntityId::new(10), None, &mut context)
        .await
        .unwrap();
    assert!(context.is_finished());
    assert_eq!(database.count_state_records().await, 5);
}
