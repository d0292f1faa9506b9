use std::{
    hint::black_box,
    sync::atomic::{AtomicU64, Ordering},
};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use emporium_store::{
    Aggregation,
    Collection,
    CollectionOptions,
    Operator,
    QueryBuilder,
    SortOrder,
    Store,
    StoreConfig,
    UniqueIndex,
};
use serde_json::json;
use tempfile::TempDir;

const SEEDED_DOCUMENTS: u64 = 500;

async fn setup_collection(options: CollectionOptions) -> (Store, Collection, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = Store::open(temp_dir.path(), StoreConfig::default())
        .await
        .unwrap();
    let collection = store
        .collection_with_options("bench_products", options)
        .await
        .unwrap();
    (store, collection, temp_dir)
}

async fn seed(collection: &Collection) {
    for i in 0..SEEDED_DOCUMENTS {
        collection
            .insert(
                &format!("product-{i}"),
                json!({
                    "sku": format!("SKU-{i:05}"),
                    "name": format!("Product {i}"),
                    "price_cents": (i * 37) % 10_000,
                    "category": if i % 3 == 0 { "home" } else { "office" },
                }),
            )
            .await
            .unwrap();
    }
}

fn bench_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (_store, collection, _temp_dir) = rt.block_on(setup_collection(CollectionOptions::default()));
    let next_id = AtomicU64::new(0);

    c.bench_function("collection_insert", |b| {
        b.iter(|| {
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            rt.block_on(async {
                collection
                    .insert(&format!("doc-{id}"), json!({"name": "test", "value": black_box(id)}))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_get(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (_store, collection, _temp_dir) = rt.block_on(async {
        let setup = setup_collection(CollectionOptions::default()).await;
        setup.1.insert("target", json!({"name": "test"})).await.unwrap();
        setup
    });

    c.bench_function("collection_get", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(collection.get("target").await.unwrap());
            });
        });
    });
}

fn bench_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("collection_update", |b| {
        b.iter_batched(
            || {
                rt.block_on(async {
                    let setup = setup_collection(CollectionOptions::default()).await;
                    setup
                        .1
                        .insert("target", json!({"name": "test", "stock": 1}))
                        .await
                        .unwrap();
                    setup
                })
            },
            |(_store, collection, _temp_dir)| {
                rt.block_on(async move {
                    collection
                        .update("target", json!({"stock": black_box(2)}))
                        .await
                        .unwrap();
                });
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_unique_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let options = CollectionOptions::default().unique(UniqueIndex::single("sku"));
    let (_store, collection, _temp_dir) = rt.block_on(async {
        let setup = setup_collection(options).await;
        seed(&setup.1).await;
        setup
    });
    let next_id = AtomicU64::new(SEEDED_DOCUMENTS);

    c.bench_function("collection_insert_unique_500", |b| {
        b.iter(|| {
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            rt.block_on(async {
                collection
                    .insert(&format!("product-{id}"), json!({"sku": format!("SKU-{id:05}")}))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (_store, collection, _temp_dir) = rt.block_on(async {
        let setup = setup_collection(CollectionOptions::default()).await;
        seed(&setup.1).await;
        setup
    });

    c.bench_function("collection_query_filter_sort_page", |b| {
        b.iter(|| {
            rt.block_on(async {
                let query = QueryBuilder::new()
                    .filter("category", Operator::Equals, json!("home"))
                    .sort("price_cents", SortOrder::Descending)
                    .offset(20)
                    .limit(20)
                    .build();
                black_box(collection.query(query).await.unwrap());
            });
        });
    });

    c.bench_function("collection_aggregate_sum", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    collection
                        .aggregate(&[], Aggregation::Sum("price_cents".to_owned()))
                        .await
                        .unwrap(),
                );
            });
        });
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_get,
    bench_update,
    bench_unique_insert,
    bench_query
);
criterion_main!(benches);
