//! Work queue: multi-producer / multi-consumer delivery and shutdown.

use mulepool::error::Error;
use mulepool::model::{CorrelationId, WorkItem};
use mulepool::queue::WorkQueue;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn item(n: usize) -> WorkItem {
    WorkItem::new(CorrelationId::new(), json!({ "text": n.to_string() }))
}

#[test]
fn push_then_try_pop() {
    let queue = WorkQueue::unbounded();
    assert!(queue.try_pop().is_none());

    let first = item(1);
    let id = first.id;
    queue.push(first).unwrap();
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.try_pop().unwrap().id, id);
    assert!(queue.is_empty());
}

#[test]
fn full_queue_rejects_push() {
    let queue = WorkQueue::new(1);
    queue.push(item(1)).unwrap();
    assert!(matches!(
        queue.push(item(2)),
        Err(Error::QueueFull { capacity: 1 })
    ));
}

#[tokio::test]
async fn pop_waits_for_push() {
    let queue = Arc::new(WorkQueue::unbounded());

    let consumer = Arc::clone(&queue);
    let popped = tokio::spawn(async move { consumer.pop().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let pushed = item(7);
    let id = pushed.id;
    queue.push(pushed).unwrap();

    let got = tokio::time::timeout(Duration::from_secs(1), popped)
        .await
        .expect("push must wake a consumer")
        .unwrap()
        .expect("queue is open");
    assert_eq!(got.id, id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_item_is_delivered_exactly_once() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 50;
    const CONSUMERS: usize = 3;

    let queue = Arc::new(WorkQueue::unbounded());

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(item) = queue.pop().await {
                    seen.push(item.id);
                }
                seen
            })
        })
        .collect();

    let mut sent = HashSet::new();
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let items: Vec<_> = (0..PER_PRODUCER).map(|i| item(p * 1000 + i)).collect();
            for item in &items {
                sent.insert(item.id);
            }
            tokio::spawn(async move {
                for item in items {
                    queue.push(item).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }
    queue.close();

    let mut received = Vec::new();
    for consumer in consumers {
        received.extend(consumer.await.unwrap());
    }

    assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);
    let unique: HashSet<_> = received.into_iter().collect();
    assert_eq!(unique, sent);
}

#[tokio::test]
async fn close_wakes_idle_consumers() {
    let queue = Arc::new(WorkQueue::unbounded());
    let consumer = Arc::clone(&queue);
    let popped = tokio::spawn(async move { consumer.pop().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.close();

    let got = tokio::time::timeout(Duration::from_secs(1), popped)
        .await
        .expect("close must wake consumers")
        .unwrap();
    assert!(got.is_none());
}

#[tokio::test]
async fn closed_queue_still_drains_but_refuses_pushes() {
    let queue = WorkQueue::unbounded();
    queue.push(item(1)).unwrap();
    queue.close();

    assert!(matches!(queue.push(item(2)), Err(Error::QueueClosed)));
    assert!(queue.pop().await.is_some());
    assert!(queue.pop().await.is_none());
}
