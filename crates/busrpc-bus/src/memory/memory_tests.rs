#![allow(non_snake_case)]

use super::*;
use std::time::Duration;

const QUEUE: &str = "rpc_queue";

async fn bus_with_queue() -> InMemoryBus {
    let bus = InMemoryBus::new();
    bus.declare_queue(QUEUE, QueueOptions::default()).await.unwrap();
    bus
}

fn message(body: &str) -> WireMessage {
    WireMessage::new(body.as_bytes().to_vec())
}

async fn next(consumer: &mut Box<dyn Consumer>) -> Delivery {
    tokio::time::timeout(Duration::from_secs(1), consumer.next_delivery())
        .await
        .expect("delivery within a second")
        .unwrap()
        .expect("consumer still active")
}

async fn assert_idle(consumer: &mut Box<dyn Consumer>) {
    let result = tokio::time::timeout(Duration::from_millis(50), consumer.next_delivery()).await;
    assert!(result.is_err(), "expected no delivery");
}

// Publishing

#[tokio::test]
async fn InMemoryBus___publish_unknown_address___no_route() {
    let bus = InMemoryBus::new();

    let result = bus.publish("nowhere", message("x")).await;

    assert_eq!(result, Err(BusError::NoRoute("nowhere".into())));
}

#[tokio::test]
async fn InMemoryBus___declare_twice___keeps_messages() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("a")).await.unwrap();

    bus.declare_queue(QUEUE, QueueOptions::default()).await.unwrap();

    assert_eq!(bus.queue_stats(QUEUE).unwrap().ready, 1);
}

#[tokio::test]
async fn InMemoryBus___consume___delivers_in_fifo_order() {
    let bus = bus_with_queue().await;
    for body in ["1", "2", "3"] {
        bus.publish(QUEUE, message(body)).await.unwrap();
    }
    let mut consumer = bus.consume(QUEUE, 0).await.unwrap();

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let delivery = next(&mut consumer).await;
        bodies.push(String::from_utf8(delivery.message.body.clone()).unwrap());
        delivery.ack().await.unwrap();
    }

    assert_eq!(bodies, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn InMemoryBus___consumer_waiting___woken_by_publish() {
    let bus = bus_with_queue().await;
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();
    let publisher = bus.clone();

    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.publish(QUEUE, message("late")).await.unwrap();
    });

    let delivery = next(&mut consumer).await;
    assert_eq!(delivery.message.body, b"late");
    assert_eq!(delivery.attempt, 1);
    assert!(!delivery.redelivered);
    handle.await.unwrap();
}

// Prefetch

#[tokio::test]
async fn InMemoryBus___prefetch_one___holds_second_until_ack() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("a")).await.unwrap();
    bus.publish(QUEUE, message("b")).await.unwrap();
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();

    let first = next(&mut consumer).await;
    assert_idle(&mut consumer).await;
    let stats = bus.queue_stats(QUEUE).unwrap();
    assert_eq!((stats.ready, stats.unacked), (1, 1));

    first.ack().await.unwrap();
    let second = next(&mut consumer).await;

    assert_eq!(second.message.body, b"b");
}

#[tokio::test]
async fn InMemoryBus___prefetch_zero___unlimited() {
    let bus = bus_with_queue().await;
    for _ in 0..5 {
        bus.publish(QUEUE, message("m")).await.unwrap();
    }
    let mut consumer = bus.consume(QUEUE, 0).await.unwrap();

    let mut held = Vec::new();
    for _ in 0..5 {
        held.push(next(&mut consumer).await);
    }

    assert_eq!(bus.queue_stats(QUEUE).unwrap().unacked, 5);
}

#[tokio::test]
async fn InMemoryBus___competing_consumers___each_take_one() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("a")).await.unwrap();
    bus.publish(QUEUE, message("b")).await.unwrap();
    let mut first = bus.consume(QUEUE, 1).await.unwrap();
    let mut second = bus.consume(QUEUE, 1).await.unwrap();

    let a = next(&mut first).await;
    let b = next(&mut second).await;

    assert_ne!(a.message.body, b.message.body);
    assert_eq!(bus.queue_stats(QUEUE).unwrap().consumers, 2);
}

// Settlement

#[tokio::test]
async fn Delivery___ack___removes_message() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("a")).await.unwrap();
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();

    next(&mut consumer).await.ack().await.unwrap();

    let stats = bus.queue_stats(QUEUE).unwrap();
    assert_eq!((stats.ready, stats.unacked, stats.acked), (0, 0, 1));
}

#[tokio::test]
async fn Delivery___requeue___redelivered_with_next_attempt() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("a")).await.unwrap();
    bus.publish(QUEUE, message("b")).await.unwrap();
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();

    next(&mut consumer).await.requeue().await.unwrap();
    let again = next(&mut consumer).await;

    assert_eq!(again.message.body, b"a");
    assert_eq!(again.attempt, 2);
    assert!(again.redelivered);
    assert_eq!(bus.queue_stats(QUEUE).unwrap().requeued, 1);
}

#[tokio::test]
async fn Delivery___reject_with_dead_letter___moves_to_dead_letter_queue() {
    let bus = InMemoryBus::new();
    bus.declare_queue("dlq", QueueOptions::default()).await.unwrap();
    bus.declare_queue(QUEUE, QueueOptions::default().with_dead_letter("dlq"))
        .await
        .unwrap();
    bus.publish(QUEUE, message("poison")).await.unwrap();
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();

    next(&mut consumer).await.reject().await.unwrap();

    assert_eq!(bus.queue_stats(QUEUE).unwrap().rejected, 1);
    let mut dead = bus.consume("dlq", 1).await.unwrap();
    let delivery = next(&mut dead).await;
    assert_eq!(delivery.message.body, b"poison");
    assert_eq!(delivery.message.header(DEATH_QUEUE_HEADER), Some(QUEUE));
    assert_eq!(delivery.attempt, 1);
}

#[tokio::test]
async fn Delivery___reject_without_dead_letter___dropped() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("poison")).await.unwrap();
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();

    next(&mut consumer).await.reject().await.unwrap();

    let stats = bus.queue_stats(QUEUE).unwrap();
    assert_eq!((stats.ready, stats.unacked, stats.rejected), (0, 0, 1));
}

#[tokio::test]
async fn Consumer___dropped_with_unacked___messages_return_in_order() {
    let bus = bus_with_queue().await;
    for body in ["a", "b", "c"] {
        bus.publish(QUEUE, message(body)).await.unwrap();
    }
    let mut consumer = bus.consume(QUEUE, 0).await.unwrap();
    let a = next(&mut consumer).await;
    let b = next(&mut consumer).await;

    drop(consumer);

    assert_eq!(bus.queue_stats(QUEUE).unwrap().ready, 3);
    assert_eq!(a.ack().await, Err(BusError::UnknownDeliveryTag(1)));
    drop(b);
    let mut replacement = bus.consume(QUEUE, 0).await.unwrap();
    let first = next(&mut replacement).await;
    assert_eq!(first.message.body, b"a");
    assert!(first.redelivered);
}

// Queue lifecycle

#[tokio::test]
async fn InMemoryBus___private_queue___unique_generated_names() {
    let bus = InMemoryBus::new();

    let first = bus.declare_private_queue().await.unwrap();
    let second = bus.declare_private_queue().await.unwrap();

    assert!(first.starts_with("amq.gen-"));
    assert_ne!(first, second);
    assert!(bus.has_queue(&first));
}

#[tokio::test]
async fn InMemoryBus___delete_queue___ends_consumer() {
    let bus = bus_with_queue().await;
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();
    let deleter = bus.clone();

    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deleter.delete_queue(QUEUE).await.unwrap();
    });

    let result = tokio::time::timeout(Duration::from_secs(1), consumer.next_delivery())
        .await
        .unwrap();
    assert!(matches!(result, Ok(None)));
    assert!(!bus.has_queue(QUEUE));
    handle.await.unwrap();
}

#[tokio::test]
async fn InMemoryBus___delete_unknown_queue___queue_not_found() {
    let bus = InMemoryBus::new();

    let result = bus.delete_queue("missing").await;

    assert_eq!(result, Err(BusError::QueueNotFound("missing".into())));
}

#[tokio::test]
async fn InMemoryBus___consume_unknown_queue___queue_not_found() {
    let bus = InMemoryBus::new();

    let result = bus.consume("missing", 1).await;

    assert!(matches!(result, Err(BusError::QueueNotFound(_))));
}

// Connection loss

#[tokio::test]
async fn InMemoryBus___close___fails_waiting_consumer() {
    let bus = bus_with_queue().await;
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();
    let closer = bus.clone();

    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        closer.close();
    });

    let result = tokio::time::timeout(Duration::from_secs(1), consumer.next_delivery())
        .await
        .unwrap();
    assert!(matches!(result, Err(BusError::ConnectionClosed)));
    handle.await.unwrap();
}

#[tokio::test]
async fn InMemoryBus___close___returns_unacked_and_refuses_publish() {
    let bus = bus_with_queue().await;
    bus.publish(QUEUE, message("in-flight")).await.unwrap();
    let mut consumer = bus.consume(QUEUE, 1).await.unwrap();
    let delivery = next(&mut consumer).await;

    bus.close();

    assert!(bus.is_closed());
    assert_eq!(delivery.ack().await, Err(BusError::ConnectionClosed));
    assert_eq!(
        bus.publish(QUEUE, message("after")).await,
        Err(BusError::ConnectionClosed)
    );
    let stats = bus.queue_stats(QUEUE).unwrap();
    assert_eq!((stats.ready, stats.unacked, stats.acked), (1, 0, 0));
}
