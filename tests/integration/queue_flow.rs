//! Dispatch-to-consumption flow across simulated workers.

use chrono::{Duration, Utc};
use fleetcron::config::{LeaderConfig, SchedulerConfig};
use fleetcron::consumer::QueueConsumer;
use fleetcron::dispatch::{DispatchMode, TaskDispatcher};
use fleetcron::election::ElectionManager;
use fleetcron::message::TaskMessage;
use fleetcron::queue::{MemoryQueue, QueueTransport};
use fleetcron::registry::TaskExecutor;
use fleetcron::scheduler::Scheduler;
use fleetcron::store::{KeyValueStore, MemoryStore};
use fleetcron::WorkerId;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::fixtures::{counting_registry, RecordingQueue};

struct Worker {
    election: ElectionManager,
    dispatcher: TaskDispatcher,
    consumer: QueueConsumer,
}

fn worker(
    store: &Arc<dyn KeyValueStore>,
    queue: &MemoryQueue,
    executor: TaskExecutor,
) -> Worker {
    let election = ElectionManager::new(
        Arc::clone(store),
        WorkerId::generate(),
        LeaderConfig::default(),
    );
    let transport: Arc<dyn QueueTransport> = Arc::new(queue.clone());
    let dispatcher = TaskDispatcher::new(
        executor.clone(),
        DispatchMode::Queued {
            queue: Arc::clone(&transport),
            leadership: election.handle(),
            queue_name: "tasks".to_string(),
            message_ttl: Duration::seconds(60),
        },
    );
    let consumer = QueueConsumer::new(executor, transport, "tasks");
    Worker {
        election,
        dispatcher,
        consumer,
    }
}

#[tokio::test]
async fn test_only_leader_produces_work() {
    let (registry, count) = counting_registry(&["backup"], "* * * * * *");
    let executor = TaskExecutor::new(Arc::new(registry));
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let queue = MemoryQueue::new();

    let workers: Vec<Worker> = (0..3).map(|_| worker(&store, &queue, executor.clone())).collect();
    for w in &workers {
        w.election.election_tick().await;
    }

    // Same task tick fires on every worker; only the leader enqueues
    for w in &workers {
        w.dispatcher.dispatch("backup").await;
    }
    assert_eq!(queue.len("tasks").await, 1);

    // Every worker's consumer ticks; the message executes exactly once
    for w in &workers {
        w.consumer.consume_tick().await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(queue.is_empty("tasks").await);
}

#[tokio::test]
async fn test_consumption_is_not_leader_gated() {
    let (registry, count) = counting_registry(&["backup"], "* * * * * *");
    let executor = TaskExecutor::new(Arc::new(registry));
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let queue = MemoryQueue::new();

    let leader = worker(&store, &queue, executor.clone());
    let follower = worker(&store, &queue, executor);
    leader.election.election_tick().await;
    follower.election.election_tick().await;

    leader.dispatcher.dispatch("backup").await;

    // The follower drains work the leader produced
    follower.consumer.consume_tick().await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_past_expiry_message_is_discarded() {
    // "backup.1700000000000" popped when the clock is already past
    // 1700000001000: discarded, never executed.
    let (registry, count) = counting_registry(&["backup"], "* * * * * *");
    let executor = TaskExecutor::new(Arc::new(registry));
    let queue = MemoryQueue::new();
    queue.push("tasks", "backup.1700000000000").await.unwrap();

    assert!(Utc::now().timestamp_millis() > 1_700_000_001_000);
    let consumer = QueueConsumer::new(executor, Arc::new(queue.clone()), "tasks");
    consumer.consume_tick().await;

    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(queue.is_empty("tasks").await);
}

#[tokio::test]
async fn test_unready_transport_sees_no_push_or_pop() {
    let (registry, count) = counting_registry(&["backup"], "* * * * * *");
    let executor = TaskExecutor::new(Arc::new(registry));
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let recording = Arc::new(RecordingQueue::new(false));
    let transport: Arc<dyn QueueTransport> = recording.clone();

    let election = ElectionManager::new(
        Arc::clone(&store),
        WorkerId::generate(),
        LeaderConfig::default(),
    );
    election.election_tick().await;

    let dispatcher = TaskDispatcher::new(
        executor.clone(),
        DispatchMode::Queued {
            queue: Arc::clone(&transport),
            leadership: election.handle(),
            queue_name: "tasks".to_string(),
            message_ttl: Duration::seconds(60),
        },
    );
    let consumer = QueueConsumer::new(executor, transport, "tasks");

    dispatcher.dispatch("backup").await;
    consumer.consume_tick().await;

    assert_eq!(recording.pushes.load(Ordering::SeqCst), 0);
    assert_eq!(recording.pops.load(Ordering::SeqCst), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_disabled_queue_runs_everywhere() {
    let (registry, count) = counting_registry(&["backup"], "* * * * * *");
    let executor = TaskExecutor::new(Arc::new(registry));

    // Three single-instance processes with no coordination layer at all
    for _ in 0..3 {
        let dispatcher = TaskDispatcher::new(executor.clone(), DispatchMode::Direct);
        dispatcher.dispatch("backup").await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_round_trip_through_real_queue() {
    let queue = MemoryQueue::new();
    let sent = TaskMessage::new("reports.nightly", Utc::now() + Duration::seconds(60));
    queue.push("tasks", &sent.encode()).await.unwrap();

    let raw = queue.pop("tasks").await.unwrap().unwrap();
    assert_eq!(TaskMessage::decode(&raw).unwrap(), sent);
}

#[tokio::test]
async fn test_two_schedulers_end_to_end() {
    let (registry_a, count) = counting_registry(&["heartbeat"], "* * * * * *");
    let (registry_b, _) = {
        // Second process registers the same task against the same counter
        let c = Arc::clone(&count);
        let mut registry = fleetcron::TaskRegistry::new();
        registry.register("heartbeat", "* * * * * *", move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (registry, ())
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let queue: Arc<dyn QueueTransport> = Arc::new(MemoryQueue::new());

    let mut config = SchedulerConfig::default();
    config.queue.enable = true;

    let a = Scheduler::new(
        config.clone(),
        registry_a,
        Some(Arc::clone(&store)),
        Some(Arc::clone(&queue)),
    )
    .unwrap();
    let b = Scheduler::new(config, registry_b, Some(store), Some(queue)).unwrap();

    let leadership = (a.leadership().unwrap(), b.leadership().unwrap());

    let token = CancellationToken::new();
    let (ta, tb) = (token.clone(), token.clone());
    let ha = tokio::spawn(async move { a.run(ta).await });
    // Stagger startup so the second process observes the first's claim
    // instead of racing it (the race path has its own dedicated test)
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let hb = tokio::spawn(async move { b.run(tb).await });

    tokio::time::sleep(std::time::Duration::from_millis(3200)).await;
    token.cancel();
    ha.await.unwrap().unwrap();
    hb.await.unwrap().unwrap();

    // Exactly one process led, and queued work actually executed
    assert!(leadership.0.is_leader() ^ leadership.1.is_leader());
    let executed = count.load(Ordering::SeqCst);
    assert!(executed >= 1, "expected at least one execution, got {}", executed);
    // At-most-once per tick: a ~3.5s run of a one-second schedule cannot
    // legitimately execute more than a handful of times
    assert!(executed <= 5, "duplicate execution suspected: {}", executed);
}
