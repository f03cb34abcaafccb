use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sms_domain::{
    DispatchEvent, DispatchObserver, FailureReason, GatewayClient, SendTask, WorkerState,
};
use sms_errors::SmsError;
use sms_worker::WorkerHandle;
use uuid::Uuid;

const RETRY_DELAY: Duration = Duration::from_millis(40);

#[derive(Debug, Clone)]
struct SendCall {
    phone: String,
    message: String,
    at: Instant,
}

/// 按脚本返回结果的网关，脚本用完后一律成功
#[derive(Default)]
struct ScriptedGateway {
    probe_script: Mutex<VecDeque<bool>>,
    send_script: Mutex<VecDeque<bool>>,
    send_delay: Duration,
    sends: Mutex<Vec<SendCall>>,
    probes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    fn always_ok() -> Self {
        Self::default()
    }

    fn with_send_results(results: &[bool]) -> Self {
        Self {
            send_script: Mutex::new(results.iter().copied().collect()),
            ..Default::default()
        }
    }

    fn with_probe_results(results: &[bool]) -> Self {
        Self {
            probe_script: Mutex::new(results.iter().copied().collect()),
            ..Default::default()
        }
    }

    fn with_send_delay(send_delay: Duration) -> Self {
        Self {
            send_delay,
            ..Default::default()
        }
    }

    fn sends(&self) -> Vec<SendCall> {
        self.sends.lock().unwrap().clone()
    }

    fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }
}

#[async_trait]
impl GatewayClient for ScriptedGateway {
    async fn probe_alive(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probe_script.lock().unwrap().pop_front().unwrap_or(true)
    }

    async fn send(&self, phone: &str, message: &str) -> bool {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }

        self.sends.lock().unwrap().push(SendCall {
            phone: phone.to_string(),
            message: message.to_string(),
            at: Instant::now(),
        });
        let result = self.send_script.lock().unwrap().pop_front().unwrap_or(true);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<(DispatchEvent, Uuid)>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<(DispatchEvent, Uuid)> {
        self.events.lock().unwrap().clone()
    }

    fn delivered(&self) -> Vec<Uuid> {
        self.events()
            .into_iter()
            .filter(|(event, _)| *event == DispatchEvent::Delivered)
            .map(|(_, id)| id)
            .collect()
    }

    fn count(&self, event: DispatchEvent) -> usize {
        self.events().iter().filter(|(e, _)| *e == event).count()
    }
}

impl DispatchObserver for RecordingObserver {
    fn on_event(&self, event: DispatchEvent, task: &SendTask) {
        self.events.lock().unwrap().push((event, task.id()));
    }
}

fn is_valid_phone(phone: &str) -> bool {
    match phone.strip_prefix('+') {
        Some(digits) => digits.len() >= 8 && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn build_handle(gateway: Arc<ScriptedGateway>, observer: Arc<RecordingObserver>) -> WorkerHandle {
    WorkerHandle::builder(gateway, Arc::new(is_valid_phone))
        .observer(observer)
        .retry_delay(RETRY_DELAY)
        .build()
}

async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

fn task(phone: &str, message: &str) -> SendTask {
    SendTask::new(phone, message).unwrap()
}

#[tokio::test]
async fn test_valid_task_is_delivered_once() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let observer = Arc::new(RecordingObserver::default());
    let handle = build_handle(Arc::clone(&gateway), Arc::clone(&observer));

    handle.start().await.unwrap();
    assert!(handle.submit(task("+375257654321", "hello")));

    assert!(wait_until(Duration::from_secs(2), || observer.delivered().len() == 1).await);
    assert_eq!(handle.pending_count(), 0);

    let sends = gateway.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].phone, "+375257654321");
    assert_eq!(sends[0].message, "hello");

    handle.shutdown().await;
    assert_eq!(gateway.send_count(), 1);
}

#[tokio::test]
async fn test_invalid_phone_is_dropped_without_send() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let observer = Arc::new(RecordingObserver::default());
    let handle = build_handle(Arc::clone(&gateway), Arc::clone(&observer));

    assert!(handle.submit(task("not-a-phone", "x")));
    assert_eq!(handle.pending_count(), 1);

    handle.start().await.unwrap();
    assert!(
        wait_until(Duration::from_secs(2), || observer.count(DispatchEvent::Dropped) == 1).await
    );
    assert_eq!(handle.pending_count(), 0);
    assert_eq!(gateway.send_count(), 0);
    assert_eq!(gateway.probes.load(Ordering::SeqCst), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_twice_then_delivered() {
    let gateway = Arc::new(ScriptedGateway::with_send_results(&[false, false, true]));
    let observer = Arc::new(RecordingObserver::default());
    let handle = build_handle(Arc::clone(&gateway), Arc::clone(&observer));

    handle.start().await.unwrap();
    let submitted = task("+375257654321", "hello");
    let id = submitted.id();
    assert!(handle.submit(submitted));

    assert!(wait_until(Duration::from_secs(2), || observer.delivered() == vec![id]).await);

    let sends = gateway.sends();
    assert_eq!(sends.len(), 3);
    assert!(sends[2].at.duration_since(sends[0].at) >= RETRY_DELAY * 2);
    assert_eq!(
        observer.count(DispatchEvent::Failed(FailureReason::SendRejected)),
        2
    );
    assert_eq!(handle.pending_count(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_task_goes_behind_later_tasks() {
    let gateway = Arc::new(ScriptedGateway::with_send_results(&[false]));
    let observer = Arc::new(RecordingObserver::default());
    let handle = build_handle(Arc::clone(&gateway), Arc::clone(&observer));

    let a = task("+375250000001", "A");
    let b = task("+375250000002", "B");
    let (a_id, b_id) = (a.id(), b.id());
    assert!(handle.submit(a));
    assert!(handle.submit(b));

    handle.start().await.unwrap();
    assert!(wait_until(Duration::from_secs(2), || observer.delivered().len() == 2).await);

    assert_eq!(observer.delivered(), vec![b_id, a_id]);
    let phones: Vec<String> = gateway.sends().into_iter().map(|c| c.phone).collect();
    assert_eq!(
        phones,
        vec!["+375250000001", "+375250000002", "+375250000001"]
    );

    handle.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_gateway_is_retried_like_rejection() {
    let gateway = Arc::new(ScriptedGateway::with_probe_results(&[false]));
    let observer = Arc::new(RecordingObserver::default());
    let handle = build_handle(Arc::clone(&gateway), Arc::clone(&observer));

    handle.start().await.unwrap();
    assert!(handle.submit(task("+375257654321", "hello")));

    assert!(wait_until(Duration::from_secs(2), || observer.delivered().len() == 1).await);
    assert_eq!(
        observer.count(DispatchEvent::Failed(FailureReason::GatewayUnreachable)),
        1
    );
    assert_eq!(gateway.probes.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.send_count(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_submit_after_stop_is_rejected() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let observer = Arc::new(RecordingObserver::default());
    let handle = build_handle(Arc::clone(&gateway), Arc::clone(&observer));

    handle.start().await.unwrap();
    handle.stop().await;
    assert_eq!(handle.state(), WorkerState::Stopped);

    let before = handle.pending_count();
    assert!(!handle.submit(task("+375257654321", "hello")));
    assert_eq!(handle.pending_count(), before);
    assert_eq!(observer.count(DispatchEvent::Rejected), 1);

    assert!(matches!(
        handle.try_submit(task("+375257654321", "hello")),
        Err(SmsError::LifecycleRejection)
    ));

    handle.shutdown().await;
    assert_eq!(gateway.send_count(), 0);
}

#[tokio::test]
async fn test_submissions_before_start_can_be_refused() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let handle = WorkerHandle::builder(gateway, Arc::new(is_valid_phone))
        .accept_before_start(false)
        .build();

    assert!(!handle.submit(task("+375257654321", "hello")));
    handle.start().await.unwrap();
    assert!(handle.submit(task("+375257654321", "hello")));

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_one_send_in_flight() {
    let gateway = Arc::new(ScriptedGateway::with_send_delay(Duration::from_millis(3)));
    let observer = Arc::new(RecordingObserver::default());
    let handle = Arc::new(build_handle(Arc::clone(&gateway), Arc::clone(&observer)));

    handle.start().await.unwrap();

    let mut producers = Vec::new();
    for i in 0..4 {
        let handle = Arc::clone(&handle);
        producers.push(tokio::spawn(async move {
            for j in 0..10 {
                assert!(handle.submit(task(&format!("+3752500{i:02}{j:03}"), "load")));
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    assert!(wait_until(Duration::from_secs(5), || observer.delivered().len() == 40).await);
    assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.send_count(), 40);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let handle = build_handle(gateway, Arc::new(RecordingObserver::default()));

    assert_eq!(handle.state(), WorkerState::Stopped);
    handle.start().await.unwrap();
    assert_eq!(handle.state(), WorkerState::Running);
    assert!(matches!(handle.start().await, Err(SmsError::AlreadyRunning)));

    handle.shutdown().await;
    assert_eq!(handle.state(), WorkerState::Stopped);

    // 循环退出后可以重新启动
    handle.start().await.unwrap();
    assert!(handle.submit(task("+375257654321", "hello")));
    handle.shutdown().await;
}

#[tokio::test]
async fn test_stop_during_retry_delay_keeps_task_queued() {
    let gateway = Arc::new(ScriptedGateway::with_send_results(&[false]));
    let observer = Arc::new(RecordingObserver::default());
    let handle = WorkerHandle::builder(Arc::clone(&gateway) as Arc<dyn GatewayClient>, Arc::new(is_valid_phone))
        .observer(Arc::clone(&observer) as Arc<dyn DispatchObserver>)
        .retry_delay(Duration::from_millis(200))
        .build();

    handle.start().await.unwrap();
    assert!(handle.submit(task("+375257654321", "hello")));
    assert!(wait_until(Duration::from_secs(2), || gateway.send_count() == 1).await);

    // 重试等待未结束，旧循环仍在运行
    let stopped_at = Instant::now();
    handle.stop().await;
    assert!(matches!(handle.start().await, Err(SmsError::AlreadyRunning)));

    handle.shutdown().await;
    assert!(stopped_at.elapsed() < Duration::from_secs(2));
    assert_eq!(gateway.send_count(), 1);
    assert_eq!(handle.pending_count(), 1);
    assert!(observer.delivered().is_empty());
}

#[tokio::test]
async fn test_shutdown_while_idle_returns_promptly() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let handle = build_handle(gateway, Arc::new(RecordingObserver::default()));

    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .expect("idle worker should stop without waiting for a task");
}

#[tokio::test]
async fn test_stop_does_not_wait_for_pending_shutdown() {
    let gateway = Arc::new(ScriptedGateway::with_send_delay(Duration::from_millis(500)));
    let handle = Arc::new(build_handle(
        Arc::clone(&gateway),
        Arc::new(RecordingObserver::default()),
    ));

    handle.start().await.unwrap();
    assert!(handle.submit(task("+375257654321", "hello")));
    assert!(
        wait_until(Duration::from_secs(2), || gateway.in_flight.load(Ordering::SeqCst) == 1).await
    );

    // shutdown()等待正在进行的发送
    let shutting_down = {
        let handle = Arc::clone(&handle);
        tokio::spawn(async move { handle.shutdown().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!shutting_down.is_finished());

    tokio::time::timeout(Duration::from_millis(100), handle.stop())
        .await
        .expect("stop should not block behind a pending shutdown");
    assert!(!handle.submit(task("+375257654321", "again")));

    shutting_down.await.unwrap();
    assert_eq!(gateway.send_count(), 1);
    assert_eq!(handle.state(), WorkerState::Stopped);
}
