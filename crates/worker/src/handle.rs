use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sms_config::AppConfig;
use sms_domain::{
    DispatchEvent, DispatchObserver, GatewayClient, PhoneValidator, SendTask, TaskQueue,
    WorkerState,
};
use sms_errors::{SmsError, SmsResult};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::dispatch::{DispatchSettings, DispatchWorker};
use crate::observer::TracingObserver;
use crate::queue::InMemoryTaskQueue;

/// Worker运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub dispatch: DispatchSettings,
    /// start()之前是否接受提交
    pub accept_before_start: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            dispatch: DispatchSettings::default(),
            accept_before_start: true,
        }
    }
}

impl From<&AppConfig> for WorkerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            dispatch: DispatchSettings {
                retry_delay: Duration::from_secs(config.worker.retry_delay_seconds),
                probe_before_send: config.gateway.probe_before_send,
            },
            accept_before_start: config.worker.accept_before_start,
        }
    }
}

/// WorkerHandle构建器
pub struct WorkerHandleBuilder {
    gateway: Arc<dyn GatewayClient>,
    validator: Arc<dyn PhoneValidator>,
    observer: Arc<dyn DispatchObserver>,
    queue: Arc<dyn TaskQueue>,
    settings: WorkerSettings,
}

impl WorkerHandleBuilder {
    pub fn new(gateway: Arc<dyn GatewayClient>, validator: Arc<dyn PhoneValidator>) -> Self {
        Self {
            gateway,
            validator,
            observer: Arc::new(TracingObserver::new()),
            queue: Arc::new(InMemoryTaskQueue::new()),
            settings: WorkerSettings::default(),
        }
    }

    /// 设置观察者，默认为 [`TracingObserver`]
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 替换任务队列实现，默认为 [`InMemoryTaskQueue`]
    pub fn queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn settings(mut self, settings: WorkerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.settings.dispatch.retry_delay = retry_delay;
        self
    }

    pub fn probe_before_send(mut self, probe_before_send: bool) -> Self {
        self.settings.dispatch.probe_before_send = probe_before_send;
        self
    }

    pub fn accept_before_start(mut self, accept_before_start: bool) -> Self {
        self.settings.accept_before_start = accept_before_start;
        self
    }

    pub fn build(self) -> WorkerHandle {
        let worker = DispatchWorker::new(
            Arc::clone(&self.queue),
            self.gateway,
            self.validator,
            Arc::clone(&self.observer),
            self.settings.dispatch,
        );

        WorkerHandle {
            queue: self.queue,
            observer: self.observer,
            worker: Arc::new(worker),
            accepting: AtomicBool::new(self.settings.accept_before_start),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx: Mutex::new(None),
            active: Mutex::new(None),
        }
    }
}

/// Worker控制面，供各个前端使用
///
/// 同一个实例任何时刻最多只有一个分发循环在运行。
pub struct WorkerHandle {
    queue: Arc<dyn TaskQueue>,
    observer: Arc<dyn DispatchObserver>,
    worker: Arc<DispatchWorker>,
    /// 是否接受新任务，stop()之后为false
    accepting: AtomicBool,
    /// 分发循环在每轮开始时检查
    running: Arc<AtomicBool>,
    /// 当前循环的关闭信号，与 `active` 分开加锁，stop()不必等待循环退出
    shutdown_tx: Mutex<Option<broadcast::Sender<()>>>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    pub fn builder(
        gateway: Arc<dyn GatewayClient>,
        validator: Arc<dyn PhoneValidator>,
    ) -> WorkerHandleBuilder {
        WorkerHandleBuilder::new(gateway, validator)
    }

    /// 提交任务，worker已停止时返回false且不入队
    pub fn submit(&self, task: SendTask) -> bool {
        if !self.accepting.load(Ordering::SeqCst) {
            self.observer.on_event(DispatchEvent::Rejected, &task);
            return false;
        }

        self.observer.on_event(DispatchEvent::Submitted, &task);
        let task_id = task.id();
        if let Err(e) = self.queue.enqueue(task) {
            error!(task_id = %task_id, "任务入队失败: {}", e);
            return false;
        }
        self.observer.on_queue_depth(self.queue.size());
        true
    }

    /// 同 [`submit`](Self::submit)，拒绝时返回 [`SmsError::LifecycleRejection`]
    pub fn try_submit(&self, task: SendTask) -> SmsResult<Uuid> {
        let task_id = task.id();
        if self.submit(task) {
            Ok(task_id)
        } else {
            Err(SmsError::LifecycleRejection)
        }
    }

    /// 当前排队任务数，与并发出队之间可能有瞬时偏差
    pub fn pending_count(&self) -> usize {
        self.queue.size()
    }

    pub fn state(&self) -> WorkerState {
        if self.running.load(Ordering::SeqCst) {
            WorkerState::Running
        } else {
            WorkerState::Stopped
        }
    }

    /// 启动分发循环
    ///
    /// 已在运行，或上一次停止后循环还没有退出时，返回 [`SmsError::AlreadyRunning`]。
    pub async fn start(&self) -> SmsResult<()> {
        let mut active = self.active.lock().await;
        if let Some(join) = active.as_ref() {
            if !join.is_finished() {
                return Err(SmsError::AlreadyRunning);
            }
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        *self.shutdown_tx.lock().await = Some(shutdown_tx);
        self.running.store(true, Ordering::SeqCst);
        self.accepting.store(true, Ordering::SeqCst);

        let worker = Arc::clone(&self.worker);
        let running = Arc::clone(&self.running);
        let join = tokio::spawn(async move {
            worker.run(running, shutdown_rx).await;
        });

        *active = Some(join);
        info!(pending = self.queue.size(), "Worker已启动");
        Ok(())
    }

    /// 通知分发循环退出，不清空队列
    ///
    /// 进行中的发送和重试等待会先完成，循环在下一轮开始时退出。
    pub async fn stop(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        let was_running = self.running.swap(false, Ordering::SeqCst);

        if let Some(shutdown_tx) = self.shutdown_tx.lock().await.as_ref() {
            // 循环已退出时没有接收者，发送失败可以忽略
            let _ = shutdown_tx.send(());
        }

        if was_running {
            info!(pending = self.queue.size(), "Worker已停止");
        }
    }

    /// stop()并等待分发循环退出
    pub async fn shutdown(&self) {
        self.stop().await;

        // 持有 `active` 期间start()会等待，保证同时只有一个循环
        let mut active = self.active.lock().await;
        if let Some(join) = active.take() {
            if let Err(e) = join.await {
                error!("分发循环异常退出: {}", e);
            }
        }
    }
}
