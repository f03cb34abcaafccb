use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sms_domain::{
    DispatchEvent, DispatchObserver, FailureReason, GatewayClient, PhoneValidator, SendTask,
    TaskQueue,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// 分发循环参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// 投递失败后的等待时间
    pub retry_delay: Duration,
    /// 发送前先探测网关
    pub probe_before_send: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(15),
            probe_before_send: true,
        }
    }
}

/// 单个任务的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 网关确认发送成功，任务被消费
    Delivered,
    /// 手机号无效，任务被永久丢弃
    Dropped,
    /// 投递失败，任务已放回队尾
    Requeued(FailureReason),
}

/// 分发状态机
///
/// Idle -> Validating -> Sending -> {Success, Failed} -> Idle。
/// 队列为空时在出队处挂起；失败后把任务原样放回队尾，再等待固定间隔。
/// 重试次数不设上限，网关持续不可用时同一任务会一直循环。
pub struct DispatchWorker {
    queue: Arc<dyn TaskQueue>,
    gateway: Arc<dyn GatewayClient>,
    validator: Arc<dyn PhoneValidator>,
    observer: Arc<dyn DispatchObserver>,
    settings: DispatchSettings,
}

impl DispatchWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        gateway: Arc<dyn GatewayClient>,
        validator: Arc<dyn PhoneValidator>,
        observer: Arc<dyn DispatchObserver>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            queue,
            gateway,
            validator,
            observer,
            settings,
        }
    }

    pub fn settings(&self) -> DispatchSettings {
        self.settings
    }

    /// 分发循环
    ///
    /// 每轮开始时检查 `running`；空闲等待可以被关闭信号打断，
    /// 正在进行的发送和重试等待不会被打断。
    pub async fn run(&self, running: Arc<AtomicBool>, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("分发循环已启动");

        loop {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            let task = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    debug!("空闲等待期间收到停止信号");
                    break;
                }
                task = self.queue.dequeue() => task,
            };

            match task {
                Ok(task) => {
                    self.process(task).await;
                }
                Err(e) => {
                    error!("从任务队列取任务失败，分发循环退出: {}", e);
                    break;
                }
            }
        }

        info!(pending = self.queue.size(), "分发循环已退出");
    }

    /// 处理一个已出队的任务，失败时包含放回队尾和重试等待
    pub(crate) async fn process(&self, task: SendTask) -> DispatchOutcome {
        let outcome = self.attempt(&task).await;

        debug!(task_id = %task.id(), outcome = ?outcome, "任务处理完成");

        match outcome {
            DispatchOutcome::Delivered => {
                self.observer.on_event(DispatchEvent::Delivered, &task);
            }
            DispatchOutcome::Dropped => {
                self.observer.on_event(DispatchEvent::Dropped, &task);
            }
            DispatchOutcome::Requeued(reason) => {
                self.observer.on_event(DispatchEvent::Failed(reason), &task);
                if let Err(e) = self.queue.enqueue(task) {
                    error!("任务放回队列失败: {}", e);
                }
            }
        }

        self.observer.on_queue_depth(self.queue.size());

        if let DispatchOutcome::Requeued(_) = outcome {
            tokio::time::sleep(self.settings.retry_delay).await;
        }

        outcome
    }

    /// 校验并做一次完整的投递尝试，探测和发送视为同一次尝试
    async fn attempt(&self, task: &SendTask) -> DispatchOutcome {
        if !self.validator.is_valid(task.phone()) {
            return DispatchOutcome::Dropped;
        }

        if self.settings.probe_before_send && !self.gateway.probe_alive().await {
            return DispatchOutcome::Requeued(FailureReason::GatewayUnreachable);
        }

        if self.gateway.send(task.phone(), task.message()).await {
            DispatchOutcome::Delivered
        } else {
            DispatchOutcome::Requeued(FailureReason::SendRejected)
        }
    }
}
