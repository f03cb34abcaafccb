use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sms_domain::{SendTask, TaskQueue};
use sms_errors::{SmsError, SmsResult};
use tokio::sync::{mpsc, Mutex};

/// 基于无界mpsc通道的内存队列
///
/// 入队不加锁；出队通过互斥锁串行化接收端，
/// 长度用原子计数维护，读取时不与出队竞争。
pub struct InMemoryTaskQueue {
    sender: mpsc::UnboundedSender<SendTask>,
    receiver: Mutex<mpsc::UnboundedReceiver<SendTask>>,
    size: AtomicUsize,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            size: AtomicUsize::new(0),
        }
    }
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    fn enqueue(&self, task: SendTask) -> SmsResult<()> {
        // 先计数再发送，计数永远不会低于通道内的实际长度
        self.size.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.sender.send(task) {
            self.size.fetch_sub(1, Ordering::SeqCst);
            return Err(SmsError::Internal(format!("任务队列已关闭: {e}")));
        }
        Ok(())
    }

    async fn dequeue(&self) -> SmsResult<SendTask> {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(task) => {
                self.size.fetch_sub(1, Ordering::SeqCst);
                Ok(task)
            }
            None => Err(SmsError::Internal("任务队列已关闭".to_string())),
        }
    }

    fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }
}
