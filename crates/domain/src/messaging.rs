use async_trait::async_trait;
use sms_errors::SmsResult;

use crate::entities::SendTask;

/// 待发送任务队列
///
/// FIFO、无容量上限，入队永不拒绝。`dequeue` 在队列为空时挂起，
/// 实现必须是取消安全的：被丢弃的 `dequeue` future 不能吞掉任务。
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 追加到队尾
    fn enqueue(&self, task: SendTask) -> SmsResult<()>;

    /// 等待并取出队首任务
    async fn dequeue(&self) -> SmsResult<SendTask>;

    /// 当前队列长度，不加锁，允许与并发出队存在瞬时偏差
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
