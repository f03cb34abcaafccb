use crate::entities::SendTask;
use crate::events::DispatchEvent;

/// 分发过程观察者
///
/// 回调在worker循环内同步执行，实现不能阻塞；
/// worker不依赖观察结果。
pub trait DispatchObserver: Send + Sync {
    fn on_event(&self, event: DispatchEvent, task: &SendTask);

    fn on_queue_depth(&self, _depth: usize) {}
}

/// 什么都不做的观察者
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {
    fn on_event(&self, _event: DispatchEvent, _task: &SendTask) {}
}
