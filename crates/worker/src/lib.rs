//! 短信分发核心
//!
//! 单消费者的分发循环：从队列取任务、校验手机号、调用网关发送，
//! 失败的任务放回队尾并等待固定间隔后继续。

pub mod dispatch;
pub mod handle;
pub mod observer;
pub mod queue;

pub use dispatch::{DispatchOutcome, DispatchSettings, DispatchWorker};
pub use handle::{WorkerHandle, WorkerHandleBuilder, WorkerSettings};
pub use observer::TracingObserver;
pub use queue::InMemoryTaskQueue;
