use metrics::{counter, gauge};
use sms_domain::{DispatchEvent, DispatchObserver, SendTask};
use tracing::{debug, info, warn};

/// 默认观察者：记录日志并更新指标
///
/// 未安装metrics recorder时指标调用为空操作。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DispatchObserver for TracingObserver {
    fn on_event(&self, event: DispatchEvent, task: &SendTask) {
        match event {
            DispatchEvent::Submitted => {
                debug!(task_id = %task.id(), phone = %task.phone(), "task submitted");
                counter!("sms_tasks_submitted_total").increment(1);
            }
            DispatchEvent::Rejected => {
                warn!(task_id = %task.id(), phone = %task.phone(), "task rejected, worker stopped");
                counter!("sms_tasks_rejected_total").increment(1);
            }
            DispatchEvent::Delivered => {
                info!(task_id = %task.id(), phone = %task.phone(), "sms delivered");
                counter!("sms_tasks_delivered_total").increment(1);
            }
            DispatchEvent::Dropped => {
                warn!(task_id = %task.id(), phone = %task.phone(), "invalid phone, task dropped");
                counter!("sms_tasks_dropped_total").increment(1);
            }
            DispatchEvent::Failed(reason) => {
                warn!(
                    task_id = %task.id(),
                    phone = %task.phone(),
                    reason = reason.as_str(),
                    "sms delivery failed, task requeued"
                );
                counter!("sms_delivery_failures_total", "reason" => reason.as_str()).increment(1);
            }
        }
    }

    fn on_queue_depth(&self, depth: usize) {
        gauge!("sms_queue_depth").set(depth as f64);
    }
}
