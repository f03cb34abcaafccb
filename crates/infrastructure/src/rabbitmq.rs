use std::sync::Arc;

use futures::StreamExt;
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, Connection, ConnectionProperties,
};
use sms_config::MessageQueueConfig;
use sms_domain::SendTask;
use sms_errors::{SmsError, SmsResult};
use sms_worker::WorkerHandle;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// 一条投递的处理结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// 已入队，或数据无效直接丢弃
    Ack,
    /// worker已停止，退回broker等待下次消费
    Requeue,
}

/// 解码消息并提交给worker
pub fn handle_payload(handle: &WorkerHandle, data: &[u8]) -> DeliveryDecision {
    let task = match SendTask::decode(data) {
        Ok(task) => task,
        Err(e) => {
            warn!("丢弃无效消息: {}", e);
            return DeliveryDecision::Ack;
        }
    };

    let task_id = task.id();
    if handle.submit(task) {
        debug!(task_id = %task_id, "消息已提交");
        DeliveryDecision::Ack
    } else {
        DeliveryDecision::Requeue
    }
}

/// RabbitMQ前端，把队列中的消息转成短信任务
pub struct RabbitMqConsumer {
    connection: Connection,
    channel: Channel,
    config: MessageQueueConfig,
    handle: Arc<WorkerHandle>,
}

impl RabbitMqConsumer {
    pub async fn connect(config: MessageQueueConfig, handle: Arc<WorkerHandle>) -> SmsResult<Self> {
        let connection = Connection::connect(&config.url, ConnectionProperties::default())
            .await
            .map_err(|e| SmsError::MessageQueue(format!("连接RabbitMQ失败: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| SmsError::MessageQueue(format!("创建通道失败: {e}")))?;

        channel
            .queue_declare(
                &config.queue,
                QueueDeclareOptions {
                    durable: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                SmsError::MessageQueue(format!("声明队列 {} 失败: {e}", config.queue))
            })?;

        info!(queue = %config.queue, "成功连接到RabbitMQ");

        Ok(Self {
            connection,
            channel,
            config,
            handle,
        })
    }

    /// 持续消费直到收到关闭信号或连接断开
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> SmsResult<()> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.config.queue,
                &self.config.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| SmsError::MessageQueue(format!("创建消费者失败: {e}")))?;

        info!(
            queue = %self.config.queue,
            consumer_tag = %self.config.consumer_tag,
            "RabbitMQ消费者已启动"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("RabbitMQ消费者收到关闭信号");
                    break;
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => self.settle(delivery).await,
                        Some(Err(e)) => {
                            error!("接收消息失败: {}", e);
                            break;
                        }
                        None => {
                            warn!("RabbitMQ消费者流已结束");
                            break;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.connection.close(200, "shutdown").await {
            warn!("关闭RabbitMQ连接失败: {}", e);
        }
        Ok(())
    }

    async fn settle(&self, delivery: Delivery) {
        let result = match handle_payload(&self.handle, &delivery.data) {
            DeliveryDecision::Ack => delivery.ack(BasicAckOptions::default()).await,
            DeliveryDecision::Requeue => {
                warn!("worker已停止，消息退回队列");
                delivery
                    .nack(BasicNackOptions {
                        requeue: true,
                        ..Default::default()
                    })
                    .await
            }
        };

        if let Err(e) = result {
            error!("确认消息失败: {}", e);
        }
    }
}
