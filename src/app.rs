use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use sms_api::{create_routes, AppState};
use sms_config::AppConfig;
use sms_domain::PhoneValidator;
use sms_infrastructure::{
    install_prometheus_recorder, E164PhoneValidator, HiLinkGatewayClient, RabbitMqConsumer,
};
use sms_worker::{WorkerHandle, WorkerSettings};
use tokio::{net::TcpListener, sync::broadcast, task::JoinHandle};
use tracing::{error, info};

/// 主应用程序：一个worker加上若干前端
pub struct Application {
    config: AppConfig,
    worker: Arc<WorkerHandle>,
    validator: Arc<dyn PhoneValidator>,
    metrics: Option<PrometheusHandle>,
}

impl Application {
    pub fn new(config: AppConfig) -> Result<Self> {
        let metrics = if config.observability.metrics_enabled {
            Some(install_prometheus_recorder()?)
        } else {
            None
        };

        let gateway = Arc::new(
            HiLinkGatewayClient::new(&config.gateway).context("创建HiLink网关客户端失败")?,
        );
        let validator: Arc<dyn PhoneValidator> =
            Arc::new(E164PhoneValidator::new().context("创建手机号校验器失败")?);

        let worker = WorkerHandle::builder(gateway, Arc::clone(&validator))
            .settings(WorkerSettings::from(&config))
            .build();

        Ok(Self {
            config,
            worker: Arc::new(worker),
            validator,
            metrics,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.worker.pending_count()
    }

    /// 启动worker和前端，收到关闭信号后按顺序停止
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let api_shutdown_rx = shutdown_rx.resubscribe();
        let mq_shutdown_rx = shutdown_rx.resubscribe();

        self.worker.start().await.context("启动worker失败")?;

        let handles = match self.spawn_frontends(api_shutdown_rx, mq_shutdown_rx).await {
            Ok(handles) => handles,
            Err(e) => {
                error!("前端启动失败，停止worker: {e:#}");
                self.worker.shutdown().await;
                return Err(e);
            }
        };

        let _ = shutdown_rx.recv().await;
        info!("应用收到关闭信号");

        self.worker.shutdown().await;

        for handle in handles {
            if let Err(e) = handle.await {
                error!("前端任务异常退出: {}", e);
            }
        }

        Ok(())
    }

    /// 启动已启用的前端，任何一个失败时中止已启动的前端
    async fn spawn_frontends(
        &self,
        api_shutdown_rx: broadcast::Receiver<()>,
        mq_shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Vec<JoinHandle<()>>> {
        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        if self.config.api.enabled {
            handles.push(self.spawn_api(api_shutdown_rx).await?);
        }

        if self.config.message_queue.enabled {
            match self.spawn_rabbitmq(mq_shutdown_rx).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    for handle in &handles {
                        handle.abort();
                    }
                    return Err(e);
                }
            }
        }

        Ok(handles)
    }

    async fn spawn_api(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<JoinHandle<()>> {
        let app = create_routes(AppState {
            worker: Arc::clone(&self.worker),
            validator: Arc::clone(&self.validator),
            metrics: self.metrics.clone(),
        });

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        Ok(tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            });

            if let Err(e) = server.await {
                error!("API服务器运行失败: {}", e);
            }
            info!("API服务器已停止");
        }))
    }

    async fn spawn_rabbitmq(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<JoinHandle<()>> {
        let consumer =
            RabbitMqConsumer::connect(self.config.message_queue.clone(), Arc::clone(&self.worker))
                .await
                .context("连接RabbitMQ失败")?;

        Ok(tokio::spawn(async move {
            if let Err(e) = consumer.run(shutdown_rx).await {
                error!("RabbitMQ消费者运行失败: {}", e);
            }
        }))
    }
}
