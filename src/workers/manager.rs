// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::circuits::Circuit;
use crate::engines::traits::Fetcher;
use crate::queue::ScrapeQueue;
use crate::workers::scrape_worker::ScrapeWorker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

/// 工作器池
///
/// 固定规模的并发工作器集合，每个工作器独占一条电路。
/// `run` 在所有工作器退出后才返回。
pub struct WorkerPool {
    fetcher: Arc<dyn Fetcher>,
}

impl WorkerPool {
    /// 创建新的工作器池实例
    ///
    /// # 参数
    ///
    /// * `fetcher` - 所有工作器共享的抓取引擎
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// 启动工作器并等待队列耗尽
    ///
    /// 为每条电路派生一个工作器任务，逐个join直到全部退出。
    /// 单个工作器任务的panic被记录日志，不会影响其余工作器，
    /// 也不会向调用方传播。
    ///
    /// # 参数
    ///
    /// * `circuits` - 已就绪的电路，工作器与之一一绑定
    /// * `queue` - 共享的抓取任务队列
    pub async fn run(&self, circuits: &[Circuit], queue: Arc<ScrapeQueue>) {
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(circuits.len());
        for circuit in circuits {
            let worker = ScrapeWorker::new(circuit.index, circuit.socks_port, self.fetcher.clone());
            let queue = queue.clone();
            // We spawn the worker loop on a separate task so all workers run in parallel
            let handle = tokio::spawn(async move {
                worker.run(queue).await;
            });
            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
