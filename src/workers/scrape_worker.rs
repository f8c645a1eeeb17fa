// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engines::traits::Fetcher;
use crate::queue::ScrapeQueue;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 抓取工作器
///
/// 与一条电路一一绑定，经由该电路的SOCKS端口执行队列中的
/// 抓取任务，直至队列为空后退出
pub struct ScrapeWorker {
    /// 绑定的电路索引
    index: usize,
    /// 绑定电路的SOCKS端口
    socks_port: u16,
    fetcher: Arc<dyn Fetcher>,
    worker_id: Uuid,
}

impl ScrapeWorker {
    /// 创建新的抓取工作器实例
    ///
    /// # 参数
    ///
    /// * `index` - 绑定的电路索引
    /// * `socks_port` - 绑定电路的SOCKS端口
    /// * `fetcher` - 抓取引擎
    pub fn new(index: usize, socks_port: u16, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            index,
            socks_port,
            fetcher,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行抓取工作器
    ///
    /// 循环非阻塞出队并执行任务；首次观察到空队列即退出。
    /// 单个任务的抓取失败作为结果值交给处理器；处理器自身的
    /// panic被隔离在工作器边界，记录日志后继续下一个任务。
    pub async fn run(&self, queue: Arc<ScrapeQueue>) {
        info!("Scrape worker {} started on circuit {}", self.worker_id, self.index);

        while let Some(task) = queue.try_dequeue() {
            debug!(
                "Scraping circuit:{} url:{} via socks port {}",
                self.index, task.url, self.socks_port
            );
            let result = self.fetcher.fetch(&task.url, self.socks_port).await;

            let handled = AssertUnwindSafe(task.handler.handle(
                &task.url,
                task.context.as_ref(),
                &result,
            ))
            .catch_unwind()
            .await;
            if handled.is_err() {
                error!(
                    "Handler panicked for url {} on circuit {}",
                    task.url, self.index
                );
            }
        }

        info!("Scrape worker {} finished, queue drained", self.worker_id);
    }
}
