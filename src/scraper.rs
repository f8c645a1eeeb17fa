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

use crate::circuits::{CircuitError, CircuitSupervisor};
use crate::config::Settings;
use crate::engines::traits::Fetcher;
use crate::engines::SocksFetcher;
use crate::queue::{LogHandler, ScrapeHandler, ScrapeQueue, ScrapeTask};
use crate::workers::WorkerPool;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 协调器错误类型
#[derive(Error, Debug)]
pub enum ScraperError {
    /// 电路启动失败
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    /// 批次已经执行过
    #[error("Scraper has already run")]
    AlreadyRan,
}

/// 批次运行状态
///
/// 所有路径最终恰好收敛到 `Stopped` 一次；
/// 启动失败时从 `CircuitsStarting` 直接进入 `Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    CircuitsStarting,
    Running,
    Draining,
    Stopped,
}

/// 抓取协调器
///
/// 编排一个封闭批次的完整生命周期：启动电路、启动工作器、
/// 等待队列耗尽、无条件终止电路。
///
/// 前置条件：所有任务必须在 `run` 之前入队。工作器在首次观察到
/// 空队列时即退出，运行中入队的任务可能被静默丢弃。
pub struct TorScraper {
    settings: Arc<Settings>,
    queue: Arc<ScrapeQueue>,
    fetcher: Arc<dyn Fetcher>,
    state: RunState,
}

impl TorScraper {
    /// 创建新的抓取协调器实例，使用SOCKS5抓取引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 应用程序配置
    pub fn new(settings: Arc<Settings>) -> Self {
        let timeout = Duration::from_secs(settings.scraper.fetch_timeout_secs);
        Self::with_fetcher(settings, Arc::new(SocksFetcher::new(timeout)))
    }

    /// 创建使用指定抓取引擎的协调器实例
    ///
    /// # 参数
    ///
    /// * `settings` - 应用程序配置
    /// * `fetcher` - 抓取引擎
    pub fn with_fetcher(settings: Arc<Settings>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            settings,
            queue: Arc::new(ScrapeQueue::new()),
            fetcher,
            state: RunState::Idle,
        }
    }

    /// 入队一个使用默认日志处理器的抓取任务
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    pub fn add_scrape(&self, url: impl Into<String>) {
        self.add_scrape_with(url, None, Arc::new(LogHandler));
    }

    /// 入队一个带上下文与自定义处理器的抓取任务
    ///
    /// 必须在 `run` 之前调用（封闭批次前置条件）
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `context` - 随任务传递给处理器的任意上下文
    /// * `handler` - 结果处理器
    pub fn add_scrape_with(
        &self,
        url: impl Into<String>,
        context: Option<Value>,
        handler: Arc<dyn ScrapeHandler>,
    ) {
        assert!(
            self.state == RunState::Idle,
            "tasks must be enqueued before run() starts"
        );
        self.queue.enqueue(ScrapeTask {
            url: url.into(),
            context,
            handler,
        });
    }

    /// 当前排队的任务数
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// 当前运行状态
    pub fn state(&self) -> RunState {
        self.state
    }

    /// 执行批次并阻塞直至全部抓取完成
    ///
    /// 依次：启动电路（任一失败则中止整个批次）、启动与电路
    /// 一一绑定的工作器、等待所有工作器退出、终止全部电路。
    /// 无论批次结果如何，teardown对每条已启动电路恰好执行一次。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 批次完成，所有任务的处理器均已被调用
    /// * `Err(ScraperError)` - 启动失败，没有任何任务被出队
    pub async fn run(&mut self) -> Result<(), ScraperError> {
        if self.state != RunState::Idle {
            return Err(ScraperError::AlreadyRan);
        }

        let count = self.settings.scraper.thread_count;
        self.transition(RunState::CircuitsStarting);
        let supervisor = CircuitSupervisor::new(self.settings.clone(), self.fetcher.clone());
        let mut circuits = match supervisor.start(count).await {
            Ok(circuits) => circuits,
            Err(e) => {
                self.transition(RunState::Stopped);
                return Err(e.into());
            }
        };

        self.transition(RunState::Running);
        let pool = WorkerPool::new(self.fetcher.clone());
        pool.run(&circuits, self.queue.clone()).await;

        self.transition(RunState::Draining);
        supervisor.stop(&mut circuits).await;
        self.transition(RunState::Stopped);
        Ok(())
    }

    fn transition(&mut self, next: RunState) {
        debug!("scraper state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
