// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::FetchResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// 抓取结果处理器特质
///
/// 任务完成后由所属工作器调用，无论抓取成功与否
#[async_trait]
pub trait ScrapeHandler: Send + Sync {
    /// 处理抓取结果
    ///
    /// # 参数
    ///
    /// * `url` - 被抓取的URL
    /// * `context` - 入队时附带的上下文
    /// * `result` - 原始响应字节或抓取失败值
    async fn handle(&self, url: &str, context: Option<&Value>, result: &FetchResult);
}

/// 默认结果处理器
///
/// 将URL、上下文与结果写入日志
pub struct LogHandler;

#[async_trait]
impl ScrapeHandler for LogHandler {
    async fn handle(&self, url: &str, context: Option<&Value>, result: &FetchResult) {
        debug!("url: {}", url);
        debug!("context: {:?}", context);
        match result {
            Ok(body) => debug!("result: {} bytes", body.len()),
            Err(failure) => debug!("result: {}", failure),
        }
    }
}

/// 抓取任务
///
/// 入队后不可变，由恰好一个工作器取出并执行
pub struct ScrapeTask {
    /// 目标URL
    pub url: String,
    /// 调用方附带的任意上下文
    pub context: Option<Value>,
    /// 结果处理器
    pub handler: Arc<dyn ScrapeHandler>,
}

/// 抓取任务队列
///
/// 线程安全的先进先出队列。出队操作从不阻塞，
/// 队列为空是工作器的终止条件。
pub struct ScrapeQueue {
    inner: Mutex<VecDeque<ScrapeTask>>,
}

impl ScrapeQueue {
    /// 创建新的空队列
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// 入队任务
    ///
    /// # 参数
    ///
    /// * `task` - 要入队的任务
    pub fn enqueue(&self, task: ScrapeTask) {
        self.inner.lock().push_back(task);
    }

    /// 非阻塞出队
    ///
    /// # 返回值
    ///
    /// * `Some(ScrapeTask)` - 队首任务
    /// * `None` - 队列为空，立即返回而不等待
    pub fn try_dequeue(&self) -> Option<ScrapeTask> {
        self.inner.lock().pop_front()
    }

    /// 当前排队的任务数
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// 队列是否为空
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for ScrapeQueue {
    fn default() -> Self {
        Self::new()
    }
}
