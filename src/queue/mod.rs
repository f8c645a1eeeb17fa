// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 实现抓取任务的先进先出队列与结果处理器
pub mod scrape_queue;

pub use scrape_queue::{LogHandler, ScrapeHandler, ScrapeQueue, ScrapeTask};
