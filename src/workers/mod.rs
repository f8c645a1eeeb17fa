// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 实现抓取工作器及其池化管理
pub mod manager;
pub mod scrape_worker;

pub use manager::WorkerPool;
pub use scrape_worker::ScrapeWorker;
