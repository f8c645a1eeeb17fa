// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 电路模块
///
/// 管理Tor进程的启动、引导同步与终止
pub mod circuits;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 引擎模块
///
/// 实现经由SOCKS5代理的网页抓取引擎
pub mod engines;

/// 队列模块
///
/// 实现线程安全的抓取任务队列
pub mod queue;

/// 协调器模块
///
/// 负责整个抓取批次的生命周期编排
pub mod scraper;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现与电路一一绑定的抓取工作器
pub mod workers;

pub use scraper::TorScraper;
