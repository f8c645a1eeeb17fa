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

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// 抓取传输错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 无效的代理配置
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),
}

/// 单个URL抓取失败
///
/// 携带目标URL与底层原因，作为结果值交给任务处理器，
/// 不会作为控制流错误向外传播
#[derive(Error, Debug)]
#[error("Unable to reach {url} ({source})")]
pub struct FetchFailure {
    /// 目标URL
    pub url: String,
    /// 底层传输错误
    #[source]
    pub source: FetchError,
}

/// 抓取结果
///
/// 成功时为原始响应字节，失败时为 [`FetchFailure`]
pub type FetchResult = Result<Bytes, FetchFailure>;

/// 抓取引擎特质
///
/// 通过指定的本地SOCKS5端口执行一次HTTP抓取
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 执行抓取
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `socks_port` - 本地SOCKS5代理端口
    ///
    /// # 返回值
    ///
    /// 原始响应字节，或携带原因的抓取失败值
    async fn fetch(&self, url: &str, socks_port: u16) -> FetchResult;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
