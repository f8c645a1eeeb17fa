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

use crate::engines::traits::{FetchError, FetchFailure, FetchResult, Fetcher};
use async_trait::async_trait;
use std::time::Duration;
use tracing::error;

/// SOCKS5抓取引擎
///
/// 基于reqwest实现，所有流量经由 `socks5h://127.0.0.1:<port>` 转发。
/// 使用 `socks5h` 方案使目标主机名在代理侧解析，避免本地DNS泄漏。
pub struct SocksFetcher {
    /// 单次抓取的超时时间
    timeout: Duration,
}

impl SocksFetcher {
    /// 创建新的SOCKS5抓取引擎实例
    ///
    /// # 参数
    ///
    /// * `timeout` - 单次抓取的超时时间
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn fetch_inner(&self, url: &str, socks_port: u16) -> Result<bytes::Bytes, FetchError> {
        let proxy_url = format!("socks5h://127.0.0.1:{}", socks_port);
        let proxy = reqwest::Proxy::all(&proxy_url)
            .map_err(|e| FetchError::InvalidProxy(format!("{}: {}", proxy_url, e)))?;

        // Each fetch gets a fresh client so circuits never share connection state
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; torcrawl/1.0)")
            .timeout(self.timeout)
            .proxy(proxy)
            .build()?;

        let response = client.get(url).send().await?;
        let body = response.bytes().await?;
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for SocksFetcher {
    /// 经由指定SOCKS5端口执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `socks_port` - 本地SOCKS5代理端口
    ///
    /// # 返回值
    ///
    /// 原始响应字节；任何传输层错误都作为 [`FetchFailure`] 值返回
    async fn fetch(&self, url: &str, socks_port: u16) -> FetchResult {
        match self.fetch_inner(url, socks_port).await {
            Ok(body) => Ok(body),
            Err(source) => {
                error!("Unable to reach {} ({})", url, source);
                Err(FetchFailure {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "socks5h"
    }
}
