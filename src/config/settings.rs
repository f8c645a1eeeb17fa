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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// 应用程序配置设置
///
/// 包含抓取批次与Tor电路的所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 抓取配置
    pub scraper: ScraperSettings,
    /// Tor电路配置
    pub tor: TorSettings,
}

/// 抓取配置设置
#[derive(Debug, Deserialize)]
pub struct ScraperSettings {
    /// 电路与工作器的数量
    pub thread_count: usize,
    /// 启动后用于探测出口IP的URL（为空时禁用探测）
    pub public_ip_url: Option<String>,
    /// 单次抓取的超时时间（秒）
    pub fetch_timeout_secs: u64,
}

/// Tor电路配置设置
#[derive(Debug, Deserialize)]
pub struct TorSettings {
    /// Tor可执行文件路径
    pub binary: PathBuf,
    /// SOCKS端口基址，第i个电路使用 基址+i
    pub socks_port_offset: u16,
    /// 控制端口基址，第i个电路使用 基址+i
    pub control_port_offset: u16,
    /// 状态目录根路径，第i个电路使用独立子目录
    pub data_directory: PathBuf,
    /// 等待单个电路引导完成的超时时间（秒）
    pub bootstrap_timeout_secs: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件与环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Scraper defaults
            .set_default("scraper.thread_count", 2)?
            .set_default("scraper.public_ip_url", "")?
            .set_default("scraper.fetch_timeout_secs", 60)?
            // Tor defaults
            .set_default("tor.binary", "/usr/bin/tor")?
            .set_default("tor.socks_port_offset", 9250)?
            .set_default("tor.control_port_offset", 9350)?
            .set_default("tor.data_directory", "tor_data")?
            .set_default("tor.bootstrap_timeout_secs", 120)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("TORCRAWL").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置的内部一致性
    ///
    /// 检查线程数为正、端口区间不越界且SOCKS与控制端口区间互不重叠
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 配置有效
    /// * `Err(ConfigError)` - 配置违反约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.scraper.thread_count;
        if count == 0 {
            return Err(ConfigError::Message(
                "scraper.thread_count must be greater than zero".into(),
            ));
        }

        let socks_end = self.tor.socks_port_offset as u64 + count as u64 - 1;
        let control_end = self.tor.control_port_offset as u64 + count as u64 - 1;
        if socks_end > u16::MAX as u64 || control_end > u16::MAX as u64 {
            return Err(ConfigError::Message(format!(
                "port range exceeds 65535 with thread_count {}",
                count
            )));
        }

        let socks_start = self.tor.socks_port_offset as u64;
        let control_start = self.tor.control_port_offset as u64;
        if socks_start <= control_end && control_start <= socks_end {
            return Err(ConfigError::Message(format!(
                "socks port range {}-{} overlaps control port range {}-{}",
                socks_start, socks_end, control_start, control_end
            )));
        }

        Ok(())
    }

    /// 出口IP探测URL，空字符串视为未配置
    pub fn public_ip_url(&self) -> Option<&str> {
        self.scraper
            .public_ip_url
            .as_deref()
            .filter(|u| !u.is_empty())
    }
}
