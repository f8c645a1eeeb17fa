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

use crate::config::Settings;
use crate::engines::traits::Fetcher;
use crate::utils::ports::{ensure_ports_free, PortError};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

/// 引导完成的输出标记
const BOOTSTRAP_MARKER: &str = "Bootstrapped ";
const BOOTSTRAP_DONE: &str = "Bootstrapped 100%";

/// 电路错误类型
#[derive(Error, Debug)]
pub enum CircuitError {
    /// 端口预检失败
    #[error("Port precheck failed: {0}")]
    Ports(#[from] PortError),

    /// 状态目录创建失败
    #[error("Unable to create data directory for circuit {index}: {source}")]
    DataDirectory {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Tor进程启动失败
    #[error("Failed to spawn tor process for circuit {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// 无法读取Tor进程的标准输出
    #[error("Stdout of tor process for circuit {index} is unavailable")]
    StdoutUnavailable { index: usize },

    /// Tor进程在引导完成前退出
    #[error("Tor process for circuit {index} exited before bootstrap completed")]
    ExitedEarly { index: usize },

    /// 引导超时
    #[error("Tor process for circuit {index} did not bootstrap in time")]
    BootstrapTimeout { index: usize },
}

/// 电路
///
/// 一个隔离的Tor进程实例及其专属的本地端口与状态目录。
/// 由监督器创建与终止，运行期间被恰好一个工作器独占。
#[derive(Debug)]
pub struct Circuit {
    /// 电路索引，与工作器一一对应
    pub index: usize,
    /// 本地SOCKS5代理端口
    pub socks_port: u16,
    /// 本地控制端口
    pub control_port: u16,
    /// 独立状态目录
    pub data_directory: PathBuf,
    child: Option<Child>,
}

impl Circuit {
    /// 构造不带进程的电路，仅供测试使用
    #[cfg(test)]
    pub(crate) fn detached(
        index: usize,
        socks_port: u16,
        control_port: u16,
        data_directory: PathBuf,
    ) -> Self {
        Self {
            index,
            socks_port,
            control_port,
            data_directory,
            child: None,
        }
    }
}

/// 电路进程监督器
///
/// 负责按索引启动Tor进程、等待引导完成以及终止所有进程。
/// 端口与进程资源由监督器独占管理，teardown保证恰好执行一次。
pub struct CircuitSupervisor {
    settings: Arc<Settings>,
    fetcher: Arc<dyn Fetcher>,
}

impl CircuitSupervisor {
    /// 创建新的电路进程监督器实例
    ///
    /// # 参数
    ///
    /// * `settings` - 应用程序配置
    /// * `fetcher` - 用于出口IP探测的抓取引擎
    pub fn new(settings: Arc<Settings>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { settings, fetcher }
    }

    /// 计算指定电路的SOCKS端口
    pub fn socks_port(&self, index: usize) -> u16 {
        self.settings.tor.socks_port_offset + index as u16
    }

    /// 计算指定电路的控制端口
    pub fn control_port(&self, index: usize) -> u16 {
        self.settings.tor.control_port_offset + index as u16
    }

    /// 启动指定数量的电路
    ///
    /// 先对全部端口做占用预检，再逐个启动Tor进程并阻塞等待其
    /// 引导完成。任何一个电路失败都会终止已启动的电路并中止整个
    /// 启动过程。每个电路就绪后，若配置了出口IP探测URL，则经由该
    /// 电路做一次尽力而为的探测，失败仅记录日志。
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的电路数量
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<Circuit>)` - 全部就绪的电路
    /// * `Err(CircuitError)` - 启动失败，已启动的电路均已终止
    pub async fn start(&self, count: usize) -> Result<Vec<Circuit>, CircuitError> {
        let mut ports = Vec::with_capacity(count * 2);
        for index in 0..count {
            ports.push(self.socks_port(index));
            ports.push(self.control_port(index));
        }
        ensure_ports_free(&ports)?;

        let mut circuits: Vec<Circuit> = Vec::with_capacity(count);
        for index in 0..count {
            match self.start_one(index).await {
                Ok(circuit) => circuits.push(circuit),
                Err(e) => {
                    self.stop(&mut circuits).await;
                    return Err(e);
                }
            }

            if let Some(url) = self.settings.public_ip_url() {
                match self.fetcher.fetch(url, self.socks_port(index)).await {
                    Ok(body) => info!(
                        "Circuit {} public IP: {}",
                        index,
                        String::from_utf8_lossy(&body).trim()
                    ),
                    Err(e) => warn!("Public IP probe failed for circuit {}: {}", index, e),
                }
            }
        }

        Ok(circuits)
    }

    /// 终止所有电路的Tor进程
    ///
    /// 幂等操作：已终止或已消失的进程不会导致错误，
    /// 对同一电路集合重复调用是安全的
    ///
    /// # 参数
    ///
    /// * `circuits` - 要终止的电路集合
    pub async fn stop(&self, circuits: &mut [Circuit]) {
        for circuit in circuits.iter_mut() {
            if let Some(mut child) = circuit.child.take() {
                if let Err(e) = child.start_kill() {
                    debug!("Circuit {} already gone: {}", circuit.index, e);
                }
                let _ = child.wait().await;
                info!("Circuit {} terminated", circuit.index);
            }
        }
    }

    async fn start_one(&self, index: usize) -> Result<Circuit, CircuitError> {
        let socks_port = self.socks_port(index);
        let control_port = self.control_port(index);
        let data_directory = self.settings.tor.data_directory.join(index.to_string());

        tokio::fs::create_dir_all(&data_directory)
            .await
            .map_err(|source| CircuitError::DataDirectory { index, source })?;

        info!(
            "Launching circuit {} (socks {}, control {})",
            index, socks_port, control_port
        );
        let mut child = Command::new(&self.settings.tor.binary)
            .arg("--SocksPort")
            .arg(socks_port.to_string())
            .arg("--ControlPort")
            .arg(control_port.to_string())
            .arg("--DataDirectory")
            .arg(&data_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CircuitError::Spawn { index, source })?;

        let stdout = child
            .stdout
            .take()
            .ok_or(CircuitError::StdoutUnavailable { index })?;
        let mut lines = BufReader::new(stdout).lines();

        let deadline = Duration::from_secs(self.settings.tor.bootstrap_timeout_secs);
        let bootstrapped = match timeout(deadline, Self::await_bootstrap(index, &mut lines)).await {
            Ok(result) => result,
            Err(_) => Err(CircuitError::BootstrapTimeout { index }),
        };
        if let Err(e) = bootstrapped {
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(e);
        }

        // Keep draining stdout so the child never blocks on a full pipe
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                trace!("tor[{}]: {}", index, line);
            }
        });

        info!("Circuit {} ready on socks port {}", index, socks_port);
        Ok(Circuit {
            index,
            socks_port,
            control_port,
            data_directory,
            child: Some(child),
        })
    }

    async fn await_bootstrap(
        index: usize,
        lines: &mut Lines<BufReader<ChildStdout>>,
    ) -> Result<(), CircuitError> {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.contains(BOOTSTRAP_MARKER) {
                        // Tor前缀形如 "May 12 00:00:00.000 [notice] "
                        let msg = match line.rsplit_once("[notice] ") {
                            Some((_, msg)) => msg,
                            None => line.as_str(),
                        };
                        info!("tor[{}]: {}", index, msg);
                        if line.contains(BOOTSTRAP_DONE) {
                            return Ok(());
                        }
                    }
                }
                Ok(None) => return Err(CircuitError::ExitedEarly { index }),
                Err(_) => return Err(CircuitError::ExitedEarly { index }),
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod tests;
