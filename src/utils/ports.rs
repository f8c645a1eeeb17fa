// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::net::TcpListener;
use thiserror::Error;

/// 端口检测错误类型
#[derive(Error, Debug)]
pub enum PortError {
    #[error("端口 {0} 已被占用")]
    PortInUse(u16),

    #[error("端口 {0} 被重复分配")]
    DuplicatePort(u16),
}

/// 检查指定端口是否已被占用
///
/// # 参数
///
/// * `port` - 要检查的端口号
///
/// # 返回值
///
/// * `bool` - 如果端口已被占用返回 true，否则返回 false
pub fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_err()
}

/// 校验一组端口互不重复且均未被占用
///
/// 电路启动前的预检：任何冲突都视为启动失败
///
/// # 参数
///
/// * `ports` - 要校验的端口集合
///
/// # 返回值
///
/// * `Ok(())` - 所有端口可用
/// * `Err(PortError)` - 存在重复或已被占用的端口
pub fn ensure_ports_free(ports: &[u16]) -> Result<(), PortError> {
    let mut seen = HashSet::new();
    for &port in ports {
        if !seen.insert(port) {
            return Err(PortError::DuplicatePort(port));
        }
    }
    for &port in ports {
        if is_port_in_use(port) {
            return Err(PortError::PortInUse(port));
        }
    }
    Ok(())
}
