// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 电路模块
///
/// 每个工作器独占一条电路：一个隔离的Tor进程及其
/// SOCKS端口、控制端口与状态目录
pub mod supervisor;

pub use supervisor::{Circuit, CircuitError, CircuitSupervisor};
