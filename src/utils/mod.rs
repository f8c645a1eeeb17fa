// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供端口检测、遥测初始化等辅助功能
pub mod ports;
pub mod telemetry;
