// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::config::settings::{ScraperSettings, Settings, TorSettings};
use crate::engines::SocksFetcher;
use std::path::Path;

/// 生成一个伪装成Tor的shell脚本
///
/// 参数约定与真实调用一致：--SocksPort P --ControlPort P --DataDirectory D
fn stub_tor(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("tor-stub.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn settings(binary: PathBuf, data_dir: PathBuf, count: usize, socks: u16, control: u16) -> Settings {
    Settings {
        scraper: ScraperSettings {
            thread_count: count,
            public_ip_url: None,
            fetch_timeout_secs: 5,
        },
        tor: TorSettings {
            binary,
            socks_port_offset: socks,
            control_port_offset: control,
            data_directory: data_dir,
            bootstrap_timeout_secs: 5,
        },
    }
}

fn supervisor(settings: Settings) -> CircuitSupervisor {
    CircuitSupervisor::new(
        Arc::new(settings),
        Arc::new(SocksFetcher::new(Duration::from_secs(1))),
    )
}

#[test]
fn test_port_mapping_per_index() {
    let dir = std::env::temp_dir();
    let supervisor = supervisor(settings(
        PathBuf::from("/usr/bin/tor"),
        dir,
        3,
        9250,
        9350,
    ));

    let socks: Vec<u16> = (0..3).map(|i| supervisor.socks_port(i)).collect();
    let control: Vec<u16> = (0..3).map(|i| supervisor.control_port(i)).collect();
    assert_eq!(socks, vec![9250, 9251, 9252]);
    assert_eq!(control, vec![9350, 9351, 9352]);
}

#[tokio::test]
async fn test_start_assigns_ports_and_directories() {
    let dir = tempfile::tempdir().unwrap();
    let binary = stub_tor(
        dir.path(),
        "echo 'May 12 00:00:00.000 [notice] Bootstrapped 100% (done): Done'; sleep 30",
    );
    let supervisor = supervisor(settings(
        binary,
        dir.path().join("data"),
        3,
        42250,
        42350,
    ));

    let mut circuits = supervisor.start(3).await.unwrap();
    let socks: Vec<u16> = circuits.iter().map(|c| c.socks_port).collect();
    let control: Vec<u16> = circuits.iter().map(|c| c.control_port).collect();
    assert_eq!(socks, vec![42250, 42251, 42252]);
    assert_eq!(control, vec![42350, 42351, 42352]);
    for (i, circuit) in circuits.iter().enumerate() {
        assert_eq!(circuit.index, i);
        assert!(circuit.data_directory.ends_with(i.to_string()));
        assert!(circuit.data_directory.is_dir());
    }

    supervisor.stop(&mut circuits).await;
}

#[tokio::test]
async fn test_bootstrap_failure_aborts_start() {
    let dir = tempfile::tempdir().unwrap();
    // 第二条电路（SocksPort 42261）在引导前退出
    let binary = stub_tor(
        dir.path(),
        "if [ \"$2\" = \"42261\" ]; then exit 1; fi\n\
         echo '[notice] Bootstrapped 100% (done): Done'; sleep 30",
    );
    let supervisor = supervisor(settings(
        binary,
        dir.path().join("data"),
        3,
        42260,
        42360,
    ));

    let err = supervisor.start(3).await.unwrap_err();
    assert!(matches!(err, CircuitError::ExitedEarly { index: 1 }));
}

#[tokio::test]
async fn test_bootstrap_timeout() {
    let dir = tempfile::tempdir().unwrap();
    // 永不输出引导标记
    let binary = stub_tor(dir.path(), "sleep 30");
    let mut cfg = settings(binary, dir.path().join("data"), 1, 42270, 42370);
    cfg.tor.bootstrap_timeout_secs = 1;
    let supervisor = supervisor(cfg);

    let err = supervisor.start(1).await.unwrap_err();
    assert!(matches!(err, CircuitError::BootstrapTimeout { index: 0 }));
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let binary = stub_tor(
        dir.path(),
        "echo '[notice] Bootstrapped 100% (done): Done'; sleep 30",
    );
    let supervisor = supervisor(settings(
        binary,
        dir.path().join("data"),
        1,
        42280,
        42380,
    ));

    let mut circuits = supervisor.start(1).await.unwrap();
    supervisor.stop(&mut circuits).await;
    // 第二次teardown必须是无操作，不得报错
    supervisor.stop(&mut circuits).await;
}

#[tokio::test]
async fn test_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = supervisor(settings(
        dir.path().join("missing-binary"),
        dir.path().join("data"),
        1,
        42290,
        42390,
    ));

    let err = supervisor.start(1).await.unwrap_err();
    assert!(matches!(err, CircuitError::Spawn { index: 0, .. }));
}

#[tokio::test]
async fn test_port_precheck_rejects_bound_port() {
    let listener = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let bound = listener.local_addr().unwrap().port();

    let dir = tempfile::tempdir().unwrap();
    let binary = stub_tor(dir.path(), "echo '[notice] Bootstrapped 100%'; sleep 30");
    let supervisor = supervisor(settings(binary, dir.path().join("data"), 1, bound, 42391));

    let err = supervisor.start(1).await.unwrap_err();
    assert!(matches!(err, CircuitError::Ports(_)));
}
