// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试
///
/// 使用伪装成Tor的shell脚本验证整个批次的生命周期：
/// 电路启动、工作器消费队列、无条件teardown
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use torcrawl::config::settings::{ScraperSettings, Settings, TorSettings};
use torcrawl::engines::FetchResult;
use torcrawl::queue::ScrapeHandler;
use torcrawl::scraper::RunState;
use torcrawl::TorScraper;

fn stub_tor(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    // $6 是 --DataDirectory 的值；记录PID以便验证teardown
    let script = "#!/bin/sh\n\
                  echo \"$$\" > \"$6/pid\"\n\
                  echo 'May 12 00:00:00.000 [notice] Bootstrapped 100% (done): Done'\n\
                  sleep 60\n";
    let path = dir.join("tor-stub.sh");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn settings(binary: PathBuf, data_dir: PathBuf, count: usize) -> Arc<Settings> {
    Arc::new(Settings {
        scraper: ScraperSettings {
            thread_count: count,
            public_ip_url: None,
            fetch_timeout_secs: 2,
        },
        tor: TorSettings {
            binary,
            socks_port_offset: 43250,
            control_port_offset: 43350,
            data_directory: data_dir,
            bootstrap_timeout_secs: 10,
        },
    })
}

struct RecordingHandler {
    calls: Mutex<Vec<(String, Option<Value>, bool)>>,
}

#[async_trait]
impl ScrapeHandler for RecordingHandler {
    async fn handle(&self, url: &str, context: Option<&Value>, result: &FetchResult) {
        self.calls
            .lock()
            .push((url.to_string(), context.cloned(), result.is_ok()));
    }
}

fn process_is_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_full_batch_lifecycle_with_stub_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let binary = stub_tor(dir.path());

    let mut scraper = TorScraper::new(settings(binary, data_dir.clone(), 2));
    let handler = Arc::new(RecordingHandler {
        calls: Mutex::new(Vec::new()),
    });
    for i in 0..4 {
        scraper.add_scrape_with(
            format!("http://host{}.example/", i),
            Some(json!({ "seq": i })),
            handler.clone(),
        );
    }
    assert_eq!(scraper.queued(), 4);

    scraper.run().await.unwrap();
    assert_eq!(scraper.state(), RunState::Stopped);
    assert_eq!(scraper.queued(), 0);

    // 每个任务的处理器恰好被调用一次，上下文原样传递；
    // 伪Tor不代理任何流量，抓取结果应全部为失败值
    let calls = handler.calls.lock();
    assert_eq!(calls.len(), 4);
    for (url, context, ok) in calls.iter() {
        assert!(url.starts_with("http://host"));
        assert!(context.is_some());
        assert!(!ok);
    }

    // teardown后伪Tor进程必须全部消失
    for index in 0..2 {
        let pid_file = data_dir.join(index.to_string()).join("pid");
        let pid = std::fs::read_to_string(pid_file).unwrap();
        assert!(!process_is_alive(pid.trim()));
    }
}

#[tokio::test]
async fn test_empty_batch_completes_without_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let binary = stub_tor(dir.path());
    let mut cfg = settings(binary, dir.path().join("data"), 2);
    Arc::get_mut(&mut cfg).unwrap().tor.socks_port_offset = 43260;
    Arc::get_mut(&mut cfg).unwrap().tor.control_port_offset = 43360;

    let mut scraper = TorScraper::new(cfg);
    scraper.run().await.unwrap();
    assert_eq!(scraper.state(), RunState::Stopped);
    assert_eq!(scraper.queued(), 0);
}
