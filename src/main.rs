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

use std::sync::Arc;
use torcrawl::config::Settings;
use torcrawl::utils::telemetry;
use torcrawl::TorScraper;
use tracing::info;

/// 主函数
///
/// 应用程序入口点：加载配置、入队命令行给出的URL并执行一个批次
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting torcrawl...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Enqueue the batch before the run starts (closed batch)
    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        anyhow::bail!("Usage: torcrawl URL [URL...]");
    }
    let mut scraper = TorScraper::new(settings);
    for url in urls {
        scraper.add_scrape(url);
    }
    info!("{} scrape tasks enqueued", scraper.queued());

    // 4. Run to completion; circuits are torn down on every path
    scraper.run().await?;
    info!("Batch finished");
    Ok(())
}
