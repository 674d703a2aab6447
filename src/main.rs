use anyhow::Result;
use scan_reorder::utils::logging;
use scan_reorder::{App, Config};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env().inspect_err(|e| error!("❌ {}", e))?;

    // 初始化并运行应用
    App::initialize(config)
        .run()
        .await
        .inspect_err(|e| error!("❌ {}", e))?;

    Ok(())
}
