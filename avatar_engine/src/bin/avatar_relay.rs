//! 多人同步中继服务
//!
//! ```bash
//! RUST_LOG=info avatar-relay --port 8787 --http-port 8788
//! curl -X POST localhost:8788/animate -H 'content-type: application/json' \
//!      -d '{"type":"emotion","name":"happy"}'
//! ```

use std::process::ExitCode;

use avatar_engine::sync::serve_http;
use avatar_engine::RelayHub;
use clap::Parser;
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(name = "avatar-relay", version, about = "WebSocket relay for avatar animate commands")]
struct Args {
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// 监听端口
    #[arg(short, long, default_value_t = 8787)]
    port: u16,

    /// HTTP 入口端口（`/health`、`/animate`）
    #[arg(long, default_value_t = 8788)]
    http_port: u16,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async move {
        let hub = RelayHub::bind(format!("{}:{}", args.host, args.port)).await?;
        let http = tokio::net::TcpListener::bind(format!("{}:{}", args.host, args.http_port)).await?;
        let handle = hub.handle();

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let mut ws_stop = shutdown_tx.subscribe();
        let mut http_stop = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
            let _ = shutdown_tx.send(());
        });

        tokio::try_join!(
            hub.serve(async move {
                let _ = ws_stop.recv().await;
            }),
            serve_http(http, handle, async move {
                let _ = http_stop.recv().await;
            }),
        )?;
        Ok::<(), avatar_engine::AvatarError>(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("relay stopped: {e}");
            ExitCode::FAILURE
        }
    }
}
