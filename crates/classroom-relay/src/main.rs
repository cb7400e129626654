//! classroom-relay binary.

use clap::Parser;
use tokio::net::TcpListener;

use classroom_relay::{serve, RoomHub};

#[derive(Parser)]
#[command(name = "classroom-relay", about = "WebSocket room relay for the 3D classroom")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Path the room channel is served under.
    #[arg(long, default_value = classroom_common::ROOM_PATH)]
    room_path: String,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("classroom_relay={}", args.log_level).into()),
        )
        .init();

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(room = %args.room_path, "classroom-relay listening on {}", addr);

    serve(listener, RoomHub::new(), args.room_path).await;
    Ok(())
}
