//! NanoRPC hello-world demo.
//!
//! Starts an HTTP server with a single `test` procedure, calls it over
//! loopback, prints the reply and shuts down.
//!
//! ```bash
//! hello-world --port 55555 --workers 2
//! ```

use anyhow::Result;
use argh::FromArgs;

/// Run the NanoRPC hello-world demo.
#[derive(FromArgs)]
struct Options {
    /// address to bind the server on
    #[argh(option, default = "String::from(\"127.0.0.1\")")]
    address: String,

    /// port to serve and call on
    #[argh(option, default = "55555")]
    port: u16,

    /// number of runtime worker threads
    #[argh(option, default = "2")]
    workers: usize,
}

fn main() -> Result<()> {
    let options: Options = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.workers.max(1))
        .enable_all()
        .build()?;
    runtime.block_on(run(options))
}

async fn run(options: Options) -> Result<()> {
    let mut rpc = nanorpc::Server::new();
    rpc.handle("test", |s: String| format!("Tested: {s}"))?;

    let http = nanorpc::easy::make_server(
        options.address.clone(),
        options.port,
        options.workers,
        "/api/",
        rpc,
    )?;

    let client = nanorpc::easy::make_client(
        options.address.clone(),
        options.port,
        options.workers,
        "/api/",
    )
    .await?;

    let reply: String = client.call("test", ("hello",)).await?.result()?;
    tracing::info!(%reply, "server replied");
    println!("{reply}");

    http.stop().await;
    Ok(())
}
