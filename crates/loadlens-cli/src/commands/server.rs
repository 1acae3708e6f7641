//! `loadlens server`: run the pipeline and serve it over HTTP.

use loadlens_core::Pipeline;
use tokio_util::sync::CancellationToken;

pub fn run(
    host: &str,
    port: u16,
    remote_url: Option<&str>,
    provider_url: Option<&str>,
    period: Option<&str>,
    every: Option<u64>,
    seed: Option<u64>,
) {
    let pipeline_config = super::pipeline_config(remote_url, provider_url, period, every, seed);
    let base = format!("http://{host}:{port}");

    println!("Loadlens Server v{}", loadlens_core::VERSION);
    println!("   {base}");
    println!("   {}", super::describe_config(&pipeline_config));
    println!();
    println!("   Endpoints:");
    println!("     GET /             API index (try: curl {base})");
    println!("     GET /state        Full pipeline view");
    println!("     GET /metrics      Latest reading across all channels");
    println!("     GET /history      Retained history points, oldest first");
    println!("     GET /suggestions  Active suggestions with provenance");
    println!("     GET /health       Pipeline liveness and tick counter");
    println!();
    println!("   Examples:");
    println!("     curl {base}/metrics");
    println!("     curl {base}/suggestions");
    println!();
    println!("   Press Ctrl+C to stop.");
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let pipeline = match Pipeline::new(pipeline_config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error building pipeline: {e}");
                std::process::exit(1);
            }
        };
        let views = pipeline.subscribe();
        let cancel = CancellationToken::new();

        let signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.cancel();
            }
        });

        let handle = tokio::spawn(pipeline.run(cancel.clone()));
        tokio::select! {
            _ = loadlens_server::run_server(views, host, port) => {}
            _ = cancel.cancelled() => {}
        }
        let _ = handle.await;
    });
}
