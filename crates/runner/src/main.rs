use hublink_runner::{CONNECTION_STRING_ENV, DeviceRunner, RunnerConfig};

fn print_help() {
    eprintln!(
        r#"hublink-thing - LED/temperature device on a simulated hub

USAGE:
    hublink-thing [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    {}   Device connection string (overrides the config file)
    RUST_LOG                    Log level filter (default: info)

EXAMPLES:
    # Run with defaults until Ctrl-C
    hublink-thing

    # Run with config file
    hublink-thing --config thing.json
"#,
        CONNECTION_STRING_ENV
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            RunnerConfig::from_file(&path)?
        }
        None => {
            log::info!("Using default configuration");
            RunnerConfig::default()
        }
    }
    .with_env_overrides();

    let runner = DeviceRunner::new(config);
    let report = runner
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    log::info!("{:?}", report);
    Ok(())
}
