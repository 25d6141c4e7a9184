// src/main.rs

use buildworker::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("buildworker error: {err:?}");
        std::process::exit(2);
    }

    match run(args).await {
        Ok(summary) if summary.failed => std::process::exit(1),
        Ok(_) => {}
        Err(err) => {
            eprintln!("buildworker error: {err}");
            std::process::exit(2);
        }
    }
}
