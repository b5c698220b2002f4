use clap::Parser;

#[tokio::main]
async fn main() {
    frameboxd::init_tracing();
    let cli = frameboxd::Cli::parse();
    if let Err(err) = frameboxd::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
