use clap::Parser;

#[tokio::main]
async fn main() {
    let args = aether_lib::CliArgs::parse();
    aether_lib::init_logging(args.verbose);

    if let Err(e) = aether_lib::run(args).await {
        log::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
