fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = hhfetch::cli::Args::parse();
    // An explicit --log-level wins; RUST_LOG applies only when it is absent.
    match args.log_level {
        Some(level) => {
            env_logger::Builder::new()
                .filter_level(level)
                .format_timestamp_secs()
                .init();
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .format_timestamp_secs()
                .init();
        }
    }
    if let Err(e) = hhfetch::cli::run(&args) {
        eprintln!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
