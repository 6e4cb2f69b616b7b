use anyhow::Result;
use clap::Parser;
use daynote::{
    config::Config,
    daemon::{args::LoggerArgs, initialize_store, start_logger},
    utils::{
        logging::{enable_logging, LOGGER_PREFIX},
        runtime::single_thread_runtime,
    },
};

fn main() -> Result<()> {
    run(LoggerArgs::parse())
}

fn run(args: LoggerArgs) -> Result<()> {
    let config = Config::from_env()?;
    enable_logging(LOGGER_PREFIX, &config.log_dir(), args.log, !args.quiet)?;
    single_thread_runtime()?.block_on(async move {
        if args.init {
            let store = initialize_store(&config).await?;
            println!("Activity store initialized at {}", store.record_dir().display());
            Ok::<(), anyhow::Error>(())
        } else {
            start_logger(&config).await
        }
    })
}
