use clap::Parser;
use rayon::ThreadPoolBuilder;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn configure_threads(spec: &str) {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    configure_threads(&cli.threads);

    let result = match &cli.command {
        Commands::Optimize {
            fields,
            crops,
            weather,
            rules,
            config,
            start,
            end,
            out,
        } => commands::optimize::handle(
            fields,
            crops,
            weather,
            rules.as_ref(),
            config.as_ref(),
            *start,
            *end,
            out.as_ref(),
        ),
        Commands::Period {
            fields,
            crops,
            weather,
            field,
            crop,
            config,
            start,
            end,
        } => commands::period::handle(
            fields,
            crops,
            weather,
            field,
            crop,
            config.as_ref(),
            *start,
            *end,
        ),
        Commands::Adjust {
            plan,
            moves,
            fields,
            crops,
            weather,
            rules,
            config,
            start,
            end,
            out,
        } => commands::adjust::handle(
            plan,
            moves,
            fields,
            crops,
            weather,
            rules.as_ref(),
            config.as_ref(),
            *start,
            *end,
            out.as_ref(),
        ),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
