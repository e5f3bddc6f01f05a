use anyhow::Result;
use clap::Parser;
use speech_qa_data::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("speech_qa_data=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
