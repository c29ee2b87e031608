use anyhow::Context;
use blink::agent::CodeAgent;
use blink::credential::{ApiCredential, TOKEN_ENV_VAR};
use blink::logging::init_logging;
use blink::tooling::cli::Cli;
use blink::tooling::repl::Repl;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(Some(&config.logging))?;

    let mut credential = match ApiCredential::obtain() {
        Ok(credential) => credential,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Set {}=<your token> and restart.", TOKEN_ENV_VAR);
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(async {
        let agent = CodeAgent::new(&config, &credential)?;
        tracing::info!(workspace = %agent.store().root().display(), "session started");

        // Interrupts archive the session before the process dies.
        let log = agent.log();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log.lock().archive();
                println!("\nSession saved.");
                std::process::exit(130);
            }
        });

        Repl::new(agent).run().await
    });

    credential.clear();
    result.map_err(Into::into)
}
