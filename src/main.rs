mod config;
mod error;
mod logger;
mod stack;
mod template;

use crate::config::StackConfig;
use crate::logger::Logger;
use crate::stack::{Outcome, Stack, STACK_POLICY};
use crate::template::Template;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the stack configuration file
    #[arg(short, long, default_value = "stack_config.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    Logger::init();
    let cli = Cli::parse();

    let config = StackConfig::load(&cli.config)?;
    let template = Template::new(&config);
    let body = template.body()?;
    let stack = Stack::new(&config).await;

    println!(
        "{}...",
        console::style(format!("Provisioning \"{}\"", config.stack_name))
            .green()
            .bold()
    );

    let outcome = stack.reconcile(&body, STACK_POLICY).await?;

    match &outcome {
        Outcome::Applied { stack_id } => {
            println!("{} {stack_id}", console::style("Stack is up").green().bold());
        }
        Outcome::Unchanged { stack_id } => {
            println!(
                "{} {stack_id}",
                console::style("Nothing to update").yellow().bold()
            );
        }
    }

    for (key, value) in stack.outputs().await? {
        println!("{} {value}", console::style(key).bold());
    }

    Ok(())
}
