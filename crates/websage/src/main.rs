//! The `websage` command line tool.

#[macro_use]
extern crate tracing;

use std::env;
use std::io;
use std::process::ExitCode;

use owo_colors::OwoColorize;
use rustyline::DefaultEditor;
use websage::bootstrap::{self, ConfigError, Credentials, Launch, RunMode};
use websage::shell::Shell;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => debug!("no .env file found"),
        Err(err) => warn!("failed to load .env file: {err}"),
    }

    let mode = RunMode::from_args(env::args().skip(1));
    let launched =
        Credentials::from_env().and_then(|c| bootstrap::launch(c, mode));
    let launched = match launched {
        Ok(launched) => launched,
        Err(err) => {
            print_config_error(&err);
            return ExitCode::FAILURE;
        }
    };

    match launched {
        Launch::Serve(flows) => {
            let banner = bootstrap::serve_banner(&flows);
            println!("{}", format!("\n🚀 {banner}").bright_cyan());
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("failed to wait for Ctrl+C: {err}");
                return ExitCode::FAILURE;
            }
            info!("shutting down");
            ExitCode::SUCCESS
        }
        Launch::Interactive(session) => {
            let editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(err) => {
                    print_error(&format!("readline error: {err}"));
                    return ExitCode::FAILURE;
                }
            };
            let mut shell = Shell::new(editor, io::stdout(), session);
            if let Err(err) = shell.run().await {
                print_error(&err.to_string());
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

fn print_config_error(err: &ConfigError) {
    print_error(&err.to_string());
    eprintln!("{}", format!("\n💡 Tip: {}", err.tip()).bright_yellow());
}

fn print_error(message: &str) {
    eprintln!("{}", format!("\n✗ Error: {message}").red());
}
