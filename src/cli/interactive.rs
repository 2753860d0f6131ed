//! Interactive mode - one request per line

use super::display;
use crate::config::AppConfig;
use kelion_core::{all_code_changes, Orchestrator};
use kelion_llm::util::truncate_safe;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = r#"
Available Commands:
  status   - Show status of all agents
  quit     - Exit the program
  help     - Show this help message

Or type any development request, for example:
  "Add a login page with email and password"
  "Create an API endpoint for user registration"
  "Write unit tests for the authentication module"
"#;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    Status,
    Help,
    Request(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => Command::Empty,
        "quit" | "exit" | "q" => Command::Quit,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        _ => Command::Request(line),
    }
}

fn prompt() {
    print!("\n🎯 Your request: ");
    let _ = std::io::stdout().flush();
}

pub async fn run(orchestrator: &Orchestrator, config: &AppConfig) -> anyhow::Result<()> {
    println!("\n💡 Interactive Mode - Type your development requests");
    println!("   Commands: 'status', 'quit', 'help'");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\n👋 Interrupted. Goodbye!");
                return Ok(());
            }
        };
        // EOF
        let Some(line) = line else {
            println!("\n👋 Goodbye!");
            return Ok(());
        };

        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => {
                println!("\n👋 Goodbye!");
                return Ok(());
            }
            Command::Status => display::print_status(&orchestrator.status(), false)?,
            Command::Help => println!("{HELP}"),
            Command::Request(request) => {
                println!("\n🚀 Processing: {}...", truncate_safe(request, 60));
                let name = format!("Task-{}", orchestrator.projects_started() + 1);

                match orchestrator
                    .execute_project(&name, request, config.orchestrator.mode)
                    .await
                {
                    Ok(project) => {
                        print!("{}", project.report(config.orchestrator.excerpt_chars));
                        print!(
                            "{}",
                            display::render_code_changes(
                                &all_code_changes(&project),
                                config.orchestrator.preview_chars
                            )
                        );
                    }
                    Err(e) => println!("\n❌ Error: {e}"),
                }
            }
        }
    }
}
