use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands;
use crate::error::TrackerError;
use crate::state::AppState;
use crate::sync::RefreshScheduler;

use super::{Commands, ShellLine, output, run};

const PROMPT: &str = "tracker> ";

/// Split a shell line into words. Single or double quotes group words;
/// an unterminated quote runs to the end of the line.
pub fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

fn prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

async fn show_dashboard(state: &AppState) -> Result<(), TrackerError> {
    run::execute(state, Commands::Stats { range: None }).await?;
    output::section("Trades");
    run::execute(
        state,
        Commands::List {
            status: super::StatusArg::All,
        },
    )
    .await
}

/// Interactive dashboard. Background refresh and change listening run
/// until the user leaves.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    match commands::load_trades(&state).await {
        Ok(source) => log::info!("Shell started with {:?}", source),
        Err(TrackerError::Unauthenticated(_)) => {
            output::warn("Live mode needs a session: `login <user>` or `mode demo`")
        }
        Err(e) => return Err(e.into()),
    }

    let scheduler = RefreshScheduler::new(state.clone());
    scheduler.start().await?;

    if let Err(e) = show_dashboard(&state).await {
        output::error(&e.to_string());
    }
    output::note("Type `help` for commands, `exit` to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let words = split_line(&line);
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit") | Some("quit") => break,
            Some("dashboard") => {
                if let Err(e) = show_dashboard(&state).await {
                    output::error(&e.to_string());
                }
                continue;
            }
            Some(_) => {}
        }

        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Help and usage errors render themselves.
                let _ = e.print();
                continue;
            }
        };

        let restart = matches!(&parsed.command, Commands::Settings(_) | Commands::Mode { .. });
        if let Err(e) = run::execute(&state, parsed.command).await {
            output::error(&e.to_string());
            continue;
        }

        // Pick up a new refresh interval.
        if restart {
            scheduler.start().await?;
        }
    }

    scheduler.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(split_line("  close  TRADE-1   450k "), vec!["close", "TRADE-1", "450k"]);
        assert!(split_line("   ").is_empty());
    }

    #[test]
    fn test_split_quoted_words() {
        assert_eq!(
            split_line(r#"add ABC --note "took profit, 3x" --ticker 'MY TOKEN'"#),
            vec!["add", "ABC", "--note", "took profit, 3x", "--ticker", "MY TOKEN"]
        );
        assert_eq!(split_line(r#"edit T --note """#), vec!["edit", "T", "--note", ""]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(split_line("edit T --note \"half open"), vec!["edit", "T", "--note", "half open"]);
    }
}
