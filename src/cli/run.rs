use std::collections::HashMap;

use crate::commands;
use crate::error::TrackerError;
use crate::models::{
    CreateTradeInput, EditTradeInput, LayoutItem, StatusFilter, Trade, UnrealizedPnLEntry,
    UpdateSettingsInput,
};
use crate::state::{AppState, TradeSource};

use super::output;
use super::{AddArgs, ApiKeyCommand, Commands, EditArgs, ModeArg, SettingsCommand, WidgetsCommand};

async fn unrealized_by_id(state: &AppState) -> Result<HashMap<String, UnrealizedPnLEntry>, TrackerError> {
    Ok(commands::get_unrealized(state)
        .await?
        .into_iter()
        .map(|entry| (entry.trade_id.clone(), entry))
        .collect())
}

/// Fill omitted edit fields from the current trade.
fn edit_input(current: &Trade, args: EditArgs) -> EditTradeInput {
    let exit_market_cap = if args.reopen {
        None
    } else {
        args.exit
            .or_else(|| current.exit_market_cap.map(|mc| mc.to_string()))
    };

    EditTradeInput {
        entry_market_cap: args
            .entry
            .unwrap_or_else(|| current.entry_market_cap.to_string()),
        exit_market_cap,
        size: args.size.unwrap_or_else(|| current.size.to_string()),
        note: args.note.unwrap_or_else(|| current.note.clone()),
    }
}

fn add_input(args: AddArgs) -> CreateTradeInput {
    CreateTradeInput {
        token_address: args.address,
        ticker: args.ticker,
        entry_market_cap: args.entry,
        exit_market_cap: args.exit,
        size: args.size,
        sol_price: args.sol_price,
        note: args.note,
    }
}

/// Run one dashboard command and print its result.
pub async fn execute(state: &AppState, command: Commands) -> Result<(), TrackerError> {
    match command {
        Commands::Add(args) => {
            let trade = commands::create_trade(state, add_input(args)).await?;
            output::ok(&format!("Added {} ({})", trade.ticker, trade.id));
        }
        Commands::Close { id, exit } => {
            let trade = commands::close_trade(state, &id, &exit).await?;
            output::trade_detail(&trade, &unrealized_by_id(state).await?);
        }
        Commands::Edit(args) => {
            let current = commands::get_trade(state, &args.id).await?;
            let id = args.id.clone();
            let trade = commands::edit_trade(state, &id, edit_input(&current, args)).await?;
            output::trade_detail(&trade, &unrealized_by_id(state).await?);
        }
        Commands::Delete { id, yes } => {
            if !yes {
                let trade = commands::get_trade(state, &id).await?;
                output::warn(&format!(
                    "This deletes {} ({}). Re-run with --yes to confirm.",
                    trade.ticker, trade.id
                ));
                return Ok(());
            }
            if commands::delete_trade(state, &id).await? {
                output::ok(&format!("Deleted {}", id));
            } else {
                output::note(&format!("No trade {}", id));
            }
        }
        Commands::List { status } => {
            let trades = commands::get_trades(state, StatusFilter::from(status)).await?;
            output::trades_table(&trades, &unrealized_by_id(state).await?);
        }
        Commands::Show { id } => {
            let trade = commands::get_trade(state, &id).await?;
            output::trade_detail(&trade, &unrealized_by_id(state).await?);
        }
        Commands::Stats { range } => {
            let stats = commands::get_dashboard_stats(state, range.as_deref()).await?;
            output::stats(&stats);
        }
        Commands::Curve { range } => {
            let curve = commands::get_equity_curve(state, range.as_deref()).await?;
            output::equity_curve(&curve);
        }
        Commands::Refresh => {
            let outcome = commands::refresh_unrealized(state).await?;
            output::ok(&format!(
                "Refreshed {} open trades ({} without market data)",
                outcome.entries.len(),
                outcome.skipped.len()
            ));
            let trades = commands::get_trades(state, StatusFilter::Open).await?;
            output::trades_table(&trades, &unrealized_by_id(state).await?);
        }
        Commands::Lookup { address } => {
            let metadata = commands::lookup_token(state, &address).await?;
            output::token(&metadata);
        }
        Commands::Settings(SettingsCommand::Show) => {
            output::settings(&commands::get_settings(state).await?);
        }
        Commands::Settings(SettingsCommand::Set { interval, batch_size }) => {
            let settings = commands::update_settings(
                state,
                UpdateSettingsInput {
                    refresh_interval_secs: interval,
                    refresh_batch_size: batch_size,
                    ..Default::default()
                },
            )
            .await?;
            output::settings(&settings);
        }
        Commands::Mode { mode } => {
            let settings = commands::set_test_mode(state, matches!(mode, ModeArg::Demo)).await?;
            output::settings(&settings);
            if !settings.test_mode && commands::current_user(state)?.is_none() {
                output::warn("Sign in with `login <user>` to see your trades");
            }
        }
        Commands::Login { user } => {
            commands::login(state, &user).await?;
            output::ok(&format!("Signed in as {}", user.trim()));
        }
        Commands::Logout => {
            commands::logout(state).await?;
            output::ok("Signed out");
        }
        Commands::Whoami => {
            let source = state.tracker.lock().await.source.clone();
            match commands::current_user(state)? {
                Some(user) => output::key_value("User", user),
                None => output::key_value("User", "(signed out)"),
            }
            if let Some(source) = source {
                let label = match source {
                    TradeSource::Demo => "demo trades".to_string(),
                    TradeSource::Remote { user_id } => format!("collection of {}", user_id),
                };
                output::key_value("Showing", label);
            }
        }
        Commands::Widgets(WidgetsCommand::List) => {
            output::widgets(&commands::list_widgets(state)?);
        }
        Commands::Widgets(WidgetsCommand::Add) => {
            let widget = commands::add_widget(state)?;
            output::ok(&format!("Added widget {}", widget.id));
        }
        Commands::Widgets(WidgetsCommand::Remove { id, yes }) => {
            if commands::remove_widget(state, &id, yes)? {
                output::ok(&format!("Removed widget {}", id));
            } else {
                output::warn(&format!("Re-run with --yes to remove widget {}", id));
            }
        }
        Commands::Widgets(WidgetsCommand::Move { id, x, y }) => {
            let widgets = commands::apply_layout(state, &[LayoutItem { i: id, x, y }])?;
            output::widgets(&widgets);
        }
        Commands::Export { path, format } => {
            let count = commands::export_trades(state, &path, format.into()).await?;
            output::ok(&format!("Exported {} trades to {}", count, path.display()));
        }
        Commands::ApiKey(ApiKeyCommand::Set { key }) => {
            commands::set_api_key(state, &key)?;
            output::ok("API key stored; it is used from the next start");
        }
        Commands::ApiKey(ApiKeyCommand::Clear) => {
            commands::clear_api_key(state)?;
            output::ok("API key removed");
        }
        Commands::ApiKey(ApiKeyCommand::Show) => match commands::api_key_preview(state)? {
            Some(preview) => output::key_value("API key", preview),
            None => output::note("No API key stored"),
        },
        Commands::Shell => {
            output::note("Already in the shell");
        }
    }

    Ok(())
}
