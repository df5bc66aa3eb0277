// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bayan shell`, `bayan ask`, and `bayan status` command implementations.
//!
//! The shell is a readline REPL over one conversation session: every line is
//! a turn through the orchestrator, answers print in the language the
//! question was asked in. `ask` runs a single turn, `status` reports pool
//! and warehouse diagnostics.

use std::sync::Arc;

use bayan_agent::SessionOrchestrator;
use bayan_config::model::BayanConfig;
use bayan_core::types::TurnStatus;
use bayan_core::{BayanError, PluginAdapter, ProviderAdapter, WarehouseAdapter};
use bayan_gemini::GeminiProvider;
use bayan_planner::Catalog;
use bayan_warehouse::SqliteWarehouse;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

/// Wire the orchestrator from configuration: Gemini provider, read-only
/// SQLite warehouse, credential pool.
async fn build_orchestrator(
    config: &BayanConfig,
) -> Result<(SessionOrchestrator, Arc<SqliteWarehouse>), BayanError> {
    if config.gemini.api_keys.is_empty() {
        return Err(BayanError::Config(
            "at least one entry in gemini.api_keys is required \
             (set it in bayan.toml or via BAYAN_GEMINI_API_KEYS)"
                .to_string(),
        ));
    }

    let provider: Arc<dyn ProviderAdapter> = Arc::new(GeminiProvider::new(&config.gemini)?);

    let catalog = Catalog::from_config(&config.catalog)?;
    let warehouse = Arc::new(SqliteWarehouse::new(config.warehouse.clone(), catalog));
    warehouse.initialize().await?;

    let orchestrator = SessionOrchestrator::new(
        config,
        provider,
        warehouse.clone() as Arc<dyn WarehouseAdapter>,
    )?;
    info!(keys = config.gemini.api_keys.len(), "orchestrator ready");
    Ok((orchestrator, warehouse))
}

/// Runs the interactive REPL. One session per invocation.
pub async fn run_shell(config: BayanConfig) -> Result<(), BayanError> {
    let (orchestrator, _warehouse) = build_orchestrator(&config).await?;
    let session_id = uuid::Uuid::new_v4().to_string();

    let mut editor =
        DefaultEditor::new().map_err(|e| BayanError::Internal(e.to_string()))?;

    println!(
        "{}",
        "Hello! I'm Bayan. Ask me anything about your company data, in English or Arabic."
            .bold()
    );
    println!("{}", "مرحبا! أنا بيان. اسألني عن بيانات شركتك بالعربية أو الإنجليزية.".bold());
    println!("{}", "(exit with `quit` or Ctrl-D)".dimmed());

    loop {
        match editor.readline(&format!("{} ", "bayan>".cyan().bold())) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    break;
                }
                let _ = editor.add_history_entry(&line);

                let report = orchestrator.handle_message(&session_id, &line).await;
                match report.status {
                    TurnStatus::Delivered => println!("{}", report.response),
                    TurnStatus::Failed => println!("{}", report.response.red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(BayanError::Internal(e.to_string())),
        }
    }

    println!("{}", "Goodbye! مع السلامة".dimmed());
    Ok(())
}

/// Runs a single question through the pipeline and prints the answer.
pub async fn run_ask(config: BayanConfig, question: &str) -> Result<(), BayanError> {
    let (orchestrator, _warehouse) = build_orchestrator(&config).await?;
    let report = orchestrator.handle_message("cli-ask", question).await;
    println!("{}", report.response);
    match report.status {
        TurnStatus::Delivered => Ok(()),
        TurnStatus::Failed => Err(BayanError::Internal("turn failed".to_string())),
    }
}

/// Prints pool occupancy and warehouse health.
pub async fn run_status(config: BayanConfig) -> Result<(), BayanError> {
    let (orchestrator, warehouse) = build_orchestrator(&config).await?;

    let stats = orchestrator.pool_stats().await;
    println!("credential pool:");
    println!("  available:    {}", stats.available);
    println!("  in use:       {}", stats.in_use);
    println!("  cooling down: {}", stats.cooling_down);
    println!("  exhausted:    {}", stats.exhausted);

    let health = warehouse.health_check().await?;
    println!("warehouse:      {health:?}");
    Ok(())
}
