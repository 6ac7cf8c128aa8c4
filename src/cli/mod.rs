mod repl;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::services::formatter::{self, format_currency, DEFAULT_DECIMALS};
use crate::services::{Config, DataLoaderService, DatasetStore};
use crate::types::{Answer, MetaReport, StatusReport};

/// Ask questions about telecom billing data in plain Spanish
#[derive(Parser)]
#[command(name = "telcoask")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Dataset file or directory (overrides TELCOASK_DATA)
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Ask {
        /// Question text, e.g. "top 5 clientes"
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the loaded dataset and snapshot version
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show columns and a preview of the first rows
    Meta {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive question loop (default)
    Repl,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = Config::load(self.data);
        let store = DatasetStore::open(Box::new(DataLoaderService::new(config)))?;
        let mut out = io::stdout().lock();

        match self.command {
            None | Some(Commands::Repl) => repl::run(&store, io::stdin().lock(), &mut out),
            Some(Commands::Ask { prompt, json }) => {
                let answer = store.ask(&prompt.join(" "));
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&answer)?)?;
                } else {
                    writeln!(out, "{}", render_answer(&answer))?;
                }
                Ok(())
            }
            Some(Commands::Status { json }) => {
                let status = store.snapshot().status();
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
                } else {
                    writeln!(out, "{}", render_status(&status))?;
                }
                Ok(())
            }
            Some(Commands::Meta { json }) => {
                let meta = store.snapshot().meta();
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&meta)?)?;
                } else {
                    writeln!(out, "{}", render_meta(&meta))?;
                }
                Ok(())
            }
        }
    }
}

/// Plain-text form of an answer
pub fn render_answer(answer: &Answer) -> String {
    match answer {
        Answer::Table { md } => md.clone(),
        Answer::Summary { answer } => format!(
            "Resumen del dataset:\n{}",
            formatter::render(
                &["Filas", "Total", "Clientes únicos", "Cargado"],
                &[vec![
                    answer.rows.to_string(),
                    answer.total.clone(),
                    answer.distinct_clients.to_string(),
                    answer.loaded_at.clone(),
                ]],
            )
        ),
    }
}

fn render_status(status: &StatusReport) -> String {
    format!(
        "Archivo: {}\nFilas: {}\nCargado: {}\nVersión: {}",
        status.file, status.rows, status.loaded_at, status.version
    )
}

fn render_meta(meta: &MetaReport) -> String {
    let preview: Vec<Vec<String>> = meta
        .preview
        .iter()
        .map(|r| {
            vec![
                r.client.clone(),
                r.emitter.clone(),
                r.period.clone(),
                format_currency(r.total, DEFAULT_DECIMALS),
            ]
        })
        .collect();

    format!(
        "Columnas: {}\nFilas: {}\nCargado: {}\n{}",
        meta.columns.join(", "),
        meta.rows,
        meta.loaded_at,
        formatter::render(&["Cliente", "Emisora", "Periodo", "Total"], &preview)
    )
}
