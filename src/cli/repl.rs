//! Interactive question loop

use std::io::{BufRead, Write};

use tracing::warn;

use super::{render_answer, render_status};
use crate::services::DatasetStore;

const EXAMPLE_PROMPTS: &[&str] = &[
    "top 5 clientes",
    "top 5 clientes del último mes",
    "total por mes",
    "variación por emisora",
    "ventas por tipo de servicio",
    "cliente ACME variación",
    "variación mensual",
];

fn print_hint<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Preguntá sobre la facturación. Ejemplos:")?;
    for prompt in EXAMPLE_PROMPTS {
        writeln!(out, "  - {}", prompt)?;
    }
    writeln!(out, "Comandos: :reload, :status, :quit")
}

/// Read prompts line by line until `:quit` or end of input
pub fn run<R: BufRead, W: Write>(store: &DatasetStore, input: R, out: &mut W) -> anyhow::Result<()> {
    print_hint(out)?;

    for line in input.lines() {
        let line = line?;
        let prompt = line.trim();

        match prompt {
            "" => continue,
            ":quit" | ":q" => break,
            ":status" => writeln!(out, "{}", render_status(&store.snapshot().status()))?,
            ":reload" => match store.reload() {
                Ok(snapshot) => writeln!(
                    out,
                    "Recargado: {} filas ({})",
                    snapshot.records.len(),
                    snapshot.loaded_at_label()
                )?,
                Err(e) => {
                    warn!(error = %e, "reload failed");
                    writeln!(out, "No se pudo recargar: {}", e)?;
                }
            },
            _ => writeln!(out, "{}\n", render_answer(&store.ask(prompt)))?,
        }
        out.flush()?;
    }

    Ok(())
}
