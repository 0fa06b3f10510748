//! Linha de comando que executa um pipeline clínico sobre um arquivo de texto,
//! grava o XMI do documento e imprime as entidades encontradas.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use clinical_core::{report, run_pipeline, write_xmi, Cas, PipelineConfig, PipelineKind};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: clinical-pipeline <input-file> <output-file> [cuis]";

/// Palavra que, em qualquer posição, pede a impressão dos códigos.
const CUIS_FLAG: &str = "cuis";

#[derive(Parser, Debug)]
#[command(name = "clinical-pipeline", version, about = "Run a clinical annotation pipeline over a text file")]
struct Cli {
    /// Plain-text note. Overwritten with the pipeline descriptor after the run.
    input: PathBuf,

    /// Destination of the XMI serialization.
    output: PathBuf,

    /// Extra words; `cuis` prints the concept codes of every entity.
    #[arg(trailing_var_arg = true)]
    extra: Vec<String>,

    /// Pipeline variant.
    #[arg(long, default_value = "default")]
    pipeline: PipelineKind,

    /// TOML configuration (dictionary file, assertion scope).
    #[arg(long, env = "CLINICAL_PIPELINE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn print_codes(&self) -> bool {
        self.extra.iter().any(|a| a == CUIS_FLAG)
            || self.input.as_os_str() == CUIS_FLAG
            || self.output.as_os_str() == CUIS_FLAG
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "clinical_core=warn,clinical_pipeline=warn",
        1 => "clinical_core=info,clinical_pipeline=info",
        _ => "clinical_core=debug,clinical_pipeline=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Lê o arquivo linha a linha, terminando cada linha com `\n`.
fn read_note(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_note(&bytes))
}

/// Decodifica o conteúdo da nota. Bytes fora de UTF-8 viram U+FFFD e `\r\n`
/// vira `\n`.
fn decode_note(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut text = String::with_capacity(decoded.len() + 1);
    for line in decoded.lines() {
        text.push_str(line);
        text.push('\n');
    }
    text
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };
    init_tracing(cli.verbose);

    if !is_readable_file(&cli.input) {
        return Err(anyhow!("{} is not a file or cannot be read!", cli.input.display()));
    }

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("invalid configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let text = read_note(&cli.input)?;
    let aed = cli
        .pipeline
        .build(&config)
        .with_context(|| format!("failed to build pipeline '{}'", cli.pipeline))?;

    let mut cas = Cas::new(text);
    let stats = run_pipeline(&mut cas, &aed)?;
    info!(
        "pipeline '{}' concluído em {} ms: {} entidades",
        cli.pipeline,
        stats.processing_ms,
        cas.entities.len()
    );

    if let Err(e) = write_xmi(&cas, &cli.output) {
        error!("falha ao gravar XMI em {}: {e}", cli.output.display());
    }

    report::write_report(&cas, cli.print_codes(), io::stdout().lock())?;

    aed.write_to(&cli.input)
        .with_context(|| format!("failed to write descriptor to {}", cli.input.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_note_terminates_lines() {
        assert_eq!(decode_note(b"Fever.\r\nCough."), "Fever.\nCough.\n");
        assert_eq!(decode_note(b""), "");
    }

    #[test]
    fn test_decode_note_replaces_invalid_bytes() {
        assert_eq!(decode_note(b"caf\xe9 au lait\n"), "caf\u{FFFD} au lait\n");
    }
}
