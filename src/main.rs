//! Command line front end: reads a JavaScript file with documentation comments and prints it
//! with the documented types written as TypeScript syntax.
//!
//! Set the `JSDOC2TS_LOG` environment variable to see what the passes do:
//!
//! ```bash
//! JSDOC2TS_LOG=debug jsdoc2ts shapes.js
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use swc_common::errors::{ColorConfig, Handler};
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jsdoc2ts::classes::ClassifyAndRewrite;
use jsdoc2ts::declarations::DeclarationTypeAttacher;
use jsdoc2ts::error::FrontendError;
use jsdoc2ts::parse::parse_source_file;
use jsdoc2ts::pass::CompilerPass;
use jsdoc2ts::validate::validate;

#[derive(Parser, Debug)]
#[command(name = "jsdoc2ts", version, about = "Moves JSDoc types into TypeScript syntax")]
struct Cli {
    /// JavaScript file to convert
    file: PathBuf,

    /// Which rewrite to run
    #[arg(short, long, value_enum, default_value_t = Mode::Classes)]
    mode: Mode,

    /// Check the structure of the rewritten tree before printing it
    #[arg(long)]
    validate: bool,

    /// Write the result here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Convert constructors into classes and attach types
    Classes,

    /// Only attach types to declarations
    Declarations,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("JSDOC2TS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let cm = Lrc::<SourceMap>::default();
    let handler = Handler::with_tty_emitter(ColorConfig::Auto, true, false, Some(cm.clone()));
    let fm = cm.new_source_file(FileName::Real(cli.file.clone()), source);

    let mut tree = match parse_source_file(&fm) {
        Ok(tree) => tree,
        Err(e) => {
            let span = match &e {
                FrontendError::Parse { span, .. } | FrontendError::Unsupported { span, .. } => *span,
            };
            handler.struct_span_err(span, &e.to_string()).emit();
            bail!("could not convert {}", cli.file.display());
        }
    };

    let mut pass: Box<dyn CompilerPass> = match cli.mode {
        Mode::Classes => Box::new(ClassifyAndRewrite::new()),
        Mode::Declarations => Box::new(DeclarationTypeAttacher::new()),
    };
    let outcome = pass
        .process(&mut tree)
        .with_context(|| format!("{} failed on {}", pass.name(), cli.file.display()))?;
    tracing::info!("{} made {} changes", pass.name(), outcome.changes());

    if cli.validate {
        validate(&tree).context("rewritten tree is malformed")?;
    }

    match &cli.output {
        Some(path) => fs::write(path, tree.to_string())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", tree),
    }
    Ok(())
}
