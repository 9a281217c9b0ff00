//! mdxir command-line interface.

mod config;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::CliConfig;
use mdxir_compiler::{compile, CompileError};
use mdxir_eval::{render, AllowCalls, RenderContext, Scope};
use mdxir_types::{codec, Document};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdxir", about = "Compile MDX to a versioned document and render it", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an MDX file to a JSON document.
    Compile {
        input: PathBuf,
        /// Output file. Omit to write to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Document slug. Defaults to frontmatter `slug`, then the file stem.
        #[arg(long)]
        slug: Option<String>,
        /// Path to a TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a stored document.
    Check { input: PathBuf },
    /// Render a stored document to HTML.
    Render {
        input: PathBuf,
        /// JSON object whose keys become the render scope.
        #[arg(long)]
        scope: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mdxir=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Compile {
            input,
            output,
            slug,
            config,
            pretty,
        } => {
            let config = CliConfig::load(config.as_deref())?;
            let mut options = config.compile;
            if slug.is_some() {
                options.slug = slug;
            }
            let source = read(&input)?;
            let document = match compile(&source, &options) {
                Err(CompileError::MissingSlug) => {
                    let stem = input
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .ok_or_else(|| anyhow!("cannot derive a slug from {}", input.display()))?;
                    compile(&source, &options.with_slug(stem))
                }
                result => result,
            }
            .with_context(|| format!("compiling {}", input.display()))?;

            let bytes = if pretty {
                codec::serialize_pretty(&document)?
            } else {
                codec::serialize(&document)?
            };
            write_output(&bytes, output.as_deref())?;
            info!(slug = %document.slug, nodes = document.root.count(), "compiled {}", input.display());
        }
        Command::Check { input } => {
            let document = load_document(&input)?;
            println!(
                "{}: slug `{}`, schema v{}, {} nodes",
                input.display(),
                document.slug,
                document.schema_version,
                document.root.count()
            );
        }
        Command::Render {
            input,
            scope,
            config,
        } => {
            let config = CliConfig::load(config.as_deref())?;
            let document = load_document(&input)?;
            let scope = match scope {
                Some(path) => {
                    let json: serde_json::Value = serde_json::from_str(&read(&path)?)
                        .with_context(|| format!("parsing scope {}", path.display()))?;
                    Scope::from_json(&json)
                        .ok_or_else(|| anyhow!("scope {} must be a JSON object", path.display()))?
                }
                None => Scope::new(),
            };
            let context = RenderContext::new(scope, AllowCalls::new());
            let tree = render(&document, &context, &config.render.registry())
                .with_context(|| format!("rendering {}", input.display()))?;
            let mut html = tree.to_html();
            html.push('\n');
            write_output(html.as_bytes(), None)?;
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    codec::deserialize(&bytes).with_context(|| format!("decoding {}", path.display()))
}

fn write_output(content: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
        }
        None => io::stdout()
            .write_all(content)
            .context("writing stdout"),
    }
}
