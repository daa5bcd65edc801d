//! Minimal CLI: declarations → (schema | defaults | declarations)
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use confique::Config as _;
use tracing::debug;

use form_schema::{
    ArrayPrimitivePolicy, CompileOptions, DuplicatePolicy, UnknownTypePolicy, default_document,
};

use crate::config::Config;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile TypeScript-style interface declarations into a form schema, or the default JSON value for it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile the root declaration and print the field schema as JSON
    Schema(CompileOut),
    /// compile the root declaration and print its default JSON value
    Defaults(CompileOut),
    /// print the scanned and classified declarations (debug view)
    Declarations(DeclarationsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths, quoted glob patterns, or '-' for stdin.
    /// Multiple inputs are concatenated in order.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// TOML config file (`root`, `unknown_types`, `array_primitives`, `duplicates`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// overrides `unknown_types` from the config file
    #[arg(long, value_enum)]
    unknown_types: Option<UnknownTypePolicy>,

    /// overrides `array_primitives` from the config file
    #[arg(long, value_enum)]
    array_primitives: Option<ArrayPrimitivePolicy>,

    /// overrides `duplicates` from the config file
    #[arg(long, value_enum)]
    duplicates: Option<DuplicatePolicy>,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root declaration name (overrides `root` from the config file)
    #[arg(long)]
    root: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DeclarationsOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_config(&self) -> Result<Config> {
        let mut builder = Config::builder();
        if let Some(path) = self.config.as_ref() {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            builder = builder.file(path);
        }
        builder.load().context("failed to load configuration")
    }

    fn compile_options(&self, config: &Config) -> CompileOptions {
        let mut options = config.compile_options();
        if let Some(x) = self.unknown_types {
            options.unknown_types = x;
        }
        if let Some(x) = self.array_primitives {
            options.array_primitives = x;
        }
        if let Some(x) = self.duplicates {
            options.duplicates = x;
        }
        options
    }

    /// Concatenated text of every input.
    fn load_text(&self) -> Result<String> {
        let mut text = String::new();
        for pattern in &self.input {
            if pattern == "-" {
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read stdin")?;
                text.push('\n');
                continue;
            }
            for source_path in resolve_file_path_patterns([pattern])? {
                debug!(path = %source_path.display(), "reading input");
                let source = std::fs::read_to_string(&source_path).with_context(|| {
                    format!("failed to read source file `{}`", source_path.display())
                })?;
                text.push_str(&source);
                text.push('\n');
            }
        }
        Ok(text)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let roots = target.compile()?;
                let src = serde_json::to_string_pretty(&roots)?;
                write_output(target.out.as_deref(), &src)
            }
            Command::Defaults(target) => {
                let roots = target.compile()?;
                let src = serde_json::to_string_pretty(&default_document(&roots))?;
                write_output(target.out.as_deref(), &src)
            }
            Command::Declarations(target) => {
                let config = target.input_settings.load_config()?;
                let options = target.input_settings.compile_options(&config);
                let text = target.input_settings.load_text()?;
                let decls = form_schema::declarations(&text, &options)?;
                println!("{decls:#?}");
                Ok(())
            }
        }
    }
}

impl CompileOut {
    fn compile(&self) -> Result<Vec<form_schema::FieldSchema>> {
        let config = self.input_settings.load_config()?;
        let options = self.input_settings.compile_options(&config);
        let root = self.root.as_deref().unwrap_or(&config.root);
        let text = self.input_settings.load_text()?;
        debug!(root, ?options, bytes = text.len(), "compiling");
        Ok(form_schema::parse(&text, root, &options)?)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create `{}`", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write `{}`", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // explicit glob that matched nothing
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
