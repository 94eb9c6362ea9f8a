#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(
    name = "jsonschema2go",
    version,
    about = "Generate Go type declarations from JSON Schema"
)]
struct Cli {
    /// The input JSON Schema files
    #[arg(value_name = "PATHS")]
    paths: Vec<std::path::PathBuf>,

    /// A single file path (used for backwards compatibility)
    #[arg(short = 'i', value_name = "PATH")]
    input: Option<std::path::PathBuf>,

    /// The output file for the generated code (stdout when omitted)
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<std::path::PathBuf>,

    /// The package that the types are created in
    #[arg(short = 'p', value_name = "PACKAGE", default_value = "main")]
    package: String,

    /// Type name for the root schema of the first input
    #[arg(long)]
    root_name: Option<String>,

    /// Log pipeline decisions to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    {
        use tracing_subscriber::EnvFilter;

        let default_level = if cli.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    if let Err(e) = cli::run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
mod cli {
    use std::fs;
    use std::io::Write;

    use anyhow::{Context, anyhow, bail};
    use gotize::{Error, Options, compile, render};
    use tracing::info;

    use super::Cli;

    pub(super) fn run(cli: &Cli) -> anyhow::Result<()> {
        let paths: Vec<_> = cli.paths.iter().chain(&cli.input).collect();
        if paths.is_empty() {
            bail!("no input JSON Schema files");
        }

        let sources = paths
            .iter()
            .map(|path| {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Ok((path.display().to_string(), text))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut options = Options::new();
        if let Some(name) = &cli.root_name {
            options = options.with_root_name(name);
        }

        let model = compile(&sources, &options).map_err(|e| describe(e, &sources))?;

        let mut code = String::new();
        code.push_str("// Code generated by jsonschema2go. DO NOT EDIT.\n\n");
        code.push_str(&format!("package {}\n", cli.package));
        code.push_str(&render(&model));

        match &cli.output {
            Some(path) => {
                fs::write(path, code)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(
                    output = %path.display(),
                    records = model.records.len(),
                    aliases = model.aliases.len(),
                    "wrote Go types"
                );
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(code.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Attach a line and character to syntax and shape errors.
    fn describe(error: Error, sources: &[(String, String)]) -> anyhow::Error {
        let position = |document: &str, offset: usize| {
            sources
                .iter()
                .find(|(name, _)| name == document)
                .and_then(|(_, text)| line_and_character(text, offset))
        };
        match &error {
            Error::SchemaSyntax {
                document,
                offset,
                message,
            } => {
                if let Some((line, character)) = position(document, *offset) {
                    return anyhow!(
                        "cannot parse JSON schema {document}: syntax error at line {line}, character {character}: {message}"
                    );
                }
            }
            Error::SchemaShape {
                document,
                path,
                offset: Some(offset),
                message,
            } => {
                if let Some((line, character)) = position(document, *offset) {
                    return anyhow!(
                        "invalid JSON schema {document}: {path} at line {line}, character {character}: {message}"
                    );
                }
            }
            _ => {}
        }
        error.into()
    }

    /// 1-based line and character of a byte offset.
    fn line_and_character(text: &str, offset: usize) -> Option<(usize, usize)> {
        let before = text.get(..offset)?;
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Some((line, before[line_start..].chars().count() + 1))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn offsets_to_positions() {
            let text = "{\n  \"a\": 1,\n  oops\n}";
            let offset = text.find("oops").unwrap();
            assert_eq!(line_and_character(text, offset), Some((3, 3)));
            assert_eq!(line_and_character(text, 0), Some((1, 1)));
            assert_eq!(line_and_character(text, text.len() + 1), None);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary is only available with the `cli` feature enabled.");
    std::process::exit(1);
}
