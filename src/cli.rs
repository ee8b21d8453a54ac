//! CLI: (type expression | class name) + class model → JSON Schema
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use docschema::{ClassModel, Converter, Options, SchemaFragment};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile doc-comment and declared types of a class model into JSON Schema
#[derive(Parser, Debug)]
#[command(name = "docschema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert a type annotation such as `list<Person>` or `?int`
    Type(TypeOut),
    /// convert a class (or enum) from the model
    Class(ClassOut),
}

#[derive(Args, Debug, Clone)]
struct ModelSettings {
    /// class model files; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1..)]
    model: Vec<String>,

    /// JSON options file (`max-depth`, `definitions-prefix`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// nesting ceiling, overrides the options file
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON
    #[arg(long)]
    compact: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct TypeOut {
    /// the annotation to convert
    expr: String,

    /// class that `self`, `parent` and relative names refer to
    #[arg(long)]
    context: Option<String>,

    #[command(flatten)]
    model_settings: ModelSettings,

    #[command(flatten)]
    output_settings: OutputSettings,
}

#[derive(clap::Parser, Debug)]
struct ClassOut {
    /// fully-qualified class name, e.g. 'App\Model\Person'
    name: String,

    #[command(flatten)]
    model_settings: ModelSettings,

    #[command(flatten)]
    output_settings: OutputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ModelSettings {
    fn load_model(&self) -> Result<ClassModel> {
        let source_paths = resolve_file_path_patterns(&self.model).context("failed to resolve model file paths")?;
        let mut model = ClassModel::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read model file {source_path_str}"))?;
            let loaded = ClassModel::from_json_str(&source_path_str, &source)?;
            debug!("loaded {} classes from {source_path_str}", loaded.len());
            model.extend(loaded);
        }
        info!("class model has {} classes", model.len());
        Ok(model)
    }

    fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            None => Options::default(),
            Some(path) => {
                let path_str = path.to_string_lossy().to_string();
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read options file {path_str}"))?;
                Options::from_json_str(&path_str, &source)?
            }
        };
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        Ok(options)
    }
}

impl OutputSettings {
    fn write(&self, schema: &SchemaFragment) -> Result<()> {
        let schema_src = if self.compact {
            serde_json::to_string(schema)?
        } else {
            serde_json::to_string_pretty(schema)?
        };
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                std::fs::write(out, &schema_src).with_context(|| format!("failed to write {}", out.display()))?;
            }
            None => println!("{schema_src}"),
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Type(target) => {
                // debug path
                if target.output_settings.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let model = target.model_settings.load_model()?;
                let converter = Converter::with_options(&model, target.model_settings.options()?);
                let schema = converter
                    .convert_annotation(&target.expr, target.context.as_deref())
                    .with_context(|| format!("failed to convert `{}`", target.expr))?;
                target.output_settings.write(&schema)
            }
            Command::Class(target) => {
                // debug path
                if target.output_settings.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let model = target.model_settings.load_model()?;
                if model.is_empty() {
                    bail!("no classes loaded; pass at least one --model file");
                }
                let converter = Converter::with_options(&model, target.model_settings.options()?);
                let schema = converter
                    .convert_class(&target.name)
                    .with_context(|| format!("failed to convert class `{}`", target.name))?;
                target.output_settings.write(&schema)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

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
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
