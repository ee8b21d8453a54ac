//! Golden-fixture runner: every `fixtures/*.json` holds a class model and a list of
//! cases with the schema (or error text) each one must produce.
//!
//! Usage: `cargo run -p dev-test-runner [NAME_REGEX]`
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use docschema::{ClassModel, Converter, Options, SchemaFragment, SchemaError};

static FIXTURES_DIR: Lazy<PathBuf> = Lazy::new(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures"));

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    #[serde(default)]
    options: Option<Options>,
    model: Value,
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    #[serde(flatten)]
    input: Input,
    #[serde(default)]
    context: Option<String>,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Input {
    Type(String),
    Class(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Expect(Value),
    /// A substring of the error message.
    Error(String),
}

enum Verdict {
    Pass,
    Fail(String),
}

fn run_case(converter: &Converter<'_>, case: &Case) -> Verdict {
    let result: Result<SchemaFragment, SchemaError> = match &case.input {
        Input::Type(expr) => converter.convert_annotation(expr, case.context.as_deref()),
        Input::Class(name) => converter.convert_class(name),
    };
    match (&case.outcome, result) {
        (Outcome::Expect(expected), Ok(schema)) => match schema.to_json() {
            Ok(actual) if &actual == expected => Verdict::Pass,
            Ok(actual) => Verdict::Fail(format!(
                "expected:\n{}\nactual:\n{}",
                serde_json::to_string_pretty(expected).unwrap_or_default(),
                serde_json::to_string_pretty(&actual).unwrap_or_default(),
            )),
            Err(error) => Verdict::Fail(format!("schema did not serialize: {error}")),
        },
        (Outcome::Expect(_), Err(error)) => Verdict::Fail(format!("unexpected error: {error}")),
        (Outcome::Error(needle), Err(error)) if error.to_string().contains(needle.as_str()) => Verdict::Pass,
        (Outcome::Error(needle), Err(error)) => {
            Verdict::Fail(format!("expected an error containing `{needle}`, got `{error}`"))
        }
        (Outcome::Error(needle), Ok(_)) => Verdict::Fail(format!("expected an error containing `{needle}`")),
    }
}

fn load_fixture(src: &str) -> Result<FixtureFile, String> {
    let deserializer = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|error| format!("at JSON path {} → {}", error.path(), error.inner()))
}

fn fixture_paths() -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(&*FIXTURES_DIR)
        .map_err(|error| format!("cannot read {}: {error}", FIXTURES_DIR.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn main() {
    let filter = match std::env::args().nth(1).map(|pattern| Regex::new(&pattern)).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("invalid filter: {error}");
            std::process::exit(2);
        }
    };
    let paths = match fixture_paths() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(2);
        }
    };

    let mut passed = 0usize;
    let mut failed = 0usize;
    for path in paths {
        let path_str = path.to_string_lossy().to_string();
        let fixture = std::fs::read_to_string(&path)
            .map_err(|error| error.to_string())
            .and_then(|src| load_fixture(&src))
            .and_then(|file| {
                let model = ClassModel::from_json_value(&path_str, file.model.clone()).map_err(|e| e.to_string())?;
                Ok((file, model))
            });
        let (file, model) = match fixture {
            Ok(loaded) => loaded,
            Err(error) => {
                eprintln!("❌ {path_str}: {error}");
                failed += 1;
                continue;
            }
        };

        let converter = Converter::with_options(&model, file.options.clone().unwrap_or_default());
        eprintln!("== {path_str}");
        for case in &file.cases {
            if filter.as_ref().is_some_and(|re| !re.is_match(&case.name)) {
                continue;
            }
            match run_case(&converter, case) {
                Verdict::Pass => {
                    passed += 1;
                    eprintln!("✅ {}", case.name);
                }
                Verdict::Fail(reason) => {
                    failed += 1;
                    eprintln!("❌ {}\n{reason}", case.name);
                }
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if failed > 0 {
        std::process::exit(1);
    }
}
