// SheetScript - A sandboxed formula scripting runtime for character sheets
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! SheetScript CLI
//!
//! Evaluates formula scripts, optionally against a JSON character sheet.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sheetscript::error::format_error;
use sheetscript::interpreter::{format_number, Limits, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STEPS};
use sheetscript::resolver::environment::build_environment;
use sheetscript::resolver::{
    Attribute, AttributeAdapter, Entity, ResolverConfig, ScriptResolver, SelfProvider, WorldCache,
    DEFAULT_MAX_DEPTH,
};
use sheetscript::sheet::Sheet;
use sheetscript::watcher::FileWatcher;

/// SheetScript - sandboxed formulas for character sheets
#[derive(Parser, Debug)]
#[command(name = "sheetscript")]
#[command(author = "SheetScript Team")]
#[command(version)]
#[command(about = "Evaluate sandboxed formula scripts against character sheet data")]
#[command(long_about = r#"
SheetScript evaluates small formula scripts in a sandbox. Scripts may
reference the attributes of a JSON character sheet as `$<id>` and the
attribute being resolved as `self`.

Results are memoized per provider and script. With --cache the memoized
results are loaded from and saved to a JSON file.

Example usage:
  sheetscript -e "Math.max(1, 2) + 3"
  sheetscript modifier.js --sheet conan.json
  sheetscript --sheet conan.json --self str_mod -e "self.formula"
  sheetscript -e "$str.value" --sheet conan.json --number

Report errors instead of degrading to an empty result:
  sheetscript broken.js --raw

Watch mode:
  sheetscript modifier.js --sheet conan.json --watch
"#)]
struct Cli {
    /// Script file to evaluate
    script_file: Option<PathBuf>,

    /// Evaluate the given script instead of a file
    #[arg(short, long, value_name = "SCRIPT", conflicts_with = "script_file")]
    eval: Option<String>,

    /// Character sheet (JSON) whose attributes scripts can reference
    #[arg(long, value_name = "FILE")]
    sheet: Option<PathBuf>,

    /// Resolve as the given sheet attribute, bound as `self`
    #[arg(long = "self", value_name = "ATTRIBUTE_ID", requires = "sheet")]
    self_attribute: Option<String>,

    /// Load and save the world cache from this JSON file
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Coerce the result to a number
    #[arg(short, long)]
    number: bool,

    /// Bypass the resolver and report script errors (exit code 1)
    #[arg(long)]
    raw: bool,

    /// Step budget for each script run
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Maximum depth of nested function calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Maximum depth of nested attribute resolutions
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    /// Watch the script and sheet files and re-evaluate on changes
    #[arg(short, long)]
    watch: bool,
}

impl Cli {
    fn config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_max_depth(self.max_depth)
            .with_limits(
                Limits::default()
                    .with_max_steps(self.max_steps)
                    .with_max_call_depth(self.max_call_depth),
            )
    }

    /// Files that trigger a re-evaluation in watch mode.
    fn watched_files(&self) -> Vec<PathBuf> {
        self.script_file
            .iter()
            .chain(self.sheet.iter())
            .cloned()
            .collect()
    }
}

/// The script and sheet of one evaluation.
struct Input {
    source: String,
    filename: String,
    sheet: Option<Rc<Sheet>>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.script_file.is_none() && cli.eval.is_none() {
        eprintln!("Error: No script given. Pass a script file or use -e <script>.");
        return ExitCode::from(2);
    }

    let world_cache = match &cli.cache {
        Some(path) => match WorldCache::load(path) {
            Ok(cache) => cache,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(4);
            }
        },
        None => WorldCache::new(),
    };
    let resolver = ScriptResolver::with_world_cache(cli.config(), Rc::new(world_cache));

    let result = run(&cli, &resolver);

    if cli.watch {
        return run_watch_loop(&cli, &resolver);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Read the script and sheet.
fn load_input(cli: &Cli) -> Result<Input, u8> {
    let (source, filename) = match (&cli.script_file, &cli.eval) {
        (_, Some(script)) => (script.clone(), "<eval>".to_string()),
        (Some(path), None) => match std::fs::read_to_string(path) {
            Ok(content) => (content, display_name(path)),
            Err(e) => {
                eprintln!("Error: Cannot read {}: {}", path.display(), e);
                return Err(3);
            }
        },
        (None, None) => return Err(2),
    };

    let sheet = match &cli.sheet {
        Some(path) => match Sheet::load(path) {
            Ok(sheet) => Some(Rc::new(sheet)),
            Err(e) => {
                eprintln!("Error: Cannot load sheet {}: {}", path.display(), e);
                return Err(3);
            }
        },
        None => None,
    };

    Ok(Input {
        source,
        filename,
        sheet,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Evaluate once and print the result.
fn run(cli: &Cli, resolver: &ScriptResolver) -> Result<(), u8> {
    let input = load_input(cli)?;
    let entity = input
        .sheet
        .as_ref()
        .map(|sheet| Rc::clone(sheet) as Rc<dyn Entity>);

    let provider = match (&cli.self_attribute, &entity) {
        (Some(id), Some(entity)) => {
            let Some(attribute) = entity.attributes().into_iter().find(|a| a.id() == id) else {
                eprintln!("Error: The sheet has no attribute '{}'", id);
                return Err(2);
            };
            AttributeAdapter::new(resolver.clone(), Rc::clone(entity), attribute).provider()
        }
        (Some(_), None) => {
            eprintln!("Error: --self requires --sheet");
            return Err(2);
        }
        (None, _) => SelfProvider::unbound(input.filename.clone()),
    };

    tracing::debug!(
        script = %input.filename,
        provider = %provider.id,
        "evaluating"
    );

    if cli.raw {
        let env = build_environment(resolver, entity.as_ref(), &provider);
        let interpreter = sheetscript::ScriptInterpreter::with_limits(resolver.config().limits);
        return match interpreter.run_script(&input.source, &env) {
            Ok(value) if cli.number => {
                println!("{}", format_number(value.to_number()));
                Ok(())
            }
            Ok(value) => {
                println!("{}", value);
                Ok(())
            }
            Err(e) => {
                eprint!("{}", format_error(&e, &input.source, Some(&input.filename)));
                Err(1)
            }
        };
    }

    if cli.number {
        let n = resolver.resolve_to_number(entity.as_ref(), &provider, &input.source);
        println!("{}", format_number(n));
    } else {
        println!(
            "{}",
            resolver.resolve_script(entity.as_ref(), &provider, &input.source)
        );
    }

    if let Some(path) = &cli.cache {
        if let Err(e) = resolver.world_cache().save(path) {
            eprintln!("Error: {}", e);
            return Err(4);
        }
    }

    Ok(())
}

/// Re-evaluate whenever a watched file changes.
fn run_watch_loop(cli: &Cli, resolver: &ScriptResolver) -> ExitCode {
    let paths = cli.watched_files();
    if paths.is_empty() {
        eprintln!("Error: --watch needs a script file or a sheet to watch.");
        return ExitCode::from(2);
    }

    let watcher = match FileWatcher::new(&paths) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: Failed to create file watcher: {}", e);
            return ExitCode::from(6);
        }
    };

    println!();
    println!("Watching for changes... (Press Ctrl+C to stop)");

    loop {
        if let Err(e) = watcher.wait_for_change() {
            eprintln!("Watch error: {}", e);
            continue;
        }

        println!();
        println!("Re-evaluating...");

        // A reloaded sheet brings a fresh entity cache; the world cache
        // outlives reloads.
        resolver.clear_cache(None);

        if run(cli, resolver).is_err() {
            println!("Fix errors and save to retry.");
        }
    }
}
