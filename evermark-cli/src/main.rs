// Command-line interface for evermark
//
// Converts the HTML files of an Evernote export into Markdown with YAML frontmatter. The
// conversion itself lives in evermark-babel; this binary finds the notes, picks which ones
// to convert, writes the results and prints a short report.
//
// Usage:
//  evermark <note.html>                        - Convert one note, in place
//  evermark <note.html> --mode recursive       - Convert a note and every note it links to
//  evermark <folder> --mode all -o <out>       - Convert the whole folder into <out>
//
// With an output folder, notes land in <out>/<notebook>/<title>.md (the notebook comes from
// the `nb:` tag) and attachments are copied to <out>/resources.
//
// Configuration is read from the built-in defaults, then ./evermark.toml if present, then
// the file given with --config. Command-line flags win over all of them.

mod error;
mod export;
mod report;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use error::{CliError, Result};
use evermark_babel::RenderOptions;
use evermark_config::{ConversionMode, EvermarkConfig, Loader};
use export::{Workspace, Writer};
use log::LevelFilter;
use report::Report;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

fn build_cli() -> Command {
    Command::new("evermark")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Evernote HTML exports to Markdown")
        .long_about(
            "evermark converts the notes of an Evernote HTML export into Markdown files\n\
            with YAML frontmatter, keeping formatting, tables, attachments and the links\n\
            between notes.\n\n\
            Modes:\n  \
            - single:    convert the given note (default)\n  \
            - all:       convert every note of the folder and report link clusters\n  \
            - recursive: convert the given note and every note reachable from it\n\n\
            Examples:\n  \
            evermark Export/Recipes.html                     # Writes Export/Recipes.md\n  \
            evermark Export/Index.html -m recursive -o notes # Follow links from Index\n  \
            evermark Export -m all -o notes                  # Whole export\n  \
            evermark Export -m all -t                        # Dry run, report only",
        )
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Note file, or export folder with --mode all")
                .required(true)
                .index(1)
                .value_hint(ValueHint::AnyPath),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .short('m')
                .help("Which notes to convert")
                .value_parser(clap::builder::PossibleValuesParser::new(
                    ConversionMode::NAMES,
                ))
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("DIR")
                .help("Output folder (defaults to writing next to each note)")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log more (-v for progress, -vv for details)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("test")
                .long("test")
                .short('t')
                .help("Convert and report without writing any file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an evermark.toml configuration file")
                .value_hint(ValueHint::FilePath),
        )
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

/// Run a conversion. Returns `false` when some notes failed.
fn run(matches: &ArgMatches) -> Result<bool> {
    let config = load_cli_config(
        matches.get_one::<String>("config").map(String::as_str),
        matches.get_one::<String>("mode").map(String::as_str),
    )?;
    let mode = config.convert.mode;
    let options = RenderOptions::from(config.render);

    let path = matches
        .get_one::<String>("path")
        .map(PathBuf::from)
        .unwrap_or_default();
    let output = matches.get_one::<String>("output").map(PathBuf::from);
    let test = matches.get_flag("test");

    let workspace = Workspace::discover(&path)?;
    if workspace.files.is_empty() {
        return Err(CliError::NoNotes(workspace.dir));
    }
    if mode != ConversionMode::All && workspace.start.is_none() {
        return Err(CliError::NotANote {
            path,
            mode: mode.as_str(),
        });
    }

    let start = Instant::now();
    let (notes, load_failures) = workspace.load();
    let mut failures = Vec::new();
    for (file, err) in load_failures {
        if workspace.is_selected(&file, mode) {
            failures.push(err);
        } else {
            log::warn!("{err}");
        }
    }
    let copy_resources = output.is_some() && config.convert.copy_resources;
    let mut run = export::convert(
        &notes,
        workspace.start.as_deref(),
        mode,
        &options,
        copy_resources,
    );
    failures.append(&mut run.failures);

    if !test {
        let writer = Writer::new(&workspace.dir, output.as_deref(), copy_resources);
        for note in &run.converted {
            if let Err(err) = writer.write(note) {
                failures.push(err);
            }
        }
    }

    let report = Report::new(mode, &workspace.files, &run.converted, start.elapsed());
    print!("{report}");

    for failure in &failures {
        eprintln!("{failure}");
    }
    Ok(failures.is_empty())
}

fn load_cli_config(explicit_path: Option<&str>, mode: Option<&str>) -> Result<EvermarkConfig> {
    let mut loader = Loader::new().with_optional_file("evermark.toml");
    if let Some(path) = explicit_path {
        loader = loader.with_file(Path::new(path));
    }
    if let Some(mode) = mode {
        loader = loader.set_override("convert.mode", mode)?;
    }
    Ok(loader.build()?)
}
