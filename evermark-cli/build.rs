use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Keep in sync with evermark_config::ConversionMode::NAMES
const MODES: &[&str] = &["single", "all", "recursive"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("evermark")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Evernote HTML exports to Markdown")
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
                .value_parser(clap::builder::PossibleValuesParser::new(MODES)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output folder")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("test")
                .long("test")
                .short('t')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath),
        );

    generate_to(Bash, &mut cmd, "evermark", &outdir)?;
    generate_to(Zsh, &mut cmd, "evermark", &outdir)?;
    generate_to(Fish, &mut cmd, "evermark", &outdir)?;

    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
