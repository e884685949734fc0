use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};

fn new_app() -> Command<'static> {
    Command::new("huffcomp")
        .about("Compresses and decompresses files with Huffman coding")
        .arg(
            Arg::new("decompress")
                .long("decompress")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Restore SOURCE, a compressed file, into DEST"),
        )
        .arg(
            Arg::new("SOURCE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("File to read"),
        )
        .arg(
            Arg::new("DEST")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("File to create, replaced if it exists"),
        )
}

/// Source size over destination size, or `None` when either size is unknown.
fn compression_rate(original: io::Result<u64>, compressed: io::Result<u64>) -> Option<f64> {
    match (original, compressed) {
        (Ok(original), Ok(compressed)) if compressed > 0 => {
            Some(original as f64 / compressed as f64)
        }
        _ => None,
    }
}

/// Runs one compression or decompression. DEST is removed again if anything
/// fails after it was created.
fn run(decompress: bool, source: &Path, dest: &Path) -> Result<()> {
    let mut input =
        File::open(source).with_context(|| format!("cannot open '{}'", source.display()))?;
    let mut output =
        File::create(dest).with_context(|| format!("cannot create '{}'", dest.display()))?;

    let result = if decompress {
        huffcomp::decode(&mut input, &mut output).context("cannot decompress")
    } else {
        huffcomp::encode(&mut input, &mut output).context("cannot compress")
    };

    if let Err(err) = result {
        drop(output);
        if let Err(remove_err) = fs::remove_file(dest) {
            log::warn!("cannot remove '{}': {}", dest.display(), remove_err);
        }
        return Err(err);
    }

    if decompress {
        println!("decompressed '{}' into '{}'", source.display(), dest.display());
    } else {
        println!("compressed '{}' into '{}'", source.display(), dest.display());

        let rate = compression_rate(
            input.metadata().map(|meta| meta.len()),
            output.metadata().map(|meta| meta.len()),
        );
        if let Some(rate) = rate {
            println!("compression rate is {:.2}", rate);
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let matches = new_app().get_matches();
    let (source, dest) = match (
        matches.get_one::<PathBuf>("SOURCE"),
        matches.get_one::<PathBuf>("DEST"),
    ) {
        (Some(source), Some(dest)) => (source, dest),
        _ => unreachable!("SOURCE and DEST are required"),
    };

    let start = Instant::now();
    if let Err(err) = run(matches.get_flag("decompress"), source, dest) {
        eprintln!("Error: {:?}", err);
        process::exit(1);
    }

    log::info!("finished in {:?}", start.elapsed());
}
