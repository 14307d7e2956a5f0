//! Resolves slot accounts and groups the way `getent` would, straight through
//! the module's lookups, and checks host contract files against the module.

extern crate arg_parser;
extern crate nss_slots;

use std::path::Path;
use std::{env, fs, process};

use anyhow::{bail, Context, Result};
use arg_parser::ArgParser;
use log::debug;
use tracing_subscriber::EnvFilter;

use nss_slots::{Config, Error};

const USAGE: &str = "usage: slots_getent [-c CONFIG] [-o OUTPUT_CONFIG] [-b BYTES] [-v] passwd|group KEY...";

// Small on purpose, so the retry path gets exercised.
const DEFAULT_BUFFER_SIZE: usize = 16;

#[derive(Clone, Copy, Debug)]
enum Database {
    Passwd,
    Group,
}

impl Database {
    fn from_arg(arg: &str) -> Result<Self> {
        match arg {
            "passwd" => Ok(Database::Passwd),
            "group" => Ok(Database::Group),
            other => bail!("unknown database '{}'", other),
        }
    }
}

/// Looks `key` up, growing `buf` to the hinted size until the record fits.
fn lookup(database: Database, key: &str, buf: &mut Vec<u8>) -> Option<String> {
    loop {
        let result = match (database, key.parse::<u32>()) {
            (Database::Passwd, Ok(uid)) => nss_slots::account_by_id(uid, buf).map(|e| e.to_string()),
            (Database::Passwd, Err(_)) => {
                nss_slots::account_by_name(key.as_bytes(), buf).map(|e| e.to_string())
            }
            (Database::Group, Ok(gid)) => nss_slots::group_by_id(gid, buf).map(|e| e.to_string()),
            (Database::Group, Err(_)) => {
                nss_slots::group_by_name(key.as_bytes(), buf).map(|e| e.to_string())
            }
        };

        match result {
            Ok(line) => return Some(line),
            Err(Error::NotFound) => return None,
            Err(err @ Error::BufferTooSmall { required, .. }) => {
                debug!("{}: {}, retrying", key, err);
                buf.resize(required, 0);
            }
        }
    }
}

fn parser() -> ArgParser {
    ArgParser::new(4)
        .add_opt("c", "config")
        .add_opt("o", "output-config")
        .add_opt("b", "buffer-size")
        .add_flag(&["v", "verbose"])
}

/// Returns whether every key was found.
fn run(parser: &ArgParser) -> Result<bool> {
    let config = match parser.get_opt("config") {
        Some(path) => {
            let config = Config::from_file(Path::new(&path))?;
            config.verify()?;
            Some((path, config))
        }
        None => None,
    };

    // The host file with its includes resolved, or the builtin contract
    if let Some(path) = parser.get_opt("output-config") {
        let output = match &config {
            Some((_, config)) => toml::to_string_pretty(config)?,
            None => toml::to_string_pretty(&Config::builtin())?,
        };
        fs::write(&path, output).with_context(|| format!("{}: failed to write", path))?;
        return Ok(true);
    }

    if let Some((path, _)) = &config {
        if parser.args.is_empty() {
            println!("{}: matches the module contract", path);
            return Ok(true);
        }
    }

    let buffer_size = match parser.get_opt("buffer-size") {
        Some(size) => size
            .parse::<usize>()
            .with_context(|| format!("invalid buffer size '{}'", size))?,
        None => DEFAULT_BUFFER_SIZE,
    };

    let (database, keys) = match parser.args.split_first() {
        Some((database, keys)) if !keys.is_empty() => (Database::from_arg(database)?, keys),
        _ => bail!("{}", USAGE),
    };

    let mut all_found = true;
    for key in keys {
        let mut buf = vec![0; buffer_size];
        match lookup(database, key, &mut buf) {
            Some(line) => println!("{}", line),
            None => {
                debug!("{}: not found", key);
                all_found = false;
            }
        }
    }

    Ok(all_found)
}

fn main() {
    let mut parser = parser();
    parser.parse(env::args());

    // The default tracing-log bridge forwards the library's `log` records
    let filter = if parser.found("verbose") { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(&parser) {
        Ok(true) => {}
        // Same status getent uses for keys it can't resolve
        Ok(false) => process::exit(2),
        Err(err) => {
            eprintln!("slots_getent: {:#}", err);
            process::exit(1);
        }
    }
}
