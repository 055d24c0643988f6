use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::{eyre, Result};
use flexboard::{from_script_value, Config, Session};
use serde_json::json;

#[derive(Parser, Debug)]
#[clap(name = "flexboard", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// Configuration file to use (JSON, YAML or TOML).
    #[clap(short, long, default_value = "flexboard.yml")]
    config: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the dataset and show the items visible in a view, along with
    /// the results of its bindings.
    Show {
        /// ID of the view to show. Defaults to the last view loaded.
        #[clap(long)]
        view: Option<String>,

        /// Output one JSON object per item.
        #[clap(long)]
        json: bool,

        /// Where to find view definitions. Defaults to the patterns in the
        /// configuration file.
        patterns: Vec<String>,
    },
    /// Check that the bindings of all views compile, without fetching any
    /// data.
    Check {
        /// Where to find view definitions. Defaults to the patterns in the
        /// configuration file.
        patterns: Vec<String>,
    },
}

fn main() {
    let args = Args::parse();
    if let Err(e) = simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    }) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = Config::load(&args.config).and_then(|config| match args.command {
        Command::Show {
            view,
            json,
            patterns,
        } => show(config, view, json, &patterns),
        Command::Check { patterns } => check(config, &patterns),
    });
    if let Err(e) = result {
        log::error!("Failed: {:?}", e);
        std::process::exit(1);
    }
}

fn load_session(config: Config, patterns: &[String]) -> Result<(Session, Vec<String>)> {
    let mut session = Session::from_config(config)?;
    let ids = if patterns.is_empty() {
        session.load_configured_views()?
    } else {
        session.load_views(patterns)?
    };
    Ok((session, ids))
}

fn show(config: Config, view: Option<String>, json: bool, patterns: &[String]) -> Result<()> {
    let (mut session, loaded) = load_session(config, patterns)?;
    let view_id = match view.or_else(|| loaded.last().cloned()) {
        Some(id) => id,
        None => return Err(eyre!("no view to show")),
    };
    session.refresh()?;

    let board = session.board();
    let view = board
        .view(&view_id)
        .ok_or_else(|| flexboard::Error::NoSuchView(view_id.clone()))?;
    let ids = board.ids();
    for idx in board.visible_indices(&view_id)? {
        let row = view
            .bindmap()
            .row(idx)
            .into_iter()
            .filter(|(name, _)| {
                view.bindmap()
                    .get(name)
                    .map_or(false, |binding| !binding.is_reserved())
            })
            .map(|(name, value)| (name, from_script_value(&value)))
            .collect::<serde_json::Map<String, serde_json::Value>>();
        if json {
            println!("{}", json!({ "id": ids[idx], "bindings": row }));
        } else {
            let fields = row
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<String>>();
            println!("{}\t{}", ids[idx], fields.join("\t"));
        }
    }
    Ok(())
}

fn check(config: Config, patterns: &[String]) -> Result<()> {
    let (mut session, loaded) = load_session(config, patterns)?;
    let errors = session.board_mut().compile_bindings();
    for e in &errors {
        log::error!("{}", e);
    }
    if errors.is_empty() {
        log::info!("All bindings of {} view(s) compile", loaded.len());
        Ok(())
    } else {
        Err(eyre!("{} binding(s) failed to compile", errors.len()))
    }
}
