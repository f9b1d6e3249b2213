use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tunebox::config;
use tunebox::playlist::SharedPlaylist;
use tunebox::store::{SqliteTrackStore, TrackStore};
use tunebox::upload::Uploader;

#[derive(Debug, Default)]
struct CliArgs {
    db: Option<PathBuf>,
    upload: Option<PathBuf>,
    list: bool,
    verbosity: usize,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let headless = args.upload.is_some() || args.list;

    // The TUI owns the terminal, so it only logs to stderr when asked to.
    stderrlog::new()
        .module(module_path!())
        .quiet(!headless && args.verbosity == 0)
        .verbosity(args.verbosity + 1)
        .init()
        .context("failed to initialise logging")?;

    let settings = config::load_state()?;
    let database_path = match args.db {
        Some(path) => path,
        None => config::database_path(&settings)?,
    };

    if let Some(file) = args.upload {
        let store = Arc::new(SqliteTrackStore::new(&database_path));
        let uploader = Uploader::new(
            store,
            SharedPlaylist::new(),
            settings.accepted_extensions.clone(),
        );
        let track = uploader.upload_blocking(&file)?;
        println!("{}", track.id);
        return Ok(());
    }

    if args.list {
        let store = SqliteTrackStore::new(&database_path);
        let tracks = store.load_all()?;
        for track in tracks {
            println!("{}\t{}", track.id, track.name);
        }
        return Ok(());
    }

    tunebox::app::run_with_startup(tunebox::app::AppStartupOptions {
        settings,
        database_path,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--db" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--db requires a path");
                };
                out.db = Some(PathBuf::from(value));
            }
            "--upload" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--upload requires a file path");
                };
                out.upload = Some(PathBuf::from(value));
            }
            "--list" => out.list = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            flag if flag.len() > 1 && flag.starts_with('-') && flag[1..].chars().all(|c| c == 'v') => {
                out.verbosity += flag.len() - 1;
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    if out.upload.is_some() && out.list {
        anyhow::bail!("--upload and --list cannot be combined");
    }
    Ok(out)
}

fn print_help() {
    println!("tunebox");
    println!("  --db <path>       Track database to use");
    println!("  --upload <file>   Store one audio file and print its id");
    println!("  --list            Print stored tracks as id<TAB>name");
    println!("  -v, -vv, -vvv     More log output on stderr");
}
