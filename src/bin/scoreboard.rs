//! Lists today's games and optionally saves the raw scoreboard document.

use std::{path::PathBuf, process};

use clap::Parser;

use score_drive::{
    cli::LogArgs,
    menu,
    scoreboard::{parse_games, save_raw, NbaScoreboard, DEFAULT_URL},
    Error,
};

const BANNER: &str = "============================================================";

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Scoreboard endpoint.
    #[arg(long, env = "SCORE_DRIVE_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Where to write the raw response.
    #[arg(long, default_value = "raw_scoreboard_data.json")]
    save: PathBuf,

    /// Do not write the raw response.
    #[arg(long, conflicts_with = "save")]
    no_save: bool,

    #[command(flatten)]
    log: LogArgs,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.log.init() {
        eprintln!("{}", err);
    }
    if let Err(err) = run(cli) {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let source = NbaScoreboard::with_url(cli.url);
    println!("{}\nNBA SCOREBOARD\n{}", BANNER, BANNER);
    println!("Fetching {}\n", source.url());

    let raw = source.fetch_raw()?;
    let games = menu::ordered(parse_games(&serde_json::to_vec(&raw)?)?);
    println!("Found {} game(s) today.\n", games.len());
    for game in &games {
        println!(
            "{:<12} {:<30} {}",
            game.game_id,
            game.score_line(),
            menu::status_marker(game)
        );
    }

    if !cli.no_save {
        save_raw(&raw, &cli.save)?;
        println!("\nRaw data saved to {}", cli.save.display());
    }
    Ok(())
}
