use clap::{App, Arg};
use sloggers::types::Severity;

fn main() {
    let matches = App::new("sampserver")
        .version("1.0")
        .author("Bush Hammer Industries")
        .about("Runs the game server.")
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .short("c")
                .takes_value(true)
                .help("Path to game_config.toml (defaults to the bundled config)"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Logs at debug level instead of info"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { Severity::Debug } else { Severity::Info };
    let log = wireproto::logging::init_terminal(level);

    let config = match matches.value_of("CONFIG") {
        Some(path) => sampgame::config::GameConfig::load(path).expect("failed to load game_config.toml"),
        None => sampgame::config::GameConfig::default(),
    };

    slog::info!(log, "starting server"; "address" => config.server.address.to_string(), "max_clients" => config.server.max_clients);

    let mut world = sampgame::build_world(&config, log.clone()).expect("failed to bind server socket");
    world.run();
}
