use sampgame::config::GameConfig;

/// Prints a default `game_config.toml` to stdout, for operators bootstrapping
/// a new server directory.
fn main() {
    let config = serdeconv::to_toml_string(&GameConfig::default()).expect("default config always serializes");

    println!("{}", config);
}
