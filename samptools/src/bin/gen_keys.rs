use clap::{App, Arg};
use rand::distributions::Uniform;
use rand::prelude::*;
use std::fs;
use std::io::{LineWriter, Write};

const ALLOWED_CHARS: [char; 35] = [
    '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l',
    'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

const RANGE: usize = ALLOWED_CHARS.len();
const KEY_LEN: usize = 24;

/// Produces one `auth_token` value suitable for `ConnectionRequest`'s
/// serial-key field (§4.2).
fn make_key(rng: &mut ThreadRng) -> String {
    rng.sample_iter(&Uniform::new(0, RANGE))
        .take(KEY_LEN)
        .map(|sample| ALLOWED_CHARS[sample])
        .collect()
}

fn main() {
    let matches = App::new("Key Generator")
        .version("1.0")
        .author("Bush Hammer Industries")
        .about("Generates auth-token serial keys for client connection requests.")
        .arg(
            Arg::with_name("NKEYS")
                .help("Number of new keys to generate")
                .required(true),
        )
        .arg(
            Arg::with_name("KEY_FILE")
                .help("Newly generated keys are appended to this file, one per line")
                .required(false),
        )
        .get_matches();

    let key_count: usize = matches
        .value_of("NKEYS")
        .unwrap()
        .parse()
        .expect("key count must be a valid integer");

    let mut rng = thread_rng();
    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::with_capacity(key_count);

    while keys.len() < key_count {
        let key = make_key(&mut rng);
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }

    match matches.value_of("KEY_FILE") {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("failed to open key file");
            let mut file = LineWriter::new(file);
            for key in &keys {
                file.write_all(key.as_bytes()).unwrap();
                file.write_all(b"\n").unwrap();
            }
            println!("Wrote {} keys to {}", keys.len(), path);
        }
        None => {
            for key in &keys {
                println!("{}", key);
            }
        }
    }
}
