use clap::{App, Arg, SubCommand};
use corert::net::{BanEntry, BanList};
use std::time::{Duration, SystemTime};

/// Ban-list maintenance CLI (§4.2): add, remove, and list entries in the
/// flat-file ban list the running server loads at startup.
fn main() {
    let matches = App::new("Ban List")
        .version("1.0")
        .author("Bush Hammer Industries")
        .about("Maintains the server's IP ban list.")
        .arg(
            Arg::with_name("FILE")
                .long("file")
                .short("f")
                .takes_value(true)
                .required(true)
                .help("Path to the ban list file"),
        )
        .subcommand(
            SubCommand::with_name("add")
                .about("Adds a ban entry")
                .arg(Arg::with_name("PATTERN").required(true).help("IP pattern, '*' matches any octet"))
                .arg(Arg::with_name("name").long("name").takes_value(true))
                .arg(Arg::with_name("reason").long("reason").takes_value(true))
                .arg(Arg::with_name("ttl").long("ttl-secs").takes_value(true).help("Expires after this many seconds")),
        )
        .subcommand(
            SubCommand::with_name("unban")
                .about("Removes every entry matching a pattern")
                .arg(Arg::with_name("PATTERN").required(true)),
        )
        .subcommand(SubCommand::with_name("list").about("Lists every non-expired entry"))
        .get_matches();

    let path = matches.value_of("FILE").unwrap();
    let mut list = BanList::load(path).unwrap_or_else(|_| BanList::new());
    list.expire(SystemTime::now());

    match matches.subcommand() {
        ("add", Some(sub)) => {
            let mut entry = BanEntry::new(sub.value_of("PATTERN").unwrap());
            if let Some(name) = sub.value_of("name") {
                entry = entry.with_name(name);
            }
            if let Some(reason) = sub.value_of("reason") {
                entry = entry.with_reason(reason);
            }
            if let Some(ttl) = sub.value_of("ttl") {
                let secs: u64 = ttl.parse().expect("ttl-secs must be an integer");
                entry = entry.with_ttl(Duration::from_secs(secs));
            }
            list.add(entry);
            list.save(path).expect("failed to save ban list");
            println!("Added ban for {}", sub.value_of("PATTERN").unwrap());
        }
        ("unban", Some(sub)) => {
            let pattern = sub.value_of("PATTERN").unwrap();
            let removed = list.unban(pattern);
            list.save(path).expect("failed to save ban list");
            println!("{}", if removed { "Removed matching entries" } else { "No matching entries" });
        }
        ("list", Some(_)) | (_, None) => {
            for entry in list.entries() {
                println!("{}", entry.pattern);
            }
            println!("{} entr{}", list.len(), if list.len() == 1 { "y" } else { "ies" });
        }
        _ => unreachable!(),
    }
}
