use clap::{App, Arg};
use corert::net::{Endpoint, Incoming};
use sloggers::types::Severity;
use std::thread;
use std::time::Duration;

/// Raw UDP smoke-test listener: binds an `Endpoint` and logs every
/// handshake attempt, payload, and disconnect it observes, without
/// wiring up pools or a tick loop. Useful for poking a running
/// configuration with a bare client before standing up the full server.
fn main() {
    let matches = App::new("Listener Smoke Test")
        .version("1.0")
        .author("Bush Hammer Industries")
        .about("Binds a UDP endpoint and logs incoming traffic.")
        .arg(
            Arg::with_name("ADDRESS")
                .help("Address to bind, e.g. 127.0.0.1:7777")
                .default_value("127.0.0.1:7777"),
        )
        .get_matches();

    let addr = matches
        .value_of("ADDRESS")
        .unwrap()
        .parse()
        .expect("invalid bind address");

    let log = wireproto::logging::init_terminal(Severity::Debug);
    let mut endpoint = Endpoint::bind(addr).expect("failed to bind socket");

    slog::info!(log, "listening"; "address" => addr.to_string());

    loop {
        for event in endpoint.poll() {
            match event {
                Incoming::PeerConnectRequested(addr, request) => {
                    slog::info!(log, "handshake requested"; "addr" => addr.to_string(), "name" => request.name);
                }
                Incoming::Payload(addr, channel, payload) => {
                    slog::debug!(log, "payload"; "addr" => addr.to_string(), "channel" => format!("{:?}", channel), "bytes" => payload.len());
                }
                Incoming::Disconnected(addr, reason) => {
                    slog::info!(log, "disconnected"; "addr" => addr.to_string(), "reason" => format!("{:?}", reason));
                }
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
}
