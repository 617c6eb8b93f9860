//! Condottieri -- a card-augmented Diplomacy-variant session driver.
//!
//! This binary reads control-surface commands from stdin and writes
//! responses to stdout, one line per command. Logs go to stderr so the
//! output stream stays machine-readable. The resolution gateway is the
//! in-crate scripted one; a real resolver plugs in behind the same trait.

use std::io::{self, BufRead, Write};

use condottieri::board::phase::PhaseKey;
use condottieri::protocol::command::{parse_command, Command};
use condottieri::resolve::scripted::ScriptedGateway;
use condottieri::session::game::Session;

/// Runs the main command loop, reading from stdin and writing to stdout.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut session = Session::new(Box::new(ScriptedGateway::new()));

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::SubmitOrders { nation, orders } => {
                report(&mut out, session.submit_orders(&nation, orders), &session);
            }
            Command::SubmitCards { nation, orders } => {
                report(
                    &mut out,
                    session.submit_card_orders(&nation, orders),
                    &session,
                );
            }
            Command::SubmitRetreats { nation, orders } => {
                report(&mut out, session.submit_retreats(&nation, orders), &session);
            }
            Command::Phase => {
                let info = session.current_phase();
                writeln!(out, "{}", serde_json::to_string(&info).unwrap()).unwrap();
            }
            Command::State => {
                let units = session.latest_snapshot();
                writeln!(out, "{}", serde_json::to_string(units).unwrap()).unwrap();
            }
            Command::History => {
                let mut keys: Vec<PhaseKey> = session.history().keys().copied().collect();
                keys.sort_by_key(|k| (k.turn, k.phase as usize));
                let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                writeln!(out, "{}", serde_json::to_string(&keys).unwrap()).unwrap();
            }
            Command::Reset => {
                session.reset();
                report(&mut out, Ok(()), &session);
            }
            Command::Quit => break,
        }
        out.flush().unwrap();
    }
}

/// Writes `ok <turn>-<phase>` or `error <message>` for a submission result.
fn report<W: Write>(
    out: &mut W,
    result: Result<(), condottieri::session::game::SessionError>,
    session: &Session,
) {
    match result {
        Ok(()) => {
            let info = session.current_phase();
            writeln!(out, "ok {}-{}", info.turn, info.phase).unwrap();
        }
        Err(e) => {
            writeln!(out, "error {}", e).unwrap();
        }
    }
}
