//! Line-command parser for the session driver binary.
//!
//! Parses incoming control-surface commands from raw text into structured
//! `Command` variants the main loop can dispatch on. The real transport
//! layer is external; this is the minimal line protocol in front of the
//! session.

use crate::cards::CardOrder;

/// A parsed session command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit movement orders: `submit FRA A den holds ; ...`.
    SubmitOrders { nation: String, orders: Vec<String> },

    /// Submit card orders as JSON: `cards FRA [{"nation":"FRA",...}]`.
    SubmitCards {
        nation: String,
        orders: Vec<CardOrder>,
    },

    /// Submit retreat orders: `retreat FRA FRA: A par -> bre ; ...`.
    SubmitRetreats { nation: String, orders: Vec<String> },

    /// Print the current turn and phase.
    Phase,

    /// Print the latest committed snapshot.
    State,

    /// Print the committed history keys in order.
    History,

    /// Restore the starting position.
    Reset,

    /// Terminate the driver.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging to stderr.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (trimmed, ""),
    };

    match word {
        "phase" => Some(Command::Phase),
        "state" => Some(Command::State),
        "history" => Some(Command::History),
        "reset" => Some(Command::Reset),
        "quit" => Some(Command::Quit),

        "submit" => parse_nation_orders(rest).map(|(nation, orders)| Command::SubmitOrders {
            nation,
            orders,
        }),
        "retreat" => parse_nation_orders(rest).map(|(nation, orders)| Command::SubmitRetreats {
            nation,
            orders,
        }),
        "cards" => parse_cards(rest),

        other => {
            eprintln!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `<NATION> [order ; order ; ...]`.
fn parse_nation_orders(rest: &str) -> Option<(String, Vec<String>)> {
    let (nation, tail) = match rest.split_once(char::is_whitespace) {
        Some((n, t)) => (n, t),
        None if !rest.is_empty() => (rest, ""),
        None => {
            eprintln!("malformed submit: expected '<NATION> [orders]'");
            return None;
        }
    };

    let orders: Vec<String> = tail
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    Some((nation.to_string(), orders))
}

/// Parses `<NATION> <json array of card orders>`.
fn parse_cards(rest: &str) -> Option<Command> {
    let (nation, json) = match rest.split_once(char::is_whitespace) {
        Some((n, j)) => (n, j.trim()),
        None if !rest.is_empty() => (rest, "[]"),
        None => {
            eprintln!("malformed cards: expected '<NATION> <json>'");
            return None;
        }
    };

    match serde_json::from_str::<Vec<CardOrder>>(json) {
        Ok(orders) => Some(Command::SubmitCards {
            nation: nation.to_string(),
            orders,
        }),
        Err(e) => {
            eprintln!("malformed card orders: {}", e);
            None
        }
    }
}
