//! Interactive peer-selection prompt.
//!
//! The loop is: scan → list numbered peers → read a selection → run a
//! control session against the chosen peer → on session end, rescan and
//! prompt again.  `r` rescans immediately, `q` quits.  Prompt text goes to
//! stdout directly; diagnostics go through `tracing` like everywhere else.

use std::net::{IpAddr, SocketAddr};

use peerdesk_scan::{Device, ScanError, Scanner};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::capture;
use crate::session::controller::run_controller;
use crate::sink::HeadlessSink;

/// What the user asked for at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Peer(usize),
    Rescan,
    Quit,
}

/// Parses one prompt line against the current peer count.
fn parse_selection(input: &str, peer_count: usize) -> Option<Selection> {
    match input.trim() {
        "q" | "Q" => Some(Selection::Quit),
        "r" | "R" | "" => Some(Selection::Rescan),
        number => match number.parse::<usize>() {
            Ok(n) if (1..=peer_count).contains(&n) => Some(Selection::Peer(n - 1)),
            _ => None,
        },
    }
}

/// Runs the prompt loop until the user quits or stdin closes.
pub async fn run(scanner: Scanner, port: u16, stop: CancellationToken) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let peers = match scanner.find_reachable_peers().await {
            Ok(peers) => peers,
            Err(e @ ScanError::NoInterface) => {
                warn!("{e}");
                Vec::new()
            }
            Err(e) => {
                warn!("scan failed: {e}");
                Vec::new()
            }
        };

        if peers.is_empty() {
            println!("\nNo reachable peers found.");
            print!("Press Enter to search again, or 'q' to quit: ");
            flush_stdout();
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if matches!(line.trim(), "q" | "Q") {
                break;
            }
            continue;
        }

        print_peer_list(&peers);
        print!("\nSelect peer number (or 'r' to search again, 'q' to quit): ");
        flush_stdout();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_selection(&line, peers.len()) {
            Some(Selection::Quit) => break,
            Some(Selection::Rescan) => continue,
            None => {
                println!(
                    "Invalid selection. Choose 1-{}, 'r' to search again, or 'q' to quit.",
                    peers.len()
                );
                continue;
            }
            Some(Selection::Peer(index)) => {
                let peer = &peers[index];
                println!("Selected: {}\n", peer.ip);
                control_session(peer, port, &stop).await;
                println!("\nControl session ended. Returning to peer selection...");
            }
        }
    }

    info!("quitting");
    stop.cancel();
    Ok(())
}

fn print_peer_list(peers: &[Device]) {
    println!("\n=== Reachable Peers ===");
    for (i, peer) in peers.iter().enumerate() {
        println!("{}. {} ({})", i + 1, peer.ip, peer.display_name());
    }
}

/// Runs one controller session; all outcomes return to the prompt.
async fn control_session(peer: &Device, port: u16, stop: &CancellationToken) {
    let addr = SocketAddr::new(IpAddr::V4(peer.ip), port);
    info!("connecting to {addr}...");
    println!("Press Ctrl+Shift+B to stop control.");

    let capture = match capture::new_platform_capture() {
        Ok(capture) => capture,
        Err(e) => {
            warn!("cannot start input capture: {e}");
            return;
        }
    };

    match run_controller(addr, capture, Box::new(HeadlessSink::new()), stop.child_token()).await
    {
        Ok(reason) => info!("control session ended: {reason}"),
        Err(e) => warn!("control session ended: {e}"),
    }
}

fn flush_stdout() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_selection() {
        assert_eq!(parse_selection("q", 3), Some(Selection::Quit));
        assert_eq!(parse_selection(" Q ", 3), Some(Selection::Quit));
    }

    #[test]
    fn test_rescan_selection() {
        assert_eq!(parse_selection("r", 3), Some(Selection::Rescan));
        assert_eq!(parse_selection("R", 3), Some(Selection::Rescan));
        assert_eq!(parse_selection("", 3), Some(Selection::Rescan));
    }

    #[test]
    fn test_peer_selection_is_one_based() {
        assert_eq!(parse_selection("1", 3), Some(Selection::Peer(0)));
        assert_eq!(parse_selection("3", 3), Some(Selection::Peer(2)));
    }

    #[test]
    fn test_out_of_range_and_garbage_are_rejected() {
        assert_eq!(parse_selection("0", 3), None);
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("abc", 3), None);
        assert_eq!(parse_selection("-1", 3), None);
    }
}
