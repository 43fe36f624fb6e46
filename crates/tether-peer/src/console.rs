//! Interactive terminal front end for a [`Session`]

use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::error::PeerError;
use crate::relay::{Entry, Session};
use crate::service::InboundMessage;

const DEFAULT_BENCH_ROUNDS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Menu,
    RoomName,
    PeerName,
    Chat,
}

impl Prompt {
    fn show(self) {
        match self {
            Prompt::Menu => println!("Enter a room or a personal chat? [1/2]"),
            Prompt::RoomName => println!("Room name:"),
            Prompt::PeerName => println!("User name:"),
            Prompt::Chat => {}
        }
    }
}

pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
        }
    }

    /// Ask for a nickname until a non-empty one is given
    pub async fn read_identity(&mut self) -> anyhow::Result<String> {
        loop {
            println!("Nickname:");
            match self.lines.next_line().await? {
                Some(line) if !line.trim().is_empty() => return Ok(line.trim().to_string()),
                Some(_) => continue,
                None => anyhow::bail!("stdin closed before a nickname was entered"),
            }
        }
    }

    /// Drive the session until end of input or Ctrl-C, then log out
    pub async fn run(
        &mut self,
        mut session: Session,
        mut inbound: broadcast::Receiver<InboundMessage>,
    ) -> anyhow::Result<()> {
        println!("Logged in as {} ({})", session.identity(), session.endpoint());
        let mut prompt = Prompt::Menu;
        prompt.show();

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    let Some(line) = line? else { break };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    prompt = handle_line(&mut session, prompt, line).await;
                    prompt.show();
                }
                msg = inbound.recv() => match msg {
                    Ok(msg) if session.active() == Some(&msg.conversation) => {
                        println!("{}", msg.message);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Console skipped {} inbound messages", missed);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }

        session.logout().await?;
        println!("Bye.");
        Ok(())
    }
}

async fn handle_line(session: &mut Session, prompt: Prompt, line: &str) -> Prompt {
    match prompt {
        Prompt::Menu => match line {
            "1" => Prompt::RoomName,
            "2" => Prompt::PeerName,
            _ => {
                println!("Please enter 1 or 2");
                Prompt::Menu
            }
        },
        Prompt::RoomName => match session.enter_room(line).await {
            Ok(entry) => {
                print_entry(&entry);
                Prompt::Chat
            }
            Err(e) => {
                println!("Could not enter room: {}", e);
                Prompt::Menu
            }
        },
        Prompt::PeerName => match session.enter_personal(line).await {
            Ok(entry) => {
                print_entry(&entry);
                Prompt::Chat
            }
            Err(PeerError::NoSuchUser(name)) => {
                println!("No such user: {}", name);
                Prompt::Menu
            }
            Err(e) => {
                println!("Could not start chat: {}", e);
                Prompt::Menu
            }
        },
        Prompt::Chat => {
            handle_chat(session, line).await;
            if session.active().is_some() {
                Prompt::Chat
            } else {
                Prompt::Menu
            }
        }
    }
}

async fn handle_chat(session: &mut Session, line: &str) {
    if line == "quit" {
        match session.quit().await {
            Ok(conversation) => println!("Left {}", conversation),
            Err(e) => println!("Error while leaving: {}", e),
        }
        return;
    }

    if let Some(rest) = line.strip_prefix("/bench") {
        let rounds = match rest.trim() {
            "" => DEFAULT_BENCH_ROUNDS,
            n => match n.parse() {
                Ok(n) => n,
                Err(_) => {
                    println!("Usage: /bench [rounds]");
                    return;
                }
            },
        };
        match session.benchmark(rounds).await {
            Ok(report) => println!(
                "{} rounds in {:?}, mean {:?} per round, {} failed deliveries",
                report.rounds,
                report.total,
                report.mean(),
                report.failures
            ),
            Err(e) => println!("Benchmark aborted: {}", e),
        }
        return;
    }

    match session.send(line).await {
        Ok(delivery) if !delivery.failed.is_empty() => {
            let failed: Vec<String> = delivery.failed.iter().map(|ep| ep.to_string()).collect();
            println!("(not delivered to {})", failed.join(", "));
        }
        Ok(_) => {}
        Err(e) => println!("Send failed: {}", e),
    }
}

fn print_entry(entry: &Entry) {
    if entry.created {
        println!("Room created: {}", entry.conversation);
    }
    println!("--- {} (version {}) ---", entry.conversation, entry.reconciliation.version);
    print!("{}", entry.reconciliation.history);
    println!("--- type messages, 'quit' to leave, '/bench [N]' to benchmark ---");
}
