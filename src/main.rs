use clap::Parser;
use log::error;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use dirshare::{Config, DirshareError, Node, Rejection, Result, DEFAULT_TIME_URL};

#[derive(Parser)]
#[command(name = "dirshare")]
#[command(about = "A peer node for a centralized-directory P2P file sharing network")]
#[command(version)]
struct Cli {
    /// Registry server address
    #[arg(short = 's', long)]
    server: String,
    /// Registry server port
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1024..))]
    port: u16,
    /// URL of the timestamp web service
    #[arg(long, default_value = DEFAULT_TIME_URL)]
    time_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dirshare::utils::logger::setup_logging();

    let cli = Cli::parse();
    let config = Config {
        server: cli.server,
        port: cli.port,
        time_url: cli.time_url,
    };

    let mut node = Node::new(config)?;
    shell(&mut node).await;

    if let Err(e) = node.shutdown().await {
        error!("shutdown failed: {}", e);
    }
    Ok(())
}

/// Interactive command loop; dispatches each line to the node and prints a
/// human-readable outcome. The process exits only via QUIT (or end of
/// input).
async fn shell(node: &mut Node) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("c> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let command = command.to_uppercase();
        let args: Vec<&str> = words.collect();

        match (command.as_str(), args.as_slice()) {
            ("REGISTER", [user]) => report("REGISTER", node.register(user).await),
            ("REGISTER", _) => println!("Syntax error. Usage: REGISTER <userName>"),

            ("UNREGISTER", [user]) => report("UNREGISTER", node.unregister(user).await),
            ("UNREGISTER", _) => println!("Syntax error. Usage: UNREGISTER <userName>"),

            ("CONNECT", [user]) => report("CONNECT", node.connect(user).await),
            ("CONNECT", _) => println!("Syntax error. Usage: CONNECT <userName>"),

            ("DISCONNECT", [user]) => report("DISCONNECT", node.disconnect(user).await),
            ("DISCONNECT", _) => println!("Syntax error. Usage: DISCONNECT <userName>"),

            ("PUBLISH", [path, description @ ..]) if !description.is_empty() => {
                let description = description.join(" ");
                report("PUBLISH", node.publish(path, &description).await);
            }
            ("PUBLISH", _) => println!("Syntax error. Usage: PUBLISH <fileName> <description>"),

            ("DELETE", [path]) => report("DELETE", node.delete(path).await),
            ("DELETE", _) => println!("Syntax error. Usage: DELETE <fileName>"),

            ("LIST_USERS", []) => run_list_users(node).await,
            ("LIST_USERS", _) => println!("Syntax error. Use: LIST_USERS"),

            ("LIST_CONTENT", [target]) => run_list_content(node, target).await,
            ("LIST_CONTENT", _) => println!("Syntax error. Usage: LIST_CONTENT <userName>"),

            ("GET_FILE", [user, remote, local]) => {
                report("GET_FILE", node.get_file(user, remote, Path::new(local)).await);
            }
            ("GET_FILE", _) => {
                println!("Syntax error. Usage: GET_FILE <userName> <remote_fileName> <local_fileName>");
            }

            ("QUIT", []) => break,
            ("QUIT", _) => println!("Syntax error. Use: QUIT"),

            (other, _) => println!("Error: command {} not valid.", other),
        }
    }
}

async fn run_list_users(node: &Node) {
    match node.list_users().await {
        Ok(mut users) => {
            println!("LIST_USERS OK");
            while let Some(entry) = users.next().await {
                match entry {
                    Ok(user) => println!("{} {} {}", user.name, user.ip, user.port),
                    Err(e) => {
                        error!("user listing aborted: {}", e);
                        println!("LIST_USERS FAIL");
                        return;
                    }
                }
            }
        }
        Err(e) => println!("{}", failure_line("LIST_USERS", &e)),
    }
}

async fn run_list_content(node: &Node, target: &str) {
    match node.list_content(target).await {
        Ok(mut content) => {
            println!("LIST_CONTENT OK");
            while let Some(entry) = content.next().await {
                match entry {
                    Ok(name) => println!("{}", name),
                    Err(e) => {
                        error!("content listing aborted: {}", e);
                        println!("LIST_CONTENT FAIL");
                        return;
                    }
                }
            }
        }
        Err(e) => println!("{}", failure_line("LIST_CONTENT", &e)),
    }
}

fn report(op: &str, result: Result<()>) {
    match result {
        Ok(()) => println!("{} OK", op),
        Err(e) => println!("{}", failure_line(op, &e)),
    }
}

fn failure_line(op: &str, err: &DirshareError) -> String {
    match err {
        // Two rejections print bare, without the "<OP> FAIL, " prefix.
        DirshareError::Rejected(Rejection::NameTaken) => "USERNAME IN USE".to_string(),
        DirshareError::Rejected(Rejection::AlreadyConnected) => {
            "USER ALREADY CONNECTED".to_string()
        }
        DirshareError::Rejected(Rejection::UnknownUser) if op == "UNREGISTER" => {
            "USER DOES NOT EXIST".to_string()
        }
        DirshareError::Rejected(rejection) => {
            format!("{} FAIL, {}", op, rejection_text(*rejection))
        }
        DirshareError::Precondition(msg) => format!("{} FAIL, {}", op, msg),
        _ => {
            error!("{} failed: {}", op, err);
            format!("{} FAIL", op)
        }
    }
}

fn rejection_text(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::NameTaken => "USERNAME IN USE",
        Rejection::UnknownUser => "USER DOES NOT EXIST",
        Rejection::AlreadyConnected => "USER ALREADY CONNECTED",
        Rejection::NotConnected => "USER NOT CONNECTED",
        Rejection::AlreadyPublished => "CONTENT ALREADY PUBLISHED",
        Rejection::NotPublished => "CONTENT NOT PUBLISHED",
        Rejection::UnknownTarget => "REMOTE USER DOES NOT EXIST",
        Rejection::NoPublishedFiles => "USER HAS NO FILES",
        Rejection::FileNotPublished => "FILE NOT PUBLISHED",
        Rejection::PeerOffline => "USER NOT CONNECTED",
        Rejection::RemoteFileMissing => "FILE NOT EXIST",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_lines_match_the_client_shell() {
        let rejected = |r| DirshareError::Rejected(r);

        assert_eq!(
            failure_line("REGISTER", &rejected(Rejection::NameTaken)),
            "USERNAME IN USE"
        );
        assert_eq!(
            failure_line("UNREGISTER", &rejected(Rejection::UnknownUser)),
            "USER DOES NOT EXIST"
        );
        assert_eq!(
            failure_line("CONNECT", &rejected(Rejection::UnknownUser)),
            "CONNECT FAIL, USER DOES NOT EXIST"
        );
        assert_eq!(
            failure_line("CONNECT", &rejected(Rejection::AlreadyConnected)),
            "USER ALREADY CONNECTED"
        );
        assert_eq!(
            failure_line("DISCONNECT", &rejected(Rejection::NotConnected)),
            "DISCONNECT FAIL, USER NOT CONNECTED"
        );
        assert_eq!(
            failure_line("PUBLISH", &rejected(Rejection::AlreadyPublished)),
            "PUBLISH FAIL, CONTENT ALREADY PUBLISHED"
        );
        assert_eq!(
            failure_line("DELETE", &rejected(Rejection::NotPublished)),
            "DELETE FAIL, CONTENT NOT PUBLISHED"
        );
        assert_eq!(
            failure_line("LIST_CONTENT", &rejected(Rejection::UnknownTarget)),
            "LIST_CONTENT FAIL, REMOTE USER DOES NOT EXIST"
        );
        assert_eq!(
            failure_line("LIST_CONTENT", &rejected(Rejection::NoPublishedFiles)),
            "LIST_CONTENT FAIL, USER HAS NO FILES"
        );
        assert_eq!(
            failure_line("GET_FILE", &rejected(Rejection::FileNotPublished)),
            "GET_FILE FAIL, FILE NOT PUBLISHED"
        );
        assert_eq!(
            failure_line("GET_FILE", &rejected(Rejection::RemoteFileMissing)),
            "GET_FILE FAIL, FILE NOT EXIST"
        );
        assert_eq!(
            failure_line(
                "PUBLISH",
                &DirshareError::Precondition("MUST USE ABSOLUTE PATH".to_string())
            ),
            "PUBLISH FAIL, MUST USE ABSOLUTE PATH"
        );
        assert_eq!(
            failure_line("REGISTER", &DirshareError::ConnectionClosed),
            "REGISTER FAIL"
        );
    }
}
