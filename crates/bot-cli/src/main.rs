use std::env;
use std::fs;
use std::net::SocketAddr;

use bot_api::{milestone_text, serve};
use bot_core::PointsEngine;
use contracts::{ActivityEvent, BotConfig};

fn print_usage() {
    println!("bot-cli <command>");
    println!("commands:");
    println!("  serve [addr] [config.json]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  tiers [config.json]");
    println!("  simulate <user_id> <messages> [config.json]");
    println!("    feeds synthetic activity events and prints the resulting account");
}

fn parse_u64(value: Option<&String>, label: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn default_config_path() -> Option<String> {
    env::var("ROLEBANK_CONFIG")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn load_config(path_arg: Option<&String>) -> Result<BotConfig, String> {
    let Some(path) = path_arg.cloned().or_else(default_config_path) else {
        return Ok(BotConfig::default());
    };

    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("failed to read config {path}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("failed to parse config {path}: {err}"))
}

fn print_tiers(config: &BotConfig) {
    println!("tiers for {}:", config.bot_id);
    for tier in &config.tiers {
        println!("  {}: {} points", tier.role_name, tier.point_threshold);
    }
}

fn run_simulation(args: &[String]) -> Result<(), String> {
    let user_id = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing user_id".to_string())?;
    let messages = parse_u64(args.get(3), "messages")?;
    let config = load_config(args.get(4))?;

    let mut engine = PointsEngine::from_config(config)
        .map_err(|err| format!("invalid tier configuration: {err}"))?;

    for offset in 0..messages {
        let event = ActivityEvent::new(user_id.as_str(), "chan_simulated", offset);
        let accrual = engine.record_activity(&event);
        for notice in &accrual.milestones {
            println!("milestone: {}", milestone_text(notice));
        }
    }

    let snapshot = engine.snapshot();
    for account in &snapshot.accounts {
        println!("{account}");
    }
    println!("events recorded: {}", engine.events().len());
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                let config = match load_config(args.get(3)) {
                    Ok(config) => config,
                    Err(err) => {
                        eprintln!("error: {err}");
                        std::process::exit(2);
                    }
                };

                init_tracing();
                println!("serving points api on http://{addr}");
                if let Err(err) = serve(addr, config).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                print_usage();
                std::process::exit(2);
            }
        },
        Some("tiers") => match load_config(args.get(2)) {
            Ok(config) => print_tiers(&config),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        },
        Some("simulate") => {
            if let Err(err) = run_simulation(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
