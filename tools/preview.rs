/// Preview — interactive shell for trying actions against a character sheet.
///
/// Usage: preview [--seed <n>] [--config <file.ron>] [--catalog <file.ron>]
///
/// Commands:
///   act <text>              — run input, context and output for one turn
///   set <attr> <value>      — set an attribute (1-10 or 'disabled')
///   display on|off          — toggle the result marker
///   memory <line>           — append a line to the memory text
///   record <type> <title>   — define a record; body lines follow, end with '.'
///   sheet                   — show the current configuration
///   help                    — list commands
///   quit                    — exit

use aidchaos::core::exchange::SessionState;
use aidchaos::core::pipeline::{HostEnv, Orchestrator};
use aidchaos::core::store::{MemoryRecordStore, RecordStore};
use aidchaos::schema::attribute::{AttributeValue, RawScore};
use aidchaos::schema::history::HistoryEntry;
use aidchaos::schema::settings::ConfigurationSnapshot;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// In-memory stand-in for a scenario host.
struct Session {
    records: MemoryRecordStore,
    history: Vec<HistoryEntry>,
    memory: String,
    state: SessionState,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path = None;
    let mut catalog_path = None;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--catalog" if i + 1 < args.len() => {
                i += 1;
                catalog_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = Orchestrator::builder();
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    if let Some(ref path) = catalog_path {
        builder = builder.catalog_path(path);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let mut orchestrator = match builder.build() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Attributes: {}", orchestrator.catalog().names().join(", "));
    match seed {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: entropy"),
    }
    println!("Type 'help' for commands.\n");

    let mut session = Session {
        records: MemoryRecordStore::new(),
        history: Vec::new(),
        memory: String::new(),
        state: SessionState::new(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "act" => {
                if rest.is_empty() {
                    println!("Usage: act <text>");
                    continue;
                }
                run_turn(&mut orchestrator, &mut session, rest);
            }
            "set" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 2 {
                    println!("Usage: set <attr> <value>");
                    continue;
                }
                let Some(name) = orchestrator.catalog().canonical_name(parts[0]).map(str::to_string)
                else {
                    println!("Unknown attribute: {}", parts[0]);
                    continue;
                };
                let Some(raw) = RawScore::parse(parts[1]) else {
                    println!("Invalid value: {}", parts[1]);
                    continue;
                };
                let value = raw.finalize();
                edit_sheet(&orchestrator, &mut session, |snapshot| {
                    snapshot.attributes.insert(name.clone(), value);
                });
                println!("{} set to {}", name, value);
            }
            "display" => {
                let on = match rest {
                    "on" => true,
                    "off" => false,
                    _ => {
                        println!("Usage: display on|off");
                        continue;
                    }
                };
                edit_sheet(&orchestrator, &mut session, |snapshot| snapshot.result_display = on);
                println!("Result display {}", rest);
            }
            "memory" => {
                if rest.is_empty() {
                    println!("--- Memory ---\n{}\n--- End ---", session.memory);
                    continue;
                }
                session.memory.push_str(rest);
                session.memory.push('\n');
                println!("Memory line added.");
            }
            "record" => {
                let parts: Vec<&str> = rest.splitn(2, char::is_whitespace).collect();
                if parts.len() != 2 {
                    println!("Usage: record <type> <title>");
                    continue;
                }
                println!("Enter body lines, finish with a single '.'");
                let body = read_body(&stdin);
                session.records.insert(parts[0], parts[1].trim(), &body);
                println!("Record '{}' ({}) stored.", parts[1].trim(), parts[0]);
            }
            "sheet" => {
                let snapshot = orchestrator
                    .sheet_resolver()
                    .load(&mut session.records, &session.memory);
                print_sheet(&orchestrator, &snapshot);
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn run_turn(orchestrator: &mut Orchestrator, session: &mut Session, action: &str) {
    let input = orchestrator.input(&format!("> {}", action));
    session.history.push(HistoryEntry::new(&input, "do"));

    let mut env = HostEnv {
        records: &mut session.records,
        history: &session.history,
        memory: &session.memory,
        state: &mut session.state,
    };
    let outcome = orchestrator.on_context("The story so far.", false, &mut env);
    match outcome.bypass {
        Some(reason) => println!("(context bypassed: {:?})", reason),
        None => {
            println!("\n--- Context ---");
            println!("{}", outcome.text);
            println!("--- End ---\n");
        }
    }

    let output = orchestrator.output("The narrator continues.", &mut env);
    println!("--- Output ---");
    println!("{}", output);
    println!("--- End ---\n");
}

fn edit_sheet(orchestrator: &Orchestrator, session: &mut Session, edit: impl FnOnce(&mut ConfigurationSnapshot)) {
    let resolver = orchestrator.sheet_resolver();
    let mut snapshot = resolver.load(&mut session.records, &session.memory);
    edit(&mut snapshot);
    let config = orchestrator.config();
    let names = orchestrator.catalog().names();
    if let Err(e) = session.records.upsert(
        &config.settings_title,
        &snapshot.render(&names),
        &config.settings_type,
    ) {
        println!("ERROR: {}", e);
    }
    session.state.config = None;
}

fn read_body(stdin: &io::Stdin) -> String {
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim() == "." {
            break;
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn print_sheet(orchestrator: &Orchestrator, snapshot: &ConfigurationSnapshot) {
    println!("\n--- Configuration ---");
    println!("  enabled:               {}", snapshot.enabled);
    println!("  result display:        {}", snapshot.result_display);
    println!("  inheritance processed: {}", snapshot.inheritance_resolved);
    for name in orchestrator.catalog().names() {
        let value = snapshot
            .value(name)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let odds = match snapshot.value(name) {
            Some(AttributeValue::Score(s)) => format!("success on 1-{}", 20 + 5 * s as u32),
            _ => "automatic critical failure".to_string(),
        };
        println!("  {:<14} {:>8}   ({})", name, value, odds);
    }
    println!("--- End ---\n");
}

fn print_usage() {
    println!("Usage: preview [--seed <n>] [--config <file.ron>] [--catalog <file.ron>]");
    println!();
    println!("Interactive shell for trying player actions against a character sheet.");
    println!("Set RUST_LOG=aidchaos=debug to trace detection and rolls.");
}

fn print_help() {
    println!("Commands:");
    println!("  act <text>              Run input, context and output for one turn");
    println!("  set <attr> <value>      Set an attribute (1-10 or 'disabled')");
    println!("  display on|off          Toggle the result marker");
    println!("  memory [line]           Append a memory line, or show the memory");
    println!("  record <type> <title>   Define a record; body lines follow, end with '.'");
    println!("  sheet                   Show the current configuration");
    println!("  help                    Show this help");
    println!("  quit                    Exit");
}
