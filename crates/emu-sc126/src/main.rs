//! SC126/SC131 emulator binary.
//!
//! Runs the board against the host terminal as a dumb byte console, or
//! headless for scripted batch runs, or as a JSON-RPC control server.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use emu_sc126::{McpServer, Sc126, Sc126Config, Sc126Model, STEPS_PER_BURST};

/// Driver tick rate: one burst per tick.
const TICK: Duration = Duration::from_millis(10);

/// How often RAM is persisted while running.
const SNAPSHOT_PERIOD: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    model: String,
    rom_path: Option<PathBuf>,
    ram_path: Option<PathBuf>,
    mcp: bool,
    headless: bool,
    bursts: u64,
    type_text: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        model: "sc126".to_string(),
        rom_path: None,
        ram_path: None,
        mcp: false,
        headless: false,
        bursts: 500,
        type_text: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--model" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.model = s.to_lowercase();
                }
            }
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--ram" => {
                i += 1;
                cli.ram_path = args.get(i).map(PathBuf::from);
            }
            "--mcp" => {
                cli.mcp = true;
            }
            "--headless" => {
                cli.headless = true;
            }
            "--bursts" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.bursts = s.parse().unwrap_or(500);
                }
            }
            "--type" => {
                i += 1;
                cli.type_text = args.get(i).cloned();
            }
            "--help" | "-h" => {
                eprintln!("Usage: emu-sc126 [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --model <model>   Board model: sc126, sc131 [default: sc126]");
                eprintln!("  --rom <file>      RomWBW ROM image (required except with --mcp)");
                eprintln!("  --ram <file>      RAM snapshot file to load and persist");
                eprintln!("  --mcp             Run as JSON-RPC server over stdio");
                eprintln!("  --headless        Run without a terminal, dump console to stdout");
                eprintln!("  --bursts <n>      Bursts to run in headless mode [default: 500]");
                eprintln!("  --type <text>     Paste text into the console (use \\n for Enter)");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn make_board(cli: &CliArgs) -> Sc126 {
    let Some(ref rom_path) = cli.rom_path else {
        eprintln!("A ROM image is required: --rom <file>");
        process::exit(1);
    };
    let rom = match std::fs::read(rom_path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Failed to read ROM file {}: {err}", rom_path.display());
            process::exit(1);
        }
    };

    let model = match cli.model.as_str() {
        "sc126" => Sc126Model::Sc126,
        "sc131" => Sc126Model::Sc131,
        other => {
            eprintln!("Unknown model: {other}. Use sc126 or sc131.");
            process::exit(1);
        }
    };

    let mut config = Sc126Config::new(rom);
    config.model = model;
    config.snapshot_path = cli.ram_path.clone();
    let mut board = Sc126::new(&config);

    if let Some(ref text) = cli.type_text {
        board.paste(&text.replace("\\n", "\n"));
    }

    board
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

fn run_headless(cli: &CliArgs) {
    let mut board = make_board(cli);

    for _ in 0..cli.bursts {
        board.run_burst(STEPS_PER_BURST);
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let _ = stdout.write_all(&board.take_transcript());
    let _ = stdout.flush();

    board.persist_ram();
}

// ---------------------------------------------------------------------------
// Terminal mode
// ---------------------------------------------------------------------------

fn run_terminal(cli: &CliArgs) {
    let mut board = make_board(cli);
    eprintln!("SC126 emulator running (board {}). Ctrl-C to quit.", board.id());

    // Host keystrokes arrive on their own thread; the driver loop owns
    // the board and everything else.
    let (tx, rx) = mpsc::channel::<u8>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for byte in stdin.lock().bytes() {
            let Ok(byte) = byte else { break };
            if tx.send(byte).is_err() {
                break;
            }
        }
    });

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut last_snapshot = Instant::now();

    loop {
        let tick_start = Instant::now();

        // Drain pending keystrokes; a disconnected channel means stdin
        // closed, which is the shutdown signal.
        let mut stdin_closed = false;
        loop {
            match rx.try_recv() {
                Ok(byte) => board.send_byte(byte),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    stdin_closed = true;
                    break;
                }
            }
        }
        if stdin_closed && board.pending_input() == 0 {
            break;
        }

        let out = board.run_burst(STEPS_PER_BURST);
        if !out.is_empty() {
            let _ = stdout.write_all(&out);
            let _ = stdout.flush();
        }

        if last_snapshot.elapsed() >= SNAPSHOT_PERIOD {
            board.persist_ram();
            last_snapshot = Instant::now();
        }

        if let Some(remaining) = TICK.checked_sub(tick_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    // Shutdown: force a final snapshot.
    board.persist_ram();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = parse_args();

    if cli.mcp {
        let mut server = McpServer::new();
        server.run();
        return;
    }

    if cli.headless {
        run_headless(&cli);
        return;
    }

    run_terminal(&cli);
}
