use telscript::config::SessionConfig;
use telscript::errors::TelnetResult;
use telscript::script::Script;
use telscript::session::TelnetSession;

use crossterm::{
    QueueableCommand,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use std::env;
use std::fs;
use std::io::{Write, stdout};
use std::process;

fn main() -> TelnetResult<()> {
    let args: Vec<String> = env::args().collect();
    let Some(script_path) = args.get(1) else {
        eprintln!("Usage: telscript <script.json> [config-file]");
        process::exit(2);
    };
    let config_path = args.get(2).map(String::as_str).unwrap_or("telscript.conf");

    // Load configuration
    let config = match SessionConfig::load_from_file(config_path) {
        Ok(config) => {
            println!("✓ Configuration loaded from {}", config_path);
            config
        }
        Err(e) => {
            eprintln!("Config error: {}. Using defaults.", e);
            SessionConfig::default()
        }
    };

    let script = match Script::load_from_file(script_path) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Script error: {}", e);
            process::exit(2);
        }
    };

    println!(
        "📡 telscript connecting to {}:{} (timeout {}s, prompt {:?})",
        config.connection.host,
        config.connection.port,
        config.connection.timeout.as_secs(),
        config.prompts.prompt,
    );
    if let Some(name) = &script.name {
        println!("📜 Running script: {}", name);
    }

    let started = jiff::Zoned::now();
    let mut session = TelnetSession::new(config);
    session.connect()?;

    let outcome = script.run(&mut session);

    match &outcome {
        Ok(reports) => {
            let mut out = stdout();
            for report in reports {
                out.queue(SetForegroundColor(Color::Green))?;
                out.queue(Print(format!("── {} ──\n", report.label)))?;
                out.queue(ResetColor)?;
                if !report.output.is_empty() {
                    out.queue(Print(format!("{}\n", report.output)))?;
                }
            }
            out.flush()?;
        }
        Err(e) => {
            let mut out = stdout();
            out.queue(SetForegroundColor(Color::Red))?;
            out.queue(Print(format!("✗ Script failed: {}\n", e)))?;
            out.queue(ResetColor)?;
            out.flush()?;
        }
    }

    // Save the transcript regardless of outcome; it is the diagnostic trail.
    let transcript_path = format!("telscript-{}.log", started.strftime("%Y%m%d-%H%M%S"));
    match fs::write(&transcript_path, session.transcript()) {
        Ok(()) => println!("💾 Transcript saved to {}", transcript_path),
        Err(e) => eprintln!("Warning: could not save transcript: {}", e),
    }

    session.disconnect()?;

    if outcome.is_err() {
        process::exit(1);
    }
    Ok(())
}
