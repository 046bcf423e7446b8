//! The `rill repl` command.

use rill_session::Session;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub fn run() -> Result<(), String> {
    println!("Rill REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;

    // One session for the whole REPL run: each line is a submission
    let session = Session::initialize();

    loop {
        let readline = rl.readline("rill> ");
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Handle REPL commands
                if line.starts_with(':') {
                    match line {
                        ":quit" | ":q" => break,
                        ":help" | ":h" => {
                            println!("Commands:");
                            println!("  :help, :h    Show this help");
                            println!("  :quit, :q    Exit the REPL");
                            println!();
                            println!("Anything else is evaluated as a Rill expression.");
                            continue;
                        }
                        _ => {
                            println!("Unknown command: {line}");
                            continue;
                        }
                    }
                }

                // Errors come back as `error: ...` lines already
                println!("{}", session.submit(line));
            }
            Err(ReadlineError::Interrupted) => {
                println!("(interrupted, :quit to exit)");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.to_string()),
        }
    }

    Ok(())
}
