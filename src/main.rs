use std::{error::Error, io::Write};

use lajur::{Database, DatabaseConfig, QueryOutput};
use rustyline::{DefaultEditor, Result, error::ReadlineError};
use tracing::error;

const HISTORY_FILE: &str = ".lajur_history";

fn read_multiline_command(rl: &mut DefaultEditor) -> Result<String> {
    let mut input = String::new();
    let mut prompt = "lajur> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // Trailing backslash continues the statement on the next line
        if let Some(continued) = trimmed_line.strip_suffix('\\') {
            input.push_str(continued);
            input.push(' ');
            prompt = "    -> ".to_string();
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

fn print_help() {
    println!(
        r#"
Statements:
  CREATE TABLE <name> (<col> INT | <col> VARCHAR(<n>), ...)
  INSERT INTO <name> VALUES (<value>, ...)
  SELECT * | <col>, ... FROM <name> [WHERE <col> = <value>]
  DELETE FROM <name> [WHERE <col> = <value>]

Commands:
  help, h          - Show this help message
  .tables          - List tables
  .schema <name>   - Show a table's definition
  clear            - Clear the screen
  exit, quit, q    - Exit

Use '\' at the end of a line for multiline input.
"#
    );
}

/// `Some(table)` for `.schema <table>`, `Some(None)` when the name is missing,
/// `None` when the line is not a `.schema` command at all
fn schema_command(cmd: &str) -> Option<Option<&str>> {
    let mut words = cmd.split_whitespace();
    if words.next() != Some(".schema") {
        return None;
    }
    match (words.next(), words.next()) {
        (Some(table_name), None) => Some(Some(table_name)),
        _ => Some(None),
    }
}

/// Handle one line of input, returning false when the shell should exit
fn process_command(db: &Database, command: &str) -> bool {
    let cmd = command.trim();

    match cmd {
        "exit" | "quit" | "q" => {
            println!("Goodbye!");
            return false;
        }
        "help" | "h" => print_help(),
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        ".tables" => {
            for name in db.table_names() {
                println!("{}", name);
            }
        }
        "" => {}
        _ => {
            if let Some(target) = schema_command(cmd) {
                match target {
                    Some(table_name) => match db.schema(table_name) {
                        Ok(schema) => println!("{}", schema.to_sql()),
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Usage: .schema <name>"),
                }
                return true;
            }

            match db.execute(cmd) {
                Ok(QueryOutput::Done) => println!("OK"),
                Ok(QueryOutput::Rows(rows)) => {
                    for row in &rows {
                        let fields: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
                        println!("({})", fields.join(", "));
                    }
                    println!("{} row(s)", rows.len());
                }
                Err(e) => println!("Error: {}", e),
            }
        }
    }

    true
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lajur=info")),
        )
        .with_target(true)
        .init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let sync_writes = std::env::var("LAJUR_SYNC").is_ok_and(|v| v == "1");
    let config = DatabaseConfig::new(dir).with_sync_writes(sync_writes);
    let history_path = config.dir.join(HISTORY_FILE);
    let db = Database::open(config)?;

    println!("lajur - type 'help' for usage");

    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if !command.is_empty() {
                    rl.add_history_entry(&command)?;
                    if !process_command(&db, &command) {
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                error!(error = %err, "readline failed");
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        error!(error = %e, "failed to save history");
    }
    Ok(())
}
