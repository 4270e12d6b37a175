use std::io::{self, BufRead, Write};
use std::path::Path;

use minidb::{Session, storage};

const DATA_PATH: &str = "data.txt";

fn main() -> io::Result<()> {
    let mut session = if Path::new(DATA_PATH).exists() {
        match storage::load_from_path(DATA_PATH) {
            Ok(catalog) => Session::with_catalog(catalog),
            Err(err) => {
                eprintln!("could not restore {}: {}", DATA_PATH, err);
                Session::new()
            }
        }
    } else {
        Session::new()
    };
    session.set_save_path(DATA_PATH);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            continue;
        }

        match session.execute(&tokens) {
            Ok(Some(set)) => {
                println!("{}", set.columns.join(" | "));
                for row in &set.rows {
                    println!("{}", row.join(" | "));
                }
            }
            Ok(None) => println!("ok"),
            Err(err) => println!("error: {}", err),
        }
    }

    Ok(())
}
