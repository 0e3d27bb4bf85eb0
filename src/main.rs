use std::fs;
use std::io;
use std::process;

use ansi_rgb::{green, Foreground};
use clap::{arg, command};
use log::info;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use loxwalk::{Lox, RunStatus};

fn main() {
    env_logger::init();
    let matches = command!()
        .arg(arg!([script] "Script file to run; omit for a REPL"))
        .arg(arg!(--ast "Print the parsed syntax tree before running"))
        .get_matches();
    let show_ast = matches.get_flag("ast");
    if let Some(filename) = matches.get_one::<String>("script") {
        run_file(filename, show_ast);
    } else {
        run_prompt(show_ast);
    }
}

fn run_file(filename: &str, show_ast: bool) {
    info!("running {}", filename);
    let source = match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Could not read {}: {}", filename, error);
            process::exit(1);
        }
    };
    let mut stdout = io::stdout();
    let mut lox = Lox::new(&mut stdout);
    lox.show_ast = show_ast;
    match lox.run(&source, false) {
        RunStatus::Ok => {}
        RunStatus::StaticError => process::exit(65),
        RunStatus::RuntimeError => process::exit(70),
    }
}

fn run_prompt(show_ast: bool) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(error) => {
            eprintln!("Could not start the REPL: {}", error);
            process::exit(1);
        }
    };
    let history_path = "history.txt";
    if rl.load_history(history_path).is_err() {
        println!("No previous history.");
    }
    let mut stdout = io::stdout();
    let mut lox = Lox::new(&mut stdout);
    lox.show_ast = show_ast;
    let prompt = ">> ".fg(green()).to_string();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                // Errors are reported and the prompt comes back.
                lox.run(&line, true);
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(error) => {
                println!("Error: {:?}", error);
                break;
            }
        }
    }
    if let Err(error) = rl.save_history(history_path) {
        eprintln!("Could not save history: {}", error);
    }
}
