use clap::Parser;
use dirs::home_dir;
use log::{debug, info};
use minibasic::{
    cli::{Args, Commands},
    error::Result,
    extensions::ResultExtensions,
    repl::{REPLPrompt, SyntaxHighlighter, BANNER},
    runtime::Interpreter,
    session::{check_source, Session},
};
use nu_ansi_term::{Color, Style};
use reedline::{DefaultHinter, FileBackedHistory, Reedline, Signal};
use std::{
    fs,
    io::{self, BufReader},
    path::PathBuf,
};

fn run_file(file: PathBuf, max_steps: usize) -> Result<()> {
    let source = fs::read_to_string(file)?;

    let interpreter = Interpreter::new(BufReader::new(io::stdin()), io::stdout())
        .with_max_steps(max_steps);
    let mut session = Session::new(interpreter);

    session.load(&source)?;
    session.run()
}

fn check_file(file: PathBuf) -> Result<()> {
    let source = fs::read_to_string(file)?;

    match check_source(&source) {
        Ok(program) => {
            for (number, line) in program.iter() {
                println!("{} {}", number, line.statement);
            }
        }
        Err(errors) => {
            for err in errors {
                eprintln!("{}", err);
            }
        }
    }

    Ok(())
}

fn run_repl(max_steps: usize) -> Result<()> {
    let mut line_editor = Reedline::create()
        .with_hinter(Box::new(
            DefaultHinter::default().with_style(Style::new().italic().fg(Color::LightGray)),
        ))
        .with_highlighter(Box::new(SyntaxHighlighter));

    // Add file-backed history if possible
    if let Some(history) = home_dir()
        .map(|home| home.join(".minibasic_history"))
        .and_then(|path| FileBackedHistory::with_file(100, path).ok())
        .map(Box::new)
    {
        line_editor = line_editor.with_history(history);
    } else {
        eprintln!("NOTE: Failed to load history. Persistence is now disabled.")
    }

    let prompt = REPLPrompt;
    let interpreter = Interpreter::new(BufReader::new(io::stdin()), io::stdout())
        .with_max_steps(max_steps);
    let mut session = Session::new(interpreter);

    println!("{}", BANNER);

    loop {
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                session.enter(&buffer).report();
            }
            Signal::CtrlD | Signal::CtrlC => {
                break Ok(());
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    debug!("max steps: {}", args.max_steps);

    match args.command {
        Commands::Run { file } => {
            info!("FILE MODE");
            debug!("file: {:?}", file);

            run_file(file, args.max_steps).report();
        }
        Commands::Check { file } => {
            info!("CHECK MODE");
            debug!("file: {:?}", file);

            check_file(file).report();
        }
        Commands::Repl => {
            info!("REPL MODE");

            run_repl(args.max_steps).report();
        }
    }
    Ok(())
}
