use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{self as ct, terminal};

use four_lib::vm::EofBehavior;
use four_lib::{loader, CAT_PROGRAM};

use std::fs::{self, File};
use std::io::{self, stdout, BufReader, Read, Write};
use std::path::PathBuf;

mod debugger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The program source, like "3.6000180071051094". Whitespace is ignored.
    /// Without a program or a file, the cat program is run
    #[arg(conflicts_with = "file")]
    program: Option<String>,

    /// read the program source from a file
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// read the program's input from a file instead of stdin
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// what an input instruction does once the input is exhausted
    #[arg(long, value_enum, default_value_t = EofArg::Halt)]
    eof: EofArg,

    /// print the decoded instructions and loop table instead of running
    #[arg(short = 's', long)]
    show_program: bool,

    /// print the program in its canonical form instead of running
    #[arg(short = 'e', long)]
    encode: bool,

    /// step through the program in the debugger. The debugger reads its commands from the
    /// terminal, so program input should come from --input
    #[arg(short = 'd', long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum EofArg {
    /// end the run successfully
    Halt,
    /// store -1 in the cell and continue
    Sentinel,
    /// abort the run with an error
    Error,
}

impl From<EofArg> for EofBehavior {
    fn from(value: EofArg) -> Self {
        match value {
            EofArg::Halt => EofBehavior::Halt,
            EofArg::Sentinel => EofBehavior::Sentinel,
            EofArg::Error => EofBehavior::Error,
        }
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let src = match (&cli.program, &cli.file) {
        (Some(src), _) => src.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("reading program {}", path.display()))?,
        (None, None) => CAT_PROGRAM.into(),
    };

    let program = match loader::load(&src) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", four_lib::Error::from(e));
            std::process::exit(1);
        }
    };

    if cli.show_program {
        print!("{}", program);
        return Ok(());
    }
    if cli.encode {
        println!("{}", program.to_source());
        return Ok(());
    }

    let input: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening input {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    if cli.debug {
        let mut stdout = stdout();
        let mut output = vec![];
        ct::execute!(stdout, terminal::EnterAlternateScreen)?;
        let res = debugger::run(&program, input, cli.eof.into(), &mut output, &mut stdout);
        ct::execute!(stdout, terminal::LeaveAlternateScreen)?;
        stdout.write_all(&output)?;
        stdout.flush()?;
        res
    } else {
        let res = match four_lib::execute(&program, input, stdout().lock(), cli.eof.into()) {
            Ok(reason) => {
                log::info!("finished: {:?}", reason);
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        };
        std::process::exit(res);
    }
}
