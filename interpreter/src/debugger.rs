use std::io::{Read, Stdout, Write};

use anyhow::{anyhow, bail, Result};
use crossterm::{self as ct, terminal};
use four_lib::core::{LoopTable, Program, Tape};
use four_lib::vm::{self, EofBehavior, ExecOutcome};
use rustyline::{error::ReadlineError, DefaultEditor};

#[derive(PartialEq, Clone)]
enum UserCommand {
    Next,
    Continue,
    LastCommand,
    ShowTape,
    ShowTapeAt(usize),
    ShowLoops,
    Quit,
}

/// Runs the program one instruction per command. What the program writes is collected
/// in output, so it can be shown in its own pane and printed once the session is over
pub fn run(
    program: &Program,
    input: impl Read,
    on_eof: EofBehavior,
    output: &mut Vec<u8>,
    stdout: &mut Stdout,
) -> Result<()> {
    let mut executor = vm::Executor::new(program, input, output).with_eof_behavior(on_eof);
    let mut rl = DefaultEditor::new()?;
    let mut last_cmd = None;

    use UserCommand::*;
    loop {
        render_state(stdout, &executor)?;
        stdout.flush()?;
        let mut cmd = read_line(&mut rl)?;
        if cmd == UserCommand::LastCommand && last_cmd.is_some() {
            cmd = last_cmd.clone().unwrap_or(LastCommand);
        }
        match &cmd {
            LastCommand => {
                // This is only reached, if there was no last command, in which case it's
                // a noop
            }
            Next => match executor.step() {
                Ok(ExecOutcome::Continue) => {}
                Ok(ExecOutcome::Halt(reason)) => {
                    log::info!("finished: {:?}", reason);
                    return Ok(());
                }
                Err(e) => bail!("runtime error: {}", e),
            },
            Continue => match executor.run() {
                Ok(reason) => {
                    log::info!("finished: {:?}", reason);
                    return Ok(());
                }
                Err(e) => bail!("runtime error: {}", e),
            },
            ShowTape => {
                for (i, value) in executor.tape().non_zero() {
                    println!("{}: {}", i, value);
                }
            }
            ShowTapeAt(i) => {
                if *i < executor.tape().len() {
                    println!("{}", executor.tape()[*i]);
                } else {
                    println!("Invalid cell index");
                }
            }
            ShowLoops => {
                for (start, end) in program.loops().pairs() {
                    println!("{} <-> {}", start, end);
                }
            }
            Quit => return Ok(()),
        }
        last_cmd = Some(cmd);
    }
}

fn read_line(rl: &mut DefaultEditor) -> Result<UserCommand> {
    loop {
        let line = rl.readline("> ");
        use ReadlineError::*;
        match line {
            Ok(line) => match parse_line(&line) {
                Ok(cmd) => return Ok(cmd),
                Err(e) => eprintln!("Error: {}", e),
            },
            Err(Interrupted | Eof) => return Ok(UserCommand::Quit),
            Err(other) => return Err(other.into()),
        }
    }
}

fn parse_line(line: &str) -> Result<UserCommand> {
    use UserCommand::*;
    let line = line.trim();
    let elems: Vec<_> = line.split_whitespace().collect();

    if let Some(first) = elems.first() {
        match *first {
            "n" | "next" => Ok(Next),
            "c" | "continue" => Ok(Continue),
            "s" | "show" => parse_show(&elems[1..]),
            "q" | "quit" => Ok(Quit),
            _ => Err(anyhow!("Invalid Command")),
        }
    } else {
        Ok(LastCommand)
    }
}

fn parse_show(elems: &[&str]) -> Result<UserCommand> {
    match elems {
        [] => Err(anyhow!("show needs an argument")),
        ["t" | "tape"] => Ok(UserCommand::ShowTape),
        ["l" | "loops"] => Ok(UserCommand::ShowLoops),
        ["t" | "tape", "at", idx] => Ok(UserCommand::ShowTapeAt(idx.parse()?)),
        [_] => Err(anyhow!("Invalid word after show")),
        _ => bail!("Invalid Command"),
    }
}

struct Rect {
    w: u16,
    h: u16,
    x: u16,
    y: u16,
}

struct Rects {
    instructions: Rect,
    tape: Rect,
    loops: Rect,
    output: Rect,
}

impl Rect {
    pub fn render(
        &self,
        stdout: &mut Stdout,
        lines: impl IntoIterator<Item = String>,
    ) -> Result<()> {
        let wu = self.w as usize;
        let mut lines = lines.into_iter();
        for i in 0..self.h {
            let line: String = lines.next().unwrap_or_default().chars().take(wu).collect();
            ct::queue!(stdout, ct::cursor::MoveTo(self.x, self.y + i))?;
            write!(stdout, "{:<width$}", line, width = wu)?;
        }
        Ok(())
    }
}

fn render_state<R: Read, W: Write>(
    stdout: &mut Stdout,
    executor: &vm::Executor<R, W>,
) -> Result<()>
where
    W: AsRef<[u8]>,
{
    let curr_cursor = ct::cursor::position()?;
    let term_size = terminal::size()?;
    let rects = compute_rects(term_size);
    render_instructions(stdout, &rects.instructions, executor.program(), executor.next_index())?;
    render_tape(stdout, &rects.tape, executor.tape())?;
    render_loops(stdout, &rects.loops, executor.program().loops())?;
    render_output(stdout, &rects.output, executor.output().as_ref())?;
    ct::queue!(stdout, ct::cursor::MoveTo(curr_cursor.0, curr_cursor.1))?;
    Ok(())
}

fn render_instructions(
    stdout: &mut Stdout,
    rect: &Rect,
    program: &Program,
    next_idx: usize,
) -> Result<()> {
    let lines = std::iter::once("Next instructions:".into()).chain(
        program
            .instructions()
            .iter()
            .enumerate()
            .skip(next_idx)
            .map(|(i, inst)| format!("{}: {}", i, inst)),
    );
    rect.render(stdout, lines)
}

fn render_tape(stdout: &mut Stdout, rect: &Rect, tape: &Tape) -> Result<()> {
    let lines = std::iter::once("Tape:".into())
        .chain(tape.non_zero().map(|(i, v)| format!("[{}] = {}", i, v)));
    rect.render(stdout, lines)
}

fn render_loops(stdout: &mut Stdout, rect: &Rect, loops: &LoopTable) -> Result<()> {
    let lines = std::iter::once("Loops:".into())
        .chain(loops.pairs().map(|(s, e)| format!("{} <-> {}", s, e)));
    rect.render(stdout, lines)
}

fn render_output(stdout: &mut Stdout, rect: &Rect, output: &[u8]) -> Result<()> {
    let text = String::from_utf8_lossy(output);
    let lines: Vec<String> = text.lines().map(String::from).collect();
    // keep the most recent lines in view
    let skip = lines.len().saturating_sub((rect.h as usize).saturating_sub(1));
    rect.render(
        stdout,
        std::iter::once("Output:".into()).chain(lines.into_iter().skip(skip)),
    )
}

fn compute_rects((term_w, term_h): (u16, u16)) -> Rects {
    let width12 = term_w / 2;
    let width14 = term_w / 4;
    let width34 = term_w * 3 / 4;
    let height45 = term_h * 4 / 5;
    let height12 = term_h / 2;

    Rects {
        instructions: Rect {
            x: 0,
            y: 0,
            w: width12,
            h: height45,
        },
        output: Rect {
            x: width12,
            y: 0,
            w: width14,
            h: height45,
        },
        tape: Rect {
            x: width34,
            y: 0,
            w: width14,
            h: height12,
        },
        loops: Rect {
            x: width34,
            y: height12,
            w: width14,
            h: height45 - height12,
        },
    }
}
