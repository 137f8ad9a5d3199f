use std::io::{self, Write};
use std::process::Command;

use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

pub trait Surface {
    fn suspend(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;

    fn acknowledge(&mut self) -> Result<()> {
        io::stdin().read_line(&mut String::new())?;
        Ok(())
    }
}

impl<W: Write> Surface for Terminal<CrosstermBackend<W>> {
    fn suspend(&mut self) -> Result<()> {
        self.show_cursor()?;
        disable_raw_mode()?;
        execute!(self.backend_mut(), LeaveAlternateScreen)?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.backend_mut(), EnterAlternateScreen)?;
        self.hide_cursor()?;
        self.clear()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Suspended,
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped,
    Exited(Option<i32>),
    Failed,
}

pub struct CommandRunner {
    state: RunnerState,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    pub fn new() -> Self {
        CommandRunner {
            state: RunnerState::Idle,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Runs `cmd` through `sh -c`. The surface is always resumed, and
    /// failures are only logged; they never reach the menu.
    pub fn execute<S: Surface>(&mut self, surface: &mut S, cmd: &str, pause: bool) -> RunOutcome {
        if cmd.trim().is_empty() {
            return RunOutcome::Skipped;
        }

        self.state = RunnerState::Suspended;
        let outcome = match surface.suspend() {
            Ok(()) => self.run(surface, cmd, pause),
            Err(err) => {
                log::warn!("could not suspend the display for '{cmd}': {err:#}");
                RunOutcome::Failed
            }
        };
        if let Err(err) = surface.resume() {
            log::warn!("could not resume the display: {err:#}");
        }
        self.state = RunnerState::Idle;

        match outcome {
            RunOutcome::Exited(code) => log::info!("'{cmd}' exited with {code:?}"),
            RunOutcome::Failed => log::warn!("'{cmd}' failed to run"),
            RunOutcome::Skipped => {}
        }
        outcome
    }

    fn run<S: Surface>(&mut self, surface: &mut S, cmd: &str, pause: bool) -> RunOutcome {
        let mut stdout = io::stdout();
        let _ = clear_screen(&mut stdout);
        println!("Menu Maker: Executing '{cmd}'");
        println!("{}", "=".repeat(60));
        println!();

        self.state = RunnerState::Running;
        let outcome = match Command::new("sh").arg("-c").arg(cmd).status() {
            Ok(status) => RunOutcome::Exited(status.code()),
            Err(err) => {
                log::warn!("failed to start '{cmd}': {err}");
                RunOutcome::Failed
            }
        };

        if pause {
            self.state = RunnerState::Paused;
            println!();
            println!("{}", "=".repeat(60));
            match outcome {
                RunOutcome::Exited(Some(code)) => {
                    println!("Command completed with exit code: {code}")
                }
                RunOutcome::Exited(None) => println!("Command was terminated by a signal"),
                _ => println!("Command could not be started"),
            }
            println!("Press Enter to return to Menu Maker...");
            let _ = stdout.flush();
            if let Err(err) = surface.acknowledge() {
                log::warn!("acknowledgment failed: {err:#}");
            }
        }
        let _ = clear_screen(&mut stdout);
        outcome
    }
}

fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}
