use crate::{spawn_solver, SolveHandle};

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute, queue,
    style::{Print, Stylize},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use fifteen::{CancelToken, HeuristicKind, Move, Puzzle, Solution, SolveError};
use rand::rngs::StdRng;
use std::{
    io::{self, Write},
    time::{Duration, Instant},
};
use tracing::debug;

const ALREADY_SOLVED: &str = "Puzzle already solved";
const UNSOLVABLE: &str = "Puzzle unsolvable";
const SOLVE_FAILED: &str = "Failed to solve puzzle";
const NOT_INT_VALUE: &str = "Value must be an integer";
const HELP: &str =
    "W/A/S/D slide  arrows select  e edit  x shuffle  h heuristic  Enter solve  q quit";

enum Mode {
    Idle,
    Editing {
        input: String,
    },
    Solving {
        worker: SolveHandle,
        cancel: CancelToken,
        started: Instant,
    },
    Replay {
        solution: Solution,
        step: usize,
        elapsed: Duration,
    },
}

struct App {
    puzzle: Puzzle,
    heuristic: HeuristicKind,
    rng: StdRng,
    mode: Mode,
    cursor: usize,
    message: Option<String>,
    quit: bool,
}

impl App {
    fn new(puzzle: Puzzle, heuristic: HeuristicKind, rng: StdRng) -> Self {
        Self {
            puzzle,
            heuristic,
            rng,
            mode: Mode::Idle,
            cursor: 0,
            message: None,
            quit: false,
        }
    }

    fn event_loop(&mut self, out: &mut impl Write) -> Result<()> {
        while !self.quit {
            self.poll_solver();
            self.draw(out)?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        if let Mode::Solving { cancel, .. } = &self.mode {
            cancel.cancel();
        }
        Ok(())
    }

    fn poll_solver(&mut self) {
        let finished = matches!(&self.mode, Mode::Solving { worker, .. } if worker.is_finished());
        if !finished {
            return;
        }

        let Mode::Solving {
            worker, started, ..
        } = std::mem::replace(&mut self.mode, Mode::Idle)
        else {
            return;
        };
        let elapsed = started.elapsed();

        match worker.join() {
            Ok(Ok(solution)) => {
                self.mode = Mode::Replay {
                    solution,
                    step: 0,
                    elapsed,
                };
            }
            Ok(Err(SolveError::Cancelled)) => {}
            Ok(Err(SolveError::Unsolvable)) => self.message = Some(UNSOLVABLE.to_string()),
            Ok(Err(_)) | Err(_) => self.message = Some(SOLVE_FAILED.to_string()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }

        match &mut self.mode {
            Mode::Idle => self.idle_key(key.code),
            Mode::Editing { input } => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() && input.len() < 6 => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter => {
                    let input = std::mem::take(input);
                    self.mode = Mode::Idle;
                    self.commit_edit(&input);
                }
                KeyCode::Esc => self.mode = Mode::Idle,
                _ => {}
            },
            Mode::Solving { cancel, .. } => {
                if key.code == KeyCode::Esc {
                    debug!("solve aborted");
                    cancel.cancel();
                    self.mode = Mode::Idle;
                }
            }
            Mode::Replay { solution, step, .. } => match key.code {
                KeyCode::Char('n') | KeyCode::Right if *step + 1 < solution.states().len() => {
                    *step += 1
                }
                KeyCode::Char('p') | KeyCode::Left if *step > 0 => *step -= 1,
                KeyCode::Esc => self.mode = Mode::Idle,
                KeyCode::Char('q') => self.quit = true,
                _ => {}
            },
        }
    }

    fn idle_key(&mut self, code: KeyCode) {
        self.message = None;
        let dimension = self.puzzle.dimension();

        match code {
            KeyCode::Char('w') => {
                self.puzzle.apply_move(Move::Up);
            }
            KeyCode::Char('s') => {
                self.puzzle.apply_move(Move::Down);
            }
            KeyCode::Char('a') => {
                self.puzzle.apply_move(Move::Left);
            }
            KeyCode::Char('d') => {
                self.puzzle.apply_move(Move::Right);
            }
            KeyCode::Up if self.cursor >= dimension => self.cursor -= dimension,
            KeyCode::Down if self.cursor + dimension <= self.puzzle.size() => {
                self.cursor += dimension
            }
            KeyCode::Left if self.cursor % dimension > 0 => self.cursor -= 1,
            KeyCode::Right if self.cursor % dimension + 1 < dimension => self.cursor += 1,
            KeyCode::Char('e') => {
                self.mode = Mode::Editing {
                    input: String::new(),
                }
            }
            KeyCode::Char('x') => self.reshuffle(),
            KeyCode::Char('h') => self.heuristic = self.heuristic.next(),
            KeyCode::Enter => self.start_solve(),
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn commit_edit(&mut self, input: &str) {
        let value = if input.is_empty() {
            0
        } else {
            match input.parse::<u32>() {
                Ok(value) => value,
                Err(_) => {
                    self.message = Some(NOT_INT_VALUE.to_string());
                    return;
                }
            }
        };

        let size = self.puzzle.size();
        if value as usize > size || (value == 0 && !input.is_empty()) {
            self.message = Some(format!(
                "Value must be between 1 and {} inclusive or empty for blank tile",
                size
            ));
            return;
        }

        debug!(cell = self.cursor, value, "editing tile");
        self.puzzle.set(self.cursor, value);
    }

    fn reshuffle(&mut self) {
        // An edited board may be unsolvable; start over from a fresh one
        if self.puzzle.is_solvable() {
            self.puzzle.shuffle(&mut self.rng);
        } else if let Ok(puzzle) = Puzzle::new(self.puzzle.size(), &mut self.rng) {
            self.puzzle = puzzle;
        }
    }

    fn start_solve(&mut self) {
        if self.puzzle.is_solved() {
            self.message = Some(ALREADY_SOLVED.to_string());
            return;
        }

        let (worker, cancel) = spawn_solver(self.puzzle.clone(), self.heuristic);
        self.mode = Mode::Solving {
            worker,
            cancel,
            started: Instant::now(),
        };
    }

    fn draw(&self, out: &mut impl Write) -> Result<()> {
        queue!(out, terminal::Clear(ClearType::All), MoveTo(0, 0))?;

        let (board, status) = match &self.mode {
            Mode::Idle => (&self.puzzle, HELP.to_string()),
            Mode::Editing { input } => (
                &self.puzzle,
                format!(
                    "New value: {}_  (Enter to set, empty for blank, Esc to cancel)",
                    input
                ),
            ),
            Mode::Solving { started, .. } => (
                &self.puzzle,
                format!("Solving... {:.1?}  (Esc to abort)", started.elapsed()),
            ),
            Mode::Replay {
                solution,
                step,
                elapsed,
            } => (
                &solution.states()[*step],
                format!(
                    "Step {}/{}  solved in {:.2?}  (n/p to step, Esc to return)",
                    step,
                    solution.move_count(),
                    elapsed
                ),
            ),
        };

        queue!(
            out,
            Print(format!("{}-puzzle  heuristic: {}", board.size(), self.heuristic))
        )?;

        let width = board.size().to_string().len();
        let show_cursor = matches!(self.mode, Mode::Idle | Mode::Editing { .. });
        for row in 0..board.dimension() {
            queue!(out, MoveTo(0, row as u16 + 2))?;
            for col in 0..board.dimension() {
                let index = row * board.dimension() + col;
                let label = match board.get(index) {
                    0 => String::new(),
                    value => value.to_string(),
                };
                let cell = format!("[{:>width$}]", label, width = width);
                if show_cursor && index == self.cursor {
                    queue!(out, Print(cell.reverse()), Print(" "))?;
                } else {
                    queue!(out, Print(cell), Print(" "))?;
                }
            }
        }

        let line = board.dimension() as u16 + 3;
        queue!(out, MoveTo(0, line), Print(status))?;
        if let Some(message) = &self.message {
            queue!(out, MoveTo(0, line + 1), Print(message.as_str().bold()))?;
        }

        out.flush()?;
        Ok(())
    }
}

/// Interactive terminal front-end. Restores the terminal even when the loop fails.
pub fn run(puzzle: Puzzle, heuristic: HeuristicKind, rng: StdRng) -> Result<()> {
    let mut stdout = io::stdout();

    enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = App::new(puzzle, heuristic, rng).event_loop(&mut stdout);

    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    result
}
