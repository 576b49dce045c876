use std::{thread::sleep, time::Duration};

use anyhow::{bail, Context, Result};
use log::info;

use crate::{Coords, TermInt};
use crate::term::{is_ctrl_c, TermManager};
use gridsnake::GridInt;
use gridsnake::engine::{Cell, Engine, MoveResult};
use gridsnake::snake::{Direction::{*, self}, Position};

use crossterm::event::{KeyCode, KeyEvent};

const POLL_INTERVAL_MS: u64 = 10;
const COUNTDOWN_STEP_MS: u64 = 500;
const DEAD_SEGMENT_DELAY_MS: u64 = 50;
const GAME_OVER_DELAY_MS: u64 = 1000;

const CELL_WIDTH: TermInt = 2;
const SNAKE_BODY_GLYPH: [char; 2] = ['█', '█'];
const FOOD_GLYPH: [char; 2] = ['(', ')'];
const DEAD_SNAKE_GLYPH: [char; 2] = ['X', 'X'];
const EMPTY_GLYPH: [char; 2] = [' ', ' '];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: GridInt,
    pub cols: GridInt,
    pub tick: Duration,
    pub seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Command {
    Turn(Direction),
    TogglePause,
    Quit,
}

/// Where the board sits on the terminal. The score line is right above the border.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Layout {
    border_top_left: Coords,
    border_size: Coords,
}

impl Layout {
    fn fit(rows: GridInt, cols: GridInt, terminal: Coords) -> Option<Self> {
        let width = TermInt::try_from(cols).ok()?.checked_mul(CELL_WIDTH)?.checked_add(2)?;
        let height = TermInt::try_from(rows).ok()?.checked_add(2)?;
        let (term_w, term_h) = terminal;

        // One extra line for the score
        if width > term_w || height + 1 > term_h {
            return None;
        }

        let left = (term_w - width) / 2;
        let top = (term_h - height - 1) / 2 + 1;
        Some(Layout { border_top_left: (left, top), border_size: (width, height) })
    }

    fn score_pos(&self) -> Coords {
        (self.border_top_left.0, self.border_top_left.1 - 1)
    }

    fn cell_pos(&self, pos: Position) -> Coords {
        let (left, top) = self.border_top_left;
        (left + 1 + pos.col as TermInt * CELL_WIDTH, top + 1 + pos.row as TermInt)
    }
}

pub struct SnakeGame {
    config: GameConfig,
    layout: Layout,
    paused: bool,
    sessions: u64,
    term: TermManager,
}

impl SnakeGame {
    pub fn new(config: GameConfig) -> Result<Self> {
        let term = TermManager::new().context("Could not read the terminal size")?;
        let terminal = term.get_terminal_size();

        let layout = match Layout::fit(config.rows, config.cols, terminal) {
            Some(layout) => layout,
            None => bail!(
                "A {}x{} board does not fit a {}x{} terminal",
                config.rows,
                config.cols,
                terminal.0,
                terminal.1
            ),
        };

        Ok(SnakeGame { config, layout, paused: false, sessions: 0, term })
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.term.setup().context("Could not set up the terminal")
    }

    pub fn restore(&mut self) -> Result<()> {
        self.term.restore().context("Could not restore the terminal")
    }

    pub fn show_intro(&mut self) -> Result<Flow> {
        let lines = &[
            "Arrow keys or WASD to move",
            "P or Esc to pause",
            "CTRL+C to quit",
            "",
            "Press any key to begin"
        ];

        self.term.show_message(lines)?;

        if is_ctrl_c(&self.term.read_key_blocking()?) {
            return Ok(Flow::Quit);
        }

        self.term.hide_message()?;
        Ok(Flow::Continue)
    }

    /// Plays one session, from a fresh engine until the snake dies or fills the board.
    pub fn play(&mut self) -> Result<Flow> {
        let mut engine = self.new_engine()?;
        self.paused = false;

        self.term.clear()?;
        self.term.draw_borders(self.layout.border_top_left, self.layout.border_size)?;
        self.draw_engine(&engine)?;
        self.draw_score(engine.score())?;

        self.term.show_message(&["Press any key to start"])?;
        if is_ctrl_c(&self.term.read_key_blocking()?) {
            return Ok(Flow::Quit);
        }
        if self.countdown()? == Flow::Quit {
            return Ok(Flow::Quit);
        }

        let tick_ms = self.config.tick.as_millis() as u64;
        let mut elapsed = 0;

        while !engine.is_game_over() {
            for key_ev in self.term.read_key_events_queue()? {
                match command_for(&key_ev) {
                    Some(Command::Quit) => return Ok(Flow::Quit),
                    Some(Command::TogglePause) => {
                        if self.toggle_pause()? == Flow::Quit {
                            return Ok(Flow::Quit);
                        }
                        elapsed = 0;
                    }
                    Some(Command::Turn(dir)) if !self.paused => engine.request_direction_change(dir),
                    _ => {}
                }
            }

            sleep(Duration::from_millis(POLL_INTERVAL_MS));
            if self.paused { continue; }

            elapsed += POLL_INTERVAL_MS;
            if elapsed < tick_ms { continue; }
            elapsed = 0;

            let move_res = engine.advance();
            self.draw_update(&engine, &move_res)?;

            if engine.is_board_full() {
                break;
            }
        }

        self.game_over(&engine)?;

        // Keys pressed while the dead snake was drawn must not skip the score
        if flow_after(&self.term.read_key_events_queue()?) == Flow::Quit {
            return Ok(Flow::Quit);
        }

        if is_ctrl_c(&self.term.read_key_blocking()?) {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Continue)
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn new_engine(&mut self) -> Result<Engine> {
        let (rows, cols) = (self.config.rows, self.config.cols);
        self.sessions += 1;

        let engine = match self.config.seed {
            Some(seed) => {
                let seed = seed.wrapping_add(self.sessions - 1);
                info!("Session {} on a {}x{} board, seed {}", self.sessions, rows, cols, seed);
                Engine::with_seed(rows, cols, seed)?
            }
            None => {
                info!("Session {} on a {}x{} board, unseeded", self.sessions, rows, cols);
                Engine::new(rows, cols)?
            }
        };

        Ok(engine)
    }

    fn countdown(&mut self) -> Result<Flow> {
        for n in (1..=3).rev() {
            let label = n.to_string();
            self.term.show_message(&[label.as_str()])?;
            sleep(Duration::from_millis(COUNTDOWN_STEP_MS));
        }
        self.term.hide_message()?;

        // Keys pressed during the countdown are dropped
        Ok(flow_after(&self.term.read_key_events_queue()?))
    }

    fn toggle_pause(&mut self) -> Result<Flow> {
        if !self.paused {
            info!("Paused");
            self.paused = true;
            self.term.show_message(&["Paused", "Press P or Esc to resume", "or CTRL+C to quit"])?;
            Ok(Flow::Continue)
        } else {
            let flow = self.countdown()?;
            self.paused = false;
            info!("Resumed");
            Ok(flow)
        }
    }

    fn game_over(&mut self, engine: &Engine) -> Result<()> {
        let won = engine.is_board_full();
        info!("Session {} ended with score {}{}", self.sessions, engine.score(), if won {", board full"} else {""});

        if !won {
            for pos in engine.body() {
                self.print_cell(pos, DEAD_SNAKE_GLYPH)?;
                self.term.flush()?;
                sleep(Duration::from_millis(DEAD_SEGMENT_DELAY_MS));
            }
            sleep(Duration::from_millis(GAME_OVER_DELAY_MS));
        }

        let s = if won {"You won!"} else {"Game over!"};
        self.term.show_message(&[
            s,
            &*format!("Score: {}", engine.score()),
            "",
            "Press any key to play again,",
            "or CTRL+C to quit."
        ])?;
        Ok(())
    }

    fn draw_engine(&mut self, engine: &Engine) -> Result<()> {
        for (pos, cell) in engine.grid().iter() {
            self.print_cell(pos, glyph_for(cell))?;
        }
        self.print_cell(engine.head(), head_glyph(engine.direction()))?;
        self.term.flush()?;
        Ok(())
    }

    fn draw_update(&mut self, engine: &Engine, mov: &MoveResult) -> Result<()> {
        match mov {
            MoveResult::Moved { new_head, old_head, old_tail } => {
                // Tail first: the head may be moving into it
                self.print_cell(*old_tail, EMPTY_GLYPH)?;
                self.print_cell(*old_head, SNAKE_BODY_GLYPH)?;
                self.print_cell(*new_head, head_glyph(engine.direction()))?;
            }
            MoveResult::Ate { new_head, old_head, spawned } => {
                self.print_cell(*old_head, SNAKE_BODY_GLYPH)?;
                self.print_cell(*new_head, head_glyph(engine.direction()))?;
                for food in spawned {
                    self.print_cell(*food, FOOD_GLYPH)?;
                }
                self.draw_score(engine.score())?;
            }
            MoveResult::Crashed | MoveResult::Finished => {}
        }

        self.term.flush()?;
        Ok(())
    }

    fn draw_score(&mut self, score: u32) -> Result<()> {
        self.term.print_str_at(self.layout.score_pos(), &format!("SCORE {}", score))?;
        self.term.flush()?;
        Ok(())
    }

    fn print_cell(&mut self, pos: Position, glyph: [char; 2]) -> Result<()> {
        let (x, y) = self.layout.cell_pos(pos);
        self.term.print_at((x, y), glyph[0])?;
        self.term.print_at((x + 1, y), glyph[1])?;
        Ok(())
    }
}

fn command_for(ev: &KeyEvent) -> Option<Command> {
    if is_ctrl_c(ev) {
        return Some(Command::Quit);
    }

    match ev.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Some(Command::Turn(Up)),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Some(Command::Turn(Left)),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Some(Command::Turn(Down)),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Some(Command::Turn(Right)),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Esc => Some(Command::TogglePause),
        _ => None,
    }
}

/// Outcome of keys discarded while the board was busy: only Ctrl+C counts.
fn flow_after(dropped: &[KeyEvent]) -> Flow {
    if dropped.iter().any(is_ctrl_c) { Flow::Quit } else { Flow::Continue }
}

fn head_glyph(direction: Direction) -> [char; 2] {
    match direction {
        Up => ['/', '\\'],
        Down => ['\\', '/'],
        Left => ['<', '<'],
        Right => ['>', '>'],
    }
}

fn glyph_for(cell: Cell) -> [char; 2] {
    match cell {
        Cell::Snake => SNAKE_BODY_GLYPH,
        Cell::Food => FOOD_GLYPH,
        Cell::Empty | Cell::Outside => EMPTY_GLYPH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(command_for(&key(KeyCode::Char('w'))), Some(Command::Turn(Up)));
        assert_eq!(command_for(&key(KeyCode::Left)), Some(Command::Turn(Left)));
        assert_eq!(command_for(&key(KeyCode::Char('S'))), Some(Command::Turn(Down)));
        assert_eq!(command_for(&key(KeyCode::Char('d'))), Some(Command::Turn(Right)));
        assert_eq!(command_for(&key(KeyCode::Esc)), Some(Command::TogglePause));
        assert_eq!(command_for(&key(KeyCode::Char('p'))), Some(Command::TogglePause));
        assert_eq!(command_for(&key(KeyCode::Char('x'))), None);
        assert_eq!(
            command_for(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(command_for(&key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn layout_centers_the_board() {
        let layout = Layout::fit(15, 15, (80, 24)).unwrap();

        assert_eq!(layout.border_size, (32, 17));
        assert_eq!(layout.border_top_left, (24, 4));
        assert_eq!(layout.score_pos(), (24, 3));
        assert_eq!(layout.cell_pos(Position::new(0, 0)), (25, 5));
        assert_eq!(layout.cell_pos(Position::new(14, 14)), (53, 19));
    }

    #[test]
    fn layout_rejects_small_terminals() {
        assert!(Layout::fit(15, 15, (31, 24)).is_none());
        assert!(Layout::fit(15, 15, (32, 17)).is_none());
        assert_eq!(Layout::fit(15, 15, (32, 18)).unwrap().border_top_left, (0, 1));
        assert!(Layout::fit(-1, 15, (80, 24)).is_none());
    }

    #[test]
    fn dropped_keys_only_quit_on_ctrl_c() {
        assert_eq!(flow_after(&[]), Flow::Continue);
        assert_eq!(flow_after(&[key(KeyCode::Char('w')), key(KeyCode::Enter)]), Flow::Continue);
        assert_eq!(
            flow_after(&[key(KeyCode::Up), KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)]),
            Flow::Quit
        );
    }

    #[test]
    fn head_points_along_direction() {
        assert_eq!(head_glyph(Right), ['>', '>']);
        assert_eq!(head_glyph(Left), ['<', '<']);
        assert_eq!(head_glyph(Up), ['/', '\\']);
        assert_eq!(head_glyph(Down), ['\\', '/']);
    }

    #[test]
    fn glyphs_per_cell() {
        assert_eq!(glyph_for(Cell::Snake), SNAKE_BODY_GLYPH);
        assert_eq!(glyph_for(Cell::Food), FOOD_GLYPH);
        assert_eq!(glyph_for(Cell::Empty), EMPTY_GLYPH);
    }
}
