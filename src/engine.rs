use std::collections::{HashSet, VecDeque};
use std::ops::Index;

use log::{debug, info, trace};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::error::{EngineError, Result};
use crate::snake::{Direction, Position, Snake};
use crate::GridInt;

pub const INITIAL_SNAKE_LENGTH: GridInt = 3;
pub const MIN_ROWS: GridInt = 1;
pub const MIN_COLS: GridInt = INITIAL_SNAKE_LENGTH + 1;

const MAX_PENDING_TURNS: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Snake,
    Food,
    /// Classification of positions beyond the border, never stored in a grid.
    Outside,
}

static OUTSIDE: Cell = Cell::Outside;

/// Read-only snapshot of the board, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: GridInt,
    cols: GridInt,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn rows(&self) -> GridInt {
        self.rows
    }

    pub fn cols(&self) -> GridInt {
        self.cols
    }

    pub fn get(&self, pos: Position) -> Cell {
        self[pos]
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(i, &cell)| {
            let i = i as GridInt;
            (Position::new(i / cols, i % cols), cell)
        })
    }

    fn offset(&self, pos: Position) -> Option<usize> {
        if pos.row < 0 || pos.row >= self.rows || pos.col < 0 || pos.col >= self.cols {
            None
        } else {
            Some((pos.row * self.cols + pos.col) as usize)
        }
    }
}

impl Index<Position> for Grid {
    type Output = Cell;

    fn index(&self, pos: Position) -> &Self::Output {
        match self.offset(pos) {
            Some(i) => &self.cells[i],
            None => &OUTSIDE,
        }
    }
}

/// What a single call to [`Engine::advance`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveResult {
    Moved { new_head: Position, old_head: Position, old_tail: Position },
    Ate { new_head: Position, old_head: Position, spawned: Vec<Position> },
    Crashed,
    /// The game was already over, nothing changed.
    Finished,
}

/// The simulation: one snake on a bounded grid.
///
/// Mutated only through [`Engine::request_direction_change`] and [`Engine::advance`].
/// Once a collision ends the game every further call is ignored; start a new
/// engine to play again.
#[derive(Clone, Debug)]
pub struct Engine {
    rows: GridInt,
    cols: GridInt,
    snake: Snake,
    food: HashSet<Position>,
    turns: VecDeque<Direction>,
    score: u32,
    game_over: bool,
    rng: StdRng,
}

impl Engine {
    pub fn new(rows: GridInt, cols: GridInt) -> Result<Self> {
        Engine::with_rng(rows, cols, StdRng::from_entropy())
    }

    pub fn with_seed(rows: GridInt, cols: GridInt, seed: u64) -> Result<Self> {
        Engine::with_rng(rows, cols, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rows: GridInt, cols: GridInt, rng: StdRng) -> Result<Self> {
        if rows < MIN_ROWS || cols < MIN_COLS {
            return Err(EngineError::GridTooSmall { rows, cols });
        }

        let head = Position::new(rows / 2, INITIAL_SNAKE_LENGTH);
        let mut engine = Engine {
            rows,
            cols,
            snake: Snake::new(head, INITIAL_SNAKE_LENGTH, Direction::Right),
            food: HashSet::new(),
            turns: VecDeque::with_capacity(MAX_PENDING_TURNS),
            score: 0,
            game_over: false,
            rng,
        };
        engine.place_food(1);

        debug!("New {}x{} engine, head at {:?}", rows, cols, head);
        Ok(engine)
    }

    pub fn rows(&self) -> GridInt {
        self.rows
    }

    pub fn cols(&self) -> GridInt {
        self.cols
    }

    pub fn head(&self) -> Position {
        self.snake.head()
    }

    pub fn tail(&self) -> Position {
        self.snake.tail()
    }

    /// Body segments, head first.
    pub fn body(&self) -> impl Iterator<Item = Position> + '_ {
        self.snake.body().iter().copied()
    }

    pub fn direction(&self) -> Direction {
        self.snake.get_direction()
    }

    /// Buffered turns not yet applied, oldest first.
    pub fn pending_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.turns.iter().copied()
    }

    pub fn food(&self) -> impl Iterator<Item = Position> + '_ {
        self.food.iter().copied()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// True when the snake covers every cell of the grid.
    pub fn is_board_full(&self) -> bool {
        self.snake.len() == self.total_cells()
    }

    pub fn cell_at(&self, pos: Position) -> Cell {
        if !self.in_bounds(pos) {
            Cell::Outside
        } else if self.snake.contains(&pos) {
            Cell::Snake
        } else if self.food.contains(&pos) {
            Cell::Food
        } else {
            Cell::Empty
        }
    }

    pub fn grid(&self) -> Grid {
        let cells = self.positions().map(|pos| self.cell_at(pos)).collect();
        Grid { rows: self.rows, cols: self.cols, cells }
    }

    /// Buffers a turn for a later tick.
    ///
    /// Dropped when two turns are already waiting, or when `direction` repeats
    /// or reverses the last buffered turn (the current direction if none is
    /// buffered).
    pub fn request_direction_change(&mut self, direction: Direction) {
        if self.game_over {
            trace!("Ignoring {:?}, game is over", direction);
            return;
        }

        if self.turns.len() >= MAX_PENDING_TURNS {
            trace!("Ignoring {:?}, turn buffer full", direction);
            return;
        }

        let last = self.last_intended_direction();
        if direction == last || direction == last.opposite() {
            trace!("Ignoring {:?} after {:?}", direction, last);
            return;
        }

        self.turns.push_back(direction);
    }

    /// Moves the snake one cell.
    pub fn advance(&mut self) -> MoveResult {
        if self.game_over {
            return MoveResult::Finished;
        }

        if let Some(direction) = self.turns.pop_front() {
            debug!("Turning {:?}", direction);
            self.snake.set_direction(direction);
        }

        let old_head = self.snake.head();
        let new_head = self.snake.next_head();

        match self.will_hit(new_head) {
            Cell::Outside | Cell::Snake => {
                self.game_over = true;
                info!(
                    "Game over moving {:?} into {:?}, score {}",
                    self.snake.get_direction(),
                    new_head,
                    self.score
                );
                MoveResult::Crashed
            }
            Cell::Empty => {
                let old_tail = self.snake.tail();
                self.snake.pop_tail();
                self.snake.push_head(new_head);
                MoveResult::Moved { new_head, old_head, old_tail }
            }
            Cell::Food => {
                self.food.remove(&new_head);
                self.snake.push_head(new_head);
                self.score += 1;

                let spawned = if self.food.is_empty() {
                    let count = self.food_spawn_count();
                    self.place_food(count)
                } else {
                    vec![]
                };
                MoveResult::Ate { new_head, old_head, spawned }
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn last_intended_direction(&self) -> Direction {
        match self.turns.back() {
            Some(&direction) => direction,
            None => self.snake.get_direction(),
        }
    }

    fn will_hit(&self, pos: Position) -> Cell {
        // The tail leaves its cell on this same tick
        if self.in_bounds(pos) && pos == self.snake.tail() {
            Cell::Empty
        } else {
            self.cell_at(pos)
        }
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    fn total_cells(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    fn positions(&self) -> impl Iterator<Item = Position> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
    }

    fn food_spawn_count(&mut self) -> usize {
        spawn_count_for_roll(self.rng.gen_range(0..100))
    }

    /// Places up to `count` food items on distinct empty cells and returns them.
    fn place_food(&mut self, count: usize) -> Vec<Position> {
        let empty: Vec<Position> = self
            .positions()
            .filter(|&pos| self.cell_at(pos) == Cell::Empty)
            .collect();

        if empty.is_empty() {
            debug!("No room left for food");
            return vec![];
        }

        let spawned: Vec<Position> = empty.choose_multiple(&mut self.rng, count).copied().collect();
        self.food.extend(spawned.iter().copied());

        debug!("Spawned {} food (asked for {}): {:?}", spawned.len(), count, spawned);
        spawned
    }
}

/// How many food items a percentile roll in `0..100` spawns.
fn spawn_count_for_roll(roll: u32) -> usize {
    match roll {
        0..=59 => 1,
        60..=89 => 2,
        _ => 3,
    }
}
