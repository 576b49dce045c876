use std::collections::{HashSet, VecDeque};

use crate::GridInt;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub const ALL: [Direction; 4] = [Up, Down, Left, Right];

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    /// Unit step as `(rows, cols)`.
    pub fn delta(self) -> (GridInt, GridInt) {
        match self {
            Up => (-1, 0),
            Down => (1, 0),
            Left => (0, -1),
            Right => (0, 1),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: GridInt,
    pub col: GridInt,
}

impl Position {
    pub const fn new(row: GridInt, col: GridInt) -> Self {
        Position { row, col }
    }

    pub fn translate(self, direction: Direction) -> Self {
        let (dr, dc) = direction.delta();
        Position::new(self.row + dr, self.col + dc)
    }
}

/// Snake body, head first. `occupied` mirrors `body` for constant time lookups.
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Position>,
    occupied: HashSet<Position>,
    direction: Direction,
}

impl Snake {
    /// Lays out `size` segments ending at `head`, trailing behind it opposite to `direction`.
    pub fn new(head: Position, size: GridInt, direction: Direction) -> Self {
        let back = direction.opposite();
        let body = (0..size).scan(head, |pos, i| {
            if i > 0 {
                *pos = pos.translate(back);
            }
            Some(*pos)
        });

        Snake::from_body(body, direction)
    }

    /// Builds a snake from explicit head-first segments, which must be distinct.
    pub fn from_body(segments: impl IntoIterator<Item = Position>, direction: Direction) -> Self {
        let mut body = VecDeque::new();
        let mut occupied = HashSet::new();

        for pos in segments {
            let fresh = occupied.insert(pos);
            debug_assert!(fresh, "segment {:?} repeated", pos);
            body.push_back(pos);
        }

        Snake { body, occupied, direction }
    }

    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    pub fn contains(&self, pos: &Position) -> bool {
        self.occupied.contains(pos)
    }

    pub fn next_head(&self) -> Position {
        self.head().translate(self.direction)
    }

    pub fn push_head(&mut self, pos: Position) {
        let fresh = self.occupied.insert(pos);
        debug_assert!(fresh, "head {:?} already on the body", pos);
        self.body.push_front(pos);
    }

    pub fn pop_tail(&mut self) -> Option<Position> {
        let tail = self.body.pop_back()?;
        self.occupied.remove(&tail);
        Some(tail)
    }

    pub fn set_direction(&mut self, new_direction: Direction) {
        self.direction = new_direction;
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snake_trails_behind_head() {
        let snake = Snake::new(Position::new(7, 3), 3, Right);

        let body: Vec<_> = snake.body().iter().copied().collect();
        assert_eq!(body, vec![Position::new(7, 3), Position::new(7, 2), Position::new(7, 1)]);
        assert_eq!(snake.head(), Position::new(7, 3));
        assert_eq!(snake.tail(), Position::new(7, 1));
        assert_eq!(snake.next_head(), Position::new(7, 4));
    }

    #[test]
    fn occupancy_follows_body() {
        let mut snake = Snake::new(Position::new(2, 2), 2, Down);
        assert!(snake.contains(&Position::new(1, 2)));

        snake.push_head(snake.next_head());
        assert!(snake.contains(&Position::new(3, 2)));
        assert_eq!(snake.len(), 3);

        assert_eq!(snake.pop_tail(), Some(Position::new(1, 2)));
        assert!(!snake.contains(&Position::new(1, 2)));
        assert_eq!(snake.len(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already on the body")]
    fn pushing_head_onto_body_panics() {
        let mut snake = Snake::new(Position::new(2, 2), 3, Right);
        snake.push_head(Position::new(2, 1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "repeated")]
    fn repeated_segments_panic() {
        Snake::from_body(vec![Position::new(0, 0), Position::new(0, 1), Position::new(0, 0)], Left);
    }

    #[test]
    fn opposites_pair_up() {
        for dir in Direction::ALL.iter() {
            assert_eq!(dir.opposite().opposite(), *dir);
            let (dr, dc) = dir.delta();
            assert_eq!(dir.opposite().delta(), (-dr, -dc));
        }
    }
}
