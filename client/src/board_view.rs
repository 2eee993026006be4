//! Text rendering of a session snapshot for the terminal.
//!
//! Black is `X`, white is `O`. The last confirmed move is wrapped in
//! parentheses and the star points of a 19x19 board show as `+`.

use std::fmt::Write;

use weiqi::session::Snapshot;
use weiqi::{Color, Point};

const STAR_LINES: [u8; 3] = [3, 9, 15];

pub fn render(snapshot: &Snapshot) -> String {
    let board = &snapshot.board;
    let size = board.size();
    let mut out = String::from("   ");
    for x in 0..size {
        let _ = write!(out, "{x:^3}");
    }
    out.push('\n');

    for (y, row) in board.rows().enumerate() {
        let _ = write!(out, "{y:>2} ");
        for (x, cell) in row.iter().enumerate() {
            let point = Point::new(x as u8, y as u8);
            let glyph = match cell {
                Some(Color::Black) => 'X',
                Some(Color::White) => 'O',
                None if size == 19 && is_star(point) => '+',
                None => '.',
            };
            if snapshot.last_move == Some(point) {
                let _ = write!(out, "({glyph})");
            } else {
                let _ = write!(out, " {glyph} ");
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{} to move", snapshot.turn);
    out
}

fn is_star(point: Point) -> bool {
    STAR_LINES.contains(&point.x) && STAR_LINES.contains(&point.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weiqi::session::Phase;
    use weiqi::BoardGrid;

    fn snapshot(board: BoardGrid, last_move: Option<Point>) -> Snapshot {
        Snapshot {
            board,
            turn: Color::White,
            last_move,
            tentative: None,
            phase: Phase::Idle,
            accepts_input: false,
        }
    }

    #[test]
    fn small_board_with_marker() {
        let mut board = BoardGrid::new(9);
        board.set(Point::new(2, 2), Some(Color::Black)).unwrap();
        board.set(Point::new(6, 6), Some(Color::White)).unwrap();
        let text = render(&snapshot(board, Some(Point::new(6, 6))));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "    0  1  2  3  4  5  6  7  8 ");
        assert_eq!(lines[3], " 2  .  .  X  .  .  .  .  .  . ");
        assert_eq!(lines[7], " 6  .  .  .  .  .  . (O) .  . ");
        assert!(!text.contains('+'));
    }

    #[test]
    fn star_points_on_nineteen() {
        let mut board = BoardGrid::new(19);
        board.set(Point::new(3, 3), Some(Color::Black)).unwrap();
        let text = render(&snapshot(board, None));
        assert_eq!(text.matches('+').count(), 8);
        assert_eq!(text.matches('X').count(), 1);
        assert!(!text.contains('('));
    }

    #[test]
    fn thirteen_has_no_star_points() {
        let text = render(&snapshot(BoardGrid::new(13), None));
        assert!(!text.contains('+'));
    }
}
