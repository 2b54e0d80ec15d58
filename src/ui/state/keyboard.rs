/// Grid cell that currently owns keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFocus {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

impl KeyCommand {
    /// Maps a DOM `key` value; other keys are not handled by the grid.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(KeyCommand::Up),
            "ArrowDown" => Some(KeyCommand::Down),
            "ArrowLeft" => Some(KeyCommand::Left),
            "ArrowRight" => Some(KeyCommand::Right),
            "Home" => Some(KeyCommand::Home),
            "End" => Some(KeyCommand::End),
            _ => None,
        }
    }
}

/// Moves focus inside a `rows` x `cols` grid, clamping at the edges. With no
/// current focus the first cell is focused.
pub fn move_focus(
    focus: Option<CellFocus>,
    command: KeyCommand,
    rows: usize,
    cols: usize,
) -> Option<CellFocus> {
    if rows == 0 || cols == 0 {
        return None;
    }
    let Some(current) = focus else {
        return Some(CellFocus { row: 0, col: 0 });
    };
    let row = current.row.min(rows - 1);
    let col = current.col.min(cols - 1);

    let next = match command {
        KeyCommand::Up => CellFocus {
            row: row.saturating_sub(1),
            col,
        },
        KeyCommand::Down => CellFocus {
            row: (row + 1).min(rows - 1),
            col,
        },
        KeyCommand::Left => CellFocus {
            row,
            col: col.saturating_sub(1),
        },
        KeyCommand::Right => CellFocus {
            row,
            col: (col + 1).min(cols - 1),
        },
        KeyCommand::Home => CellFocus { row, col: 0 },
        KeyCommand::End => CellFocus {
            row,
            col: cols - 1,
        },
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_clamps_at_grid_edges() {
        let start = Some(CellFocus { row: 0, col: 0 });

        assert_eq!(move_focus(start, KeyCommand::Up, 3, 4), start);
        assert_eq!(
            move_focus(start, KeyCommand::End, 3, 4),
            Some(CellFocus { row: 0, col: 3 })
        );
        assert_eq!(
            move_focus(Some(CellFocus { row: 2, col: 3 }), KeyCommand::Down, 3, 4),
            Some(CellFocus { row: 2, col: 3 })
        );
    }

    #[test]
    fn stale_focus_is_pulled_into_a_smaller_page() {
        let focus = Some(CellFocus { row: 9, col: 1 });

        assert_eq!(
            move_focus(focus, KeyCommand::Right, 2, 4),
            Some(CellFocus { row: 1, col: 2 })
        );
        assert_eq!(move_focus(focus, KeyCommand::Left, 0, 4), None);
    }
}
