use tracing::trace;

pub const COLUMNS: usize = 16;
pub const ROWS: usize = 2;

/// Two-row character display
pub trait DisplayDriver {
    fn clear(&mut self);
    fn move_to(&mut self, col: usize, row: usize);
    fn put_str(&mut self, s: &str);
    fn backlight_on(&mut self);
    fn backlight_off(&mut self);
}

/// In-memory character LCD. The station logs its frames instead of driving glass.
#[derive(Debug, Clone)]
pub struct TextLcd {
    cells: [[char; COLUMNS]; ROWS],
    col: usize,
    row: usize,
    backlight: bool,
}

impl Default for TextLcd {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLcd {
    pub fn new() -> Self {
        Self {
            cells: [[' '; COLUMNS]; ROWS],
            col: 0,
            row: 0,
            backlight: true,
        }
    }

    pub fn row(&self, row: usize) -> String {
        self.cells[row.min(ROWS - 1)].iter().collect()
    }

    /// Both rows joined by a `|`
    pub fn frame(&self) -> String {
        format!("{}|{}", self.row(0), self.row(1))
    }

    pub fn is_lit(&self) -> bool {
        self.backlight
    }
}

impl DisplayDriver for TextLcd {
    fn clear(&mut self) {
        self.cells = [[' '; COLUMNS]; ROWS];
        self.col = 0;
        self.row = 0;
    }

    fn move_to(&mut self, col: usize, row: usize) {
        self.col = col.min(COLUMNS);
        self.row = row.min(ROWS - 1);
    }

    // Text past the last column is dropped, like a real HD44780 with no wrap
    fn put_str(&mut self, s: &str) {
        trace!("lcd ({},{}) {s:?}", self.col, self.row);
        for c in s.chars() {
            if self.col >= COLUMNS {
                break;
            }
            self.cells[self.row][self.col] = c;
            self.col += 1;
        }
    }

    fn backlight_on(&mut self) {
        self.backlight = true;
    }

    fn backlight_off(&mut self) {
        self.backlight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_at_cursor() {
        let mut lcd = TextLcd::new();
        lcd.put_str("Current:");
        lcd.move_to(12, 0);
        lcd.put_str("21.4");
        lcd.move_to(0, 1);
        lcd.put_str("L:       H:");
        assert_eq!(lcd.row(0), "Current:    21.4");
        assert_eq!(lcd.row(1), "L:       H:     ");
    }

    #[test]
    fn truncates_and_clears() {
        let mut lcd = TextLcd::new();
        lcd.move_to(14, 1);
        lcd.put_str("12345");
        assert_eq!(lcd.row(1), "              12");
        lcd.clear();
        assert_eq!(lcd.frame(), format!("{}|{}", " ".repeat(16), " ".repeat(16)));
    }

    #[test]
    fn toggles_backlight() {
        let mut lcd = TextLcd::new();
        assert!(lcd.is_lit());
        lcd.backlight_off();
        assert!(!lcd.is_lit());
        lcd.backlight_on();
        assert!(lcd.is_lit());
    }
}
