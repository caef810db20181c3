/// Character-cell painter for projected faces and screen-space lines
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use pp3d_core::{geometry, LineSegment, ProjectedFace};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Screen pixels per terminal row; cells are about twice as tall as they are wide.
pub const PIXELS_PER_ROW: f64 = 2.0;

const MAX_LINE_STEPS: f64 = 4096.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
}

impl Cell {
    const EMPTY: Cell = Cell {
        character: ' ',
        color: Color::Reset,
    };
}

/// ASCII painter. Faces are drawn in the order given, so callers pass them far to near.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Maps a `[0, 1]` brightness onto the luminosity ramp.
    pub fn shade(brightness: f64) -> char {
        let index = (brightness.clamp(0.0, 1.0) * (LUMINOSITY_RAMP.len() - 1) as f64).round() as usize;
        LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
    }

    /// Fills a convex projected polygon as a triangle fan.
    pub fn fill_face(&mut self, face: &ProjectedFace, character: char, color: geometry::Color) {
        let points: Vec<(f64, f64)> = face
            .points
            .iter()
            .map(|p| (p.x, p.y / PIXELS_PER_ROW))
            .collect();
        let Some(&first) = points.first() else {
            return;
        };

        let cell = Cell {
            character,
            color: to_terminal_color(color),
        };
        for pair in points[1..].windows(2) {
            self.rasterize_triangle([first, pair[0], pair[1]], cell);
        }
    }

    fn rasterize_triangle(&mut self, v: [(f64, f64); 3], cell: Cell) {
        let [v0, v1, v2] = v;

        // Bounding box, clipped to screen bounds
        let min_x = v0.0.min(v1.0).min(v2.0).floor().max(0.0) as i64;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil().min(self.width as f64 - 1.0) as i64;
        let min_y = v0.1.min(v1.1).min(v2.1).floor().max(0.0) as i64;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil().min(self.height as f64 - 1.0) as i64;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f64 + 0.5, y as f64 + 0.5);
                if let Some((w0, w1, w2)) = barycentric(v0, v1, v2, p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.put(x, y, cell);
                    }
                }
            }
        }
    }

    /// Draws a screen-space segment (already clipped by the projection).
    pub fn draw_line(&mut self, segment: &LineSegment, character: char, color: geometry::Color) {
        let (x0, y0) = (segment.start.x, segment.start.y / PIXELS_PER_ROW);
        let (x1, y1) = (segment.end.x, segment.end.y / PIXELS_PER_ROW);
        let steps = (x1 - x0)
            .abs()
            .max((y1 - y0).abs())
            .ceil()
            .clamp(1.0, MAX_LINE_STEPS) as usize;

        let cell = Cell {
            character,
            color: to_terminal_color(color),
        };
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.put(x.floor() as i64, y.floor() as i64, cell);
        }
    }

    /// Writes text into the buffer starting at a cell position.
    pub fn draw_text(&mut self, column: usize, row: usize, text: &str, color: geometry::Color) {
        let color = to_terminal_color(color);
        for (i, character) in text.chars().enumerate() {
            self.put((column + i) as i64, row as i64, Cell { character, color });
        }
    }

    fn put(&mut self, x: i64, y: i64, cell: Cell) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.cells[idx] = cell;
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = Color::Reset;
        writer.queue(ResetColor)?;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in &self.cells[y * self.width..(y + 1) * self.width] {
                if cell.color != current {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = cell.color;
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn char_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x].character
    }
}

fn to_terminal_color(color: geometry::Color) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f64, f64), v1: (f64, f64), v2: (f64, f64), p: (f64, f64)) -> Option<(f64, f64, f64)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
