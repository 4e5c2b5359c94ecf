use std::io::{self, Write};

use beacon_core::render::{DisplaySurface, TITLE_REPLY};
use beacon_core::types::RenderFrame;
use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Widget};
use unicode_width::UnicodeWidthStr;

/// Fixed-size text display drawn as a bordered panel on a terminal stream.
///
/// Each frame is laid out into an off-screen ratatui buffer of
/// `width x lines` cells (plus border) and then written out cell by cell.
pub struct TerminalPanel<W: Write + Send> {
    out: W,
    width: usize,
    lines: usize,
}

impl<W: Write + Send> TerminalPanel<W> {
    pub fn new(out: W, width: usize, lines: usize) -> Self {
        Self { out, width, lines }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn area(&self, frame: &RenderFrame) -> Rect {
        // Wide glyphs take two cells, so a full line of them is wider than `width`.
        let widest = frame
            .body_lines
            .iter()
            .map(|l| l.width())
            .chain([self.width, frame.title.width()])
            .max()
            .unwrap_or(self.width);
        let w = u16::try_from(widest + 2).unwrap_or(u16::MAX);
        let h = u16::try_from(self.lines + 2).unwrap_or(u16::MAX);
        Rect::new(0, 0, w, h)
    }
}

impl<W: Write + Send> DisplaySurface for TerminalPanel<W> {
    fn draw(&mut self, frame: &RenderFrame) -> io::Result<()> {
        let area = self.area(frame);
        let mut buf = Buffer::empty(area);

        let accent = if frame.title == TITLE_REPLY { Color::Green } else { Color::Red };
        let mut body: Vec<Line> = frame.body_lines.iter().map(|l| Line::raw(l.as_str())).collect();
        if frame.truncated {
            if let Some(last) = body.pop() {
                body.push(last.style(Style::default().fg(Color::DarkGray)));
            }
        }
        Paragraph::new(body)
            .block(
                Block::bordered()
                    .border_style(Style::default().fg(accent))
                    .title(frame.title.as_str()),
            )
            .render(area, &mut buf);

        write_buffer(&mut self.out, &buf)?;
        self.out.flush()
    }
}

/// Emit every row of `buf`, switching colour only where it changes.
fn write_buffer(out: &mut impl Write, buf: &Buffer) -> io::Result<()> {
    let area = buf.area;
    for y in area.top()..area.bottom() {
        let mut fg = Color::Reset;
        let mut skip = 0usize;
        for x in area.left()..area.right() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            let cell = &buf[(x, y)];
            if cell.fg != fg {
                fg = cell.fg;
                queue!(out, SetForegroundColor(to_crossterm(fg)))?;
            }
            let symbol = cell.symbol();
            skip = symbol.width().saturating_sub(1);
            queue!(out, Print(symbol))?;
        }
        queue!(out, ResetColor, Print("\n"))?;
    }
    Ok(())
}

fn to_crossterm(c: Color) -> crossterm::style::Color {
    use crossterm::style::Color as C;
    match c {
        Color::Reset => C::Reset,
        Color::Black => C::Black,
        Color::Red => C::DarkRed,
        Color::Green => C::DarkGreen,
        Color::Yellow => C::DarkYellow,
        Color::Blue => C::DarkBlue,
        Color::Magenta => C::DarkMagenta,
        Color::Cyan => C::DarkCyan,
        Color::Gray => C::Grey,
        Color::DarkGray => C::DarkGrey,
        Color::LightRed => C::Red,
        Color::LightGreen => C::Green,
        Color::LightYellow => C::Yellow,
        Color::LightBlue => C::Blue,
        Color::LightMagenta => C::Magenta,
        Color::LightCyan => C::Cyan,
        Color::White => C::White,
        Color::Rgb(r, g, b) => C::Rgb { r, g, b },
        Color::Indexed(i) => C::AnsiValue(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(title: &str, lines: &[&str], truncated: bool) -> RenderFrame {
        RenderFrame {
            title: title.into(),
            body_lines: lines.iter().map(|s| s.to_string()).collect(),
            truncated,
        }
    }

    fn draw(f: &RenderFrame, width: usize, lines: usize) -> String {
        let mut panel = TerminalPanel::new(Vec::new(), width, lines);
        panel.draw(f).unwrap();
        String::from_utf8(panel.into_inner()).unwrap()
    }

    #[test]
    fn draws_title_and_body_inside_border() {
        let out = draw(&frame("Reply", &["hello", "world"], false), 12, 3);
        assert!(out.contains("Reply"));
        assert!(out.contains("hello"));
        assert!(out.contains("world"));
        // border + three body rows + border
        assert_eq!(out.matches('\n').count(), 5);
    }

    #[test]
    fn wide_glyphs_are_not_doubled() {
        let out = draw(&frame("Reply", &["你好世界"], false), 4, 1);
        assert!(out.contains("你好世界"));
    }

    #[test]
    fn error_frames_use_error_colour() {
        let ok = draw(&frame("Reply", &["x"], false), 8, 1);
        let err = draw(&frame("Request Failed", &["HTTP 500"], false), 8, 1);
        assert_ne!(ok, err);
        assert!(err.contains("HTTP 500"));
    }
}
