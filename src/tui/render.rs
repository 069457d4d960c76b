//! # Frame renderer
//!
//! Repaints a prompt in place. The first frame is written verbatim with the
//! cursor hidden. Every later frame is compared line by line with the one on
//! screen; the cursor moves back to the first differing line, everything
//! below it is erased, and only the changed suffix is written.
//!
//! ```text
//!   on screen        next frame
//!   ┌─────────┐      ┌─────────┐
//!   │ a       │      │ a       │   unchanged, not rewritten
//!   │ b       │      │ b       │   unchanged, not rewritten
//!   │ c  ◀────┼──────┼─▶ d     │   first diff: move here, erase down, write "d"
//!   └─────────┘      └─────────┘
//! ```
//!
//! A frame that grows past the bottom of the old one is repainted from the
//! old last line, so the terminal scrolls for the new lines.
//!
//! Both frames go through the same `split_lines`, so `\r\n`, `\r` and `\n`
//! all count as one line break.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveDown, MoveToColumn, MoveUp, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use log::debug;

use crate::core::text::{first_diff_line, split_lines};

pub struct FrameRenderer {
    output: Box<dyn Write + Send>,
    frame: Option<String>,
}

impl FrameRenderer {
    pub fn new(output: Box<dyn Write + Send>) -> Self {
        Self {
            output,
            frame: None,
        }
    }

    /// The frame currently on screen.
    pub fn frame(&self) -> Option<&str> {
        self.frame.as_deref()
    }

    /// Paint `next`. Returns false when it matched the frame on screen and
    /// nothing was written.
    pub fn render(&mut self, next: String) -> io::Result<bool> {
        let Some(prev) = self.frame.as_deref() else {
            queue!(self.output, Hide)?;
            self.output.write_all(next.as_bytes())?;
            self.output.flush()?;
            self.frame = Some(next);
            return Ok(true);
        };

        let Some(diff) = first_diff_line(prev, &next) else {
            return Ok(false);
        };
        let prev_lines = split_lines(prev).len();
        let lines = split_lines(&next);
        // Start at or above the last line on screen; only written line breaks
        // scroll. A shrinking frame rewrites its last line so the cursor ends on it.
        let start = diff
            .min(prev_lines.saturating_sub(1))
            .min(lines.len().saturating_sub(1));

        queue!(self.output, MoveToColumn(0))?;
        if prev_lines > 1 {
            queue!(self.output, MoveUp(to_u16(prev_lines - 1)))?;
        }
        if start > 0 {
            queue!(self.output, MoveDown(to_u16(start)))?;
        }
        queue!(self.output, Clear(ClearType::FromCursorDown))?;

        self.output.write_all(lines[start..].join("\r\n").as_bytes())?;
        self.output.flush()?;

        debug!("Repainted from line {} ({} lines on screen before)", start, prev_lines);
        self.frame = Some(next);
        Ok(true)
    }

    /// Show the cursor again and leave it on a fresh line below the prompt.
    pub fn finish(&mut self) -> io::Result<()> {
        queue!(self.output, Show)?;
        self.output.write_all(b"\r\n")?;
        self.output.flush()
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
