//! Terminal rendering surface for [`ViewSnapshot`]s.

use std::io::{self, Write};

use crate::controller::{InteractionState, ViewSnapshot};

/// Draws snapshots: answers to `out`, progress and errors to `err`.
///
/// Drawing the same snapshot twice in a row writes nothing the second time.
pub struct Renderer<O: Write, E: Write> {
    out: O,
    err: E,
    last: Option<ViewSnapshot>,
}

impl<O: Write, E: Write> Renderer<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            last: None,
        }
    }

    pub fn draw(&mut self, view: &ViewSnapshot) -> io::Result<()> {
        if self.last.as_ref() == Some(view) {
            return Ok(());
        }

        match view.state {
            InteractionState::Idle => {}
            InteractionState::Submitting => {
                writeln!(self.err, "{}", view.trigger_label())?;
                self.err.flush()?;
            }
            InteractionState::Succeeded => {
                if let Some(response) = &view.response {
                    writeln!(self.out, "Response:")?;
                    writeln!(self.out, "{}", response)?;
                    if !view.sources.is_empty() {
                        writeln!(self.out, "\nSources:")?;
                        for src in &view.sources {
                            writeln!(self.out, "  {}", src)?;
                        }
                    }
                    self.out.flush()?;
                }
            }
            InteractionState::Failed => {
                if let Some(error) = &view.error {
                    writeln!(self.err, "{}", error)?;
                    self.err.flush()?;
                }
            }
        }

        self.last = Some(view.clone());
        Ok(())
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}
