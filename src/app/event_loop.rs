use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::DefaultTerminal;

use crate::app::{App, Model};
use crate::nav::Navigator;

impl App {
    /// Run the main event loop on `nav` until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&self, nav: Navigator) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; docnav requires an interactive terminal")?;
        let size = terminal.size()?;
        let mut model = self.model(nav, (size.width, size.height));

        let result = self.event_loop(&mut terminal, &mut model);

        ratatui::restore();
        result
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let poll_ms = if needs_render { 0 } else { 250 };
            if event::poll(Duration::from_millis(poll_ms))? {
                if let Some(msg) = Self::handle_event(&event::read()?, model) {
                    tracing::trace!(frame = frame_idx, ?msg, "message");
                    self.dispatch(model, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while !model.should_quit && event::poll(Duration::from_millis(0))? {
                    if let Some(msg) = Self::handle_event(&event::read()?, model) {
                        drained += 1;
                        self.dispatch(model, msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    tracing::trace!(frame = frame_idx, drained, "drained events");
                }
            }

            if model.should_quit {
                break;
            }

            if needs_render {
                frame_idx += 1;
                let draw_scope = crate::perf::scope("frame.draw");
                terminal.draw(|frame| Self::view(model, frame))?;
                drop(draw_scope);
                needs_render = false;
            }
        }
        Ok(())
    }
}
