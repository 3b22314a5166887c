/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
use std::io::{stdout, Write};
use std::time::Duration;

use ansi_term::Color::RGB;
use ansi_term::Style;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use symposium::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{trace, warn};

use crate::{PADLEFT, PADTOP, TITLE};

const REFRESH: Duration = Duration::from_millis(100);

struct Seat {
    name: String,
    state: PhilosopherState,
    detail: String,
    meals: u64,
}

/// Live view of a table, repainted from broker events.
pub struct Board {
    table: Table,
    seats: Vec<Seat>,
    held: Vec<bool>,
    lagged: u64,
}

impl Board {
    pub fn new(table: Table) -> Self {
        let seats = table
            .philosophers()
            .iter()
            .map(|p| Seat {
                name: p.name().to_string(),
                state: p.state(),
                detail: String::new(),
                meals: p.meals(),
            })
            .collect();
        let held = vec![false; table.len()];
        Self {
            table,
            seats,
            held,
            lagged: 0,
        }
    }

    /// Applies events as they arrive and repaints on a fixed cadence until the
    /// broker goes away or the task is aborted.
    pub async fn run(mut self, mut events: Receiver<TableEvent>) {
        let mut ticker = tokio::time::interval(REFRESH);
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => self.apply(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "board fell behind the table");
                        self.lagged += skipped;
                        self.resync();
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.paint() {
                        warn!("Failed to paint the board: {e}");
                    }
                }
            }
        }
    }

    fn apply(&mut self, event: TableEvent) {
        trace!(?event, "board");
        match event {
            TableEvent::Philosopher { id, state, detail } => {
                if let Some(seat) = self.seats.get_mut(id) {
                    seat.state = state;
                    seat.detail = detail.unwrap_or_default();
                    seat.meals = self.table.philosophers()[id].meals();
                }
            }
            TableEvent::Chopstick { id, held } => {
                if let Some(slot) = self.held.get_mut(id) {
                    *slot = held;
                }
            }
        }
    }

    /// Reads current state straight from the table after missed events.
    fn resync(&mut self) {
        for (seat, handle) in self.seats.iter_mut().zip(self.table.philosophers()) {
            seat.state = handle.state();
            seat.meals = handle.meals();
        }
        for (slot, chopstick) in self.held.iter_mut().zip(self.table.chopsticks()) {
            *slot = chopstick.is_held();
        }
    }

    fn paint(&self) -> std::io::Result<()> {
        let title = Style::new().bold().fg(RGB(255, 141, 204));
        let dim = Style::new().fg(RGB(96, 96, 96));

        let mut stdout = stdout();
        let mut row = PADTOP;
        queue!(stdout, cursor::MoveTo(PADLEFT, row), Clear(ClearType::UntilNewLine))?;
        write!(stdout, "{}", title.paint(TITLE))?;
        row += 1;
        queue!(stdout, cursor::MoveTo(PADLEFT, row), Clear(ClearType::UntilNewLine))?;
        write!(
            stdout,
            "{}",
            dim.paint(format!(
                "strategy: {}   status: {}   meals: {}   (q to quit)",
                self.table.strategy(),
                status_label(self.table.status()),
                self.table.total_meals()
            ))
        )?;
        row += 2;

        for seat in &self.seats {
            queue!(stdout, cursor::MoveTo(PADLEFT, row), Clear(ClearType::UntilNewLine))?;
            write!(
                stdout,
                "{:<14} {} {:>5}  {}",
                seat.name,
                state_style(seat.state).paint(format!("{:<8}", seat.state.to_string())),
                seat.meals,
                dim.paint(seat.detail.as_str())
            )?;
            row += 1;
        }

        row += 1;
        queue!(stdout, cursor::MoveTo(PADLEFT, row), Clear(ClearType::UntilNewLine))?;
        let sticks: Vec<String> = self
            .held
            .iter()
            .enumerate()
            .map(|(id, held)| {
                if *held {
                    format!("{}", Style::new().fg(RGB(253, 209, 234)).paint(format!("{id}:|")))
                } else {
                    format!("{}", dim.paint(format!("{id}:.")))
                }
            })
            .collect();
        write!(stdout, "chopsticks  {}", sticks.join(" "))?;

        if let Some(waiter) = self.table.waiter() {
            row += 1;
            queue!(stdout, cursor::MoveTo(PADLEFT, row), Clear(ClearType::UntilNewLine))?;
            write!(
                stdout,
                "waiter      {}/{} admitted, peak {}",
                waiter.admitted(),
                waiter.capacity(),
                waiter.peak_admitted()
            )?;
        }
        if self.lagged > 0 {
            row += 1;
            queue!(stdout, cursor::MoveTo(PADLEFT, row), Clear(ClearType::UntilNewLine))?;
            write!(stdout, "{}", dim.paint(format!("skipped {} events", self.lagged)))?;
        }
        stdout.flush()
    }
}

fn state_style(state: PhilosopherState) -> Style {
    match state {
        PhilosopherState::Thinking => Style::new().fg(RGB(130, 170, 255)),
        PhilosopherState::Hungry => Style::new().fg(RGB(255, 203, 107)),
        PhilosopherState::Eating => Style::new().bold().fg(RGB(195, 232, 141)),
        PhilosopherState::Stopped => Style::new().fg(RGB(96, 96, 96)),
    }
}

fn status_label(status: TableStatus) -> &'static str {
    match status {
        TableStatus::Idle => "idle",
        TableStatus::Running => "running",
        TableStatus::Finished => "finished",
        TableStatus::Stopped => "stopped",
    }
}
