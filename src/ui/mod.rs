pub mod messages;

pub use messages::{InputEvent, LoadCompletion, Message, ModalAction, OperationResult};

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::sync::mpsc;

const TICK_RATE: Duration = Duration::from_millis(250);

/// Translates a raw terminal event into the opaque taxonomy the event loop
/// dispatches. Rendering is a read-only consumer of application state and
/// lives outside this crate's scope (spec §1); this module only owns
/// getting messages onto the single-threaded queue.
fn translate_key(code: KeyCode) -> Option<InputEvent> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(InputEvent::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(InputEvent::Down),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter => Some(InputEvent::DrillIn),
        KeyCode::Left | KeyCode::Char('h') => Some(InputEvent::DrillOut),
        KeyCode::Esc => Some(InputEvent::Cancel),
        KeyCode::Backspace => Some(InputEvent::FilterBackspace),
        KeyCode::Char('/') => Some(InputEvent::FilterToggle),
        KeyCode::Char('q') => Some(InputEvent::Quit),
        KeyCode::Char(' ') => Some(InputEvent::PlayOrMark),
        KeyCode::Char(c) => Some(InputEvent::FilterChar(c)),
        _ => None,
    }
}

/// Polls terminal input on a blocking thread and forwards translated
/// messages onto `tx`, plus a steady tick for spinner frames (spec §5: all
/// suspension points besides message dispatch run off the UI thread).
pub fn spawn_input_pump(tx: mpsc::UnboundedSender<Message>) {
    tokio::task::spawn_blocking(move || loop {
        let timeout = TICK_RATE;
        match event::poll(timeout) {
            Ok(true) => {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if let Some(input) = translate_key(key.code) {
                        let quit = matches!(input, InputEvent::Quit);
                        if tx.send(Message::Input(input)).is_err() {
                            return;
                        }
                        if quit {
                            return;
                        }
                    }
                }
            }
            Ok(false) => {
                if tx.send(Message::Tick).is_err() {
                    return;
                }
            }
            Err(_) => return,
        }
    });
}
