//! Recorded input: a file of s-expressions, one event per form, replayed in order.
//!
//! ```text
//! (resize 320 200)
//! (frame 0)
//! (press left) (move 10 10) (move 60 10) (release left)
//! (scroll 4)
//! (key reload)
//! ```

use anyhow::Context;
use std::path::Path;

use crate::{
    input::{Button, InputEvent, Key},
    parser::{self, Lexeme, Parser},
};

pub fn parse(source: &str) -> parser::Result<Vec<InputEvent>> {
    let mut events = Vec::new();
    let mut parser = Parser::new(source);

    parser.forms(|p, head| {
        let event = match head.text.as_str() {
            "resize" => InputEvent::Resized {
                width: p.count()?,
                height: p.count()?,
            },
            "frame" => InputEvent::Frame { time: p.number()? },
            "press" => InputEvent::ButtonPressed(button(p)?),
            "release" => InputEvent::ButtonReleased(button(p)?),
            "move" => InputEvent::PointerMoved {
                x: p.number()?,
                y: p.number()?,
            },
            "scroll" => InputEvent::Scrolled { dy: p.number()? },
            "key" => InputEvent::KeyPressed(key(p)?),
            _ => return Err(unknown(p, head, "event")),
        };
        events.push(event);
        Ok(())
    })?;

    Ok(events)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<InputEvent>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input script `{}`", path.display()))?;
    parse(&source).with_context(|| format!("Failed to parse input script `{}`", path.display()))
}

fn button(p: &mut Parser) -> parser::Result<Button> {
    let name = p.ident()?;
    match name.text.as_str() {
        "left" => Ok(Button::Left),
        "right" => Ok(Button::Right),
        "middle" => Ok(Button::Middle),
        _ => Err(unknown(p, &name, "button")),
    }
}

fn key(p: &mut Parser) -> parser::Result<Key> {
    let name = p.ident()?;
    match name.text.as_str() {
        "reload" => Ok(Key::Reload),
        "escape" => Ok(Key::Escape),
        _ => Err(unknown(p, &name, "key")),
    }
}

fn unknown(p: &Parser, name: &Lexeme, what: &str) -> parser::Error {
    p.invalid(name, format!("unknown {} `{}`", what, name.text))
}
