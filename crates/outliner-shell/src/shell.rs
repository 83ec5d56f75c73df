//! The line-driven application shell.
//!
//! Reads one [`Command`] per line, applies it to a [`Session`] over a
//! [`MemorySurface`], and re-renders the view whenever the session publishes
//! a new one.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use outliner_editor::{Cursor, EditingSurface, EditorError, KeyGesture, MemorySurface, Session, View};
use outliner_types::{Block, resolve_prefix};

use crate::command::{BlockRef, Command, CommandError, command_names};
use crate::config::ShellConfig;

/// Error type for shell commands.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("no block matches {0:?}")]
    NoSuchBlock(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W> {
    session: Session<MemorySurface>,
    config: ShellConfig,
    out: W,
    /// Views published by the session since the last render.
    pending: Rc<RefCell<Option<View>>>,
}

impl<W: Write> Shell<W> {
    pub fn new(config: ShellConfig, out: W) -> Result<Self, ShellError> {
        Self::with_session(Session::new(MemorySurface::new())?, config, out)
    }

    pub fn with_session(
        mut session: Session<MemorySurface>,
        config: ShellConfig,
        out: W,
    ) -> Result<Self, ShellError> {
        let pending: Rc<RefCell<Option<View>>> = Rc::default();
        let sink = Rc::clone(&pending);
        session.subscribe(move |view| *sink.borrow_mut() = Some(view.clone()));
        Ok(Self {
            session,
            config,
            out,
            pending,
        })
    }

    pub fn session(&self) -> &Session<MemorySurface> {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands until `quit` or end of input. Command errors are
    /// printed and the loop continues; output errors end it.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), ShellError> {
        self.render()?;
        self.prompt()?;
        for line in input.lines() {
            let line = line?;
            match self.run_line(&line) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(ShellError::Io(e)) => return Err(ShellError::Io(e)),
                Err(e) => {
                    tracing::debug!(line = %line, "command failed: {e}");
                    writeln!(self.out, "error: {e}")?;
                }
            }
            self.prompt()?;
        }
        Ok(())
    }

    /// Parse and apply one line.
    pub fn run_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let command: Command = line.parse()?;
        self.apply(command)
    }

    pub fn apply(&mut self, command: Command) -> Result<Flow, ShellError> {
        match command {
            Command::Show => self.render()?,
            Command::Type(text) => self.key(KeyGesture::Text(text))?,
            Command::Enter => self.key(KeyGesture::Enter)?,
            Command::Break => self.key(KeyGesture::ShiftEnter)?,
            Command::Back => self.key(KeyGesture::Backspace)?,
            Command::Cursor { block, offset } => {
                let index = self.block_index(&block)?;
                self.session
                    .surface_mut()
                    .set_selection(Cursor::new(index, offset))?;
                self.render()?;
            }
            Command::Push => self.key(KeyGesture::Push)?,
            Command::Pop => self.key(KeyGesture::Pop)?,
            Command::Add => {
                self.session.append_child()?;
                self.render_pending()?;
            }
            Command::Dump(path) => {
                let text = self.session.dump(self.config.pretty_dump)?;
                match path {
                    Some(path) => {
                        std::fs::write(&path, text)?;
                        tracing::info!(path = %path.display(), "state dumped");
                        writeln!(self.out, "wrote {}", path.display())?;
                    }
                    None => writeln!(self.out, "{text}")?,
                }
            }
            Command::Load(path) => {
                self.load_file(&path)?;
                self.render_pending()?;
            }
            Command::Gc => {
                let removed = self.session.sweep();
                writeln!(self.out, "removed {removed} unreachable node(s)")?;
            }
            Command::Help => {
                writeln!(self.out, "commands: {}", command_names().join(", "))?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Replace the state from a dump file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ShellError> {
        let text = std::fs::read_to_string(path)?;
        self.session.load(&text)?;
        tracing::info!(path = %path.display(), nodes = self.session.state().tree.len(), "state loaded");
        Ok(())
    }

    fn key(&mut self, gesture: KeyGesture) -> Result<(), ShellError> {
        self.session.key(gesture)?;
        self.render_pending()
    }

    fn block_index(&self, block: &BlockRef) -> Result<usize, ShellError> {
        let value = self.session.surface().value();
        match block {
            BlockRef::Index(i) if *i < value.len() => Ok(*i),
            BlockRef::Index(i) => Err(ShellError::NoSuchBlock(i.to_string())),
            BlockRef::Id(prefix) => {
                let id = resolve_prefix(value.iter().map(|b| &b.id), prefix)
                    .map_err(|e| ShellError::NoSuchBlock(e.to_string()))?;
                value
                    .iter()
                    .position(|b| b.id == id)
                    .ok_or_else(|| ShellError::NoSuchBlock(prefix.clone()))
            }
        }
    }

    fn prompt(&mut self) -> Result<(), ShellError> {
        write!(self.out, "{}", self.config.prompt)?;
        self.out.flush()?;
        Ok(())
    }

    /// Announce a focus change published by the session, then render.
    fn render_pending(&mut self) -> Result<(), ShellError> {
        let published = self.pending.borrow_mut().take();
        if let Some(view) = published {
            tracing::debug!(node = %view.node, blocks = view.batch.len(), "view published");
            writeln!(self.out, "-> {}", view.node.short())?;
        }
        self.render()
    }

    /// Print the title line and every block of the surface, marking the cursor.
    pub fn render(&mut self) -> Result<(), ShellError> {
        let view = self.session.view()?;
        match &view.title {
            Some(title) => writeln!(self.out, "# {}", escape(title))?,
            None => writeln!(self.out, "# (root)")?,
        }

        let surface = self.session.surface();
        let cursor = surface.selection();
        for (i, block) in surface.value().iter().enumerate() {
            let marker = if cursor.map(|c| c.block) == Some(i) { '>' } else { ' ' };
            let text = match cursor {
                Some(c) if c.block == i => with_caret(block, c.offset),
                _ => block.plain_text(),
            };
            writeln!(
                self.out,
                "{marker} [{i}] {} {}{}",
                block.id.short(),
                kind_prefix(block),
                escape(&text)
            )?;
        }
        Ok(())
    }
}

fn kind_prefix(block: &Block) -> String {
    if !block.kind.is_code() {
        return String::new();
    }
    format!("```{} ", block.language.as_deref().unwrap_or(""))
}

fn with_caret(block: &Block, offset: usize) -> String {
    let text = block.plain_text();
    let at = text.char_indices().nth(offset).map_or(text.len(), |(i, _)| i);
    format!("{}|{}", &text[..at], &text[at..])
}

fn escape(text: &str) -> String {
    text.replace('\n', "\\n")
}

impl<W> std::fmt::Debug for Shell<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
