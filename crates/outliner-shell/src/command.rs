//! Shell command parsing.
//!
//! | Command                    | Effect                                        |
//! |----------------------------|-----------------------------------------------|
//! | `show`                     | print the current view                        |
//! | `type <text>`              | insert text at the cursor                     |
//! | `enter`                    | soft break, or open a code block after a fence|
//! | `break`                    | hard break (split the block)                  |
//! | `back`                     | delete backward                               |
//! | `cursor <block> <offset>`  | place the cursor; block is `3` or `@<id>`      |
//! | `push`                     | focus the block under the cursor              |
//! | `pop`                      | focus the parent                              |
//! | `add`                      | append an empty child to the focus node       |
//! | `dump [path]`              | print (or write) the state dump               |
//! | `load <path>`              | replace the state from a dump file            |
//! | `gc`                       | drop unreachable nodes                        |
//! | `help`                     | list commands                                 |
//! | `quit`                     | leave                                         |

use std::path::PathBuf;
use std::str::FromStr;

use strum::{EnumString, IntoStaticStr, VariantNames};

/// Which block a `cursor` command refers to.
///
/// `@<prefix>` always names an id, so ids made only of digits stay reachable.
/// A bare token is an index when it parses as one, otherwise an id prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    Index(usize),
    /// Id or unique id prefix.
    Id(String),
}

impl BlockRef {
    fn parse(token: &str) -> Self {
        match token.strip_prefix('@') {
            Some(prefix) => BlockRef::Id(prefix.to_string()),
            None => token
                .parse()
                .map_or_else(|_| BlockRef::Id(token.to_string()), BlockRef::Index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Type(String),
    Enter,
    Break,
    Back,
    Cursor { block: BlockRef, offset: usize },
    Push,
    Pop,
    Add,
    Dump(Option<PathBuf>),
    Load(PathBuf),
    Gc,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Word {
    Show,
    Type,
    Enter,
    Break,
    Back,
    Cursor,
    Push,
    Pop,
    Add,
    Dump,
    Load,
    Gc,
    Help,
    #[strum(serialize = "quit", serialize = "exit")]
    Quit,
}

/// Error type for command parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?} (try `help`)")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("not a number: {0:?}")]
    BadNumber(String),
}

/// Names of every command, for `help`.
pub fn command_names() -> &'static [&'static str] {
    Word::VARIANTS
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse one input line. Blank lines parse as `show`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.trim().is_empty() {
            return Ok(Command::Show);
        }

        let (head, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        let word = Word::from_str(head).map_err(|_| CommandError::Unknown(head.to_string()))?;
        let name: &'static str = word.into();
        let missing = |what| CommandError::MissingArgument { command: name, what };

        let command = match word {
            Word::Show => Command::Show,
            // everything after the single separating space is literal text
            Word::Type if rest.is_empty() => return Err(missing("some text")),
            Word::Type => Command::Type(rest.to_string()),
            Word::Enter => Command::Enter,
            Word::Break => Command::Break,
            Word::Back => Command::Back,
            Word::Cursor => {
                let mut args = rest.split_whitespace();
                let block = args.next().ok_or_else(|| missing("a block"))?;
                let offset = args.next().ok_or_else(|| missing("an offset"))?;
                Command::Cursor {
                    block: BlockRef::parse(block),
                    offset: offset
                        .parse()
                        .map_err(|_| CommandError::BadNumber(offset.to_string()))?,
                }
            }
            Word::Push => Command::Push,
            Word::Pop => Command::Pop,
            Word::Add => Command::Add,
            Word::Dump => {
                let path = rest.trim();
                Command::Dump((!path.is_empty()).then(|| PathBuf::from(path)))
            }
            Word::Load => match rest.trim() {
                "" => return Err(missing("a path")),
                path => Command::Load(PathBuf::from(path)),
            },
            Word::Gc => Command::Gc,
            Word::Help => Command::Help,
            Word::Quit => Command::Quit,
        };
        Ok(command)
    }
}
