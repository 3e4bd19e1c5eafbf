/// Console command parsing.
use std::fmt;

/// A parsed console command. Indices are 1-based as printed in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick a new root folder (clears the folder cache).
    Open(String),
    /// Navigate to a folder, keeping the cache.
    Cd(String),
    Up,
    Enter(usize),
    Crumb(usize),
    List,
    More,
    /// Change the search pattern; empty clears it.
    Find(String),
    Browse,
    Pick(usize),
    Details(usize),
    Reveal(usize),
    Notices,
    Dismiss(u64),
    Help,
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type `help` for commands)", self.0)
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Commands:
  open <path>     choose a new root folder
  cd <path>       go to a folder
  up              go to the parent folder
  enter <n>       open listed folder n
  crumb <n>       jump to breadcrumb segment n (clears the cache)
  ls              show the current listing
  more            show more rows
  find [text]     search below the current folder; bare `find` clears
  browse          return from search results to the listing
  pick <n>        open search match n
  details <n>     show metadata of row n
  reveal <n>      show row n in the file browser
  notices         list notices
  dismiss <id>    dismiss a notice
  quit            exit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let path = |rest: &str| -> Result<String, ParseError> {
            if rest.is_empty() {
                Err(ParseError(format!("`{word}` needs a path")))
            } else {
                Ok(rest.to_string())
            }
        };
        let index = |rest: &str| -> Result<usize, ParseError> {
            match rest.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ParseError(format!("`{word}` needs a row number"))),
            }
        };

        match word {
            "open" => Ok(Self::Open(path(rest)?)),
            "cd" => Ok(Self::Cd(path(rest)?)),
            "up" | ".." => Ok(Self::Up),
            "enter" => Ok(Self::Enter(index(rest)?)),
            "crumb" => Ok(Self::Crumb(index(rest)?)),
            "ls" => Ok(Self::List),
            "more" => Ok(Self::More),
            "find" => Ok(Self::Find(rest.to_string())),
            "browse" => Ok(Self::Browse),
            "pick" => Ok(Self::Pick(index(rest)?)),
            "details" => Ok(Self::Details(index(rest)?)),
            "reveal" => Ok(Self::Reveal(index(rest)?)),
            "notices" => Ok(Self::Notices),
            "dismiss" => rest
                .parse()
                .map(Self::Dismiss)
                .map_err(|_| ParseError("`dismiss` needs a notice id".into())),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "" => Err(ParseError("empty command".into())),
            other => Err(ParseError(format!("unknown command `{other}`"))),
        }
    }
}
