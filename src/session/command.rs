use std::fmt;

/// Operator commands, one key each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleTurbo,
    Stop,
    Abort,
    /// Acquire 1 to 9 frames, then stop.
    Snap(u32),
    Continuous,
    Save,
    Help,
    Quit,
}

pub const MENU: &str = "\
GRAB CTL : [S]=stop, [1-9]=snap N, [G]=continuous, [A]=Abort
MISC     : [Q]or[ESC]=end,         [T]=Toggle TurboMode (if available), [@]=SaveToFile";

const ESC: char = '\u{1b}';

impl Command {
    pub fn parse(key: char) -> Option<Self> {
        match key {
            'T' | 't' => Some(Command::ToggleTurbo),
            'S' | 's' | '0' => Some(Command::Stop),
            'A' | 'a' => Some(Command::Abort),
            '1'..='9' => key.to_digit(10).map(Command::Snap),
            'G' | 'g' => Some(Command::Continuous),
            '@' => Some(Command::Save),
            '?' => Some(Command::Help),
            ESC | 'Q' | 'q' => Some(Command::Quit),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ToggleTurbo => write!(f, "toggle turbo"),
            Command::Stop => write!(f, "stop"),
            Command::Abort => write!(f, "abort"),
            Command::Snap(n) => write!(f, "snap {}", n),
            Command::Continuous => write!(f, "continuous"),
            Command::Save => write!(f, "save"),
            Command::Help => write!(f, "help"),
            Command::Quit => write!(f, "quit"),
        }
    }
}
