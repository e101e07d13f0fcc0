//! Commands delivered to the screen reader

/// What the host should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    LineUp,
    LineDown,
    WindowLeft,
    WindowRight,
    Top,
    Bottom,
    /// Return the window to the cursor
    Home,
    /// Move the cursor to the cell given as argument
    Route,
    /// Start a selection at the cell given as argument
    CutBegin,
    /// End a selection at the cell given as argument
    CutEnd,
    /// Describe the character under the cell given as argument
    DescribeCharacter,
    Help,
    Preferences,
    /// Type the dot pattern given as argument
    PassDots,
    /// Raw key passthrough; argument is the packed key code
    PassKey,
    /// The display changed size; argument is the new text column count
    Resize,
}

/// A resolved command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub kind: CommandKind,
    pub argument: Option<u16>,
    /// Bound through a key table (as opposed to a raw passthrough)
    pub universal: bool,
}

impl Command {
    pub const fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            argument: None,
            universal: true,
        }
    }

    pub const fn with_argument(kind: CommandKind, argument: u16) -> Self {
        Self {
            kind,
            argument: Some(argument),
            universal: true,
        }
    }

    pub const fn passthrough(code: u16) -> Self {
        Self {
            kind: CommandKind::PassKey,
            argument: Some(code),
            universal: false,
        }
    }

    pub const fn resize(columns: u8) -> Self {
        Self::with_argument(CommandKind::Resize, columns as u16)
    }
}
