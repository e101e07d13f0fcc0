//! Key tables and chord resolution
//!
//! A chord is every key held when the first of them is released. It is
//! looked up once, at that release; releasing the remaining keys produces
//! nothing until a key goes down again.

use heapless::Vec;

use super::command::{Command, CommandKind};
use crate::keys::{KeyEvent, KeyGroup, KeyId};

/// Keys that can be held at once
pub const MAX_CHORD: usize = 16;

/// One table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Keys that must all be held
    pub keys: &'static [KeyId],
    /// When set, exactly one extra key from this group must be held and its
    /// number becomes the command argument
    pub argument_group: Option<KeyGroup>,
    pub command: CommandKind,
}

impl KeyBinding {
    pub const fn chord(keys: &'static [KeyId], command: CommandKind) -> Self {
        Self {
            keys,
            argument_group: None,
            command,
        }
    }

    pub const fn with_argument(keys: &'static [KeyId], group: KeyGroup, command: CommandKind) -> Self {
        Self {
            keys,
            argument_group: Some(group),
            command,
        }
    }

    fn resolve(&self, held: &[KeyId]) -> Option<Command> {
        if !self.keys.iter().all(|key| held.contains(key)) {
            return None;
        }
        match self.argument_group {
            None if held.len() == self.keys.len() => Some(Command::new(self.command)),
            Some(group) if held.len() == self.keys.len() + 1 => {
                let extra = held.iter().find(|key| !self.keys.contains(*key))?;
                (extra.group == group)
                    .then(|| Command::with_argument(self.command, u16::from(extra.number)))
            }
            _ => None,
        }
    }
}

/// Named set of bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTable {
    pub name: &'static str,
    pub bindings: &'static [KeyBinding],
}

impl KeyTable {
    /// First binding matching exactly the held keys
    pub fn lookup(&self, held: &[KeyId]) -> Option<Command> {
        self.bindings.iter().find_map(|binding| binding.resolve(held))
    }
}

/// Turns key events into commands through a table
#[derive(Debug, Clone)]
pub struct KeyBinder {
    table: KeyTable,
    held: Vec<KeyId, MAX_CHORD>,
    armed: bool,
}

impl KeyBinder {
    pub fn new(table: KeyTable) -> Self {
        Self {
            table,
            held: Vec::new(),
            armed: false,
        }
    }

    pub fn table(&self) -> &KeyTable {
        &self.table
    }

    pub fn handle(&mut self, event: KeyEvent) -> Option<Command> {
        if event.pressed {
            if !self.held.contains(&event.key) && self.held.push(event.key).is_err() {
                warn!("chord too large, ignoring key {}", event.key.number);
            }
            self.armed = true;
            return None;
        }

        let command = if self.armed {
            self.armed = false;
            let command = self
                .table
                .lookup(&self.held)
                .unwrap_or_else(|| Command::passthrough(event.key.code()));
            debug!("chord of {} keys resolved", self.held.len());
            Some(command)
        } else {
            None
        };

        self.held.retain(|key| *key != event.key);
        command
    }

    /// Forget held keys
    pub fn reset(&mut self) {
        self.held.clear();
        self.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAV: KeyGroup = KeyGroup::Navigation;

    const LEFT: KeyId = KeyId::new(NAV, 0);
    const RIGHT: KeyId = KeyId::new(NAV, 1);
    const EXTRA: KeyId = KeyId::new(NAV, 2);

    static BINDINGS: [KeyBinding; 4] = [
        KeyBinding::chord(&[LEFT], CommandKind::WindowLeft),
        KeyBinding::chord(&[RIGHT], CommandKind::WindowRight),
        KeyBinding::chord(&[LEFT, RIGHT], CommandKind::Home),
        KeyBinding::with_argument(&[EXTRA], KeyGroup::Routing, CommandKind::CutBegin),
    ];

    static EXTRA_ROUTE: [KeyBinding; 1] =
        [KeyBinding::with_argument(&[], KeyGroup::Routing, CommandKind::Route)];

    fn binder() -> KeyBinder {
        KeyBinder::new(KeyTable {
            name: "test",
            bindings: &BINDINGS,
        })
    }

    #[test]
    fn test_single_key() {
        let mut binder = binder();
        assert_eq!(binder.handle(KeyEvent::press(NAV, 0)), None);
        assert_eq!(
            binder.handle(KeyEvent::release(NAV, 0)),
            Some(Command::new(CommandKind::WindowLeft))
        );
    }

    #[test]
    fn test_chord_fires_on_first_release() {
        let mut binder = binder();
        binder.handle(KeyEvent::press(NAV, 0));
        binder.handle(KeyEvent::press(NAV, 1));
        assert_eq!(
            binder.handle(KeyEvent::release(NAV, 1)),
            Some(Command::new(CommandKind::Home))
        );
        assert_eq!(binder.handle(KeyEvent::release(NAV, 0)), None);
    }

    #[test]
    fn test_argument_from_group() {
        let mut binder = binder();
        binder.handle(KeyEvent::press(NAV, 2));
        binder.handle(KeyEvent::press(KeyGroup::Routing, 17));
        assert_eq!(
            binder.handle(KeyEvent::release(KeyGroup::Routing, 17)),
            Some(Command::with_argument(CommandKind::CutBegin, 17))
        );
    }

    #[test]
    fn test_bare_argument_binding() {
        let mut binder = KeyBinder::new(KeyTable {
            name: "route",
            bindings: &EXTRA_ROUTE,
        });
        binder.handle(KeyEvent::press(KeyGroup::Routing, 3));
        assert_eq!(
            binder.handle(KeyEvent::release(KeyGroup::Routing, 3)),
            Some(Command::with_argument(CommandKind::Route, 3))
        );
    }

    #[test]
    fn test_unbound_chord_passes_through() {
        let mut binder = binder();
        binder.handle(KeyEvent::press(NAV, 9));
        let command = binder.handle(KeyEvent::release(NAV, 9)).unwrap();
        assert_eq!(command.kind, CommandKind::PassKey);
        assert_eq!(command.argument, Some(9));
        assert!(!command.universal);
    }
}
