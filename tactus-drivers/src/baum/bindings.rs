//! Built-in Baum key tables

use tactus_core::commands::{CommandKind, KeyBinding, KeyTable};
use tactus_core::keys::{KeyGroup, KeyId};

use super::keys::TOP_BASE;

const fn display_key(n: u8) -> KeyId {
    KeyId::new(KeyGroup::Navigation, TOP_BASE + n - 1)
}

const D1: KeyId = display_key(1);
const D2: KeyId = display_key(2);
const D3: KeyId = display_key(3);
const D4: KeyId = display_key(4);
const D5: KeyId = display_key(5);
const D6: KeyId = display_key(6);

const DEFAULT_BINDINGS: [KeyBinding; 14] = [
    KeyBinding::chord(&[D1], CommandKind::LineUp),
    KeyBinding::chord(&[D3], CommandKind::LineDown),
    KeyBinding::chord(&[D2], CommandKind::WindowLeft),
    KeyBinding::chord(&[D5], CommandKind::WindowRight),
    KeyBinding::chord(&[D4], CommandKind::Top),
    KeyBinding::chord(&[D6], CommandKind::Bottom),
    KeyBinding::chord(&[D2, D5], CommandKind::Home),
    KeyBinding::chord(&[D1, D4], CommandKind::Help),
    KeyBinding::chord(&[D3, D6], CommandKind::Preferences),
    KeyBinding::with_argument(&[], KeyGroup::Routing, CommandKind::Route),
    KeyBinding::with_argument(&[], KeyGroup::HorizontalSensors, CommandKind::Route),
    KeyBinding::with_argument(&[], KeyGroup::StatusRouting, CommandKind::DescribeCharacter),
    KeyBinding::with_argument(&[D1], KeyGroup::Routing, CommandKind::CutBegin),
    KeyBinding::with_argument(&[D3], KeyGroup::Routing, CommandKind::CutEnd),
];

const VARIO_BINDINGS: [KeyBinding; 14] = [
    KeyBinding::chord(&[D1], CommandKind::WindowLeft),
    KeyBinding::chord(&[D6], CommandKind::WindowRight),
    KeyBinding::chord(&[D2], CommandKind::LineUp),
    KeyBinding::chord(&[D5], CommandKind::LineDown),
    KeyBinding::chord(&[D3], CommandKind::Top),
    KeyBinding::chord(&[D4], CommandKind::Bottom),
    KeyBinding::chord(&[D1, D6], CommandKind::Home),
    KeyBinding::chord(&[D2, D5], CommandKind::Help),
    KeyBinding::chord(&[D3, D4], CommandKind::Preferences),
    KeyBinding::with_argument(&[], KeyGroup::Routing, CommandKind::Route),
    KeyBinding::with_argument(&[], KeyGroup::HorizontalSensors, CommandKind::Route),
    KeyBinding::with_argument(&[], KeyGroup::StatusRouting, CommandKind::DescribeCharacter),
    KeyBinding::with_argument(&[D1], KeyGroup::Routing, CommandKind::CutBegin),
    KeyBinding::with_argument(&[D3], KeyGroup::Routing, CommandKind::CutEnd),
];

/// Display keys D1..D3 left of the cells and D4..D6 right of them
pub const DEFAULT: KeyTable = KeyTable {
    name: "default",
    bindings: &DEFAULT_BINDINGS,
};

/// Vario layout: D1/D6 pan, D2/D5 move by line
pub const VARIO: KeyTable = KeyTable {
    name: "vario",
    bindings: &VARIO_BINDINGS,
};

/// Table for a model, honouring the `variokeys` override
pub fn select(vario_model: bool, variokeys: bool) -> KeyTable {
    if vario_model || variokeys {
        VARIO
    } else {
        DEFAULT
    }
}
