//! Command grammar.
//!
//! A command is a verb character followed by an object character, an
//! optional argument, an optional `;id` suffix and a line ending:
//!
//! ```text
//! <verb><object>[<argument>][;<commandId>]<CR | CRLF>
//! ```
//!
//! The verb/object table below is the whole grammar. Anything outside it is
//! rejected before any device is touched.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::LineEnding;

/// Verb → allowed objects. `R` takes no object.
pub const GRAMMAR: &[(char, &[char])] = &[
    ('e', &['e', 'l', 'r', 's']),
    ('o', &['s', 'l', 'r']),
    ('c', &['s', 'l', 'r']),
    ('M', &['a', 'b', 'c', 'p']),
    ('m', &['a', 'b', 'c', 'p', 'H']),
    ('s', &['t']),
    ('r', &['a', 'b', 'c', 'B', 'e', 'i', 'o', 'p', 's', 't', 'v']),
    ('R', &[]),
    ('w', &['t']),
];

/// Command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `e`: expose sequence (Hartmann doors, then shutter).
    Expose,
    /// `o`: open a door.
    Open,
    /// `c`: close a door.
    Close,
    /// `M`: absolute piston move.
    MoveAbsolute,
    /// `m`: relative piston move (or home).
    MoveRelative,
    /// `s`: set the controller clock.
    SetTime,
    /// `r`: status report.
    Report,
    /// `R`: reboot.
    Reboot,
    /// `w`: stall the connection (extended revision only).
    Wait,
}

impl Verb {
    /// Look up a verb by its wire character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'e' => Some(Self::Expose),
            'o' => Some(Self::Open),
            'c' => Some(Self::Close),
            'M' => Some(Self::MoveAbsolute),
            'm' => Some(Self::MoveRelative),
            's' => Some(Self::SetTime),
            'r' => Some(Self::Report),
            'R' => Some(Self::Reboot),
            'w' => Some(Self::Wait),
            _ => None,
        }
    }

    /// Wire character.
    pub fn as_char(self) -> char {
        match self {
            Self::Expose => 'e',
            Self::Open => 'o',
            Self::Close => 'c',
            Self::MoveAbsolute => 'M',
            Self::MoveRelative => 'm',
            Self::SetTime => 's',
            Self::Report => 'r',
            Self::Reboot => 'R',
            Self::Wait => 'w',
        }
    }

    /// Objects this verb accepts.
    pub fn allowed_objects(self) -> &'static [char] {
        let verb = self.as_char();
        GRAMMAR.iter().find(|(v, _)| *v == verb).map_or(&[], |(_, objects)| objects)
    }

    /// Whether `object` is in this verb's allowed list.
    pub fn accepts(self, object: char) -> bool {
        self.allowed_objects().contains(&object)
    }
}

/// One of the three pneumatic doors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorId {
    /// Main shutter (`s`).
    Shutter,
    /// Left Hartmann door (`l`).
    Left,
    /// Right Hartmann door (`r`).
    Right,
}

impl DoorId {
    /// All doors in report order.
    pub const ALL: [Self; 3] = [Self::Shutter, Self::Left, Self::Right];

    /// Wire object character.
    pub fn as_char(self) -> char {
        match self {
            Self::Shutter => 's',
            Self::Left => 'l',
            Self::Right => 'r',
        }
    }

    fn from_object(object: char) -> Option<Self> {
        match object {
            's' => Some(Self::Shutter),
            'l' => Some(Self::Left),
            'r' => Some(Self::Right),
            _ => None,
        }
    }
}

/// One of the three collimator pistons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PistonId {
    /// Piston A.
    A,
    /// Piston B.
    B,
    /// Piston C.
    C,
}

impl PistonId {
    /// All pistons in report order.
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Upper-case letter used in `MRx` report bodies.
    pub fn report_letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }
}

/// Which pistons a move addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PistonSelector {
    /// A single piston.
    One(PistonId),
    /// All three pistons at once (`p`).
    All,
}

impl PistonSelector {
    fn from_object(object: char) -> Option<Self> {
        match object {
            'a' => Some(Self::One(PistonId::A)),
            'b' => Some(Self::One(PistonId::B)),
            'c' => Some(Self::One(PistonId::C)),
            'p' => Some(Self::All),
            _ => None,
        }
    }

    /// Pistons covered by this selector.
    pub fn pistons(self) -> &'static [PistonId] {
        match self {
            Self::One(PistonId::A) => &[PistonId::A],
            Self::One(PistonId::B) => &[PistonId::B],
            Self::One(PistonId::C) => &[PistonId::C],
            Self::All => &PistonId::ALL,
        }
    }
}

/// Expose sequence variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposeMode {
    /// `s`: open both Hartmann doors, then the shutter.
    Science,
    /// `l`: open left, close right, then open the shutter.
    LeftHartmann,
    /// `r`: close left, open right, then open the shutter.
    RightHartmann,
    /// `e`: close both Hartmann doors, then close the shutter.
    End,
}

/// What a report command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    /// `a`/`b`/`c`: one piston position.
    Piston(PistonId),
    /// `B`: boot time.
    BootTime,
    /// `e`: temperature and humidity probes.
    Environment,
    /// `i`: ion pump voltages.
    IonPumps,
    /// `o`: accelerometer.
    Accelerometer,
    /// `p`: door states and air pressure.
    Pneumatics,
    /// `s`: every category, one sentence each.
    Status,
    /// `t`: controller clock.
    Time,
    /// `v`: firmware version.
    Version,
}

impl ReportTarget {
    fn from_object(object: char) -> Option<Self> {
        match object {
            'a' => Some(Self::Piston(PistonId::A)),
            'b' => Some(Self::Piston(PistonId::B)),
            'c' => Some(Self::Piston(PistonId::C)),
            'B' => Some(Self::BootTime),
            'e' => Some(Self::Environment),
            'i' => Some(Self::IonPumps),
            'o' => Some(Self::Accelerometer),
            'p' => Some(Self::Pneumatics),
            's' => Some(Self::Status),
            't' => Some(Self::Time),
            'v' => Some(Self::Version),
            _ => None,
        }
    }
}

/// Typed operation carried by a validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run an expose sequence.
    Expose(ExposeMode),
    /// Open a door.
    Open(DoorId),
    /// Close a door.
    Close(DoorId),
    /// Move pistons to an absolute position.
    MoveAbsolute {
        /// Addressed pistons.
        pistons: PistonSelector,
        /// Target position in encoder units.
        position: i64,
    },
    /// Move pistons by a signed delta.
    MoveRelative {
        /// Addressed pistons.
        pistons: PistonSelector,
        /// Signed delta in encoder units.
        delta: i64,
    },
    /// Return all pistons to zero.
    Home,
    /// Set the controller clock.
    SetTime(DateTime<Utc>),
    /// Produce a status report.
    Report(ReportTarget),
    /// Reboot the controller.
    Reboot,
    /// Stall this connection before acknowledging.
    Wait(Duration),
}

impl Action {
    /// Build the typed action for an already-validated verb/object pair.
    ///
    /// Returns `None` for pairs outside [`GRAMMAR`] or for argument-carrying
    /// verbs (`M`, `m`, `s`, `w`), whose arguments are typed by the parser.
    pub(crate) fn for_object(verb: Verb, object: char) -> Option<Self> {
        match verb {
            Verb::Expose => match object {
                's' => Some(Self::Expose(ExposeMode::Science)),
                'l' => Some(Self::Expose(ExposeMode::LeftHartmann)),
                'r' => Some(Self::Expose(ExposeMode::RightHartmann)),
                'e' => Some(Self::Expose(ExposeMode::End)),
                _ => None,
            },
            Verb::Open => DoorId::from_object(object).map(Self::Open),
            Verb::Close => DoorId::from_object(object).map(Self::Close),
            Verb::Report => ReportTarget::from_object(object).map(Self::Report),
            Verb::Reboot => Some(Self::Reboot),
            Verb::MoveAbsolute | Verb::MoveRelative | Verb::SetTime | Verb::Wait => None,
        }
    }

    pub(crate) fn pistons(object: char) -> Option<PistonSelector> {
        PistonSelector::from_object(object)
    }

    /// Whether dispatching this action leaves an actuator transition to run.
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Self::Expose(_)
                | Self::Open(_)
                | Self::Close(_)
                | Self::MoveAbsolute { .. }
                | Self::MoveRelative { .. }
                | Self::Home
        )
    }
}

/// A validated command sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Verb.
    pub verb: Verb,
    /// Object character (`None` for reboot).
    pub object: Option<char>,
    /// Raw argument text, possibly empty.
    pub argument: String,
    /// Client-supplied correlation id, echoed in replies.
    pub command_id: Option<String>,
    /// Line ending the sentence arrived with.
    pub terminator: LineEnding,
    /// Typed operation.
    pub action: Action,
}

/// One inbound line after framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `!`: wake acknowledgment after a reboot.
    Wake,
    /// `q`: close the connection.
    Quit,
    /// Any other validated command.
    Command(Command),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_grammar_verb_round_trips() {
        for (c, _) in GRAMMAR {
            let verb = Verb::from_char(*c).expect("grammar verb should be known");
            assert_eq!(verb.as_char(), *c);
        }
    }

    #[test]
    fn every_non_argument_pair_has_an_action() {
        for (c, objects) in GRAMMAR {
            let verb = Verb::from_char(*c).expect("grammar verb should be known");
            for object in *objects {
                let typed = match verb {
                    Verb::MoveAbsolute | Verb::MoveRelative => {
                        *object == 'H' || Action::pistons(*object).is_some()
                    },
                    Verb::SetTime | Verb::Wait => true,
                    _ => Action::for_object(verb, *object).is_some(),
                };
                assert!(typed, "{c}{object} has no typed action");
            }
        }
    }

    #[test]
    fn home_is_only_valid_for_relative_moves() {
        assert!(Verb::MoveRelative.accepts('H'));
        assert!(!Verb::MoveAbsolute.accepts('H'));
    }

    #[test]
    fn reboot_accepts_no_object() {
        assert!(Verb::Reboot.allowed_objects().is_empty());
    }

    #[test]
    fn all_selector_covers_three_pistons() {
        assert_eq!(PistonSelector::All.pistons(), &PistonId::ALL);
        assert_eq!(PistonSelector::One(PistonId::B).pistons(), &[PistonId::B]);
    }
}
