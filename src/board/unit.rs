//! Unit kinds, sides, and base combat statistics.
//!
//! Arsenals are terrain, not units; see [`crate::board::terrain`].

/// One of the two players. The opposing side is the only notion of enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    North,
    South,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::North, Side::South];

    pub const fn opponent(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
        }
    }

    /// The territory a row belongs to: North holds `[0, rows/2)`.
    pub const fn territory_of(row: usize, rows: usize) -> Side {
        if row < rows / 2 {
            Side::North
        } else {
            Side::South
        }
    }

    /// Index for per-side storage.
    pub const fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::South => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Side::North => "NORTH",
            Side::South => "SOUTH",
        }
    }

    /// The single-character KFEN abbreviation of the side to move.
    pub const fn kfen_char(self) -> char {
        match self {
            Side::North => 'N',
            Side::South => 'S',
        }
    }

    pub fn from_kfen_char(c: char) -> Option<Side> {
        match c {
            'N' => Some(Side::North),
            'S' => Some(Side::South),
            _ => None,
        }
    }
}

/// The closed set of unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Infantry,
    Cavalry,
    Cannon,
    SwiftCannon,
    Relay,
    SwiftRelay,
}

impl UnitKind {
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Infantry,
        UnitKind::Cavalry,
        UnitKind::Cannon,
        UnitKind::SwiftCannon,
        UnitKind::Relay,
        UnitKind::SwiftRelay,
    ];

    pub const fn attack(self) -> i32 {
        match self {
            UnitKind::Infantry | UnitKind::Cavalry => 4,
            UnitKind::Cannon | UnitKind::SwiftCannon => 5,
            UnitKind::Relay | UnitKind::SwiftRelay => 0,
        }
    }

    pub const fn defense(self) -> i32 {
        match self {
            UnitKind::Infantry => 6,
            UnitKind::Cavalry => 5,
            UnitKind::Cannon | UnitKind::SwiftCannon => 8,
            UnitKind::Relay | UnitKind::SwiftRelay => 1,
        }
    }

    pub const fn movement(self) -> usize {
        match self {
            UnitKind::Infantry | UnitKind::Cannon | UnitKind::Relay => 1,
            UnitKind::Cavalry | UnitKind::SwiftCannon | UnitKind::SwiftRelay => 2,
        }
    }

    pub const fn range(self) -> usize {
        match self {
            UnitKind::Infantry | UnitKind::Cavalry => 2,
            UnitKind::Cannon | UnitKind::SwiftCannon => 3,
            UnitKind::Relay | UnitKind::SwiftRelay => 0,
        }
    }

    /// Relays extend LOC and keep moving (and defending) while offline.
    pub const fn is_relay(self) -> bool {
        matches!(self, UnitKind::Relay | UnitKind::SwiftRelay)
    }

    /// Mounted kinds are subject to the straight-line early-stop rule.
    pub const fn is_mounted(self) -> bool {
        self.movement() == 2
    }

    /// Combat units carry a nonzero attack value.
    pub const fn is_combat(self) -> bool {
        self.attack() > 0
    }

    /// The uppercase KFEN letter for this kind.
    pub const fn kfen_char(self) -> char {
        match self {
            UnitKind::Infantry => 'I',
            UnitKind::Cavalry => 'C',
            UnitKind::Cannon => 'K',
            UnitKind::SwiftCannon => 'W',
            UnitKind::Relay => 'R',
            UnitKind::SwiftRelay => 'X',
        }
    }

    /// Parses an uppercase KFEN letter. `A` is arsenal terrain, not a kind.
    pub fn from_kfen_char(c: char) -> Option<UnitKind> {
        match c {
            'I' => Some(UnitKind::Infantry),
            'C' => Some(UnitKind::Cavalry),
            'K' => Some(UnitKind::Cannon),
            'W' => Some(UnitKind::SwiftCannon),
            'R' => Some(UnitKind::Relay),
            'X' => Some(UnitKind::SwiftRelay),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            UnitKind::Infantry => "INFANTRY",
            UnitKind::Cavalry => "CAVALRY",
            UnitKind::Cannon => "CANNON",
            UnitKind::SwiftCannon => "SWIFT_CANNON",
            UnitKind::Relay => "RELAY",
            UnitKind::SwiftRelay => "SWIFT_RELAY",
        }
    }
}

/// A unit on the board, located by its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub kind: UnitKind,
    pub side: Side,
}

impl Unit {
    pub const fn new(kind: UnitKind, side: Side) -> Unit {
        Unit { kind, side }
    }

    /// KFEN letter: uppercase for North, lowercase for South.
    pub fn kfen_char(self) -> char {
        let c = self.kind.kfen_char();
        match self.side {
            Side::North => c,
            Side::South => c.to_ascii_lowercase(),
        }
    }
}
