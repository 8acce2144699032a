//! Message codec for the 24-bit broadcast slot.
//!
//! Each [`Label`] owns a residue class of the flag space: a flag belongs to
//! a label when `raw % stride == tag`. A label whose fields take `F` bits
//! gets a header of `24 - F` bits, so `stride = 2^(24 - F)` and the fields
//! ride in the quotient `raw / stride`. Tags are chosen so that no label's
//! residue class intersects another's; `tag_table_partitions_flag_space`
//! checks this for the whole table.
//!
//! On the wire a flag is `(raw + 1) ^ PROTOCOL_NONCE`. The bias keeps `0`
//! free to mean "no message". Changing the nonce or any tag is a breaking
//! protocol change.

use crate::error::CommsError;
use crate::types::{Direction, Location};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a broadcast flag.
pub const FLAG_BITS: u32 = 24;

/// Per-protocol-version XOR constant.
pub const PROTOCOL_NONCE: u32 = 0x5A3C71;

/// Most fields any label carries.
pub const MAX_FIELDS: usize = 3;

/// Field width of a wrapped coordinate.
pub const COORD_BITS: u32 = 7;

/// Largest value [`compress_influence`] produces.
pub const MAX_INFLUENCE_CODE: u32 = 15;

/// Every message kind the swarm understands.
///
/// Variants are declared in the same order as [`LABELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Enemy muckraker sighting: x, y, count.
    DangerInfo,
    /// Enemy center: x, y, influence code.
    EnemyEc,
    /// Neutral center: x, y, influence code.
    NeutralEc,
    /// Home relays a known center: x, y, safest heading (8 when none).
    EcUpdate,
    AttackLoc,
    CaptureNeutralEc,
    /// A center that now belongs to us.
    OurEc,
    SlanderersSeen,
    /// Safest heading, nearest edge heading, edge distance.
    SafeDirEdge,
    /// Attack commitment: strength, finishing flag.
    Attacking,
    Scout,
    Defend,
    DangerDir,
    Explore,
    Hide,
    Flee,
    Buff,
    CurrentlyDefending,
    Unclog,
}

/// Wire layout of one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpec {
    pub label: Label,
    /// Bit width of each field, in declared order.
    pub field_bits: &'static [u32],
    pub tag: u32,
}

impl LabelSpec {
    pub const fn arity(&self) -> usize {
        self.field_bits.len()
    }

    pub fn field_total_bits(&self) -> u32 {
        self.field_bits.iter().sum()
    }

    pub fn header_bits(&self) -> u32 {
        FLAG_BITS - self.field_total_bits()
    }

    pub fn stride(&self) -> u32 {
        1 << self.header_bits()
    }

    pub fn matches(&self, raw: u32) -> bool {
        raw % self.stride() == self.tag
    }
}

const COORDS_AND: [u32; 3] = [COORD_BITS, COORD_BITS, 4];

/// The label table, ordered by header length.
pub const LABELS: [LabelSpec; 19] = [
    LabelSpec { label: Label::DangerInfo, field_bits: &[COORD_BITS, COORD_BITS, 5], tag: 1 },
    LabelSpec { label: Label::EnemyEc, field_bits: &COORDS_AND, tag: 2 },
    LabelSpec { label: Label::NeutralEc, field_bits: &COORDS_AND, tag: 3 },
    LabelSpec { label: Label::EcUpdate, field_bits: &COORDS_AND, tag: 4 },
    LabelSpec { label: Label::AttackLoc, field_bits: &[COORD_BITS, COORD_BITS], tag: 5 },
    LabelSpec { label: Label::CaptureNeutralEc, field_bits: &[COORD_BITS, COORD_BITS], tag: 6 },
    LabelSpec { label: Label::OurEc, field_bits: &[COORD_BITS, COORD_BITS], tag: 7 },
    LabelSpec { label: Label::SlanderersSeen, field_bits: &[COORD_BITS, COORD_BITS], tag: 8 },
    LabelSpec { label: Label::SafeDirEdge, field_bits: &[3, 3, 6], tag: 9 },
    LabelSpec { label: Label::Attacking, field_bits: &[8, 1], tag: 10 },
    LabelSpec { label: Label::Scout, field_bits: &[3], tag: 11 },
    LabelSpec { label: Label::Defend, field_bits: &[3], tag: 12 },
    LabelSpec { label: Label::DangerDir, field_bits: &[3], tag: 13 },
    LabelSpec { label: Label::Explore, field_bits: &[], tag: 14 },
    LabelSpec { label: Label::Hide, field_bits: &[], tag: 15 },
    LabelSpec { label: Label::Flee, field_bits: &[], tag: 16 },
    LabelSpec { label: Label::Buff, field_bits: &[], tag: 17 },
    LabelSpec { label: Label::CurrentlyDefending, field_bits: &[], tag: 18 },
    LabelSpec { label: Label::Unclog, field_bits: &[], tag: 19 },
];

impl Label {
    pub fn spec(self) -> &'static LabelSpec {
        &LABELS[self as usize]
    }

    pub fn arity(self) -> usize {
        self.spec().arity()
    }

    pub fn all() -> impl Iterator<Item = Label> {
        LABELS.iter().map(|spec| spec.label)
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::DangerInfo => "DANGER_INFO",
            Label::EnemyEc => "ENEMY_EC",
            Label::NeutralEc => "NEUTRAL_EC",
            Label::EcUpdate => "EC_UPDATE",
            Label::AttackLoc => "ATTACK_LOC",
            Label::CaptureNeutralEc => "CAPTURE_NEUTRAL_EC",
            Label::OurEc => "OUR_EC",
            Label::SlanderersSeen => "SLANDERERS_SEEN",
            Label::SafeDirEdge => "SAFE_DIR_EDGE",
            Label::Attacking => "ATTACKING",
            Label::Scout => "SCOUT",
            Label::Defend => "DEFEND",
            Label::DangerDir => "DANGER_DIR",
            Label::Explore => "EXPLORE",
            Label::Hide => "HIDE",
            Label::Flee => "FLEE",
            Label::Buff => "BUFF",
            Label::CurrentlyDefending => "CURRENTLY_DEFENDING",
            Label::Unclog => "UNCLOG",
        }
    }

    /// Parse a label name, ignoring case and accepting `-` for `_`.
    pub fn from_name(name: &str) -> Option<Label> {
        let wanted = name.trim().to_ascii_uppercase().replace('-', "_");
        Label::all().find(|label| label.name() == wanted)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged variant record small enough for one slot.
///
/// Unused field positions are always zero, so equality compares only the
/// fields the message actually carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    label: Label,
    fields: [u32; MAX_FIELDS],
    len: u8,
}

impl Message {
    /// Build a message. Widths and arity are checked by [`encode`].
    pub fn new(label: Label, values: &[u32]) -> Self {
        let mut fields = [0; MAX_FIELDS];
        for (slot, value) in fields.iter_mut().zip(values) {
            *slot = *value;
        }
        Self {
            label,
            fields,
            len: values.len().min(u8::MAX as usize) as u8,
        }
    }

    pub fn bare(label: Label) -> Self {
        Self::new(label, &[])
    }

    pub fn with_direction(label: Label, direction: Direction) -> Self {
        Self::new(label, &[direction.ordinal() as u32])
    }

    pub fn with_location(label: Label, location: Location) -> Self {
        let (x, y) = location.wrapped();
        Self::new(label, &[x, y])
    }

    /// Location fields followed by one extra value.
    pub fn located(label: Label, location: Location, extra: u32) -> Self {
        let (x, y) = location.wrapped();
        Self::new(label, &[x, y, extra])
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn fields(&self) -> &[u32] {
        &self.fields[..(self.len as usize).min(MAX_FIELDS)]
    }

    pub fn field(&self, index: usize) -> Option<u32> {
        self.fields().get(index).copied()
    }

    /// First field read as a compass heading.
    pub fn direction(&self) -> Option<Direction> {
        self.field(0).and_then(Direction::from_ordinal)
    }

    /// First two fields read as a wrapped location, resolved near `receiver`.
    pub fn location(&self, receiver: Location) -> Option<Location> {
        match (self.field(0), self.field(1)) {
            (Some(x), Some(y)) => Some(Location::from_wrapped(x, y, receiver)),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.label, self.fields())
    }
}

/// Pack a message into a wire flag.
pub fn encode(message: &Message) -> Result<u32, CommsError> {
    let spec = message.label.spec();
    if message.len as usize != spec.arity() {
        return Err(CommsError::InvalidMessage(format!(
            "{} carries {} fields, got {}",
            message.label,
            spec.arity(),
            message.len
        )));
    }

    let mut packed = 0u32;
    let mut shift = 0;
    for (index, (&value, &bits)) in message.fields().iter().zip(spec.field_bits).enumerate() {
        if value >= 1 << bits {
            return Err(CommsError::InvalidMessage(format!(
                "{} field {} is {}, which needs more than {} bits",
                message.label, index, value, bits
            )));
        }
        packed |= value << shift;
        shift += bits;
    }

    let raw = packed * spec.stride() + spec.tag;
    Ok((raw + 1) ^ PROTOCOL_NONCE)
}

/// Unpack a wire flag.
pub fn decode(flag: u32) -> Result<Message, CommsError> {
    let biased = flag ^ PROTOCOL_NONCE;
    if flag == 0 || biased == 0 || biased > 1 << FLAG_BITS {
        return Err(CommsError::InvalidFlag(flag));
    }
    let raw = biased - 1;

    let spec = LABELS
        .iter()
        .find(|spec| spec.matches(raw))
        .ok_or(CommsError::InvalidFlag(flag))?;

    let mut rest = raw / spec.stride();
    let mut fields = [0; MAX_FIELDS];
    for (slot, &bits) in fields.iter_mut().zip(spec.field_bits) {
        let range = 1 << bits;
        *slot = rest % range;
        rest /= range;
    }

    Ok(Message {
        label: spec.label,
        fields,
        len: spec.arity() as u8,
    })
}

/// Decode, treating any unreadable flag as "no information".
pub fn try_decode(flag: u32) -> Option<Message> {
    decode(flag).ok()
}

/// Encode `message`, or the bare `fallback` if the message is malformed.
pub fn encode_or(message: &Message, fallback: Label) -> u32 {
    match encode(message) {
        Ok(flag) => flag,
        Err(err) => {
            tracing::warn!(%err, %fallback, "falling back to default message");
            // Bare labels always encode.
            encode(&Message::bare(fallback)).unwrap_or(0)
        }
    }
}

/// Log-scale influence code: `min(floor(log2(v)) + 1, 15)`, 0 for `v <= 0`.
pub fn compress_influence(influence: i32) -> u32 {
    if influence <= 0 {
        return 0;
    }
    (32 - (influence as u32).leading_zeros()).min(MAX_INFLUENCE_CODE)
}

/// Lower bound of the influence range a code stands for.
pub fn expand_influence(code: u32) -> i32 {
    match code {
        0 => 0,
        c => 1 << (c.min(MAX_INFLUENCE_CODE) - 1),
    }
}
