//! The seven diatonic modes and the arithmetic that moves pitches between
//! the 12-step chromatic scale and a mode's 7-step scale.
//!
//! Modes are ordered from the darkest (locrian, index 0) to the brightest
//! (lydian, index 6). Stepping one mode up from lydian wraps around to
//! locrian a semitone higher; that carried semitone is called a "hash".

use std::fmt;

/// Semitone offsets of the seven scale degrees, indexed by mode number.
const MODE_VECTORS: [[i32; 7]; 7] = [
    [0, 1, 3, 5, 6, 8, 10],  // locrian
    [0, 1, 3, 5, 7, 8, 10],  // phrygian
    [0, 2, 3, 5, 7, 8, 10],  // aeolian
    [0, 2, 3, 5, 7, 9, 10],  // dorian
    [0, 2, 4, 5, 7, 9, 10],  // mixolydian
    [0, 2, 4, 5, 7, 9, 11],  // ionian
    [0, 2, 4, 6, 7, 9, 11],  // lydian
];

const MODE_NAMES: [&str; 7] = ["loc", "phr", "aeo", "dor", "mix", "ion", "lyd"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    Locrian,
    Phrygian,
    Aeolian,
    Dorian,
    Mixolydian,
    Ionian,
    Lydian,
}

impl Mode {
    /// The mode assumed when a note carries none.
    pub const DEFAULT: Mode = Mode::Ionian;

    const ALL: [Mode; 7] = [
        Mode::Locrian,
        Mode::Phrygian,
        Mode::Aeolian,
        Mode::Dorian,
        Mode::Mixolydian,
        Mode::Ionian,
        Mode::Lydian,
    ];

    /// Parse a mode name. `maj` and `min` are accepted as ionian and aeolian.
    pub fn from_name(name: &str) -> Option<Mode> {
        match name {
            "loc" => Some(Mode::Locrian),
            "phr" => Some(Mode::Phrygian),
            "aeo" | "min" => Some(Mode::Aeolian),
            "dor" => Some(Mode::Dorian),
            "mix" => Some(Mode::Mixolydian),
            "ion" | "maj" => Some(Mode::Ionian),
            "lyd" => Some(Mode::Lydian),
            _ => None,
        }
    }

    pub fn is_mode_name(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// Mode for an index in `0..7`.
    pub fn from_index(index: i32) -> Option<Mode> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        MODE_NAMES[self as usize]
    }

    pub fn vector(self) -> &'static [i32; 7] {
        &MODE_VECTORS[self as usize]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Semitone vector of a mode, ionian when unset.
pub fn get_vector(mode: Option<Mode>) -> &'static [i32; 7] {
    mode.unwrap_or(Mode::DEFAULT).vector()
}

/// Mode number, ionian (5) when unset.
pub fn get_number(mode: Option<Mode>) -> i32 {
    mode.unwrap_or(Mode::DEFAULT).index()
}

/// Split a 12-step distance into scale degrees of `mode` plus the chromatic
/// rest (0 or 1) that does not fall on a degree.
///
/// Every mode vector has gaps of at most two semitones, so either the
/// distance or the distance minus one lands on a degree.
pub fn split_seven_twelve_scale(twelve_steps: i32, mode: Option<Mode>) -> (i32, i32) {
    if twelve_steps == 0 {
        return (0, 0);
    }
    let vector = get_vector(mode);
    let octaves = twelve_steps.div_euclid(12);
    let within = twelve_steps.rem_euclid(12);
    match vector.iter().position(|&step| step == within) {
        Some(degree) => (degree as i32 + octaves * 7, 0),
        None => {
            let degree = vector
                .iter()
                .rposition(|&step| step == within - 1)
                .unwrap_or(0);
            (degree as i32 + octaves * 7, 1)
        }
    }
}

/// Convert scale degrees of `mode` into semitones. Negative degrees walk
/// down through the previous octaves. `None` when the result leaves `i32`.
pub fn to_twelve(mode: Option<Mode>, seven_steps: i32) -> Option<i32> {
    let octaves = seven_steps.div_euclid(7);
    let degree = seven_steps.rem_euclid(7) as usize;
    octaves.checked_mul(12)?.checked_add(get_vector(mode)[degree])
}

/// Signed number of mode steps from the clef's mode to the child's mode.
/// A child without a mode follows its clef.
pub fn absolute_mode_distance(clef: Option<Mode>, child: Option<Mode>) -> i32 {
    match child {
        None => 0,
        Some(child) => child.index() - get_number(clef),
    }
}

/// Fold a mode distance into the nearest interval in `-3..=3`, returning
/// the folded distance and the hash carried by the fold.
pub fn convert_to_nearest_mode_distance(distance: i32) -> (i32, i32) {
    if distance < -3 {
        (7 + distance, 1)
    } else if distance > 3 {
        (distance - 7, -1)
    } else {
        (distance, 0)
    }
}

/// Step `mode` by `delta` positions around the circle of seven modes,
/// returning the new mode and the number of wraps (hashes) crossed.
pub fn switch_mode(mode: Option<Mode>, delta: i32) -> Option<(Mode, i32)> {
    let position = get_number(mode).checked_add(delta)?;
    let hashes = position.div_euclid(7);
    let mode = Mode::ALL[position.rem_euclid(7) as usize];
    Some((mode, hashes))
}
