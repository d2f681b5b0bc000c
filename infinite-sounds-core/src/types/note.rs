use crate::types::mode::{self, Mode};
use std::fmt;

/// An absolute pitch: a pitch class (0-11 chromatic representation) in an
/// octave, optionally carrying the mode it establishes when used as a clef.
/// 0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbsNote {
    pub num: i32,
    pub octave: i32,
    pub mode: Option<Mode>,
    /// Frozen notes are not transposed by enclosing clefs.
    pub frozen: bool,
    accidental: AccidentalPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum AccidentalPreference {
    Sharp,
    Flat,
    Natural,
}

/// Octave used when a note is written without one.
pub const DEFAULT_OCTAVE: i32 = 4;

/// Pitch class of a tone spelled as a letter with an optional `#` or `b`.
/// `Cb` and `B#` fall outside 0-11 and are carried into the next octave by
/// [`AbsNote::new`].
pub fn tone_number(tone: &str) -> Option<i32> {
    let mut chars = tone.chars();
    let base = match chars.next()?.to_ascii_lowercase() {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };
    let accidental = match chars.next() {
        None => 0,
        Some('#') => 1,
        Some('b') => -1,
        Some(_) => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(base + accidental)
}

fn tone_name(num: i32, accidental: AccidentalPreference) -> &'static str {
    const SHARPS: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    const FLATS: [&str; 12] = [
        "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
    ];
    let index = num.rem_euclid(12) as usize;
    match accidental {
        AccidentalPreference::Flat => FLATS[index],
        _ => SHARPS[index],
    }
}

impl AbsNote {
    /// Create a note from a pitch class and octave. Pitch classes outside
    /// 0-11 are carried into the neighbouring octave. `None` when the
    /// absolute number does not fit an `i32`.
    pub fn new(num: i32, octave: i32, mode: Option<Mode>, frozen: bool) -> Option<Self> {
        let absolute = octave.checked_mul(12)?.checked_add(num)?;
        Some(Self::from_absolute(absolute, mode, frozen))
    }

    /// Parse a spelled tone such as `C#` or `bb`.
    pub fn from_tone(
        tone: &str,
        octave: Option<i32>,
        mode: Option<Mode>,
        frozen: bool,
    ) -> Option<Self> {
        let num = tone_number(tone)?;
        let accidental = match tone.chars().nth(1) {
            Some('#') => AccidentalPreference::Sharp,
            Some('b') => AccidentalPreference::Flat,
            _ => AccidentalPreference::Natural,
        };
        let mut note = Self::new(num, octave.unwrap_or(DEFAULT_OCTAVE), mode, frozen)?;
        note.accidental = accidental;
        Some(note)
    }

    /// Create a note from its absolute number, `octave * 12 + pitch class`.
    pub fn from_absolute(absolute: i32, mode: Option<Mode>, frozen: bool) -> Self {
        AbsNote {
            num: absolute.rem_euclid(12),
            octave: absolute.div_euclid(12),
            mode,
            frozen,
            accidental: AccidentalPreference::Natural,
        }
    }

    /// Absolute number of this note, `octave * 12 + pitch class`. C4 is 48.
    pub fn absolute(&self) -> i32 {
        self.octave * 12 + self.num
    }

    /// Transpose by a number of semitones, keeping mode and frozen flag.
    /// `None` when the result leaves the representable range.
    pub fn transpose(&self, semitones: i32) -> Option<Self> {
        if semitones == 0 {
            return Some(*self);
        }
        let absolute = self.absolute().checked_add(semitones)?;
        let mut note = Self::from_absolute(absolute, self.mode, self.frozen);
        // Keep the flat spelling only for notes spelled flat
        if self.accidental == AccidentalPreference::Flat {
            note.accidental = AccidentalPreference::Flat;
        }
        Some(note)
    }

    pub fn with_mode(&self, mode: Option<Mode>) -> Self {
        AbsNote { mode, ..*self }
    }

    pub fn frozen(&self) -> Self {
        AbsNote {
            frozen: true,
            ..*self
        }
    }
}

impl fmt::Display for AbsNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frozen {
            write!(f, "!")?;
        }
        write!(f, "{}{}", tone_name(self.num, self.accidental), self.octave)?;
        if let Some(mode) = self.mode {
            write!(f, "{}", mode)?;
        }
        Ok(())
    }
}

/// A pitch relative to the enclosing clef: chromatic steps, mode steps and
/// scale degrees of the clef's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelNote {
    pub twelve: i32,
    pub mode: i32,
    pub seven: i32,
}

impl RelNote {
    pub fn new(twelve: i32, mode: i32, seven: i32) -> Self {
        RelNote {
            twelve,
            mode,
            seven,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == RelNote::default()
    }

    /// Resolve against an absolute key: chromatic steps are added directly,
    /// scale degrees through the key's mode, mode steps by switching the
    /// key's mode and adding the carried hashes.
    pub fn resolve(&self, key: &AbsNote) -> Option<AbsNote> {
        let mut absolute = key.absolute().checked_add(self.twelve)?;
        if self.seven != 0 {
            absolute = absolute.checked_add(mode::to_twelve(key.mode, self.seven)?)?;
        }
        let mut key_mode = key.mode;
        if self.mode != 0 {
            let (next, hashes) = mode::switch_mode(key.mode, self.mode)?;
            absolute = absolute.checked_add(hashes)?;
            key_mode = Some(next);
        }
        Some(AbsNote::from_absolute(absolute, key_mode, key.frozen))
    }

    pub fn checked_add(self, other: RelNote) -> Option<RelNote> {
        Some(RelNote::new(
            self.twelve.checked_add(other.twelve)?,
            self.mode.checked_add(other.mode)?,
            self.seven.checked_add(other.seven)?,
        ))
    }

    pub fn checked_sub(self, other: RelNote) -> Option<RelNote> {
        Some(RelNote::new(
            self.twelve.checked_sub(other.twelve)?,
            self.mode.checked_sub(other.mode)?,
            self.seven.checked_sub(other.seven)?,
        ))
    }
}

impl fmt::Display for RelNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.seven)?;
        if self.twelve > 0 {
            write!(f, "^+{}", self.twelve)?;
        } else if self.twelve < 0 {
            write!(f, "^-{}", -self.twelve)?;
        }
        if self.mode != 0 {
            write!(f, "%{}", self.mode)?;
        }
        Ok(())
    }
}

/// The merged note form used while a note is moved between the absolute
/// and relative encodings: an absolute number and mode plus pending
/// relative offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    pub num: i32,
    pub mode: Option<Mode>,
    pub twelve: i32,
    pub seven: i32,
    pub mode_shift: i32,
    pub closed: bool,
}

impl Note {
    pub fn from_abs(note: &AbsNote) -> Self {
        Note {
            num: note.absolute(),
            mode: note.mode,
            twelve: 0,
            seven: 0,
            mode_shift: 0,
            closed: note.frozen,
        }
    }

    pub fn has_offsets(&self) -> bool {
        self.twelve != 0 || self.seven != 0 || self.mode_shift != 0
    }

    /// Fold the pending offsets into the absolute number and mode.
    pub fn normalize_to_absolute(&self) -> Option<Note> {
        if !self.has_offsets() {
            return Some(*self);
        }
        let mut num = self.num.checked_add(self.twelve)?;
        if self.seven != 0 {
            num = num.checked_add(mode::to_twelve(self.mode, self.seven)?)?;
        }
        let mut note_mode = self.mode;
        if self.mode_shift != 0 {
            let (next, hashes) = mode::switch_mode(self.mode, self.mode_shift)?;
            num = num.checked_add(hashes)?;
            note_mode = Some(next);
        }
        Some(Note {
            num,
            mode: note_mode,
            twelve: 0,
            seven: 0,
            mode_shift: 0,
            closed: self.closed,
        })
    }

    pub fn to_abs(&self) -> Option<AbsNote> {
        let note = self.normalize_to_absolute()?;
        Some(AbsNote::from_absolute(note.num, note.mode, note.closed))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note({}", self.num)?;
        if let Some(mode) = self.mode {
            write!(f, "{}", mode)?;
        }
        write!(
            f,
            ", ~~{}, ~{}, %{})",
            self.twelve, self.seven, self.mode_shift
        )
    }
}

/// A tone letter relative to the enclosing absolute clef, `~E` or `~C#1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlphaNote {
    pub num: i32,
    pub octave: i32,
}

impl AlphaNote {
    pub fn from_tone(tone: &str, octave: i32) -> Option<Self> {
        tone_number(tone).map(|num| AlphaNote { num, octave })
    }

    /// Semitones above `key`: the upward distance between the tone letters
    /// plus whole octaves.
    pub fn semitones_above(&self, key: &AbsNote) -> Option<i32> {
        self.octave
            .checked_mul(12)?
            .checked_add((self.num - key.num).rem_euclid(12))
    }
}

impl fmt::Display for AlphaNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "~{}",
            tone_name(self.num, AccidentalPreference::Sharp)
        )?;
        if self.octave != 0 {
            write!(f, "{}", self.octave)?;
        }
        Ok(())
    }
}
