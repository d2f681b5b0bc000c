//! Musical pitch and mode algebra.
//!
//! Inside a clef, absolute notes are rewritten into notes relative to the
//! clef's key, so that transposing the clef moves everything below it.
//! Frozen notes (`!C4`, `!~2`) opt out. The operators `* / ^+ ^- ^^ % ~ !`
//! get their note meaning here; `+` and `-` are rejected on notes.

use crate::interpreter::scope::Scope;
use crate::interpreter::table::{Order, RuleTable};
use crate::parser::ast::{ClefKey, Expr, Kind, Node, NodeType, Operator};
use crate::parser::error::{Result, SyntaxError};
use crate::types::mode;
use crate::types::note::{AbsNote, AlphaNote, Note, RelNote};
use std::sync::Arc;

const ADD_SUB_ERROR: &str =
    "Notes cannot be added or subtracted. Use the ^+ or ^- or ~ to do note step operations.";
const LOG2_ERROR: &str =
    "Notes can only be multiplied/divided by positive integers in the log2 scale: 1,2,4,8,16,...";
const SEVEN_INTEGER_ERROR: &str = "The 7scale operator '~' must have an integer on its right side.";
const SEVEN_TARGET_ERROR: &str =
    "The 7scale operator '~' must be performed on a relative or absolute note.";
const ALPHA_CLEF_ERROR: &str = "A relative alpha note must have an absolute clef note set.";
const RELATIVE_CLEF_ERROR: &str = "A relative note must have an absolute clef note set.";
const NOTE_RANGE_ERROR: &str = "Note is out of range.";

pub fn table() -> RuleTable {
    let mut table = RuleTable::new("Music");
    table.register(
        NodeType::ExpFun,
        Order::TopDown,
        "note(...) becomes a clef keyed on the note",
        Arc::new(exp_fun),
    );
    table.register(
        NodeType::AbsNote,
        Order::TopDown,
        "absolute notes under an absolute clef become merged notes",
        Arc::new(abs_note),
    );
    table.register(
        NodeType::AlphaNote,
        Order::TopDown,
        "~E style notes are measured from the clef's tone",
        Arc::new(alpha_note),
    );
    table.register(
        NodeType::Note,
        Order::BottomUp,
        "merged notes become relative to the nearest clef",
        Arc::new(merged_note),
    );
    table.register(
        NodeType::RelNote,
        Order::BottomUp,
        "relative notes need an absolute clef",
        Arc::new(rel_note),
    );

    table.register(
        NodeType::Operator(Operator::Mul),
        Order::BottomUp,
        "note*2^n shifts n octaves up",
        Arc::new(|expr, _| octave_scale(expr, 1)),
    );
    table.register(
        NodeType::Operator(Operator::Div),
        Order::BottomUp,
        "note/2^n shifts n octaves down",
        Arc::new(|expr, _| octave_scale(expr, -1)),
    );
    for op in [Operator::Add, Operator::Sub] {
        table.register(
            NodeType::Operator(op),
            Order::BottomUp,
            "rejects notes",
            Arc::new(no_note_arithmetic),
        );
    }
    table.register(
        NodeType::Operator(Operator::StepUp),
        Order::BottomUp,
        "chromatic steps up",
        Arc::new(|expr, _| chromatic_step(expr, 1)),
    );
    table.register(
        NodeType::Operator(Operator::StepDown),
        Order::BottomUp,
        "chromatic steps down",
        Arc::new(|expr, _| chromatic_step(expr, -1)),
    );
    table.register(
        NodeType::Operator(Operator::Octave),
        Order::BottomUp,
        "whole octaves",
        Arc::new(octave_step),
    );
    table.register(
        NodeType::Operator(Operator::Mod),
        Order::BottomUp,
        "mode steps",
        Arc::new(mode_step),
    );
    table.register(
        NodeType::Operator(Operator::Seven),
        Order::BottomUp,
        "scale degree steps",
        Arc::new(seven_step),
    );
    table.register(
        NodeType::Operator(Operator::Freeze),
        Order::BottomUp,
        "freezes a note into an absolute note",
        Arc::new(freeze),
    );
    table
}

/// Key of the innermost clef that has an absolute key.
pub fn nearest_absolute_clef(scope: Scope<'_>) -> Option<AbsNote> {
    scope.ancestors().find_map(|expr| match expr.kind {
        Kind::Clef(ClefKey::Absolute(key)) => Some(key),
        _ => None,
    })
}

/// Sum of the relative clef keys between a node and its nearest absolute
/// clef.
pub fn relative_subtracts(scope: Scope<'_>) -> Result<RelNote> {
    let mut total = RelNote::default();
    for expr in scope.ancestors() {
        match expr.kind {
            Kind::Clef(ClefKey::Absolute(_)) => break,
            Kind::Clef(ClefKey::Relative(key)) => total = in_range(total.checked_add(key))?,
            _ => {}
        }
    }
    Ok(total)
}

/// Note arithmetic that left the `i32` range.
fn in_range<T>(value: Option<T>) -> Result<T> {
    value.ok_or_else(|| SyntaxError::new(NOTE_RANGE_ERROR))
}

fn exp_fun(expr: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
    let Some((head, args)) = expr.body.items().split_first() else {
        return Ok(None);
    };
    let key = match head.kind() {
        Some(Kind::AbsNote(note)) => ClefKey::Absolute(*note),
        Some(Kind::RelNote(note)) => {
            if nearest_absolute_clef(scope).is_none() {
                return Err(SyntaxError::new(RELATIVE_CLEF_ERROR));
            }
            ClefKey::Relative(*note)
        }
        Some(Kind::AlphaNote(note)) => {
            let clef = nearest_absolute_clef(scope)
                .ok_or_else(|| SyntaxError::new(ALPHA_CLEF_ERROR))?;
            let relative = alpha_to_relative(note, &clef)?;
            ClefKey::Relative(in_range(relative.checked_sub(relative_subtracts(scope)?))?)
        }
        _ => return Ok(None),
    };
    Ok(Some(Node::expr(Kind::Clef(key), args.to_vec())))
}

fn alpha_to_relative(note: &AlphaNote, clef: &AbsNote) -> Result<RelNote> {
    let semitones = in_range(note.semitones_above(clef))?;
    let (seven, twelve) = mode::split_seven_twelve_scale(semitones, clef.mode);
    Ok(RelNote::new(twelve, 0, seven))
}

fn abs_note(expr: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
    let Kind::AbsNote(note) = &expr.kind else {
        return Ok(None);
    };
    if note.frozen || nearest_absolute_clef(scope).is_none() {
        return Ok(None);
    }
    Ok(Some(Node::expr(Kind::Note(Note::from_abs(note)), Vec::new())))
}

fn alpha_note(expr: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
    let Kind::AlphaNote(note) = &expr.kind else {
        return Ok(None);
    };
    let clef = nearest_absolute_clef(scope).ok_or_else(|| SyntaxError::new(ALPHA_CLEF_ERROR))?;
    let merged = Note {
        num: clef.absolute(),
        mode: None,
        twelve: in_range(note.semitones_above(&clef))?,
        seven: 0,
        mode_shift: 0,
        closed: false,
    };
    Ok(Some(Node::expr(Kind::Note(merged), Vec::new())))
}

fn parent_is_freeze(scope: Scope<'_>) -> bool {
    scope
        .parent()
        .is_some_and(|parent| parent.kind == Kind::Operator(Operator::Freeze))
}

fn merged_note(expr: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
    let Kind::Note(note) = &expr.kind else {
        return Ok(None);
    };
    // `!` resolves its operand itself
    if parent_is_freeze(scope) {
        return Ok(None);
    }
    let Some(key) = nearest_absolute_clef(scope) else {
        return Ok(Some(Node::abs_note(in_range(note.to_abs())?)));
    };
    let note = in_range(note.normalize_to_absolute())?;
    let num12 = in_range(note.num.checked_sub(key.absolute()))?;
    let mode_modi = mode::absolute_mode_distance(key.mode, note.mode);
    let (seven, twelve) = mode::split_seven_twelve_scale(num12, key.mode);
    let relative = RelNote::new(twelve, mode_modi, seven).checked_sub(relative_subtracts(scope)?);
    Ok(Some(Node::rel_note(in_range(relative)?)))
}

fn rel_note(_: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
    match nearest_absolute_clef(scope) {
        Some(_) => Ok(None),
        None => Err(SyntaxError::new(RELATIVE_CLEF_ERROR)),
    }
}

enum NoteOperand {
    Abs(AbsNote),
    Rel(RelNote),
}

fn note_operand(node: &Node) -> Option<NoteOperand> {
    match node.kind()? {
        Kind::AbsNote(note) => Some(NoteOperand::Abs(*note)),
        Kind::RelNote(note) => Some(NoteOperand::Rel(*note)),
        _ => None,
    }
}

/// Left note and right number of a `note op number` node.
fn note_and_number(expr: &Expr) -> Option<(NoteOperand, f64)> {
    let (left, right) = expr.operands()?;
    Some((note_operand(left)?, right.as_number()?))
}

fn require_integer(value: f64, op: Operator) -> Result<i32> {
    if value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) {
        Ok(value as i32)
    } else {
        Err(SyntaxError::new(format!(
            "The note operator '{}' must have an integer on its right side.",
            op
        )))
    }
}

/// Octaves in a positive power of two: 1 -> 0, 2 -> 1, 4 -> 2, ...
fn log2_integer(value: f64) -> Result<i32> {
    if value > 0.0 && value.fract() == 0.0 && value <= f64::from(i32::MAX) {
        let n = value as u32;
        if n.is_power_of_two() {
            return Ok(n.trailing_zeros() as i32);
        }
    }
    Err(SyntaxError::new(LOG2_ERROR))
}

fn with_note(note: NoteOperand) -> Node {
    match note {
        NoteOperand::Abs(note) => Node::abs_note(note),
        NoteOperand::Rel(note) => Node::rel_note(note),
    }
}

fn octave_scale(expr: &Expr, direction: i32) -> Result<Option<Node>> {
    let Some((note, factor)) = note_and_number(expr) else {
        return Ok(None);
    };
    let octaves = log2_integer(factor)? * direction;
    shift_octaves(note, octaves).map(Some)
}

/// Whole octaves: twelve semitones on an absolute note, seven scale
/// degrees on a relative one.
fn shift_octaves(note: NoteOperand, octaves: i32) -> Result<Node> {
    let shifted = match note {
        NoteOperand::Abs(note) => octaves
            .checked_mul(12)
            .and_then(|steps| note.transpose(steps))
            .map(NoteOperand::Abs),
        NoteOperand::Rel(note) => octaves
            .checked_mul(7)
            .and_then(|steps| note.checked_add(RelNote::new(0, 0, steps)))
            .map(NoteOperand::Rel),
    };
    in_range(shifted).map(with_note)
}

fn no_note_arithmetic(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    if expr.body.iter().any(Node::is_note) {
        return Err(SyntaxError::new(ADD_SUB_ERROR));
    }
    Ok(None)
}

fn chromatic_step(expr: &Expr, direction: i32) -> Result<Option<Node>> {
    let Some((note, steps)) = note_and_number(expr) else {
        return Ok(None);
    };
    let op = if direction > 0 {
        Operator::StepUp
    } else {
        Operator::StepDown
    };
    let steps = require_integer(steps, op)? * direction;
    let shifted = match note {
        NoteOperand::Abs(note) => note.transpose(steps).map(NoteOperand::Abs),
        NoteOperand::Rel(note) => note
            .checked_add(RelNote::new(steps, 0, 0))
            .map(NoteOperand::Rel),
    };
    Ok(Some(with_note(in_range(shifted)?)))
}

fn octave_step(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let Some((note, octaves)) = note_and_number(expr) else {
        return Ok(None);
    };
    let octaves = require_integer(octaves, Operator::Octave)?;
    shift_octaves(note, octaves).map(Some)
}

fn mode_step(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let Some((note, steps)) = note_and_number(expr) else {
        return Ok(None);
    };
    let steps = require_integer(steps, Operator::Mod)?;
    match note {
        NoteOperand::Abs(note) if note.mode.is_none() => Ok(None),
        NoteOperand::Abs(note) => {
            let (next, hashes) = in_range(mode::switch_mode(note.mode, steps))?;
            let moved = in_range(note.with_mode(Some(next)).transpose(hashes))?;
            Ok(Some(Node::abs_note(moved)))
        }
        NoteOperand::Rel(note) => {
            let moved = in_range(note.checked_add(RelNote::new(0, steps, 0)))?;
            Ok(Some(Node::rel_note(moved)))
        }
    }
}

fn seven_step(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let Some((left, right)) = expr.operands() else {
        return Ok(None);
    };
    let steps = right
        .as_integer()
        .ok_or_else(|| SyntaxError::new(SEVEN_INTEGER_ERROR))?;
    if left.is_undefined() {
        return Ok(Some(Node::rel_note(RelNote::new(0, 0, steps))));
    }
    match note_operand(left) {
        Some(NoteOperand::Abs(note)) => {
            let semitones = in_range(mode::to_twelve(note.mode, steps))?;
            Ok(Some(Node::abs_note(in_range(note.transpose(semitones))?)))
        }
        Some(NoteOperand::Rel(note)) => {
            let moved = in_range(note.checked_add(RelNote::new(0, 0, steps)))?;
            Ok(Some(Node::rel_note(moved)))
        }
        None => Err(SyntaxError::new(SEVEN_TARGET_ERROR)),
    }
}

fn freeze(expr: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
    let Some((Node::Undefined, operand)) = expr.operands() else {
        return Ok(None);
    };
    let frozen = match operand.kind() {
        Some(Kind::Note(note)) => {
            let clef_mode = nearest_absolute_clef(scope).and_then(|key| key.mode);
            let abs = in_range(note.to_abs())?;
            abs.with_mode(abs.mode.or(clef_mode)).frozen()
        }
        Some(Kind::RelNote(note)) => {
            let key = nearest_absolute_clef(scope)
                .ok_or_else(|| SyntaxError::new(RELATIVE_CLEF_ERROR))?;
            let total = in_range(note.checked_add(relative_subtracts(scope)?))?;
            in_range(total.resolve(&key))?.frozen()
        }
        Some(Kind::AbsNote(note)) => note.frozen(),
        _ => return Ok(None),
    };
    Ok(Some(Node::abs_note(frozen)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::walker::interpret_node;
    use crate::parser::parse;
    use crate::types::mode::Mode;

    fn run(text: &str) -> Result<Node> {
        interpret_node(&parse(text)?, &table(), Scope::root())
    }

    fn abs(node: &Node) -> AbsNote {
        match node.kind() {
            Some(Kind::AbsNote(note)) => *note,
            _ => panic!("expected absolute note, got {}", node),
        }
    }

    fn rel(node: &Node) -> RelNote {
        match node.kind() {
            Some(Kind::RelNote(note)) => *note,
            _ => panic!("expected relative note, got {}", node),
        }
    }

    fn clef_body(node: &Node) -> Vec<Node> {
        match node.as_expr() {
            Some(expr) if matches!(expr.kind, Kind::Clef(_)) => expr.body.items().to_vec(),
            _ => panic!("expected clef, got {}", node),
        }
    }

    #[test]
    fn test_octave_multiply() {
        let note = abs(&run("C#4lyd*2").unwrap());
        assert_eq!(note.absolute(), 61);
        assert_eq!(note.mode, Some(Mode::Lydian));

        assert_eq!(abs(&run("C4*4").unwrap()).absolute(), 72);
        assert_eq!(abs(&run("C4/2").unwrap()).absolute(), 36);
        assert_eq!(abs(&run("C4*1").unwrap()).absolute(), 48);
    }

    #[test]
    fn test_octave_multiply_errors() {
        assert_eq!(run("C#4lyd*-2").unwrap_err().message, LOG2_ERROR);
        assert_eq!(run("C4*3").unwrap_err().message, LOG2_ERROR);
        assert_eq!(run("C4/0.5").unwrap_err().message, LOG2_ERROR);
    }

    #[test]
    fn test_add_sub_rejected() {
        assert_eq!(run("C#4lyd+4").unwrap_err().message, ADD_SUB_ERROR);
        assert_eq!(run("2-C4").unwrap_err().message, ADD_SUB_ERROR);
        // plain numbers are left for the math passes
        assert!(run("1+2").is_ok());
    }

    #[test]
    fn test_chromatic_and_octave_steps() {
        assert_eq!(abs(&run("A4^+1").unwrap()).absolute(), 58);
        assert_eq!(abs(&run("A4^-2").unwrap()).absolute(), 55);
        assert_eq!(abs(&run("A4^^-1").unwrap()).absolute(), 45);
        assert!(run("A4^+0.5").is_err());
    }

    #[test]
    fn test_mode_step() {
        let note = abs(&run("C4lyd%3").unwrap());
        assert_eq!(note.mode, Some(Mode::Aeolian));
        assert_eq!(note.absolute(), 49);

        // a note without mode is left alone
        let tree = parse("C4%1").unwrap();
        let result = interpret_node(&tree, &table(), Scope::root()).unwrap();
        assert!(result.is_same(&tree));
    }

    #[test]
    fn test_seven_operator() {
        // `C4~2` would read `~2` as a relative note, so the infix form
        // needs a space after the tilde
        assert_eq!(abs(&run("C4 ~ 2").unwrap()).absolute(), 52);
        assert_eq!(abs(&run("C4aeo~ 2").unwrap()).absolute(), 51);

        let body = clef_body(&run("C4(~ 3)").unwrap());
        assert_eq!(rel(&body[0]), RelNote::new(0, 0, 3));

        assert_eq!(run("C4 ~ 1.5").unwrap_err().message, SEVEN_INTEGER_ERROR);
        assert_eq!(run("sine ~ 1").unwrap_err().message, SEVEN_TARGET_ERROR);
    }

    #[test]
    fn test_clef_relativizes_notes() {
        let body = clef_body(&run("C4(E4, G4, C5, F#4)").unwrap());
        assert_eq!(rel(&body[0]), RelNote::new(0, 0, 2));
        assert_eq!(rel(&body[1]), RelNote::new(0, 0, 4));
        assert_eq!(rel(&body[2]), RelNote::new(0, 0, 7));
        // F# is F plus one chromatic step in C ionian
        assert_eq!(rel(&body[3]), RelNote::new(1, 0, 3));
    }

    #[test]
    fn test_clef_mode_distance() {
        let body = clef_body(&run("C4(D4dor)").unwrap());
        assert_eq!(rel(&body[0]), RelNote::new(0, -2, 1));
    }

    #[test]
    fn test_relative_clef_subtracts() {
        let outer = clef_body(&run("C4(~2(G4))").unwrap());
        let inner = clef_body(&outer[0]);
        assert_eq!(rel(&inner[0]), RelNote::new(0, 0, 2));
    }

    #[test]
    fn test_note_operators_inside_clef() {
        let body = clef_body(&run("C4(E4*2, E4^+1)").unwrap());
        assert_eq!(rel(&body[0]), RelNote::new(0, 0, 9));
        assert_eq!(rel(&body[1]), RelNote::new(1, 0, 2));
    }

    #[test]
    fn test_relative_note_operators() {
        let body = clef_body(&run("C4(E4/2, E4^^1, E4^-1, E4%1, ~2 ~ 1)").unwrap());
        assert_eq!(rel(&body[0]), RelNote::new(0, 0, -5));
        assert_eq!(rel(&body[1]), RelNote::new(0, 0, 9));
        assert_eq!(rel(&body[2]), RelNote::new(-1, 0, 2));
        assert_eq!(rel(&body[3]), RelNote::new(0, 1, 2));
        assert_eq!(rel(&body[4]), RelNote::new(0, 0, 3));
        assert_eq!(body[2].to_string(), "~2^-1");
        assert_eq!(body[3].to_string(), "~2%1");
    }

    #[test]
    fn test_note_range() {
        for text in [
            "C4^^1000000000",
            "C4^+2147483647",
            "C4 ~ 2147483647",
            "C4lyd%2147483647",
            "C4(~~2147483647 ^+ 1)",
            "C4(~0 ^^ -1000000000)",
            "C4(!~~2147483647)",
        ] {
            assert_eq!(run(text).unwrap_err().message, NOTE_RANGE_ERROR, "{}", text);
        }
        // large but representable steps are fine
        assert_eq!(abs(&run("C4^^1000000").unwrap()).absolute(), 12_000_048);
    }

    #[test]
    fn test_frozen_notes_ignore_clef() {
        let body = clef_body(&run("C4(!E4)").unwrap());
        let note = abs(&body[0]);
        assert!(note.frozen);
        assert_eq!(note.absolute(), 52);
    }

    #[test]
    fn test_freeze_operator() {
        let body = clef_body(&run("D4dor(!~2, ! F4)").unwrap());
        let from_rel = abs(&body[0]);
        assert!(from_rel.frozen);
        assert_eq!(from_rel.absolute(), 53);
        let from_note = abs(&body[1]);
        assert!(from_note.frozen);
        assert_eq!(from_note.absolute(), 53);
        assert_eq!(from_note.mode, Some(Mode::Dorian));
    }

    #[test]
    fn test_alpha_notes() {
        let body = clef_body(&run("D4(~C, ~E1)").unwrap());
        // C is a flattened seventh above D
        assert_eq!(rel(&body[0]), RelNote::new(1, 0, 5));
        assert_eq!(rel(&body[1]), RelNote::new(0, 0, 8));
        assert_eq!(run("~E").unwrap_err().message, ALPHA_CLEF_ERROR);
    }

    #[test]
    fn test_relative_note_needs_clef() {
        assert_eq!(run("~2").unwrap_err().message, RELATIVE_CLEF_ERROR);
        assert_eq!(run("~2(1)").unwrap_err().message, RELATIVE_CLEF_ERROR);
        assert!(run("C4(~2)").is_ok());
    }

    #[test]
    fn test_plain_values_are_shared() {
        let tree = parse("[1, 'a', sine(440)]").unwrap();
        let result = interpret_node(&tree, &table(), Scope::root()).unwrap();
        assert!(result.is_same(&tree));

        let number = Node::Number(1.0);
        assert!(interpret_node(&number, &table(), Scope::root())
            .unwrap()
            .is_same(&number));
    }
}
