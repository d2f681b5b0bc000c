use infinite_sounds_core::interpreter::{run_pass, static_tables};
use infinite_sounds_core::parser::{Array, Kind, Operator, Token};
use infinite_sounds_core::types::mode::switch_mode;
use infinite_sounds_core::{
    interpret, parse, static_interpret, tokenize, InterpretContext, Interpreter, Mode, Node,
    RelNote,
};

fn clef_body(node: &Node) -> Vec<Node> {
    match node.as_expr() {
        Some(expr) if matches!(expr.kind, Kind::Clef(_)) => expr.body.items().to_vec(),
        _ => panic!("expected a clef, got {}", node),
    }
}

#[test]
fn test_tokenize_then_parse_is_deterministic() {
    let text = "C4(E4, ~2, random(1, 5)) > [sine(440hz), square] | gain(--level)";
    assert_eq!(tokenize(text), tokenize(text));
    assert_eq!(parse(text).unwrap(), parse(text).unwrap());
}

#[test]
fn test_precedence() {
    assert_eq!(parse("1+2*3").unwrap().to_string(), "(1 + (2 * 3))");
    let node = parse("a-2").unwrap();
    let expr = node.as_expr().unwrap();
    assert_eq!(expr.kind, Kind::Operator(Operator::Sub));
    assert_eq!(expr.body.get(1), Some(&Node::Number(2.0)));
}

#[test]
fn test_holes_in_arrays() {
    match parse("[1,2,,'hello']").unwrap() {
        Node::Array(array) => {
            assert_eq!(array.len(), 4);
            assert_eq!(array.get(2), Some(&Node::Undefined));
            assert_eq!(array.get(3), Some(&Node::text("hello")));
        }
        other => panic!("expected array, got {}", other),
    }
}

#[test]
fn test_structural_errors() {
    assert_eq!(parse("(1,2").unwrap_err().message, "Forgot to close (-block.");
    assert_eq!(
        parse("(1,2)").unwrap_err().message,
        "(block, with, comma, is, not, allowed)"
    );
    assert_eq!(
        parse("1 &").unwrap_err().message,
        "InfiniteSound: Illegal token: &"
    );
}

#[test]
fn test_plain_number_survives_every_static_pass() {
    let number = Node::Number(42.0);
    for table in static_tables() {
        assert!(run_pass(&number, table).unwrap().is_same(&number));
    }
}

#[test]
fn test_dirty_and_clean_arrays() {
    let clean = parse("[1,2,3]").unwrap();
    assert!(matches!(&clean, Node::Array(array) if !array.is_dirty()));

    let dirty = parse("[1+1,2]").unwrap();
    assert!(matches!(&dirty, Node::Array(array) if array.is_dirty()));
    assert_eq!(
        static_interpret("[1+1,2]").unwrap(),
        Node::Array(Array::new(vec![Node::Number(2.0), Node::Number(2.0)]))
    );
}

#[test]
fn test_note_algebra_messages() {
    let note = static_interpret("C#4lyd*2").unwrap();
    match note.kind() {
        Some(Kind::AbsNote(note)) => {
            assert_eq!(note.absolute(), 61);
            assert_eq!(note.mode, Some(Mode::Lydian));
        }
        other => panic!("expected absolute note, got {:?}", other),
    }
    assert_eq!(
        static_interpret("C#4lyd*-2").unwrap_err().message,
        "Notes can only be multiplied/divided by positive integers in the log2 scale: 1,2,4,8,16,..."
    );
    assert_eq!(
        static_interpret("C#4lyd+4").unwrap_err().message,
        "Notes cannot be added or subtracted. Use the ^+ or ^- or ~ to do note step operations."
    );
}

#[test]
fn test_switch_mode_wraps() {
    assert_eq!(switch_mode(Some(Mode::Lydian), 3), Some((Mode::Aeolian, 1)));
}

#[test]
fn test_oversized_note_operands_are_errors() {
    for text in [
        "C4^^1000000000",
        "C4^+2147483647",
        "C4^-2147483647 ^- 2147483647",
        "C4(~~2147483647 ^+ 1)",
        "C4(~2 ^^ 1000000000)",
        "C4 ~ 2147483647",
        "C4lyd%2147483647",
        "C4(~1%2147483647 % 1)",
    ] {
        assert_eq!(
            static_interpret(text).unwrap_err().message,
            "Note is out of range.",
            "{}",
            text
        );
    }
}

#[test]
fn test_oversized_note_literals_are_illegal_tokens() {
    assert_eq!(
        static_interpret("C999999999").unwrap_err().message,
        "InfiniteSound: Illegal token: C999999999"
    );
    assert_eq!(
        static_interpret("C99999999999").unwrap_err().message,
        "InfiniteSound: Illegal token: C99999999999"
    );
    assert_eq!(
        static_interpret("C4(~~99999999999)").unwrap_err().message,
        "InfiniteSound: Illegal token: ~~99999999999"
    );
    assert_eq!(
        static_interpret("C4(~99999999999)").unwrap_err().message,
        "InfiniteSound: Illegal token: ~99999999999"
    );
}

#[test]
fn test_clef_scope() {
    let body = clef_body(&static_interpret("C4(E4, G4*2, ~1)").unwrap());
    let rel = |node: &Node| match node.kind() {
        Some(Kind::RelNote(note)) => *note,
        _ => panic!("expected relative note, got {}", node),
    };
    assert_eq!(rel(&body[0]), RelNote::new(0, 0, 2));
    assert_eq!(rel(&body[1]), RelNote::new(0, 0, 11));
    assert_eq!(rel(&body[2]), RelNote::new(0, 0, 1));
}

#[test]
fn test_concat_binds_before_broadcast() {
    // `:` has the tightest priority, so this is ([1,2]:3)*2
    assert_eq!(
        static_interpret("[1,2]:3*2").unwrap(),
        Node::Array(Array::new(vec![
            Node::Number(2.0),
            Node::Number(4.0),
            Node::Number(6.0),
        ]))
    );
}

#[test]
fn test_full_interpretation() {
    let mut ctx = InterpretContext::new().with_seed(5);
    ctx.set_variable("cutoff", parse("2khz").unwrap());
    ctx.arguments.push(Node::Number(0.3));

    let tree = interpret(
        "[sine(440), triangle(220)] > lowpass(--cutoff) > gain($1)",
        &ctx,
    )
    .unwrap();
    assert_eq!(
        tree.to_string(),
        "([](sine(440), triangle(220)) > lowpass(2000) > gain(0.3))"
    );
}

#[test]
fn test_lfo_in_a_chain() {
    let tree = interpret("sine(440) > gain(lfo(2, 'square', 0, 1))", &InterpretContext::new())
        .unwrap();
    assert_eq!(
        tree.to_string(),
        "(sine(440) > gain(([](constant(0), (square(2) > gain(1))) > gain(1))))"
    );
}

#[test]
fn test_constant_head() {
    let tree = interpret("0.5 > gain(2)", &InterpretContext::new()).unwrap();
    assert_eq!(tree.to_string(), "(constant(0.5) > gain(2))");
}

#[test]
fn test_seeded_random_is_repeatable() {
    let ctx = InterpretContext::new().with_seed(2024);
    let text = "sine(random(100, 1000, 100)) > gain(random([0.1, 0.2, 0.3]))";
    let first = Interpreter::new(&ctx).interpret(text).unwrap();
    let second = Interpreter::new(&ctx).interpret(text).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_illegal_token_is_reported_by_the_parser() {
    assert!(tokenize("sine & gain")
        .iter()
        .any(|t| matches!(t, Token::Error(text) if text == "&")));
    assert!(parse("sine & gain").is_err());
}

#[cfg(feature = "serde")]
#[test]
fn test_tree_serializes_with_type_tags() {
    let tree = static_interpret("sine(440) > gain(0.5)").unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["type"], ">");
    assert_eq!(json["body"][0]["type"], "sine");
    assert_eq!(json["body"][0]["body"][0], 440.0);
}
