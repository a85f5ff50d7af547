//! Property tests for the rule engine.

use fishlint_kernel::syntax::{Field, TreeBuilder};
use fishlint_kernel::{diagnose, parse, Document, ErrorCode, NodeKind, Span};
use proptest::prelude::*;

/// Words and separators the parser has rules for. No quotes or escapes, so
/// every token lexes.
const VOCABULARY: &[&str] = &[
    "echo", "hi", "set", "-U", "-gx", "--path", "MY_PATH", "X", "function", "_f", "g", "end",
    "if", "else", "switch", "case", "for", "in", "while", "begin", "return", "and", "or", "&&",
    "||", "|", ";", "\n", "#note\n",
];

fn fish_source() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCABULARY), 0..48).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn passes_are_idempotent(source in fish_source()) {
        let tree = parse(&source).unwrap();
        let doc = Document::anonymous().with_autoload_name("g");
        let first = diagnose(&tree, &doc).unwrap();
        let second = diagnose(&tree, &doc).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn at_most_one_diagnostic_per_node(source in fish_source()) {
        let tree = parse(&source).unwrap();
        let diagnostics = diagnose(&tree, &Document::anonymous()).unwrap();
        prop_assert!(diagnostics.len() <= tree.len());
        for d in &diagnostics {
            prop_assert!(d.span.slice(&source).is_some());
        }
    }
}

// ============================================================================
// Exhaustive return
// ============================================================================

#[derive(Debug, Clone)]
enum Stmt {
    Return,
    Echo,
    If {
        arms: Vec<Vec<Stmt>>,
        otherwise: Option<Vec<Stmt>>,
    },
    Switch(Vec<Vec<Stmt>>),
}

fn stmt() -> impl Strategy<Value = Stmt> {
    let leaf = prop_oneof![Just(Stmt::Return), Just(Stmt::Echo)];
    leaf.prop_recursive(3, 32, 3, |inner| {
        let body = prop::collection::vec(inner, 1..3);
        prop_oneof![
            (prop::collection::vec(body.clone(), 1..3), prop::option::of(body.clone()))
                .prop_map(|(arms, otherwise)| Stmt::If { arms, otherwise }),
            prop::collection::vec(body, 1..3).prop_map(Stmt::Switch),
        ]
    })
}

fn render(stmt: &Stmt, out: &mut String) {
    match stmt {
        Stmt::Return => out.push_str("return\n"),
        Stmt::Echo => out.push_str("echo\n"),
        Stmt::If { arms, otherwise } => {
            for (i, arm) in arms.iter().enumerate() {
                out.push_str(if i == 0 { "if true\n" } else { "else if true\n" });
                arm.iter().for_each(|s| render(s, out));
            }
            if let Some(body) = otherwise {
                out.push_str("else\n");
                body.iter().for_each(|s| render(s, out));
            }
            out.push_str("end\n");
        }
        Stmt::Switch(cases) => {
            out.push_str("switch $x\n");
            for body in cases {
                out.push_str("case '*'\n");
                body.iter().for_each(|s| render(s, out));
            }
            out.push_str("end\n");
        }
    }
}

/// Reference model: does control always leave through a `return`?
fn always_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return => true,
        Stmt::Echo | Stmt::Switch(_) => false,
        Stmt::If {
            otherwise: None, ..
        } => false,
        Stmt::If {
            arms,
            otherwise: Some(body),
        } => arms
            .iter()
            .chain(std::iter::once(body))
            .all(|branch| branch.iter().any(always_returns)),
    }
}

proptest! {
    #[test]
    fn tail_is_unreachable_iff_the_statement_always_returns(stmt in stmt()) {
        let mut source = String::from("function _f\n");
        render(&stmt, &mut source);
        let tail_start = source.len();
        source.push_str("echo tail\nend\n");

        let tree = parse(&source).unwrap();
        let diagnostics = diagnose(&tree, &Document::anonymous()).unwrap();
        let tail_reported = diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::UnreachableCode && d.span.start == tail_start);

        prop_assert_eq!(tail_reported, always_returns(&stmt), "source:\n{}", source);
    }
}

// ============================================================================
// Trailing chain
// ============================================================================

/// Build `a s1 s2 ... ;` where each `si` is either `&& x` (a continuation)
/// or a bare command `x`, with no separator in between. Returns the tree
/// and the start offset of each `si`.
fn chain_tree(continuations: &[bool]) -> (fishlint_kernel::SyntaxTree, Vec<usize>) {
    let mut source = String::from("a");
    let mut layout = Vec::new();
    for &cont in continuations {
        source.push(' ');
        layout.push((source.len(), cont));
        source.push_str(if cont { "&& x" } else { "x" });
    }
    source.push_str(" ;");

    let mut b = TreeBuilder::new(source.as_str());
    b.start_node(NodeKind::Program, None);
    command(&mut b, 0);
    for &(at, cont) in &layout {
        if cont {
            b.start_node(NodeKind::ConditionalExecution, None);
            b.token(NodeKind::Operator, None, Span::new(at, at + 2));
            command(&mut b, at + 3);
            b.finish_node();
        } else {
            command(&mut b, at);
        }
    }
    b.token(NodeKind::Terminator, None, Span::new(source.len() - 1, source.len()));
    b.finish_node();

    let starts = layout.iter().map(|&(at, _)| at).collect();
    (b.finish().unwrap(), starts)
}

fn command(b: &mut TreeBuilder, at: usize) {
    b.start_node(NodeKind::Command, None);
    b.token(NodeKind::Word, Some(Field::Name), Span::new(at, at + 1));
    b.finish_node();
}

/// Every bare command (and the leading `a`) reports everything after the
/// first bare command that follows it.
fn expected_chain_reports(continuations: &[bool]) -> Vec<usize> {
    let triggers = std::iter::once(None).chain(
        continuations
            .iter()
            .enumerate()
            .filter(|(_, cont)| !**cont)
            .map(|(i, _)| Some(i)),
    );

    let mut reported = Vec::new();
    for trigger in triggers {
        let from = trigger.map_or(0, |i| i + 1);
        if let Some(first_break) = (from..continuations.len()).find(|&j| !continuations[j]) {
            reported.extend(first_break..continuations.len());
        }
    }
    reported
}

proptest! {
    #[test]
    fn chain_breaks_at_the_first_bare_command(continuations in prop::collection::vec(any::<bool>(), 0..8)) {
        let (tree, starts) = chain_tree(&continuations);
        let diagnostics = diagnose(&tree, &Document::anonymous()).unwrap();

        let reported: Vec<usize> = diagnostics
            .iter()
            .map(|d| {
                prop_assert_eq!(d.code, ErrorCode::UnreachableCode);
                Ok(starts.iter().position(|&s| s == d.span.start).unwrap_or(usize::MAX))
            })
            .collect::<Result<_, TestCaseError>>()?;

        prop_assert_eq!(reported, expected_chain_reports(&continuations));
    }
}
