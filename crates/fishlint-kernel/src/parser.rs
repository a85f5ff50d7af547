//! Parser for fish source code.
//!
//! chumsky combinators over the logos token stream. The grammar builds a
//! small concrete tree which is then lowered into a [`TreeBuilder`]. The
//! parser never gives up: an unclosed block becomes an `ERROR` node that keeps
//! its children, a stray `end`/`else`/`case` is wrapped in an `ERROR` node,
//! and so is text the lexer rejected. Reporting those is the validator's job.
//!
//! Statement lists keep their separators as anonymous `terminator` children,
//! and `&&`/`||` continuations are siblings of the command they follow:
//!
//! ```text
//! false && echo a; echo b
//! (program (command ...) (conditional_execution (command ...)) (command ...))
//! ```

use chumsky::{input::ValueInput, prelude::*};
use fishlint_types::AnalysisError;

use crate::lexer::{self, Token};
use crate::syntax::{Field, NodeKind, SyntaxTree, TreeBuilder};

/// Span type used by the grammar.
type Span = SimpleSpan;

type ParserExtra<'tokens, 's> = extra::Err<Rich<'tokens, Tok<'s>, Span>>;

/// `set` options that read or delete instead of defining.
const NON_DEFINING_LONG: &[&str] = &["query", "erase", "show", "names"];
const NON_DEFINING_SHORT: &[char] = &['q', 'e', 'S', 'n'];

/// Keywords that only make sense inside a block that is waiting for them.
const CLOSING_KEYWORDS: &[&str] = &["end", "else", "case"];

/// Keywords that open a block closed by `end`.
pub(crate) const BLOCK_OPENERS: &[&str] = &["function", "if", "for", "while", "switch", "begin"];

/// Words after which the next word is a command.
const COMMAND_PREFIXES: &[&str] = &["and", "or", "if", "while", "begin", "else"];

/// Deepest block nesting handed to the grammar. A block opened below this
/// depth is folded, through its `end`, into one error token.
pub const MAX_NESTING: usize = 32;

/// Parse fish source into a syntax tree.
///
/// Malformed input still produces a tree. The only failure is a builder
/// invariant violation, which would be a parser bug.
pub fn parse(source: &str) -> Result<SyntaxTree, AnalysisError> {
    let tokens = limit_nesting(tokens(source));
    let end_span: Span = (source.len()..source.len()).into();

    let (statements, errors) = program_parser()
        .parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)))
        .into_output_errors();
    if !errors.is_empty() {
        tracing::trace!(recovered = errors.len(), "parse errors kept as error nodes");
    }

    let statements = statements.unwrap_or_else(|| {
        let words: Vec<Cst> = tokens
            .iter()
            .map(|(_, span)| Cst::leaf(NodeKind::Word, *span))
            .collect();
        if words.is_empty() {
            Vec::new()
        } else {
            vec![Cst::node(NodeKind::Error, words)]
        }
    });

    let mut builder = TreeBuilder::new(source);
    builder.start_node(NodeKind::Program, None);
    for statement in &statements {
        statement.lower(&mut builder);
    }
    builder.finish_node();
    builder.finish()
}

/// Grammar tokens. Words carry their text so keywords can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'s> {
    Word(&'s str),
    AndAnd,
    OrOr,
    Pipe,
    /// `;` or `&`
    Separator,
    Newline,
    Comment,
    /// Text the lexer rejected, or a block folded by the nesting limit.
    Garbage,
}

fn tokens(source: &str) -> Vec<(Tok<'_>, Span)> {
    lexer::tokenize(source)
        .into_iter()
        .map(|spanned| {
            let token = match spanned.token {
                Ok(Token::Word) => Tok::Word(source.get(spanned.span.clone()).unwrap_or("")),
                Ok(Token::AndAnd) => Tok::AndAnd,
                Ok(Token::OrOr) => Tok::OrOr,
                Ok(Token::Pipe) => Tok::Pipe,
                Ok(Token::Newline) => Tok::Newline,
                Ok(Token::Comment) => Tok::Comment,
                Ok(token) if token.is_terminator() => Tok::Separator,
                Ok(_) | Err(_) => Tok::Garbage,
            };
            (token, (spanned.span.start..spanned.span.end).into())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Open,
    Close,
    Same,
}

/// Tracks command position well enough to see blocks open and close.
#[derive(Debug)]
struct NestingScan {
    command_position: bool,
    after_else: bool,
}

impl NestingScan {
    fn new() -> Self {
        Self {
            command_position: true,
            after_else: false,
        }
    }

    fn step(&mut self, token: Tok<'_>) -> Nesting {
        let Tok::Word(word) = token else {
            self.command_position = token != Tok::Garbage;
            self.after_else = false;
            return Nesting::Same;
        };

        let effect = if !self.command_position {
            Nesting::Same
        } else if word == "end" {
            Nesting::Close
        } else if BLOCK_OPENERS.contains(&word) && !(word == "if" && self.after_else) {
            Nesting::Open
        } else {
            Nesting::Same
        };
        self.after_else = self.command_position && word == "else";
        self.command_position = self.command_position && COMMAND_PREFIXES.contains(&word);
        effect
    }
}

/// Fold every block that would nest deeper than [`MAX_NESTING`] into one
/// garbage token spanning it, so the grammar's recursion stays bounded.
fn limit_nesting(tokens: Vec<(Tok<'_>, Span)>) -> Vec<(Tok<'_>, Span)> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut scan = NestingScan::new();
    let mut depth = 0usize;
    let mut tokens = tokens.into_iter();

    while let Some((token, span)) = tokens.next() {
        match scan.step(token) {
            Nesting::Open if depth == MAX_NESTING => {
                let mut inner = 1usize;
                let mut last = span;
                for (token, span) in tokens.by_ref() {
                    last = span;
                    match scan.step(token) {
                        Nesting::Open => inner += 1,
                        Nesting::Close => inner -= 1,
                        Nesting::Same => {}
                    }
                    if inner == 0 {
                        break;
                    }
                }
                tracing::debug!(start = span.start, end = last.end, "block nested too deep");
                out.push((Tok::Garbage, (span.start..last.end).into()));
                continue;
            }
            Nesting::Open => depth += 1,
            Nesting::Close => depth = depth.saturating_sub(1),
            Nesting::Same => {}
        }
        out.push((token, span));
    }
    out
}

/// Concrete tree produced by the grammar.
#[derive(Debug, Clone)]
enum Cst {
    Leaf {
        kind: NodeKind,
        field: Option<Field>,
        span: Span,
    },
    Node {
        kind: NodeKind,
        field: Option<Field>,
        children: Vec<Cst>,
    },
}

impl Cst {
    fn leaf(kind: NodeKind, span: Span) -> Self {
        Cst::Leaf {
            kind,
            field: None,
            span,
        }
    }

    fn node(kind: NodeKind, children: Vec<Cst>) -> Self {
        Cst::Node {
            kind,
            field: None,
            children,
        }
    }

    fn with_field(mut self, with: Field) -> Self {
        match &mut self {
            Cst::Leaf { field, .. } | Cst::Node { field, .. } => *field = Some(with),
        }
        self
    }

    fn lower(&self, builder: &mut TreeBuilder) {
        match self {
            Cst::Leaf { kind, field, span } => {
                builder.token(*kind, *field, fishlint_types::Span::new(span.start, span.end));
            }
            Cst::Node {
                kind,
                field,
                children,
            } => {
                builder.start_node(*kind, *field);
                for child in children {
                    child.lower(builder);
                }
                builder.finish_node();
            }
        }
    }
}

fn prepend(first: Cst, rest: Vec<Cst>) -> Vec<Cst> {
    std::iter::once(first).chain(rest).collect()
}

/// A block node, or an error node when its `end` never came.
fn block(kind: NodeKind, mut children: Vec<Cst>, end: Option<Vec<Cst>>) -> Cst {
    match end {
        Some(end) => {
            children.extend(end);
            Cst::node(kind, children)
        }
        None => Cst::node(NodeKind::Error, children),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// Top-level program parser.
fn program_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>>
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    body_parser(&[], statement_parser(primary_parser())).then_ignore(end())
}

/// One construct in statement position, dispatched on its leading word.
fn primary_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    recursive(|primary| {
        let statement = statement_parser(primary.clone());
        let condition = condition_parser(primary.clone());

        choice((
            function_parser(statement.clone()),
            if_parser(statement.clone(), condition.clone()),
            switch_parser(statement.clone()),
            for_parser(statement.clone()),
            while_parser(statement.clone(), condition),
            begin_parser(statement),
            return_parser(),
            keyword_continuation_parser(primary),
            pipeline_parser(),
        ))
        .boxed()
    })
}

/// A primary plus the `&&`/`||` continuations hanging off it. A primary that
/// cannot start here is recovered as an error node.
fn statement_parser<'tokens, 's: 'tokens, I, P>(
    primary: P,
) -> impl Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    P: Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    primary
        .clone()
        .recover_with(via_parser(error_parser(primary.clone())))
        .then(continuation_parser(primary).repeated().collect::<Vec<_>>())
        .map(|(first, rest)| prepend(first, rest))
        .boxed()
}

/// The condition of `if`, `else if` and `while`. May be missing.
fn condition_parser<'tokens, 's: 'tokens, I, P>(
    primary: P,
) -> impl Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    P: Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    primary
        .clone()
        .then(continuation_parser(primary).repeated().collect::<Vec<_>>())
        .map(|(first, rest)| {
            prepend(first, rest)
                .into_iter()
                .map(|cst| cst.with_field(Field::Condition))
                .collect::<Vec<_>>()
        })
        .or_not()
        .map(|condition| condition.unwrap_or_default())
        .labelled("condition")
        .boxed()
}

/// `&& cmd` / `|| cmd`. A line break is allowed after the connector.
fn continuation_parser<'tokens, 's: 'tokens, I, P>(
    primary: P,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    P: Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    select! { Tok::AndAnd => (), Tok::OrOr => () }
        .map_with(|_, e| Cst::leaf(NodeKind::Operator, e.span()))
        .then(line_break_parser().repeated().collect::<Vec<_>>())
        .then(primary.or_not())
        .map(|((operator, breaks), next)| {
            let mut children = prepend(operator, breaks);
            children.extend(next);
            Cst::node(NodeKind::ConditionalExecution, children)
        })
}

/// What is left when no primary fits: a connector with nothing before it,
/// which takes the statement after it down with it, or unlexable text and
/// the words run into it.
fn error_parser<'tokens, 's: 'tokens, I, P>(
    primary: P,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    P: Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    let stray_connector = select! { Tok::AndAnd => (), Tok::OrOr => (), Tok::Pipe => () }
        .map_with(|_, e| Cst::leaf(NodeKind::Operator, e.span()))
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then(primary.or_not())
        .map(|(mut children, next)| {
            children.extend(next);
            Cst::node(NodeKind::Error, children)
        });

    let garbage = just(Tok::Garbage)
        .map_with(|_, e| Cst::leaf(NodeKind::Word, e.span()))
        .then(
            select! { Tok::Garbage => (), Tok::Word(_) => () }
                .map_with(|_, e| Cst::leaf(NodeKind::Word, e.span()))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(first, rest)| Cst::node(NodeKind::Error, prepend(first, rest)));

    choice((stray_connector, garbage)).boxed()
}

/// Statements and separators until one of `stops` or end of input. Closing
/// keywords that are not in `stops` become error nodes.
fn body_parser<'tokens, 's: 'tokens, I, S>(
    stops: &'static [&'static str],
    statement: S,
) -> impl Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    let stray = word_parser()
        .filter(move |(text, _)| CLOSING_KEYWORDS.contains(text) && !stops.contains(text))
        .map(|(_, span)| Cst::leaf(NodeKind::Keyword, span))
        .then(
            word_parser()
                .filter(|(text, _)| !CLOSING_KEYWORDS.contains(text))
                .map(|(text, span)| Cst::leaf(word_kind(text), span).with_field(Field::Argument))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(keyword, args)| Cst::node(NodeKind::Error, prepend(keyword, args)));

    choice((
        trivia_parser().map(|leaf| vec![leaf]),
        statement,
        stray.map(|error| vec![error]),
    ))
    .repeated()
    .collect::<Vec<Vec<Cst>>>()
    .map(|items| items.into_iter().flatten().collect())
    .boxed()
}

/// `function NAME [OPTIONS...] ... end`
fn function_parser<'tokens, 's: 'tokens, I, S>(
    statement: S,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    keyword_parser("function")
        .then(word_parser().repeated().collect::<Vec<_>>())
        .then(body_parser(&["end"], statement))
        .then(block_end_parser())
        .map(|(((keyword, header), body), end)| {
            let mut children = vec![keyword];
            let mut named = false;
            for (text, span) in header {
                let leaf = if !named && word_kind(text) == NodeKind::Word {
                    named = true;
                    Cst::leaf(NodeKind::Word, span).with_field(Field::Name)
                } else {
                    Cst::leaf(word_kind(text), span).with_field(Field::Option)
                };
                children.push(leaf);
            }
            children.extend(body);
            block(NodeKind::FunctionDefinition, children, end)
        })
        .labelled("function definition")
        .boxed()
}

/// `if COND ... [else if COND ...]* [else ...] end`
fn if_parser<'tokens, 's: 'tokens, I, S, C>(
    statement: S,
    condition: C,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
    C: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    let else_if = keyword_parser("else")
        .then(keyword_parser("if"))
        .then(condition.clone())
        .then(body_parser(&["end", "else"], statement.clone()))
        .map(|(((else_keyword, if_keyword), condition), body)| {
            let mut children = vec![else_keyword, if_keyword];
            children.extend(condition);
            children.extend(body);
            Cst::node(NodeKind::ElseIfClause, children)
        });

    let else_clause = keyword_parser("else")
        .then(body_parser(&["end"], statement.clone()))
        .map(|(keyword, body)| Cst::node(NodeKind::ElseClause, prepend(keyword, body)));

    keyword_parser("if")
        .then(condition)
        .then(body_parser(&["end", "else"], statement))
        .then(else_if.repeated().collect::<Vec<_>>())
        .then(else_clause.or_not())
        .then(block_end_parser())
        .map(|(((((keyword, condition), body), else_ifs), else_clause), end)| {
            let mut children = prepend(keyword, condition);
            children.extend(body);
            children.extend(else_ifs);
            children.extend(else_clause);
            block(NodeKind::IfStatement, children, end)
        })
        .labelled("if statement")
        .boxed()
}

/// `switch ARGS... [case ARGS... ...]* end`
fn switch_parser<'tokens, 's: 'tokens, I, S>(
    statement: S,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    let case = keyword_parser("case")
        .then(arguments_parser())
        .then(body_parser(&["case", "end"], statement.clone()))
        .map(|((keyword, args), body)| {
            let mut children = prepend(keyword, args);
            children.extend(body);
            Cst::node(NodeKind::CaseClause, children)
        });

    keyword_parser("switch")
        .then(arguments_parser())
        .then(body_parser(&["case", "end"], statement))
        .then(case.repeated().collect::<Vec<_>>())
        .then(block_end_parser())
        .map(|((((keyword, args), body), cases), end)| {
            let mut children = prepend(keyword, args);
            children.extend(body);
            children.extend(cases);
            block(NodeKind::SwitchStatement, children, end)
        })
        .labelled("switch statement")
        .boxed()
}

/// `for VAR in ITEMS... ... end`
fn for_parser<'tokens, 's: 'tokens, I, S>(
    statement: S,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    keyword_parser("for")
        .then(word_parser().repeated().collect::<Vec<_>>())
        .then(body_parser(&["end"], statement))
        .then(block_end_parser())
        .map(|(((keyword, header), body), end)| {
            let mut children = vec![keyword];
            let mut seen_in = false;
            for (i, (text, span)) in header.into_iter().enumerate() {
                let leaf = if i == 0 {
                    Cst::leaf(NodeKind::Word, span).with_field(Field::Name)
                } else if text == "in" && !seen_in {
                    seen_in = true;
                    Cst::leaf(NodeKind::Keyword, span)
                } else {
                    Cst::leaf(word_kind(text), span).with_field(Field::Argument)
                };
                children.push(leaf);
            }
            children.extend(body);
            block(NodeKind::ForStatement, children, end)
        })
        .labelled("for loop")
        .boxed()
}

/// `while COND ... end`
fn while_parser<'tokens, 's: 'tokens, I, S, C>(
    statement: S,
    condition: C,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
    C: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    keyword_parser("while")
        .then(condition)
        .then(body_parser(&["end"], statement))
        .then(block_end_parser())
        .map(|(((keyword, condition), body), end)| {
            let mut children = prepend(keyword, condition);
            children.extend(body);
            block(NodeKind::WhileStatement, children, end)
        })
        .labelled("while loop")
        .boxed()
}

/// `begin ... end`
fn begin_parser<'tokens, 's: 'tokens, I, S>(
    statement: S,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    S: Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    keyword_parser("begin")
        .then(body_parser(&["end"], statement))
        .then(block_end_parser())
        .map(|((keyword, body), end)| block(NodeKind::BeginStatement, prepend(keyword, body), end))
        .labelled("begin block")
        .boxed()
}

fn return_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    keyword_parser("return")
        .then(arguments_parser())
        .map(|(keyword, args)| Cst::node(NodeKind::ReturnStatement, prepend(keyword, args)))
}

/// `and cmd` / `or cmd`
fn keyword_continuation_parser<'tokens, 's: 'tokens, I, P>(
    primary: P,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
    P: Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone + 'tokens,
{
    word_parser()
        .filter(|(text, _)| matches!(*text, "and" | "or"))
        .map(|(_, span)| Cst::leaf(NodeKind::Keyword, span))
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then(primary.or_not())
        .map(|(mut children, next)| {
            children.extend(next);
            Cst::node(NodeKind::ConditionalExecution, children)
        })
        .boxed()
}

/// `a | b | c`, or a lone command.
fn pipeline_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    let stage = just(Tok::Pipe)
        .map_with(|_, e| Cst::leaf(NodeKind::Operator, e.span()))
        .then(
            just(Tok::Newline)
                .map_with(|_, e| Cst::leaf(NodeKind::Terminator, e.span()))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(command_parser().or_not())
        .map(|((pipe, breaks), next)| {
            let mut children = prepend(pipe, breaks);
            children.extend(next);
            children
        });

    command_parser()
        .then(stage.repeated().collect::<Vec<_>>())
        .map(|(first, stages)| {
            if stages.is_empty() {
                first
            } else {
                let rest = stages.into_iter().flatten().collect();
                Cst::node(NodeKind::Pipeline, prepend(first, rest))
            }
        })
        .labelled("pipeline")
        .boxed()
}

/// `name args...`. For `set`, the variable name is marked as a definition.
fn command_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    word_parser()
        .filter(|(text, _)| !CLOSING_KEYWORDS.contains(text))
        .then(word_parser().repeated().collect::<Vec<_>>())
        .map(|((name, name_span), args)| {
            let texts: Vec<&str> = args.iter().map(|(text, _)| *text).collect();
            let definition = if name == "set" {
                set_definition(&texts)
            } else {
                None
            };

            let mut children = vec![Cst::leaf(NodeKind::Word, name_span).with_field(Field::Name)];
            children.extend(args.iter().enumerate().map(|(i, (text, span))| {
                let kind = if definition == Some(i) {
                    NodeKind::VariableDefinition
                } else {
                    word_kind(text)
                };
                Cst::leaf(kind, *span).with_field(Field::Argument)
            }));
            Cst::node(NodeKind::Command, children)
        })
        .labelled("command")
}

/// A closing `end` plus the redirections after it, or nothing when input
/// ran out first.
fn block_end_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Option<Vec<Cst>>, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    keyword_parser("end")
        .then(arguments_parser())
        .map(|(keyword, args)| prepend(keyword, args))
        .or_not()
}

fn arguments_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Vec<Cst>, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    word_parser()
        .map(|(text, span)| Cst::leaf(word_kind(text), span).with_field(Field::Argument))
        .repeated()
        .collect::<Vec<_>>()
}

fn keyword_parser<'tokens, 's: 'tokens, I>(
    keyword: &'static str,
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    word_parser()
        .filter(move |(text, _)| *text == keyword)
        .map(|(_, span)| Cst::leaf(NodeKind::Keyword, span))
}

/// `;`, `&`, newline or a comment between statements.
fn trivia_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    select! {
        Tok::Separator => NodeKind::Terminator,
        Tok::Newline => NodeKind::Terminator,
        Tok::Comment => NodeKind::Comment,
    }
    .map_with(|kind, e| Cst::leaf(kind, e.span()))
}

fn line_break_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, Cst, ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    select! {
        Tok::Newline => NodeKind::Terminator,
        Tok::Comment => NodeKind::Comment,
    }
    .map_with(|kind, e| Cst::leaf(kind, e.span()))
}

fn word_parser<'tokens, 's: 'tokens, I>(
) -> impl Parser<'tokens, I, (&'s str, Span), ParserExtra<'tokens, 's>> + Clone
where
    I: ValueInput<'tokens, Token = Tok<'s>, Span = Span>,
{
    select! { Tok::Word(text) => text }.map_with(|text, e| (text, e.span()))
}

fn word_kind(word: &str) -> NodeKind {
    if word.len() > 1 && word.starts_with('-') {
        NodeKind::Option
    } else {
        NodeKind::Word
    }
}

/// Index of the variable name among `set`'s arguments, if it defines one.
fn set_definition(args: &[&str]) -> Option<usize> {
    for (i, arg) in args.iter().enumerate() {
        if *arg == "--" {
            return (i + 1 < args.len()).then_some(i + 1);
        }
        if let Some(long) = arg.strip_prefix("--") {
            let name = long.split('=').next().unwrap_or(long);
            if NON_DEFINING_LONG.contains(&name) {
                return None;
            }
            continue;
        }
        if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
            if short.chars().any(|c| NON_DEFINING_SHORT.contains(&c)) {
                return None;
            }
            continue;
        }
        return Some(i);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::sexpr;
    use rstest::rstest;

    fn dump(source: &str) -> String {
        sexpr::format(parse(source).unwrap().root().unwrap())
    }

    fn nested(opener: &str, depth: usize) -> String {
        format!("{}{}", format!("{opener}\n").repeat(depth), "end\n".repeat(depth))
    }

    #[rstest]
    #[case::plain("set X 1", Some(0))]
    #[case::scoped("set -gx X 1", Some(1))]
    #[case::long_flags("set --path --universal X", Some(2))]
    #[case::double_dash("set -l -- -weird 1", Some(2))]
    #[case::query("set -q X", None)]
    #[case::erase_cluster("set -eg X", None)]
    #[case::names("set --names", None)]
    #[case::bare("set", None)]
    fn finds_set_definition(#[case] source: &str, #[case] expected: Option<usize>) {
        let args: Vec<&str> = source.split_whitespace().skip(1).collect();
        assert_eq!(set_definition(&args), expected);
    }

    #[test]
    fn parses_function_with_options() {
        let out = dump("function foo -a x y\n  echo $x\nend");
        assert!(out.starts_with(
            r#"(program (function_definition name: (word "foo") option: (option "-a") option: (word "x") option: (word "y") (command"#
        ));
    }

    #[test]
    fn parses_if_chain() {
        let out = dump("if a; return 1; else if b; return 2; else; return 3; end");
        assert_eq!(
            out,
            r#"(program (if_statement condition: (command name: (word "a")) (return argument: (word "1")) (else_if_clause condition: (command name: (word "b")) (return argument: (word "2"))) (else_clause (return argument: (word "3")))))"#
        );
    }

    #[test]
    fn parses_switch() {
        let out = dump("switch $x\ncase a b\n  echo a\ncase '*'\n  echo other\nend");
        assert_eq!(
            out,
            r#"(program (switch_statement argument: (word "$x") (case_clause argument: (word "a") argument: (word "b") (command name: (word "echo") argument: (word "a"))) (case_clause argument: (word "'*'") (command name: (word "echo") argument: (word "other")))))"#
        );
    }

    #[test]
    fn continuations_are_siblings() {
        let out = dump("false && echo a || echo b; and echo c");
        assert_eq!(
            out,
            r#"(program (command name: (word "false")) (conditional_execution (command name: (word "echo") argument: (word "a"))) (conditional_execution (command name: (word "echo") argument: (word "b"))) (conditional_execution (command name: (word "echo") argument: (word "c"))))"#
        );
    }

    #[test]
    fn condition_chain_carries_the_field() {
        let tree = parse("while a && b\nend").unwrap();
        let root = tree.root().unwrap();
        let fields: Vec<_> = root
            .first_child()
            .unwrap()
            .named_children()
            .map(|n| (n.kind(), n.field()))
            .collect();
        assert_eq!(
            fields,
            [
                (NodeKind::Command, Some(Field::Condition)),
                (NodeKind::ConditionalExecution, Some(Field::Condition)),
            ]
        );
    }

    #[test]
    fn parses_pipeline_and_loops() {
        let out = dump("for f in a b; cat $f | wc -l; end; while true; begin; end; end");
        assert_eq!(
            out,
            r#"(program (for_statement name: (word "f") argument: (word "a") argument: (word "b") (pipeline (command name: (word "cat") argument: (word "$f")) (command name: (word "wc") argument: (option "-l")))) (while_statement condition: (command name: (word "true")) (begin_statement "begin; end")))"#
        );
    }

    #[test]
    fn unclosed_block_becomes_error() {
        let tree = parse("if true; echo hi").unwrap();
        let root = tree.root().unwrap();
        let err = root.named_children().next().unwrap();
        assert_eq!(err.kind(), NodeKind::Error);
        assert_eq!(err.text(), "if true; echo hi");
        assert!(err.first_child().unwrap().is_keyword("if"));
    }

    #[test]
    fn stray_end_is_wrapped() {
        assert_eq!(
            dump("echo hi; end"),
            r#"(program (command name: (word "echo") argument: (word "hi")) (ERROR "end"))"#
        );
    }

    #[test]
    fn stray_else_leaves_the_end_to_its_block() {
        let tree = parse("begin; else end").unwrap();
        let root = tree.root().unwrap();
        let begin = root.first_child().unwrap();
        assert_eq!(begin.kind(), NodeKind::BeginStatement);
        assert!(begin.last_child().unwrap().is_keyword("end"));
        assert!(begin.named_children().any(|n| n.is_error()));
    }

    #[test]
    fn lexer_errors_become_error_nodes() {
        let tree = parse("echo 'oops").unwrap();
        let root = tree.root().unwrap();
        let err = root.last_named_child().unwrap();
        assert_eq!(err.kind(), NodeKind::Error);
        assert!(err.text().contains("oops"));
        assert_eq!(root.first_child().unwrap().text(), "echo");
    }

    #[test]
    fn leading_pipe_takes_the_statement() {
        assert_eq!(
            dump("| wc -l"),
            r#"(program (ERROR (command name: (word "wc") argument: (option "-l"))))"#
        );
    }

    #[test]
    fn empty_source_has_a_program() {
        let tree = parse("").unwrap();
        assert_eq!(tree.root().unwrap().kind(), NodeKind::Program);
        assert_eq!(tree.len(), 1);
    }

    #[rstest]
    #[case::begin("begin")]
    #[case::if_block("if true")]
    #[case::function("function _f")]
    fn nesting_at_the_limit_is_kept(#[case] opener: &str) {
        let tree = parse(&nested(opener, MAX_NESTING)).unwrap();
        let root = tree.root().unwrap();
        assert!(!root.preorder().any(|n| n.is_error()));
    }

    #[rstest]
    #[case::begin("begin")]
    #[case::if_block("if true")]
    #[case::while_loop("while true")]
    fn deep_nesting_folds_into_one_error(#[case] opener: &str) {
        let source = nested(opener, 50_000);
        let tree = parse(&source).unwrap();
        let errors: Vec<_> = tree.root().unwrap().preorder().filter(|n| n.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].text().starts_with(opener));
        assert!(errors[0].text().ends_with("end"));
    }

    #[test]
    fn nesting_scan_ignores_arguments_and_else_if() {
        let tokens = tokens("echo begin; if a; else if b; end; set x end");
        let mut scan = NestingScan::new();
        let effects: Vec<Nesting> = tokens
            .iter()
            .map(|(token, _)| scan.step(*token))
            .filter(|effect| *effect != Nesting::Same)
            .collect();
        assert_eq!(effects, [Nesting::Open, Nesting::Close]);
    }
}
