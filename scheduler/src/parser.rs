// Parser for .dfg source files.
//
// Parses a token stream (from the lexer) into an AST per the .dfg line
// grammar. Uses chumsky combinators.
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an AST plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics; parsing continues.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::Token;

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a .dfg source string. Lexes then parses.
///
/// Returns an AST (if parsing succeeded) plus any errors.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = program_parser(source);
    let (program, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        program,
        errors: all_errors,
    }
}

// ── Main parser builder ──
//
// All grammar rules are built inside `program_parser` so that the `source`
// reference is captured once and shared by all combinators.

fn program_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Program, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Newlines ──

    let nl = just(Token::Newline).repeated().ignored();

    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    // ── Number ──

    let number = select! {
        Token::Number(n) = e => (n, e.span()),
    };

    // ── period_decl: 'period' NUMBER ──

    let period_decl = just(Token::Period)
        .ignore_then(number.clone())
        .map(|(value, value_span)| {
            ItemKind::Period(PeriodDecl { value, value_span })
        });

    // ── op_decl: 'op' IDENT attr+ ──

    let attr = ident
        .clone()
        .then_ignore(just(Token::Equals))
        .then(number)
        .map(|(name, (value, value_span))| OpAttr {
            name,
            value,
            value_span,
        });

    let op_decl = just(Token::Op)
        .ignore_then(ident.clone())
        .then(attr.repeated().at_least(1).collect::<Vec<_>>())
        .map(|(name, attrs)| ItemKind::Op(OpDecl { name, attrs }));

    // ── stmt_decl: IDENT '=' IDENT '(' args? ')' ──

    let args = ident
        .clone()
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let stmt_decl = ident
        .clone()
        .then_ignore(just(Token::Equals))
        .then(ident.clone())
        .then(args)
        .map(|((dest, op), args)| ItemKind::Stmt(StmtDecl { dest, op, args }));

    // ── Item ──

    let item = choice((period_decl, op_decl, stmt_decl)).map_with(|kind, e| Item {
        kind,
        span: e.span(),
    });

    // ── Program ──

    nl.clone()
        .ignore_then(
            item.separated_by(just(Token::Newline).repeated().at_least(1))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(nl)
        .map_with(move |items, e| Program {
            items,
            span: e.span(),
        })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let result = parse(source);
        assert!(
            result.errors.is_empty(),
            "unexpected errors: {:#?}",
            result.errors
        );
        result.program.expect("expected program")
    }

    fn parse_one_item(source: &str) -> Item {
        let program = parse_ok(source);
        assert_eq!(program.items.len(), 1, "expected exactly one item");
        program.items.into_iter().next().unwrap()
    }

    #[test]
    fn empty_program() {
        let program = parse_ok("");
        assert!(program.items.is_empty());
    }

    #[test]
    fn blank_lines_and_comments_only() {
        let program = parse_ok("\n\n# nothing here\n\n");
        assert!(program.items.is_empty());
    }

    #[test]
    fn period_decl() {
        let item = parse_one_item("period 2.5");
        let ItemKind::Period(p) = &item.kind else {
            panic!("expected Period")
        };
        assert_eq!(p.value, 2.5);
    }

    #[test]
    fn op_decl_all_attrs() {
        let item = parse_one_item("op mul latency=2 delay=0.9 limit=1");
        let ItemKind::Op(o) = &item.kind else {
            panic!("expected Op")
        };
        assert_eq!(o.name.name, "mul");
        assert_eq!(o.attrs.len(), 3);
        assert_eq!(o.attrs[0].name.name, "latency");
        assert_eq!(o.attrs[0].value, 2.0);
        assert_eq!(o.attrs[2].name.name, "limit");
        assert_eq!(o.attrs[2].value, 1.0);
    }

    #[test]
    fn op_decl_negative_limit() {
        let item = parse_one_item("op add latency=0 delay=0.4 limit=-1");
        let ItemKind::Op(o) = &item.kind else {
            panic!("expected Op")
        };
        assert_eq!(o.attrs[2].value, -1.0);
    }

    #[test]
    fn op_decl_requires_an_attr() {
        let result = parse("op add\n");
        assert!(!result.errors.is_empty(), "bare op decl should not parse");
    }

    #[test]
    fn stmt_no_args() {
        let item = parse_one_item("a = load()");
        let ItemKind::Stmt(s) = &item.kind else {
            panic!("expected Stmt")
        };
        assert_eq!(s.dest.name, "a");
        assert_eq!(s.op.name, "load");
        assert!(s.args.is_empty());
    }

    #[test]
    fn stmt_two_args() {
        let item = parse_one_item("t3 = mul(t1, t2)");
        let ItemKind::Stmt(s) = &item.kind else {
            panic!("expected Stmt")
        };
        assert_eq!(s.dest.name, "t3");
        assert_eq!(s.op.name, "mul");
        assert_eq!(s.args.len(), 2);
        assert_eq!(s.args[0].name, "t1");
        assert_eq!(s.args[1].name, "t2");
    }

    #[test]
    fn full_program() {
        let program = parse_ok(
            "# a small graph\n\
             period 1.0\n\
             op load latency=1 delay=0.5 limit=2\n\
             op mul latency=2 delay=0.9 limit=1\n\
             \n\
             a = load()\n\
             b = load()\n\
             p = mul(a, b)\n",
        );
        assert_eq!(program.items.len(), 6);
        assert!(matches!(program.items[0].kind, ItemKind::Period(_)));
        assert!(matches!(program.items[2].kind, ItemKind::Op(_)));
        assert!(matches!(program.items[5].kind, ItemKind::Stmt(_)));
    }

    #[test]
    fn missing_close_paren_is_error() {
        let result = parse("a = load(\n");
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn spans_cover_items() {
        let program = parse_ok("period 1.0\na = load()");
        let item = &program.items[1];
        let text = "period 1.0\na = load()";
        assert_eq!(&text[item.span.start()..item.span.end()], "a = load()");
    }
}
