//! Type-annotation parser.
//!
//! Turns annotation text such as `?int`, `list<Person>`, `object{a: string, b?: int}`
//! or `Response<Person>` into a [`TypeDescriptor`]. Identifiers naming one of the
//! in-scope template parameters become [`TypeDescriptor::Template`].
pub mod lexer;

use std::ops::Range;

use logos::{Lexer, Logos};

use crate::error::ParseError;
use crate::types::{Literal, Refinement, ShapeEntry, TypeDescriptor};
use lexer::Token;

/// Deepest nesting of groups, `?` prefixes and type arguments accepted by the parser.
pub const MAX_NESTING: usize = 64;

/// A `@template` declaration visible while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParam {
    pub name: String,
    pub bound: Option<TypeDescriptor>,
}

/// Parses a complete type annotation.
pub fn parse_type(src: &str, templates: &[TemplateParam]) -> Result<TypeDescriptor, ParseError> {
    let mut parser = Parser::new(src, templates);
    let ty = parser.parse_union()?;
    match parser.peek() {
        None => Ok(ty),
        Some((_, span)) => Err(ParseError::new(src, span.start, "unexpected trailing input")),
    }
}

/// Parses a type at the start of `src` and returns it with the byte offset where it
/// ends. Whatever follows (a variable name, free text) is left for the caller.
pub fn parse_type_prefix(
    src: &str,
    templates: &[TemplateParam],
) -> Result<(TypeDescriptor, usize), ParseError> {
    let mut parser = Parser::new(src, templates);
    let ty = parser.parse_union()?;
    Ok((ty, parser.end))
}

type Spanned<'src> = (Result<Token<'src>, ()>, Range<usize>);

struct Parser<'src, 't> {
    src: &'src str,
    lexer: Lexer<'src, Token<'src>>,
    peeked: Option<Option<Spanned<'src>>>,
    /// End offset of the last consumed token.
    end: usize,
    templates: &'t [TemplateParam],
    depth: usize,
}

impl<'src, 't> Parser<'src, 't> {
    fn new(src: &'src str, templates: &'t [TemplateParam]) -> Self {
        Self {
            src,
            lexer: Token::lexer(src),
            peeked: None,
            end: 0,
            templates,
            depth: 0,
        }
    }

    fn peek(&mut self) -> Option<&Spanned<'src>> {
        if self.peeked.is_none() {
            let next = self.lexer.next().map(|tok| (tok, self.lexer.span()));
            self.peeked = Some(next);
        }
        self.peeked.as_ref().and_then(Option::as_ref)
    }

    /// Next token if it lexed cleanly.
    fn peek_token(&mut self) -> Option<Token<'src>> {
        match self.peek() {
            Some((Ok(tok), _)) => Some(*tok),
            _ => None,
        }
    }

    fn at(&mut self, want: Token<'src>) -> bool {
        self.peek_token() == Some(want)
    }

    /// `want` comes next with no whitespace before it.
    fn at_adjacent(&mut self, want: Token<'src>) -> bool {
        let end = self.end;
        matches!(self.peek(), Some((Ok(tok), span)) if *tok == want && span.start == end)
    }

    fn bump(&mut self) -> Option<Spanned<'src>> {
        self.peek();
        let next = self.peeked.take().flatten();
        if let Some((_, span)) = &next {
            self.end = span.end;
        }
        next
    }

    fn eat(&mut self, want: Token<'src>) -> bool {
        if self.at(want) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error_here(&mut self, message: &str) -> ParseError {
        let offset = match self.peek() {
            Some((_, span)) => span.start,
            None => self.src.len(),
        };
        ParseError::new(self.src, offset, message)
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("type is nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, want: Token<'src>, message: &str) -> Result<(), ParseError> {
        if self.eat(want) {
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // GRAMMAR
    // ————————————————————————————————————————————————————————————————————————

    fn parse_union(&mut self) -> Result<TypeDescriptor, ParseError> {
        self.nested(Self::parse_union_members)
    }

    fn parse_union_members(&mut self) -> Result<TypeDescriptor, ParseError> {
        let mut members = vec![self.parse_intersection()?];
        while self.eat(Token::Pipe) {
            members.push(self.parse_intersection()?);
        }
        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeDescriptor::Union(members)
        })
    }

    fn parse_intersection(&mut self) -> Result<TypeDescriptor, ParseError> {
        let mut members = vec![self.parse_prefix()?];
        while self.eat(Token::Amp) {
            members.push(self.parse_prefix()?);
        }
        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeDescriptor::Intersection(members)
        })
    }

    fn parse_prefix(&mut self) -> Result<TypeDescriptor, ParseError> {
        if self.eat(Token::Question) {
            return Ok(TypeDescriptor::nullable(self.nested(Self::parse_prefix)?));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<TypeDescriptor, ParseError> {
        let mut ty = self.parse_atom()?;
        while self.at_adjacent(Token::LBracket) {
            self.bump();
            self.expect(Token::RBracket, "expected `]`")?;
            ty = TypeDescriptor::Collection {
                key: None,
                value: Some(Box::new(ty)),
            };
        }
        Ok(ty)
    }

    fn parse_atom(&mut self) -> Result<TypeDescriptor, ParseError> {
        let Some((tok, span)) = self.bump() else {
            return Err(ParseError::new(self.src, self.src.len(), "expected a type"));
        };
        match tok {
            Ok(Token::LParen) => {
                let ty = self.parse_union()?;
                self.expect(Token::RParen, "expected `)`")?;
                Ok(ty)
            }
            Ok(Token::Int(i)) => Ok(TypeDescriptor::Literal(Literal::Int(i))),
            Ok(Token::Float(x)) => Ok(TypeDescriptor::Literal(Literal::Float(x))),
            Ok(Token::Str(s)) => Ok(TypeDescriptor::Literal(Literal::String(s.to_string()))),
            Ok(Token::Variable("this")) => Ok(TypeDescriptor::This),
            Ok(Token::Variable(_)) => Err(ParseError::new(self.src, span.start, "expected a type, found a variable")),
            Ok(Token::Ident(name)) => self.parse_named(name, span.start),
            _ => Err(ParseError::new(self.src, span.start, "expected a type")),
        }
    }

    fn parse_named(&mut self, name: &'src str, start: usize) -> Result<TypeDescriptor, ParseError> {
        if self.at_adjacent(Token::DoubleColon) {
            return self.parse_expression(start);
        }

        let word = name.to_ascii_lowercase();
        let ty = match word.as_str() {
            "int" | "integer" if self.at_adjacent(Token::LAngle) => return self.parse_int_range(),
            "object" if self.at_adjacent(Token::LBrace) => return self.parse_shape(),
            "array" => return self.parse_collection(),
            "list" | "non-empty-list" => {
                let mut args = self.parse_generic_args()?;
                if args.len() > 1 {
                    return Err(ParseError::new(self.src, start, "list takes one type argument"));
                }
                return Ok(TypeDescriptor::List {
                    item: Box::new(args.pop().unwrap_or(TypeDescriptor::Mixed)),
                    non_empty: word == "non-empty-list",
                });
            }
            "iterable" => {
                self.parse_generic_args()?;
                return Ok(TypeDescriptor::Iterable);
            }
            "callable" | "closure" | "callable-string" => {
                self.skip_callable_signature()?;
                return Ok(TypeDescriptor::Callable);
            }
            _ => keyword_type(&word),
        };

        let ty = match ty {
            Some(ty) => ty,
            None => match self.templates.iter().find(|t| t.name == name) {
                Some(param) => TypeDescriptor::Template {
                    name: param.name.clone(),
                    bound: param.bound.clone().map(Box::new),
                },
                None => TypeDescriptor::Class(name.to_string()),
            },
        };

        if self.at_adjacent(Token::LAngle) {
            let args = self.parse_generic_args()?;
            return Ok(TypeDescriptor::Generic {
                base: name.to_string(),
                args,
            });
        }
        Ok(ty)
    }

    /// `<T, U>` if present, else nothing.
    fn parse_generic_args(&mut self) -> Result<Vec<TypeDescriptor>, ParseError> {
        if !self.at_adjacent(Token::LAngle) {
            return Ok(Vec::new());
        }
        self.bump();
        let mut args = vec![self.parse_union()?];
        while self.eat(Token::Comma) {
            args.push(self.parse_union()?);
        }
        self.expect(Token::RAngle, "expected `>`")?;
        Ok(args)
    }

    fn parse_collection(&mut self) -> Result<TypeDescriptor, ParseError> {
        if self.at_adjacent(Token::LBrace) {
            return Err(self.error_here("array shapes are not supported, use object{...}"));
        }
        let mut args = self.parse_generic_args()?;
        let (key, value) = match args.len() {
            0 => (None, None),
            1 => (None, args.pop()),
            2 => {
                let value = args.pop();
                (args.pop(), value)
            }
            _ => return Err(self.error_here("array takes at most two type arguments")),
        };
        Ok(TypeDescriptor::Collection {
            key: key.map(Box::new),
            value: value.map(Box::new),
        })
    }

    fn parse_int_range(&mut self) -> Result<TypeDescriptor, ParseError> {
        self.bump();
        let min = self.parse_range_bound("min")?;
        self.expect(Token::Comma, "expected `,` in integer range")?;
        let max = self.parse_range_bound("max")?;
        self.expect(Token::RAngle, "expected `>`")?;
        Ok(TypeDescriptor::IntRange { min, max })
    }

    fn parse_range_bound(&mut self, open: &str) -> Result<Option<i64>, ParseError> {
        match self.peek_token() {
            Some(Token::Int(i)) => {
                self.bump();
                Ok(Some(i))
            }
            Some(Token::Ident(word)) if word == open => {
                self.bump();
                Ok(None)
            }
            _ => Err(self.error_here("expected an integer bound")),
        }
    }

    fn parse_shape(&mut self) -> Result<TypeDescriptor, ParseError> {
        self.bump();
        let mut entries = Vec::new();
        while !self.at(Token::RBrace) {
            let key = match self.bump() {
                Some((Ok(Token::Ident(k) | Token::Str(k)), _)) => k.to_string(),
                Some((Ok(Token::Int(i)), _)) => i.to_string(),
                Some((_, span)) => return Err(ParseError::new(self.src, span.start, "expected a shape key")),
                None => return Err(ParseError::new(self.src, self.src.len(), "unterminated object shape")),
            };
            let optional = self.eat(Token::Question);
            self.expect(Token::Colon, "expected `:` after shape key")?;
            let ty = self.parse_union()?;
            entries.push(ShapeEntry { key, optional, ty });
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace, "expected `}`")?;
        Ok(TypeDescriptor::Shape(entries))
    }

    /// `callable(int, string ...$rest): bool`; only syntax is checked.
    fn skip_callable_signature(&mut self) -> Result<(), ParseError> {
        if !self.at_adjacent(Token::LParen) {
            return Ok(());
        }
        self.bump();
        while !self.at(Token::RParen) {
            self.parse_union()?;
            self.eat(Token::Ellipsis);
            if let Some(Token::Variable(_)) = self.peek_token() {
                self.bump();
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, "expected `)`")?;
        if self.eat(Token::Colon) {
            self.nested(Self::parse_prefix)?;
        }
        Ok(())
    }

    /// `Foo::BAR`, `Foo::BAR_*`, `Foo::*`
    fn parse_expression(&mut self, start: usize) -> Result<TypeDescriptor, ParseError> {
        self.bump();
        let mut matched = false;
        if let Some(Token::Ident(_)) = self.peek_token() {
            self.bump();
            matched = true;
        }
        if self.at_adjacent(Token::Star) || (!matched && self.at(Token::Star)) {
            self.bump();
            matched = true;
        }
        if !matched {
            return Err(self.error_here("expected a constant name after `::`"));
        }
        Ok(TypeDescriptor::Expression(self.src[start..self.end].to_string()))
    }
}

/// Keywords that stand alone (no parameters).
fn keyword_type(word: &str) -> Option<TypeDescriptor> {
    if let Some(refinement) = Refinement::from_keyword(word) {
        return Some(TypeDescriptor::Refined(refinement));
    }
    Some(match word {
        "mixed" => TypeDescriptor::Mixed,
        "null" => TypeDescriptor::Null,
        "bool" | "boolean" => TypeDescriptor::Bool,
        "true" => TypeDescriptor::Literal(Literal::Bool(true)),
        "false" => TypeDescriptor::Literal(Literal::Bool(false)),
        "int" | "integer" => TypeDescriptor::Int,
        "float" | "double" => TypeDescriptor::Float,
        "string" => TypeDescriptor::String,
        "scalar" => TypeDescriptor::Scalar,
        "array-key" => TypeDescriptor::ArrayKey,
        "object" => TypeDescriptor::Object,
        "self" => TypeDescriptor::SelfType,
        "static" => TypeDescriptor::Static,
        "parent" => TypeDescriptor::Parent,
        "void" => TypeDescriptor::Void,
        "never" | "never-return" | "never-returns" | "no-return" => TypeDescriptor::Never,
        "resource" | "closed-resource" | "open-resource" => TypeDescriptor::Resource,
        _ => return None,
    })
}

/// Names that can never be a class.
pub fn is_reserved_word(word: &str) -> bool {
    let word = word.to_ascii_lowercase();
    keyword_type(&word).is_some()
        || matches!(
            word.as_str(),
            "array" | "list" | "non-empty-list" | "iterable" | "callable" | "closure" | "callable-string"
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(src: &str) -> TypeDescriptor {
        parse_type(src, &[]).unwrap()
    }

    #[rstest]
    #[case("string", TypeDescriptor::String)]
    #[case("integer", TypeDescriptor::Int)]
    #[case("double", TypeDescriptor::Float)]
    #[case("mixed", TypeDescriptor::Mixed)]
    #[case("'test'", TypeDescriptor::Literal(Literal::String("test".into())))]
    #[case("123", TypeDescriptor::Literal(Literal::Int(123)))]
    #[case("false", TypeDescriptor::Literal(Literal::Bool(false)))]
    #[case("$this", TypeDescriptor::This)]
    #[case("?string", TypeDescriptor::nullable(TypeDescriptor::String))]
    #[case("non-empty-string", TypeDescriptor::Refined(Refinement::NonEmptyString))]
    #[case("void", TypeDescriptor::Void)]
    #[case(r"\App\Person", TypeDescriptor::class(r"\App\Person"))]
    fn parses_simple_types(#[case] src: &str, #[case] expected: TypeDescriptor) {
        assert_eq!(parse(src), expected);
    }

    #[test]
    fn union_binds_looser_than_intersection() {
        assert_eq!(
            parse("int|A&B"),
            TypeDescriptor::Union(vec![
                TypeDescriptor::Int,
                TypeDescriptor::Intersection(vec![TypeDescriptor::class("A"), TypeDescriptor::class("B")]),
            ])
        );
    }

    #[test]
    fn parses_generics_and_collections() {
        assert_eq!(
            parse("Response<Person>"),
            TypeDescriptor::Generic {
                base: "Response".into(),
                args: vec![TypeDescriptor::class("Person")],
            }
        );
        assert_eq!(
            parse("array<string, int[]>"),
            TypeDescriptor::Collection {
                key: Some(Box::new(TypeDescriptor::String)),
                value: Some(Box::new(TypeDescriptor::Collection {
                    key: None,
                    value: Some(Box::new(TypeDescriptor::Int)),
                })),
            }
        );
        assert_eq!(
            parse("non-empty-list<Map<A, B>>"),
            TypeDescriptor::List {
                item: Box::new(TypeDescriptor::Generic {
                    base: "Map".into(),
                    args: vec![TypeDescriptor::class("A"), TypeDescriptor::class("B")],
                }),
                non_empty: true,
            }
        );
    }

    #[test]
    fn parses_object_shape() {
        assert_eq!(
            parse("object{'aa': string, bb?: bool, cc: int|float}"),
            TypeDescriptor::Shape(vec![
                ShapeEntry {
                    key: "aa".into(),
                    optional: false,
                    ty: TypeDescriptor::String
                },
                ShapeEntry {
                    key: "bb".into(),
                    optional: true,
                    ty: TypeDescriptor::Bool
                },
                ShapeEntry {
                    key: "cc".into(),
                    optional: false,
                    ty: TypeDescriptor::Union(vec![TypeDescriptor::Int, TypeDescriptor::Float]),
                },
            ])
        );
    }

    #[test]
    fn parses_int_range() {
        assert_eq!(
            parse("int<0, max>"),
            TypeDescriptor::IntRange {
                min: Some(0),
                max: None
            }
        );
    }

    #[test]
    fn callable_signature_is_consumed() {
        assert_eq!(parse("callable(int, string ...$rest): string"), TypeDescriptor::Callable);
    }

    #[test]
    fn class_constant_is_an_expression() {
        assert_eq!(parse("Foo::BAR_*"), TypeDescriptor::Expression("Foo::BAR_*".into()));
    }

    #[test]
    fn template_names_resolve_from_scope() {
        let templates = vec![TemplateParam {
            name: "T".into(),
            bound: Some(TypeDescriptor::Object),
        }];
        assert_eq!(
            parse_type("T[]", &templates).unwrap(),
            TypeDescriptor::Collection {
                key: None,
                value: Some(Box::new(TypeDescriptor::Template {
                    name: "T".into(),
                    bound: Some(Box::new(TypeDescriptor::Object)),
                })),
            }
        );
    }

    #[test]
    fn prefix_parse_stops_before_free_text() {
        let src = "int|string $count The number [of] things";
        let (ty, end) = parse_type_prefix(src, &[]).unwrap();
        assert_eq!(ty, TypeDescriptor::Union(vec![TypeDescriptor::Int, TypeDescriptor::String]));
        assert_eq!(&src[end..], " $count The number [of] things");
    }

    #[rstest]
    #[case::groups(format!("{}int{}", "(".repeat(5_000), ")".repeat(5_000)))]
    #[case::nullables(format!("{}int", "?".repeat(5_000)))]
    #[case::lists(format!("{}int{}", "list<".repeat(5_000), ">".repeat(5_000)))]
    #[case::callables("callable(): ".repeat(5_000) + "int")]
    fn deep_nesting_is_an_error(#[case] src: String) {
        let err = parse_type(&src, &[]).unwrap_err();
        assert_eq!(err.message, "type is nested too deeply");
    }

    #[test]
    fn nesting_up_to_the_ceiling_parses() {
        let depth = MAX_NESTING - 1;
        let src = format!("{}int{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&src), TypeDescriptor::Int);
    }

    #[test]
    fn reports_trailing_input() {
        let err = parse_type("int string", &[]).unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(parse_type("array<int", &[]).is_err());
        assert!(parse_type("", &[]).is_err());
    }
}
