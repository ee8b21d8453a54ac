use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'src> {
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("?")]
    Question,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token(",")]
    Comma,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token("*")]
    Star,
    #[token("...")]
    Ellipsis,
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r#"'[^'\n]*'|"[^"\n]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Str(&'src str),
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Variable(&'src str),
    #[regex(r"\\?[A-Za-z_][A-Za-z0-9_]*(-[A-Za-z0-9_]+)*(\\[A-Za-z_][A-Za-z0-9_]*)*", |lex| lex.slice())]
    Ident(&'src str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(src: &str) -> Vec<Token<'_>> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn lexes_qualified_names_and_keywords() {
        assert_eq!(
            lex(r"?\App\Model\Person|non-empty-string"),
            vec![
                Token::Question,
                Token::Ident(r"\App\Model\Person"),
                Token::Pipe,
                Token::Ident("non-empty-string"),
            ]
        );
    }

    #[test]
    fn lexes_literals() {
        assert_eq!(
            lex("'a b'|-12|1.5|$this"),
            vec![
                Token::Str("a b"),
                Token::Pipe,
                Token::Int(-12),
                Token::Pipe,
                Token::Float(1.5),
                Token::Pipe,
                Token::Variable("this"),
            ]
        );
    }

    #[test]
    fn lexes_class_constants() {
        assert_eq!(
            lex("Foo::BAR_*"),
            vec![Token::Ident("Foo"), Token::DoubleColon, Token::Ident("BAR_"), Token::Star]
        );
    }
}
