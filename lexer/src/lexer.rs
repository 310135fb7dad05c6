use asciifile::{Position, PositionIterator, Span, Spanned};
use compiler_shared::context::Context;
use derive_more::Display;
use diagnostics::u8_to_printable_representation;
use failure::Fail;
use std::{convert::TryFrom, fmt, result::Result};

macro_rules! match_op {
    (@consume $input:expr, $span:ident, $len:expr, $right:expr) => {{
        // the span was peeked, so there are at least $len positions left
        debug_assert!($len >= 1);
        for _ in 0..$len {
            $input.next();
        }
        Some(Ok(Token::new($span, TokenKind::Operator($right))))
    }};
    ($input:expr, $( ($token_string:expr, $token:expr) ),+: $len:expr, $default:expr) => {{
        match $input.peek_exactly($len) {
            $(
                Some(span) if span.as_str() == $token_string => {
                    match_op!(@consume $input, span, $len, $token)
                }
            )+
            _ => $default,
        }
    }};
}

pub type TokenResult<'f> = Result<Token<'f>, LexicalError<'f>>;

pub type Token<'f> = Spanned<'f, TokenKind<'f>>;
pub type LexicalError<'f> = Spanned<'f, ErrorKind>;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
/// Keywords are single-ticked, operators back-ticked
pub enum TokenKind<'f> {
    #[display(fmt = "'{}'", _0)]
    Keyword(Keyword),
    #[display(fmt = "`{}`", _0)]
    Operator(Operator),
    #[display(fmt = "identifier `{}`", _0)]
    Identifier(&'f str),
    #[display(fmt = "integer literal `{}`", _0)]
    IntegerLiteral(&'f str),
    #[display(fmt = "a comment")]
    Comment(&'f str),
    #[display(fmt = "whitespace")]
    Whitespace,
}

impl TokenKind<'_> {
    pub fn is_trivia(&self) -> bool {
        match self {
            TokenKind::Whitespace | TokenKind::Comment(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Fail)]
pub enum ErrorKind {
    UnclosedComment,
    UnexpectedCharacter(u8),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::UnclosedComment => write!(f, "unclosed comment"),
            ErrorKind::UnexpectedCharacter(byte) => fmt_unexpected_character(f, byte),
        }
    }
}

fn fmt_unexpected_character(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    match byte as char {
        '\n' => write!(f, "Unexpected newline"),
        '\\' => write!(f, "Unexpected backslash"),
        '\'' => write!(f, "Unexpected single quote"),
        '"' => write!(f, "Unexpected double quote"),
        chr if chr.is_control() => write!(
            f,
            "Unexpected control character '{}'",
            u8_to_printable_representation(byte)
        ),
        _ => write!(
            f,
            "Unexpected character '{}'",
            u8_to_printable_representation(byte)
        ),
    }
}

#[derive(Debug, Fail)]
pub enum Warning {
    #[fail(display = "confusing usage of comment separator inside a comment")]
    CommentSeparatorInsideComment,
}

/// The reserved words of the grammar. `System.out.println` is a single
/// token, it cannot be split by whitespace or comments.
#[derive(Debug, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Copy, Display)]
pub enum Keyword {
    #[display(fmt = "boolean")]
    Boolean,
    #[display(fmt = "class")]
    Class,
    #[display(fmt = "else")]
    Else,
    #[display(fmt = "extends")]
    Extends,
    #[display(fmt = "false")]
    False,
    #[display(fmt = "if")]
    If,
    #[display(fmt = "int")]
    Int,
    #[display(fmt = "length")]
    Length,
    #[display(fmt = "main")]
    Main,
    #[display(fmt = "new")]
    New,
    #[display(fmt = "public")]
    Public,
    #[display(fmt = "return")]
    Return,
    #[display(fmt = "static")]
    Static,
    #[display(fmt = "String")]
    String,
    #[display(fmt = "this")]
    This,
    #[display(fmt = "true")]
    True,
    #[display(fmt = "void")]
    Void,
    #[display(fmt = "while")]
    While,
    #[display(fmt = "System.out.println")]
    PrintLn,
}

const PRINTLN: &str = "System.out.println";

impl TryFrom<&str> for Keyword {
    type Error = ();

    fn try_from(s: &str) -> Result<Keyword, Self::Error> {
        use self::Keyword::*;

        match s {
            "boolean" => Ok(Boolean),
            "class" => Ok(Class),
            "else" => Ok(Else),
            "extends" => Ok(Extends),
            "false" => Ok(False),
            "if" => Ok(If),
            "int" => Ok(Int),
            "length" => Ok(Length),
            "main" => Ok(Main),
            "new" => Ok(New),
            "public" => Ok(Public),
            "return" => Ok(Return),
            "static" => Ok(Static),
            "String" => Ok(String),
            "this" => Ok(This),
            "true" => Ok(True),
            "void" => Ok(Void),
            "while" => Ok(While),
            PRINTLN => Ok(PrintLn),
            _ => Err(()),
        }
    }
}

// Use non-semantic names, since e.g. '<' might mean more than 'less-than'
#[derive(Debug, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Copy, Display)]
pub enum Operator {
    #[display(fmt = "&&")]
    DoubleAmpersand,
    #[display(fmt = "!")]
    Exclaim,
    #[display(fmt = "(")]
    LeftParen,
    #[display(fmt = ")")]
    RightParen,
    #[display(fmt = "*")]
    Star,
    #[display(fmt = "+")]
    Plus,
    #[display(fmt = ",")]
    Comma,
    #[display(fmt = "-")]
    Minus,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = ";")]
    Semicolon,
    #[display(fmt = "<")]
    LeftChevron,
    #[display(fmt = "=")]
    Equal,
    #[display(fmt = "[")]
    LeftBracket,
    #[display(fmt = "]")]
    RightBracket,
    #[display(fmt = "{{")]
    LeftBrace,
    #[display(fmt = "}}")]
    RightBrace,
}

pub struct Lexer<'f> {
    input: PositionIterator<'f>,
    context: &'f Context<'f>,
}

/// Test if the given characters are whitespace characters of the language
fn is_minijava_whitespace(c: char) -> bool {
    match c {
        ' ' | '\n' | '\r' | '\t' | '\x0c' => true,
        _ => false,
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'f> Lexer<'f> {
    pub fn new(context: &'f Context<'f>) -> Self {
        Self {
            input: context.file.iter(),
            context,
        }
    }

    fn lex_token(&mut self) -> Option<TokenResult<'f>> {
        let position = self.input.peek()?;
        Some(match position.chr() {
            'S' if self.input.matches(PRINTLN) && !self.println_continues() => {
                self.lex_println()
            }
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_or_keyword(),
            '1'..='9' => self.lex_integer_literal(),
            '0' => self.lex_zero_integer_literal(),
            c if is_minijava_whitespace(c) => self.lex_whitespace(),
            '/' if self.input.matches("/*") => self.lex_block_comment(),
            '/' if self.input.matches("//") => self.lex_line_comment(),

            _ => self.lex_operator().unwrap_or_else(|| {
                self.input.next();
                Err(LexicalError::new(
                    position.to_single_char_span(),
                    ErrorKind::UnexpectedCharacter(position.byte()),
                ))
            }),
        })
    }

    /// `System.out.printlnx` is not the print keyword followed by `x`
    /// because `System` on its own would be a valid identifier prefix.
    fn println_continues(&self) -> bool {
        self.input
            .peek_exactly(PRINTLN.len() + 1)
            .map(|span| span.end_position().chr())
            .map_or(false, is_identifier_char)
    }

    fn lex_println(&mut self) -> TokenResult<'f> {
        debug_assert!(self.input.matches(PRINTLN));
        let span = self.lex_n(PRINTLN.len());
        Ok(Token::new(span, TokenKind::Keyword(Keyword::PrintLn)))
    }

    fn lex_zero_integer_literal(&mut self) -> TokenResult<'f> {
        let span = self.lex_n(1);
        Ok(Token::new(span, TokenKind::IntegerLiteral("0")))
    }

    fn lex_identifier_or_keyword(&mut self) -> TokenResult<'f> {
        debug_assert!(matches!(
            self.input.peek().map(|p| p.chr()),
            Some('a'..='z') | Some('A'..='Z') | Some('_')
        ));

        let span = self.lex_while(|position| is_identifier_char(position.chr()));

        let kind = match Keyword::try_from(span.as_str()) {
            Ok(keyword) => TokenKind::Keyword(keyword),
            Err(_) => TokenKind::Identifier(span.as_str()),
        };

        Ok(Token::new(span, kind))
    }

    fn lex_integer_literal(&mut self) -> TokenResult<'f> {
        let span = self.lex_while(|position| position.chr().is_ascii_digit());
        Ok(Token::new(span, TokenKind::IntegerLiteral(span.as_str())))
    }

    fn lex_block_comment(&mut self) -> TokenResult<'f> {
        debug_assert!(self.input.matches("/*"));

        let opening = self.lex_n(2);
        let mut consumed = opening;

        loop {
            if self.input.matches("*/") {
                let closing = self.lex_n(2);
                consumed = Span::combine(&consumed, &closing);
                break;
            }

            if self.input.matches("/*") {
                if let Some(separator) = self.input.peek_exactly(2) {
                    self.context.diagnostics.warning(&Spanned {
                        span: separator,
                        data: Warning::CommentSeparatorInsideComment,
                    });
                }
            }

            match self.input.next() {
                Some(position) => consumed = consumed.extend_to_position(&position),
                None => return Err(LexicalError::new(consumed, ErrorKind::UnclosedComment)),
            }
        }

        let text = consumed.as_str();
        let body = &text[2..text.len() - 2];
        Ok(Token::new(consumed, TokenKind::Comment(body)))
    }

    fn lex_line_comment(&mut self) -> TokenResult<'f> {
        debug_assert!(self.input.matches("//"));
        let span = self.lex_while(|position| position.chr() != '\n');
        Ok(Token::new(span, TokenKind::Comment(&span.as_str()[2..])))
    }

    fn lex_whitespace(&mut self) -> TokenResult<'f> {
        let span = self.lex_while(|position| is_minijava_whitespace(position.chr()));
        Ok(Token::new(span, TokenKind::Whitespace))
    }

    fn lex_operator(&mut self) -> Option<TokenResult<'f>> {
        use self::Operator::*;

        match_op!(
            self.input,
            ("&&", DoubleAmpersand):
            2,
            match_op!(
                self.input,
                ("!", Exclaim),
                ("(", LeftParen),
                (")", RightParen),
                ("*", Star),
                ("+", Plus),
                (",", Comma),
                ("-", Minus),
                (".", Dot),
                (";", Semicolon),
                ("<", LeftChevron),
                ("=", Equal),
                ("[", LeftBracket),
                ("]", RightBracket),
                ("{", LeftBrace),
                ("}", RightBrace):
                1,
                None
            )
        )
    }

    /// Consume exactly `n` characters. The caller must have peeked them.
    fn lex_n(&mut self, n: usize) -> Span<'f> {
        debug_assert!(n >= 1);
        let span = self.input.peek_at_most(n);
        for _ in 0..n {
            self.input.next();
        }
        // peek_at_most only fails on exhausted input, which callers rule out
        span.unwrap_or_else(|| unreachable!("lex_n called at end of input"))
    }

    /// Collects characters from input until `predicate` is no longer true.
    /// The next character must exist and satisfy `predicate`.
    fn lex_while<P>(&mut self, predicate: P) -> Span<'f>
    where
        P: Fn(Position<'f>) -> bool,
    {
        let first = self.lex_n(1);
        let mut consumed = first;

        while let Some(position) = self.input.peek() {
            if !predicate(position) {
                break;
            }
            self.input.next();
            consumed = consumed.extend_to_position(&position);
        }

        consumed
    }
}

impl<'f> Iterator for Lexer<'f> {
    type Item = TokenResult<'f>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lex_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use diagnostics::MessageLevel;
    use utils::assert_matches;

    macro_rules! lex {
        ($tokens:ident = $input:expr) => {
            let file = AsciiFile::new($input.as_bytes()).unwrap();
            let context = Context::dummy(&file);
            let $tokens = Lexer::new(&context)
                .map(|result| result.map(|token| token.data))
                .filter(|result| match result {
                    Ok(kind) => !kind.is_trivia(),
                    Err(_) => true,
                })
                .collect::<Vec<_>>();
        };
    }

    fn kinds<'f>(results: Vec<Result<TokenKind<'f>, LexicalError<'f>>>) -> Vec<TokenKind<'f>> {
        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|e| panic!("unexpected lexical error: {}", e)))
            .collect()
    }

    #[test]
    fn minijava_whitespace() {
        for c in "\x07\x08\x0b".chars() {
            assert_eq!(is_minijava_whitespace(c), false)
        }
        for c in " \t\r\n\x0c".chars() {
            assert!(is_minijava_whitespace(c))
        }
    }

    #[test]
    fn main_class_header() {
        lex!(tokens = "class Main { public static void main(String[] a) {");
        assert_eq!(
            vec![
                TokenKind::Keyword(Keyword::Class),
                TokenKind::Identifier("Main"),
                TokenKind::Operator(Operator::LeftBrace),
                TokenKind::Keyword(Keyword::Public),
                TokenKind::Keyword(Keyword::Static),
                TokenKind::Keyword(Keyword::Void),
                TokenKind::Keyword(Keyword::Main),
                TokenKind::Operator(Operator::LeftParen),
                TokenKind::Keyword(Keyword::String),
                TokenKind::Operator(Operator::LeftBracket),
                TokenKind::Operator(Operator::RightBracket),
                TokenKind::Identifier("a"),
                TokenKind::Operator(Operator::RightParen),
                TokenKind::Operator(Operator::LeftBrace),
            ],
            kinds(tokens)
        );
    }

    #[test]
    fn println_is_a_single_token() {
        lex!(tokens = "System.out.println(x);System.out.printlnx System");
        assert_eq!(
            vec![
                TokenKind::Keyword(Keyword::PrintLn),
                TokenKind::Operator(Operator::LeftParen),
                TokenKind::Identifier("x"),
                TokenKind::Operator(Operator::RightParen),
                TokenKind::Operator(Operator::Semicolon),
                TokenKind::Identifier("System"),
                TokenKind::Operator(Operator::Dot),
                TokenKind::Identifier("out"),
                TokenKind::Operator(Operator::Dot),
                TokenKind::Identifier("printlnx"),
                TokenKind::Identifier("System"),
            ],
            kinds(tokens)
        );
    }

    #[test]
    fn operators_and_literals() {
        lex!(tokens = "a&&!b<10+0-3*x[i]");
        assert_eq!(
            vec![
                TokenKind::Identifier("a"),
                TokenKind::Operator(Operator::DoubleAmpersand),
                TokenKind::Operator(Operator::Exclaim),
                TokenKind::Identifier("b"),
                TokenKind::Operator(Operator::LeftChevron),
                TokenKind::IntegerLiteral("10"),
                TokenKind::Operator(Operator::Plus),
                TokenKind::IntegerLiteral("0"),
                TokenKind::Operator(Operator::Minus),
                TokenKind::IntegerLiteral("3"),
                TokenKind::Operator(Operator::Star),
                TokenKind::Identifier("x"),
                TokenKind::Operator(Operator::LeftBracket),
                TokenKind::Identifier("i"),
                TokenKind::Operator(Operator::RightBracket),
            ],
            kinds(tokens)
        );
    }

    #[test]
    fn leading_zero_is_its_own_literal() {
        lex!(tokens = "007");
        assert_eq!(
            vec![
                TokenKind::IntegerLiteral("0"),
                TokenKind::IntegerLiteral("0"),
                TokenKind::IntegerLiteral("7"),
            ],
            kinds(tokens)
        );
    }

    #[test]
    fn comments_are_trivia() {
        let file = AsciiFile::new(b"x // line\n/* block\n */ y").unwrap();
        let context = Context::dummy(&file);
        let tokens = Lexer::new(&context)
            .map(|r| r.unwrap().data)
            .collect::<Vec<_>>();

        assert_eq!(
            vec![
                TokenKind::Identifier("x"),
                TokenKind::Whitespace,
                TokenKind::Comment(" line"),
                TokenKind::Whitespace,
                TokenKind::Comment(" block\n "),
                TokenKind::Whitespace,
                TokenKind::Identifier("y"),
            ],
            tokens
        );
    }

    #[test]
    fn unclosed_comment() {
        lex!(tokens = "x /* never closed");
        assert_matches!(tokens.last(), Some(Err(Spanned { data: ErrorKind::UnclosedComment, .. })));
    }

    #[test]
    fn nested_comment_opener_warns() {
        let file = AsciiFile::new(b"/* a /* b */").unwrap();
        let context = Context::dummy(&file);
        let tokens = Lexer::new(&context).collect::<Vec<_>>();

        assert_eq!(1, tokens.len());
        assert_eq!(1, context.diagnostics.count(MessageLevel::Warning));
    }

    #[test]
    fn unexpected_character() {
        lex!(tokens = "int x = 1 % 2;");
        let errors = tokens
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.data.to_string())
            .collect::<Vec<_>>();
        assert_eq!(vec!["Unexpected character '%'".to_string()], errors);
    }

    #[test]
    fn token_display() {
        assert_eq!("'while'", TokenKind::Keyword(Keyword::While).to_string());
        assert_eq!("`{`", TokenKind::Operator(Operator::LeftBrace).to_string());
        assert_eq!("identifier `foo`", TokenKind::Identifier("foo").to_string());
    }
}
