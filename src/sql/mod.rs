//! Lexing shared by the splitter, the tolerant tree and completion.
//!
//! The tokenizer never fails. Unknown characters become
//! [`TokenKind::Other`] and an unterminated literal or quoted identifier
//! runs to the end of the text, so half typed SQL still yields a usable
//! token stream. Identifier casing is preserved.
//!
//! ```rust
//! use pglens::sql::{Keyword, tokenize};
//!
//! let tokens = tokenize("SELECT a FROM \"My Table\"");
//! assert!(tokens[0].is_keyword(Keyword::Select));
//! assert_eq!(tokens[3].name(), Some("My Table"));
//! ```

pub mod keyword;
pub mod token;
pub mod token_kind;
pub mod tokenizer;

pub use keyword::Keyword;
pub use token::Token;
pub use token_kind::TokenKind;
pub use tokenizer::{MAX_LOOKAHEAD, Tokenizer, tokenize};
