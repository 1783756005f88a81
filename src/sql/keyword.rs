//! SQL keyword model used by the lenient tokenizer.
//!
//! Only words that matter to statement splitting, the tolerant clause tree
//! or completion context are listed. Everything else stays an identifier,
//! which keeps the tokenizer forgiving: column and table names that happen
//! to collide with unlisted keywords are never misclassified.
//!
//! Design notes:
//! - Keywords are matched case-insensitively via `from_lower` using a
//!   pre-lower-cased string slice.
//! - `as_str` provides the canonical lowercase representation.

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// Every keyword, in declaration order.
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant,)*];

            /// Attempt to classify a *lower-cased* word slice into a `Keyword`.
            /// Returns `None` if the word is not a recognized keyword.
            ///
            /// NOTE: The caller is responsible for lower-casing the input.
            pub fn from_lower(word: &str) -> Option<Self> {
                match word {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            /// Canonical lowercase string form of the keyword.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Abort => "abort",
    Add => "add",
    After => "after",
    All => "all",
    Also => "also",
    Alter => "alter",
    Analyze => "analyze",
    And => "and",
    As => "as",
    Atomic => "atomic",
    Before => "before",
    Begin => "begin",
    By => "by",
    Call => "call",
    Cascade => "cascade",
    Case => "case",
    Checkpoint => "checkpoint",
    Close => "close",
    Cluster => "cluster",
    Column => "column",
    Comment => "comment",
    Commit => "commit",
    Conflict => "conflict",
    Constraint => "constraint",
    Copy => "copy",
    Create => "create",
    Cross => "cross",
    Database => "database",
    Deallocate => "deallocate",
    Declare => "declare",
    Default => "default",
    Delete => "delete",
    Discard => "discard",
    Distinct => "distinct",
    Do => "do",
    Domain => "domain",
    Drop => "drop",
    Else => "else",
    End => "end",
    Except => "except",
    Execute => "execute",
    Exists => "exists",
    Explain => "explain",
    Extension => "extension",
    Fetch => "fetch",
    For => "for",
    From => "from",
    Full => "full",
    Function => "function",
    Grant => "grant",
    Group => "group",
    Having => "having",
    If => "if",
    Import => "import",
    In => "in",
    Index => "index",
    Inner => "inner",
    Insert => "insert",
    Instead => "instead",
    Intersect => "intersect",
    Into => "into",
    Is => "is",
    Join => "join",
    Lateral => "lateral",
    Left => "left",
    Limit => "limit",
    Listen => "listen",
    Load => "load",
    Lock => "lock",
    Materialized => "materialized",
    Merge => "merge",
    Move => "move",
    Natural => "natural",
    Not => "not",
    Notify => "notify",
    Null => "null",
    Of => "of",
    Offset => "offset",
    On => "on",
    Only => "only",
    Or => "or",
    Order => "order",
    Outer => "outer",
    Policy => "policy",
    Prepare => "prepare",
    Procedure => "procedure",
    Recursive => "recursive",
    Refresh => "refresh",
    Reindex => "reindex",
    Release => "release",
    Replace => "replace",
    Reset => "reset",
    Returning => "returning",
    Revoke => "revoke",
    Right => "right",
    Role => "role",
    Rollback => "rollback",
    Rule => "rule",
    Savepoint => "savepoint",
    Schema => "schema",
    Select => "select",
    Sequence => "sequence",
    Set => "set",
    Show => "show",
    Start => "start",
    Table => "table",
    Temp => "temp",
    Temporary => "temporary",
    Then => "then",
    Trigger => "trigger",
    Truncate => "truncate",
    Type => "type",
    Union => "union",
    Unlisten => "unlisten",
    Unlogged => "unlogged",
    Update => "update",
    User => "user",
    Using => "using",
    Vacuum => "vacuum",
    Values => "values",
    Verbose => "verbose",
    View => "view",
    When => "when",
    Where => "where",
    Window => "window",
    With => "with",
}

impl Keyword {
    /// Keywords that end a FROM / JOIN table list.
    pub const TERMINATORS: [Self; 12] = [
        Keyword::Where,
        Keyword::Group,
        Keyword::Order,
        Keyword::Limit,
        Keyword::Offset,
        Keyword::Union,
        Keyword::Except,
        Keyword::Intersect,
        Keyword::On,
        Keyword::Having,
        Keyword::Window,
        Keyword::Returning,
    ];

    /// Names a kind of schema object (`DROP TABLE`, `ALTER INDEX`, ...).
    pub fn is_object_kind(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            Table
                | Index
                | View
                | Schema
                | Function
                | Procedure
                | Sequence
                | Type
                | Trigger
                | Role
                | User
                | Database
                | Extension
                | Policy
                | Materialized
                | Domain
                | Rule
                | Temp
                | Temporary
                | Unlogged
        )
    }

    /// Keywords that can only continue an expression or clause list, never
    /// start one.
    pub fn is_clause_continuation(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            From | As
                | Where
                | Group
                | Order
                | By
                | Limit
                | Offset
                | Union
                | Except
                | Intersect
                | Join
                | On
                | Having
                | Is
                | In
                | And
                | Or
                | Then
                | Else
                | End
                | Into
                | Using
                | Window
                | Returning
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_keywords() {
        for w in ["select", "from", "join", "with", "insert", "begin", "atomic"] {
            assert!(Keyword::from_lower(w).is_some(), "{w} should be recognized");
        }
    }

    #[test]
    fn rejects_unknown_words() {
        for w in ["foo", "bar", "users", "garbage", "text", "random"] {
            assert!(
                Keyword::from_lower(w).is_none(),
                "{w} should NOT be recognized"
            );
        }
    }

    #[test]
    fn every_keyword_round_trips_through_its_text() {
        for kw in Keyword::ALL {
            assert_eq!(Keyword::from_lower(kw.as_str()), Some(*kw));
            assert_eq!(kw.to_string(), kw.as_str());
        }
    }

    #[test]
    fn object_kinds_are_not_clause_continuations() {
        assert!(Keyword::Table.is_object_kind());
        assert!(!Keyword::Table.is_clause_continuation());
        assert!(Keyword::From.is_clause_continuation());
        assert!(!Keyword::Select.is_object_kind());
    }
}
