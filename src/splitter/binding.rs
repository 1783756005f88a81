//! Binding powers for statement-opening keywords.
//!
//! Every keyword that can open a statement belongs to a [`StatementClass`]
//! whose binding power says how hard it pushes to start a new statement. The
//! left context (previous token plus a few facts about the open statement)
//! has an absorbing power; the keyword continues the open statement iff the
//! left context absorbs at least its binding power. Rules are per keyword
//! class, never per statement grammar.
use super::Frame;
use crate::sql::{Keyword, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatementClass {
    Query,
    Dml,
    Ddl,
    Utility,
}

pub const NONE: u8 = 0;
pub const QUERY: u8 = StatementClass::Query.binding_power();
pub const DML: u8 = StatementClass::Dml.binding_power();
pub const DDL: u8 = StatementClass::Ddl.binding_power();
pub const UTILITY: u8 = StatementClass::Utility.binding_power();

impl StatementClass {
    pub const fn binding_power(self) -> u8 {
        match self {
            StatementClass::Query => 10,
            StatementClass::Dml => 20,
            StatementClass::Ddl => 30,
            StatementClass::Utility => 40,
        }
    }
}

/// Class of a keyword that may open a statement at depth 0.
pub fn opener(kw: Keyword) -> Option<StatementClass> {
    use Keyword::*;
    use StatementClass::*;
    let class = match kw {
        Select | With | Values => Query,
        Insert | Update | Delete | Merge => Dml,
        Create | Alter | Drop | Truncate | Grant | Revoke | Comment => Ddl,
        Explain | Analyze | Vacuum | Copy | Begin | Start | Commit | Rollback | Abort | End
        | Savepoint | Release | Prepare | Execute | Deallocate | Set | Reset | Show | Do
        | Call | Lock | Listen | Notify | Unlisten | Declare | Fetch | Close | Move
        | Discard | Refresh | Reindex | Cluster | Checkpoint | Load | Import => Utility,
        _ => return None,
    };
    Some(class)
}

/// Unreserved in PostgreSQL, so regularly used as a column or table name.
pub fn is_weak(kw: Keyword) -> bool {
    use Keyword::*;
    matches!(
        kw,
        Comment
            | Set
            | Reset
            | Show
            | Start
            | Abort
            | End
            | Savepoint
            | Release
            | Prepare
            | Execute
            | Deallocate
            | Call
            | Lock
            | Listen
            | Notify
            | Unlisten
            | Declare
            | Fetch
            | Close
            | Move
            | Discard
            | Refresh
            | Reindex
            | Cluster
            | Checkpoint
            | Load
            | Import
    )
}

/// The previous token still needs an operand, so a weak keyword after it is
/// a name.
fn expects_operand(prev: &TokenKind) -> bool {
    use Keyword::*;
    match prev {
        TokenKind::Comma | TokenKind::Dot => true,
        kind if kind.is_binary_operator() => true,
        TokenKind::Keyword(k) => matches!(
            k,
            Select
                | From
                | Where
                | And
                | Or
                | Not
                | By
                | On
                | Join
                | Is
                | In
                | When
                | Then
                | Else
                | As
                | Distinct
                | Into
                | Using
                | Having
                | Returning
                | Set
        ),
        _ => false,
    }
}

/// A weak keyword followed by this token is being used as a name.
fn continues_expression(next: &TokenKind) -> bool {
    match next {
        TokenKind::Comma | TokenKind::Dot | TokenKind::ParenClose | TokenKind::Other('*') => true,
        kind if kind.is_binary_operator() => true,
        TokenKind::Keyword(k) => k.is_clause_continuation(),
        _ => false,
    }
}

fn confirms(kw: Keyword, next: Option<&TokenKind>) -> bool {
    match kw {
        Keyword::Comment => next.is_some_and(|n| n.is_keyword(Keyword::On)),
        _ => !next.is_some_and(continues_expression),
    }
}

/// Whether `kw` at depth 0 continues the statement described by `frame`.
pub(super) fn binds(
    frame: &Frame,
    kw: Keyword,
    prev: Option<&TokenKind>,
    next: Option<&TokenKind>,
) -> bool {
    let Some(class) = opener(kw) else {
        return true;
    };
    if is_weak(kw) && (prev.is_some_and(expects_operand) || !confirms(kw, next)) {
        return true;
    }
    absorbing_power(frame, kw, prev, next) >= class.binding_power()
}

fn absorbing_power(
    frame: &Frame,
    kw: Keyword,
    prev: Option<&TokenKind>,
    next: Option<&TokenKind>,
) -> u8 {
    use Keyword::*;
    let head = frame.head;
    let prev_kw = prev.and_then(TokenKind::keyword);
    let next_is_object = next
        .and_then(TokenKind::keyword)
        .is_some_and(Keyword::is_object_kind);

    match prev_kw {
        Some(Union | Intersect | Except | All | Distinct) => return QUERY,
        Some(As) => return DML,
        Some(Explain | Vacuum) => return UTILITY,
        Some(Analyze | Verbose) if head == Some(Explain) => return DML,
        Some(Do | Also | Instead) if head == Some(Create) => return DML,
        Some(Do) if frame.inserting => return DML,
        Some(Conflict) if kw == Do => return UTILITY,
        Some(For) => return DML,
        Some(Then) if head == Some(Merge) => return DML,
        Some(On | Commit) if head == Some(Create) => return UTILITY,
        Some(On | Or | After | Before | Of) if matches!(head, Some(Create | Alter)) => return DDL,
        Some(Update | Delete) if kw == Set => return UTILITY,
        Some(Grant | Revoke) => return DDL,
        Some(With) if kw == Grant => return DDL,
        _ => {}
    }

    let in_privilege_list =
        matches!(head, Some(Grant | Revoke)) || matches!(frame.last, Some(Grant | Revoke));
    if matches!(prev, Some(TokenKind::Comma)) && in_privilege_list {
        return DDL;
    }
    if frame.cte_pending && matches!(prev, Some(TokenKind::ParenClose)) {
        return DML;
    }
    if frame.inserting && kw == Do {
        return UTILITY;
    }
    if frame.awaiting_query && matches!(kw, Select | Values | With) {
        return QUERY;
    }
    if frame.last == Some(Update) && kw == Set {
        return UTILITY;
    }

    match (head, kw) {
        (Some(Explain), _) if matches!(prev, Some(TokenKind::ParenClose)) => DML,
        (Some(Create), Set | Reset) if frame.routine => UTILITY,
        (Some(Create), Execute | Do) => UTILITY,
        (Some(Create | Alter | Copy | Grant | Revoke), With) => DDL,
        (Some(Declare), With) => QUERY,
        (Some(Rollback | Release), Savepoint) => UTILITY,
        (Some(Alter), Drop | Alter | Set | Reset | Grant | Revoke) if !next_is_object => UTILITY,
        _ => NONE,
    }
}
