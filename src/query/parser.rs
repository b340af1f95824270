//! Recursive-descent parser for the query language
//!
//! Grammar, in order of the parsing functions below:
//!
//! ```text
//! stmt_list  ::= stmt { [";"] stmt }
//! stmt       ::= select | update | delete
//! select     ::= SELECT (NUMBER | col_list) [WHERE cond] [ORDER BY order_list] [LIMIT NUMBER [, NUMBER]]
//!              | SELECT agg_list [WHERE cond] [GROUP BY col_list] [HAVING cond]
//! update     ::= UPDATE SET col "=" value { "," col "=" value } [WHERE cond]
//! delete     ::= DELETE [WHERE cond]
//! cond       ::= and_cond { OR and_cond }
//! and_cond   ::= not_cond { [AND] not_cond }
//! not_cond   ::= NOT not_cond | "(" cond ")" | CELLTYPE "(" col ")" "=" STRING
//!              | col cmpop value | col REGEXP STRING | col IS NULL
//! ```
//!
//! `NOT` binds tightest, then comparisons, then `AND` (explicit or implied by
//! juxtaposition), then `OR`.

use super::ast::{
    AggregateItem, AggregateTarget, Assignment, ColumnRef, CompareOp, Condition, Delete, Limit,
    OrderItem, ParseKind, Pattern, Sampling, Select, SelectAggregate, SelectItem, Statement,
    Update, ValueExpr,
};
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::aggregate::AggregateFunction;
use crate::cell::{CellValue, Coercible, ContentType};
use crate::error::{EngineError, EngineResult};
use crate::sheet::SortDirection;

/// Words that end a clause or start a statement, and so cannot be bare column names
const RESERVED: &[&str] = &[
    "SELECT", "UPDATE", "DELETE", "SET", "WHERE", "ORDER", "GROUP", "BY", "HAVING", "LIMIT",
    "AND", "OR", "NOT", "AS", "ASC", "DESC", "IS", "NULL", "REGEXP",
];

fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}

/// Parser over the tokens of one query text
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Tokenize `text` and prepare to parse it
    pub fn new(text: &str) -> EngineResult<Self> {
        Ok(Parser {
            tokens: Lexer::new(text).tokenize()?,
            current: 0,
        })
    }

    /// Parse the whole input as a list of statements
    ///
    /// # Returns
    /// * `Ok(statements)` with at least one statement
    /// * `Err(Syntax)` with the position of the first offending token
    pub fn parse_statements(&mut self) -> EngineResult<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            while self.peek().is_punctuator(";") {
                self.advance();
            }
            if self.peek().is_eof() {
                break;
            }
            if !statements.is_empty() && !self.at_statement_start() {
                return Err(self.unexpected("a new statement"));
            }
            statements.push(self.parse_statement()?);
        }

        if statements.is_empty() {
            return Err(EngineError::syntax("empty query", self.peek().position));
        }
        Ok(statements)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + n).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.current += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> EngineError {
        let token = self.peek();
        EngineError::syntax(
            format!("expected {}, found {}", expected, token),
            token.position,
        )
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> EngineResult<()> {
        if self.accept_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn accept_punctuator(&mut self, punct: &str) -> bool {
        if self.peek().is_punctuator(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punctuator(&mut self, punct: &str) -> EngineResult<()> {
        if self.accept_punctuator(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    fn expect_string(&mut self) -> EngineResult<Token> {
        if self.peek().kind == TokenKind::String {
            Ok(self.advance())
        } else {
            Err(self.unexpected("a double-quoted string"))
        }
    }

    fn at_statement_start(&self) -> bool {
        let token = self.peek();
        token.is_keyword("SELECT") || token.is_keyword("UPDATE") || token.is_keyword("DELETE")
    }

    fn parse_statement(&mut self) -> EngineResult<Statement> {
        if self.accept_keyword("SELECT") {
            self.parse_select()
        } else if self.accept_keyword("UPDATE") {
            self.parse_update()
        } else if self.accept_keyword("DELETE") {
            Ok(Statement::Delete(Delete {
                where_clause: self.parse_where()?,
            }))
        } else {
            Err(self.unexpected("SELECT, UPDATE or DELETE"))
        }
    }

    fn parse_select(&mut self) -> EngineResult<Statement> {
        if self.at_aggregate_call() {
            return self.parse_select_aggregate();
        }

        let (items, sample) = if self.peek().kind == TokenKind::Number {
            (vec![SelectItem::All], Some(self.parse_sampling()?))
        } else {
            (self.parse_select_items()?, None)
        };

        let where_clause = self.parse_where()?;

        let mut order_by = Vec::new();
        if self.accept_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let column = self.parse_column_ref()?;
                let direction = if self.accept_keyword("DESC") {
                    SortDirection::Descending
                } else {
                    self.accept_keyword("ASC");
                    SortDirection::Ascending
                };
                order_by.push(OrderItem { column, direction });
                if !self.accept_punctuator(",") {
                    break;
                }
            }
        }

        let limit = if self.accept_keyword("LIMIT") {
            let first = self.parse_count("LIMIT")?;
            if self.accept_punctuator(",") {
                let max = self.parse_count("LIMIT")?;
                Some(Limit { offset: first, max })
            } else {
                Some(Limit {
                    offset: 0,
                    max: first,
                })
            }
        } else {
            None
        };

        Ok(Statement::Select(Select {
            items,
            sample,
            where_clause,
            order_by,
            limit,
        }))
    }

    fn at_aggregate_call(&self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Word
            && AggregateFunction::from_name(&token.literal).is_some()
            && self.peek_at(1).is_punctuator("(")
    }

    fn parse_sampling(&mut self) -> EngineResult<Sampling> {
        let token = self.advance();
        let n: f64 = token
            .literal
            .parse()
            .map_err(|_| EngineError::syntax("invalid sample size", token.position))?;
        if n >= 1.0 {
            Ok(Sampling::Count(n.floor() as usize))
        } else if n > 0.0 {
            Ok(Sampling::Fraction(n))
        } else {
            Err(EngineError::syntax(
                format!("sample size must be positive, found {}", token.literal),
                token.position,
            ))
        }
    }

    fn parse_select_items(&mut self) -> EngineResult<Vec<SelectItem>> {
        let mut items = Vec::new();
        loop {
            if self.accept_punctuator("*") {
                items.push(SelectItem::All);
            } else if self.at_aggregate_call() {
                return Err(EngineError::syntax(
                    "aggregate functions cannot be mixed with plain columns",
                    self.peek().position,
                ));
            } else {
                let column = self.parse_column_ref()?;
                let alias = self.parse_alias()?;
                items.push(SelectItem::Column { column, alias });
            }
            if !self.accept_punctuator(",") {
                return Ok(items);
            }
        }
    }

    fn parse_alias(&mut self) -> EngineResult<Option<String>> {
        if !self.accept_keyword("AS") {
            return Ok(None);
        }
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Bracketed | TokenKind::String => Ok(Some(self.advance().literal)),
            TokenKind::Word if !is_reserved(&token.literal) => Ok(Some(self.advance().literal)),
            _ => Err(self.unexpected("a column name after AS")),
        }
    }

    fn parse_select_aggregate(&mut self) -> EngineResult<Statement> {
        let mut aggregates = Vec::new();
        loop {
            if !self.at_aggregate_call() {
                return Err(EngineError::syntax(
                    "aggregate functions cannot be mixed with plain columns",
                    self.peek().position,
                ));
            }
            let name = self.advance();
            let function = AggregateFunction::from_name(&name.literal).ok_or_else(|| {
                EngineError::syntax(
                    format!("unknown aggregate function {}", name.literal),
                    name.position,
                )
            })?;
            self.expect_punctuator("(")?;
            let target = if self.accept_punctuator("*") {
                AggregateTarget::AllRows
            } else {
                AggregateTarget::Column(self.parse_column_ref()?)
            };
            self.expect_punctuator(")")?;
            let alias = self.parse_alias()?;
            aggregates.push(AggregateItem {
                function,
                target,
                alias,
            });
            if !self.accept_punctuator(",") {
                break;
            }
        }

        let where_clause = self.parse_where()?;

        let mut group_by = Vec::new();
        if self.accept_keyword("GROUP") {
            self.expect_keyword("BY")?;
            loop {
                group_by.push(self.parse_column_ref()?);
                if !self.accept_punctuator(",") {
                    break;
                }
            }
        }

        let having = if self.accept_keyword("HAVING") {
            Some(self.parse_condition()?)
        } else {
            None
        };

        Ok(Statement::SelectAggregate(SelectAggregate {
            aggregates,
            where_clause,
            group_by,
            having,
        }))
    }

    fn parse_update(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("SET")?;
        let mut assignments = Vec::new();
        loop {
            let column = self.parse_column_ref()?;
            let token = self.peek().clone();
            if !(token.kind == TokenKind::Operator && token.literal == "=") {
                return Err(self.unexpected("'='"));
            }
            self.advance();
            let value = self.parse_value()?;
            assignments.push(Assignment { column, value });
            if !self.accept_punctuator(",") {
                break;
            }
        }
        Ok(Statement::Update(Update {
            assignments,
            where_clause: self.parse_where()?,
        }))
    }

    fn parse_where(&mut self) -> EngineResult<Option<Condition>> {
        if self.accept_keyword("WHERE") {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    fn parse_count(&mut self, clause: &str) -> EngineResult<usize> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Number {
            return Err(self.unexpected(&format!("a row count after {}", clause)));
        }
        self.advance();
        token.literal.parse::<usize>().map_err(|_| {
            EngineError::syntax(
                format!("{} expects a non-negative integer, found {}", clause, token.literal),
                token.position,
            )
        })
    }

    fn parse_column_ref(&mut self) -> EngineResult<ColumnRef> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Bracketed => {
                self.advance();
                Ok(ColumnRef::Name(token.literal))
            }
            TokenKind::IndexRef => {
                self.advance();
                match token.literal.parse::<usize>() {
                    Ok(n) if n >= 1 => Ok(ColumnRef::Index(n - 1)),
                    _ => Err(EngineError::syntax(
                        format!("column numbers start at 1, found #{}", token.literal),
                        token.position,
                    )),
                }
            }
            TokenKind::Word if !is_reserved(&token.literal) => {
                self.advance();
                Ok(ColumnRef::Name(token.literal))
            }
            _ => Err(self.unexpected("a column")),
        }
    }

    fn parse_condition(&mut self) -> EngineResult<Condition> {
        let mut left = self.parse_and_condition()?;
        while self.accept_keyword("OR") {
            let right = self.parse_and_condition()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_condition(&mut self) -> EngineResult<Condition> {
        let mut left = self.parse_not_condition()?;
        loop {
            if self.accept_keyword("AND") || self.at_condition_start() {
                let right = self.parse_not_condition()?;
                left = Condition::And(Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn at_condition_start(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Bracketed | TokenKind::IndexRef => true,
            TokenKind::Punctuator => token.literal == "(",
            TokenKind::Word => token.is_keyword("NOT") || !is_reserved(&token.literal),
            _ => false,
        }
    }

    fn parse_not_condition(&mut self) -> EngineResult<Condition> {
        if self.accept_keyword("NOT") {
            return Ok(Condition::Not(Box::new(self.parse_not_condition()?)));
        }
        if self.accept_punctuator("(") {
            let inner = self.parse_condition()?;
            self.expect_punctuator(")")?;
            return Ok(inner);
        }
        if self.peek().is_keyword("CELLTYPE") && self.peek_at(1).is_punctuator("(") {
            return self.parse_celltype();
        }

        let column = self.parse_column_ref()?;
        let token = self.peek().clone();
        if token.kind == TokenKind::Operator {
            self.advance();
            let op = CompareOp::from_symbol(&token.literal).ok_or_else(|| {
                EngineError::syntax(format!("unknown operator {}", token.literal), token.position)
            })?;
            let value = self.parse_value()?;
            Ok(Condition::Compare { column, op, value })
        } else if self.accept_keyword("REGEXP") {
            let source = self.expect_string()?;
            let pattern = Pattern::new(&source.literal).map_err(|e| {
                EngineError::syntax(format!("invalid regular expression: {}", e), source.position)
            })?;
            Ok(Condition::Regexp { column, pattern })
        } else if self.accept_keyword("IS") {
            self.expect_keyword("NULL")?;
            Ok(Condition::IsNull(column))
        } else {
            Err(self.unexpected("a comparison, REGEXP or IS NULL"))
        }
    }

    fn parse_celltype(&mut self) -> EngineResult<Condition> {
        self.advance(); // CELLTYPE
        self.expect_punctuator("(")?;
        let column = self.parse_column_ref()?;
        self.expect_punctuator(")")?;
        let token = self.peek().clone();
        if !(token.kind == TokenKind::Operator && token.literal == "=") {
            return Err(self.unexpected("'=' after CELLTYPE(...)"));
        }
        self.advance();
        let kind = self.expect_string()?;
        if !ContentType::is_known_name(&kind.literal) {
            return Err(EngineError::syntax(
                format!("unknown cell type \"{}\"", kind.literal),
                kind.position,
            ));
        }
        Ok(Condition::CellType {
            column,
            kind: kind.literal,
        })
    }

    fn parse_value(&mut self) -> EngineResult<ValueExpr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                number_literal(&token)
            }
            TokenKind::String => {
                self.advance();
                Ok(ValueExpr::String(token.literal))
            }
            TokenKind::Word if token.literal == "-" && self.peek_at(1).kind == TokenKind::Number => {
                self.advance();
                let number = self.advance();
                number_literal(&Token::new(
                    TokenKind::Number,
                    format!("-{}", number.literal),
                    token.position,
                ))
            }
            TokenKind::Word if token.is_keyword("TRUE") => {
                self.advance();
                Ok(ValueExpr::Boolean(true))
            }
            TokenKind::Word if token.is_keyword("FALSE") => {
                self.advance();
                Ok(ValueExpr::Boolean(false))
            }
            TokenKind::Word if token.is_keyword("PARSE") && self.peek_at(1).is_punctuator("(") => {
                self.advance();
                self.parse_conversion()
            }
            TokenKind::Bracketed | TokenKind::IndexRef | TokenKind::Word => {
                Ok(ValueExpr::Column(self.parse_column_ref()?))
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    /// `PARSE("kind", "text")`, after the PARSE keyword
    fn parse_conversion(&mut self) -> EngineResult<ValueExpr> {
        self.expect_punctuator("(")?;
        let kind_token = self.expect_string()?;
        self.expect_punctuator(",")?;
        let text_token = self.expect_string()?;
        self.expect_punctuator(")")?;

        let kind = ParseKind::from_name(&kind_token.literal).ok_or_else(|| {
            EngineError::syntax(
                format!("unknown PARSE type \"{}\"", kind_token.literal),
                kind_token.position,
            )
        })?;

        let text = text_token.literal;
        let source = CellValue::String(text.clone());
        let value = match kind {
            ParseKind::Number => source
                .to_long()
                .map(CellValue::Long)
                .or_else(|_| source.to_double().map(CellValue::Double)),
            ParseKind::Long => source.to_long().map(CellValue::Long),
            ParseKind::Double => source.to_double().map(CellValue::Double),
            ParseKind::Boolean => source.to_boolean().map(CellValue::Boolean),
            ParseKind::String => Ok(source.clone()),
            ParseKind::Date => source.to_date().map(CellValue::Date),
            ParseKind::Time => source.to_time().map(CellValue::Time),
            ParseKind::DateTime => source.to_datetime().map(CellValue::DateTime),
        }
        .map_err(|_| {
            EngineError::syntax(
                format!("cannot parse \"{}\" as {}", text, kind_token.literal),
                text_token.position,
            )
        })?;

        Ok(ValueExpr::Parse { kind, text, value })
    }
}

fn number_literal(token: &Token) -> EngineResult<ValueExpr> {
    if let Ok(i) = token.literal.parse::<i64>() {
        return Ok(ValueExpr::Number(CellValue::Long(i)));
    }
    token
        .literal
        .parse::<f64>()
        .map(|d| ValueExpr::Number(CellValue::Double(d)))
        .map_err(|_| EngineError::syntax(format!("invalid number {}", token.literal), token.position))
}
