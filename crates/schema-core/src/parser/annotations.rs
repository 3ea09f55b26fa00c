//! Annotations and annotation values
//!
//! ```text
//! [Type]                      bare
//! [Type(value, value)]        positional
//! [Type(field = value, ...)]  named
//! ```

use super::{Marker, Parser, Recovery};
use crate::lexer::TokenKind;
use crate::syntax::NodeKind;

pub(crate) fn annotation(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump(); // '['

    if !p.at(TokenKind::Identifier) {
        let message = "Expected type after '['.".to_string();
        p.error(Some((m, NodeKind::Annotation)), Recovery::Annotation, message);
        return;
    }
    p.bump_as(NodeKind::TypeNameRef);

    if p.at(TokenKind::LParen) {
        // '(' name '=' selects the named form
        if p.nth(2) == Some(TokenKind::Equals) {
            p.bump();
            loop {
                let entry = p.mark();
                if !p.at(TokenKind::Identifier) {
                    entry.abandon(p);
                    let message = format!("Expected field name in annotation, found '{}'.", p.found());
                    p.error(Some((m, NodeKind::Annotation)), Recovery::Annotation, message);
                    return;
                }
                let field = p.text();
                p.bump_as(NodeKind::FieldRef);

                if !p.at(TokenKind::Equals) {
                    entry.abandon(p);
                    let message = format!("Expected '=' after '{}'.", field);
                    p.error(Some((m, NodeKind::Annotation)), Recovery::Annotation, message);
                    return;
                }
                p.bump();
                let value = annotation_value(p);
                close(p, entry, NodeKind::AnnotationQualifier, value);

                if p.at(TokenKind::RParen) {
                    p.bump();
                    break;
                }
                if !p.at(TokenKind::Comma) {
                    let message = format!("Expected ',' or ')' in annotation, found '{}'.", p.found());
                    p.error(Some((m, NodeKind::Annotation)), Recovery::Annotation, message);
                    return;
                }
                p.bump();
            }
        } else {
            field_array(p);
        }
    }

    let message = format!("Expected end of annotation ']', found '{}'.", p.found());
    p.expect_closing(m, NodeKind::Annotation, TokenKind::RBracket, Recovery::Annotation, message);
}

/// `( value, ... )`
///
/// Closed as incomplete when any argument failed to parse. Returns whether
/// the list is complete.
fn field_array(p: &mut Parser<'_>) -> bool {
    let m = p.mark();
    p.bump(); // '('

    let mut clean = true;
    if !p.at(TokenKind::RParen) {
        loop {
            if p.at_eof() {
                break;
            }
            clean &= annotation_value(p);
            if p.at(TokenKind::RParen) {
                break;
            }
            if !p.at(TokenKind::Comma) {
                let message = format!("Expected ',' or ')' in argument list, found '{}'.", p.found());
                p.error(
                    Some((m, NodeKind::FieldArray)),
                    Recovery::Delimited(TokenKind::RParen),
                    message,
                );
                return false;
            }
            p.bump();
        }
    }

    if !p.at(TokenKind::RParen) {
        let message = "Expected ')' to close argument list.".to_string();
        p.error(Some((m, NodeKind::FieldArray)), Recovery::Delimited(TokenKind::RParen), message);
        return false;
    }
    p.bump();
    close(p, m, NodeKind::FieldArray, clean)
}

/// Parse one value; `false` when it or anything inside it failed
pub(crate) fn annotation_value(p: &mut Parser<'_>) -> bool {
    match p.current() {
        Some(TokenKind::Integer) => number(p),
        Some(TokenKind::Boolean) => {
            p.bump_as(NodeKind::PrimitiveBool);
            true
        }
        Some(TokenKind::String) => {
            p.bump_as(NodeKind::PrimitiveString);
            true
        }
        Some(TokenKind::LBracket) => p.nested(list).unwrap_or(false),
        Some(TokenKind::LBrace) => p.nested(map).unwrap_or(false),
        Some(TokenKind::Identifier) if p.text() == "_" => {
            p.bump_as(NodeKind::EmptyOption);
            true
        }
        Some(TokenKind::Identifier) if p.nth(1) == Some(TokenKind::LParen) => {
            p.nested(new_instance).unwrap_or(false)
        }
        Some(TokenKind::Identifier) => {
            p.bump_as(NodeKind::EnumOrInstanceRef);
            true
        }
        _ => {
            let message = format!("Unknown value '{}'.", p.found());
            p.error_here(message);
            false
        }
    }
}

fn close(p: &mut Parser<'_>, m: Marker, kind: NodeKind, clean: bool) -> bool {
    if clean {
        m.done(p, kind);
    } else {
        m.done_incomplete(p, kind);
    }
    clean
}

/// `Name( value, ... )`
fn new_instance(p: &mut Parser<'_>) -> bool {
    let m = p.mark();
    p.bump_as(NodeKind::NewInstanceName);
    let clean = field_array(p);
    m.done(p, NodeKind::NewInstance);
    clean
}

/// `1` or `1.5`, which lexes as integer, `.`, integer
fn number(p: &mut Parser<'_>) -> bool {
    let m = p.mark();
    let whole = p.text();
    p.bump();

    if !p.at_word(".") {
        m.done(p, NodeKind::PrimitiveInt);
        return true;
    }
    p.bump();

    if !p.at(TokenKind::Integer) {
        let message = format!("Expected digits after '{}.'.", whole);
        p.error(Some((m, NodeKind::PrimitiveDouble)), Recovery::Value, message);
        return false;
    }
    p.bump();
    m.done(p, NodeKind::PrimitiveDouble);
    true
}

fn list(p: &mut Parser<'_>) -> bool {
    let m = p.mark();
    p.bump(); // '['

    if p.at(TokenKind::RBracket) {
        p.bump();
        m.done(p, NodeKind::FieldList);
        return true;
    }

    let mut clean = true;
    loop {
        clean &= annotation_value(p);
        if p.at(TokenKind::RBracket) {
            p.bump();
            break;
        }
        if !p.at(TokenKind::Comma) {
            let message = format!("Expected ',' or ']' in list, found '{}'.", p.found());
            p.error(
                Some((m, NodeKind::FieldList)),
                Recovery::Delimited(TokenKind::RBracket),
                message,
            );
            return false;
        }
        p.bump();
    }
    close(p, m, NodeKind::FieldList, clean)
}

fn map(p: &mut Parser<'_>) -> bool {
    let m = p.mark();
    p.bump(); // '{'

    if p.at(TokenKind::RBrace) {
        p.bump();
        m.done(p, NodeKind::FieldMap);
        return true;
    }

    let mut clean = true;
    loop {
        let entry = p.mark();
        let key = annotation_value(p);
        if !p.at(TokenKind::Colon) {
            entry.abandon(p);
            let message = format!("Expected ':' in map entry, found '{}'.", p.found());
            p.error(Some((m, NodeKind::FieldMap)), Recovery::Delimited(TokenKind::RBrace), message);
            return false;
        }
        p.bump();
        let value = annotation_value(p);
        clean &= close(p, entry, NodeKind::FieldMapEntry, key && value);

        if p.at(TokenKind::RBrace) {
            p.bump();
            break;
        }
        if !p.at(TokenKind::Comma) {
            let message = format!("Expected ',' or '}}' in map, found '{}'.", p.found());
            p.error(Some((m, NodeKind::FieldMap)), Recovery::Delimited(TokenKind::RBrace), message);
            return false;
        }
        p.bump();
    }
    close(p, m, NodeKind::FieldMap, clean)
}
