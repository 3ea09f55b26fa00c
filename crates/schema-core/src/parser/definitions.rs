//! Top-level statements, types, enums and components

use super::annotations::annotation;
use super::{
    Marker, Parser, Recovery, KEYWORD_COMMAND, KEYWORD_COMPONENT, KEYWORD_DATA, KEYWORD_ENUM,
    KEYWORD_EVENT, KEYWORD_ID, KEYWORD_IMPORT, KEYWORD_OPTION, KEYWORD_PACKAGE,
    KEYWORD_TRANSIENT, KEYWORD_TYPE,
};
use crate::lexer::TokenKind;
use crate::syntax::NodeKind;

pub(crate) fn schema_file(p: &mut Parser<'_>) {
    let root = p.mark();
    while !p.at_eof() {
        let before = p.position();
        top_level_definition(p);
        p.ensure_progress(before);
    }
    root.done(p, NodeKind::SchemaFile);
}

fn top_level_definition(p: &mut Parser<'_>) {
    if p.at_word(KEYWORD_PACKAGE) {
        package_definition(p);
    } else if p.at_word(KEYWORD_IMPORT) {
        import_definition(p);
    } else if p.at_word(KEYWORD_OPTION) {
        option_definition(p);
    } else if p.at_word(KEYWORD_ENUM) {
        p.nested(enum_definition);
    } else if p.at_word(KEYWORD_TYPE) {
        p.nested(type_definition);
    } else if p.at_word(KEYWORD_COMPONENT) {
        p.nested(component_definition);
    } else if p.at(TokenKind::LBracket) {
        annotation(p);
    } else {
        p.error(
            None,
            Recovery::TopLevel,
            format!(
                "Expected '{}', '{}', '{}', '{}', '{}' or '{}' definition at top-level.",
                KEYWORD_PACKAGE,
                KEYWORD_IMPORT,
                KEYWORD_OPTION,
                KEYWORD_ENUM,
                KEYWORD_TYPE,
                KEYWORD_COMPONENT
            ),
        );
    }
}

// ============================================================================
// Statements
// ============================================================================

fn package_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected a package name after '{}'.", KEYWORD_PACKAGE);
        p.error(Some((m, NodeKind::Package)), Recovery::Statement, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::PackageName);
    p.expect_terminator(
        m,
        NodeKind::Package,
        format!("Expected ';' after '{} {}'.", KEYWORD_PACKAGE, name),
    );
}

fn import_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::String) {
        let message = format!("Expected a quoted filename after '{}'.", KEYWORD_IMPORT);
        p.error(Some((m, NodeKind::Import)), Recovery::Statement, message);
        return;
    }
    let filename = p.text();
    p.bump_as(NodeKind::ImportFilename);
    p.expect_terminator(
        m,
        NodeKind::Import,
        format!("Expected ';' after '{} {}'.", KEYWORD_IMPORT, filename),
    );
}

fn option_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected an option name after '{}'.", KEYWORD_OPTION);
        p.error(Some((m, NodeKind::Option)), Recovery::Statement, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::OptionName);

    if !p.at(TokenKind::Equals) {
        let message = format!("Expected '=' after '{} {}'.", KEYWORD_OPTION, name);
        p.error(Some((m, NodeKind::Option)), Recovery::Statement, message);
        return;
    }
    p.bump();

    if !matches!(
        p.current(),
        Some(TokenKind::Identifier | TokenKind::Boolean | TokenKind::Integer | TokenKind::String)
    ) {
        let message = format!(
            "Expected an option value after '{} {} ='.",
            KEYWORD_OPTION, name
        );
        p.error(Some((m, NodeKind::Option)), Recovery::Statement, message);
        return;
    }
    let value = p.text();
    p.bump_as(NodeKind::OptionValue);
    p.expect_terminator(
        m,
        NodeKind::Option,
        format!("Expected ';' after '{} {} = {}'.", KEYWORD_OPTION, name, value),
    );
}

// ============================================================================
// Enums
// ============================================================================

fn enum_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected identifier after '{}'.", KEYWORD_ENUM);
        p.error(Some((m, NodeKind::Enum)), Recovery::Braces, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::DefinitionName);

    if !p.at(TokenKind::LBrace) {
        let message = format!("Expected '{{' after '{} {}'.", KEYWORD_ENUM, name);
        p.error(Some((m, NodeKind::Enum)), Recovery::Braces, message);
        return;
    }
    p.bump();

    enum_contents(p);

    if !p.at(TokenKind::RBrace) {
        let message = format!("Invalid '{}' inside {} {}.", p.found(), KEYWORD_ENUM, name);
        p.error(Some((m, NodeKind::Enum)), Recovery::Braces, message);
        return;
    }
    p.bump();
    m.done(p, NodeKind::Enum);
}

fn enum_contents(p: &mut Parser<'_>) {
    loop {
        let before = p.position();
        if p.at(TokenKind::LBracket) {
            annotation(p);
        } else if p.at(TokenKind::Identifier) {
            enum_value(p);
        } else {
            return;
        }
        p.ensure_progress(before);
    }
}

fn enum_value(p: &mut Parser<'_>) {
    let m = p.mark();
    let name = p.text();
    p.bump_as(NodeKind::FieldName);

    if !p.at(TokenKind::Equals) {
        let message = format!("Expected '=' after '{}'.", name);
        p.error(Some((m, NodeKind::EnumValue)), Recovery::Statement, message);
        return;
    }
    p.bump();

    if !p.at(TokenKind::Integer) {
        let message = format!("Expected a value after '{} ='.", name);
        p.error(Some((m, NodeKind::EnumValue)), Recovery::Statement, message);
        return;
    }
    let number = p.text();
    p.bump_as(NodeKind::FieldNumber);
    p.expect_terminator(
        m,
        NodeKind::EnumValue,
        format!("Expected ';' after '{} = {}'.", name, number),
    );
}

// ============================================================================
// Types
// ============================================================================

fn type_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected identifier after '{}'.", KEYWORD_TYPE);
        p.error(Some((m, NodeKind::Type)), Recovery::Braces, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::DefinitionName);

    if !p.at(TokenKind::LBrace) {
        let message = format!("Expected '{{' after '{} {}'.", KEYWORD_TYPE, name);
        p.error(Some((m, NodeKind::Type)), Recovery::Braces, message);
        return;
    }
    p.bump();

    type_contents(p);

    if !p.at(TokenKind::RBrace) {
        let message = format!("Invalid '{}' inside {} {}.", p.found(), KEYWORD_TYPE, name);
        p.error(Some((m, NodeKind::Type)), Recovery::Braces, message);
        return;
    }
    p.bump();
    m.done(p, NodeKind::Type);
}

/// `option` only starts a statement when it is not the `option<T>` type
fn at_option_statement(p: &Parser<'_>) -> bool {
    p.at_word(KEYWORD_OPTION) && p.nth(1) != Some(TokenKind::LAngle)
}

fn type_contents(p: &mut Parser<'_>) {
    loop {
        let before = p.position();
        if at_option_statement(p) {
            option_definition(p);
        } else if p.at(TokenKind::LBracket) {
            annotation(p);
        } else if p.at_word(KEYWORD_ENUM) {
            p.nested(enum_definition);
        } else if p.at_word(KEYWORD_TYPE) {
            p.nested(type_definition);
        } else if p.at(TokenKind::Identifier) {
            field_definition(p);
        } else {
            return;
        }
        p.ensure_progress(before);
    }
}

/// `[transient] TypeName[<Param, ...>]`
///
/// Hands `outer` back on success; on failure it has been closed as
/// incomplete with `owner` as its kind.
fn field_type(p: &mut Parser<'_>, outer: Marker, owner: NodeKind) -> Option<(Marker, String)> {
    let transient = p.at_word(KEYWORD_TRANSIENT);
    if transient {
        p.bump_as(NodeKind::Keyword);
        if !p.at(TokenKind::Identifier) {
            let message = format!("Expected typename after '{}'.", KEYWORD_TRANSIENT);
            p.error(Some((outer, owner)), Recovery::Statement, message);
            return None;
        }
    }

    let base = p.text();
    let mut name = base.to_string();
    let ty = p.mark();
    p.bump_as(NodeKind::TypeName);

    if !p.at(TokenKind::LAngle) {
        if transient {
            ty.abandon(p);
            let message = format!("Cannot use transient on non-collection type '{}'.", base);
            p.error(Some((outer, owner)), Recovery::Statement, message);
            return None;
        }
        ty.done(p, NodeKind::FieldType);
        return Some((outer, name));
    }

    name.push('<');
    p.bump();

    let expected = match base {
        "map" => 2,
        "list" | "option" => 1,
        _ => {
            ty.abandon(p);
            let message = format!("Unknown generic type '{}'.", base);
            p.error(Some((outer, owner)), Recovery::Statement, message);
            return None;
        }
    };

    if !p.at(TokenKind::Identifier) {
        ty.abandon(p);
        let message = format!("Expected typename after '{}'.", name);
        p.error(Some((outer, owner)), Recovery::Statement, message);
        return None;
    }
    name.push_str(p.text());
    p.bump_as(NodeKind::TypeParameterName);
    let mut count = 1;

    loop {
        if p.at(TokenKind::RAngle) {
            name.push('>');
            p.bump();
            if count != expected {
                ty.abandon(p);
                let message = format!(
                    "Wrong number of generics. Expected {}, got {}.",
                    expected, count
                );
                p.error(Some((outer, owner)), Recovery::Statement, message);
                return None;
            }
            ty.done(p, NodeKind::FieldType);
            return Some((outer, name));
        }

        if !p.at(TokenKind::Comma) {
            ty.abandon(p);
            let message = format!("Invalid '{}' inside <>.", p.found());
            p.error(Some((outer, owner)), Recovery::Statement, message);
            return None;
        }
        name.push_str(", ");
        p.bump();

        if !p.at(TokenKind::Identifier) {
            ty.abandon(p);
            let message = "Expected typename after ','.".to_string();
            p.error(Some((outer, owner)), Recovery::Statement, message);
            return None;
        }
        name.push_str(p.text());
        p.bump_as(NodeKind::TypeParameterName);
        count += 1;
    }
}

/// `Type name [= number];`
fn field_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    let Some((m, ty)) = field_type(p, m, NodeKind::Field) else {
        return;
    };

    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected field name after '{}'.", ty);
        p.error(Some((m, NodeKind::Field)), Recovery::Statement, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::FieldName);

    if !p.at(TokenKind::Equals) {
        p.expect_terminator(
            m,
            NodeKind::Field,
            format!("Expected '=' or ';' after '{} {}'.", ty, name),
        );
        return;
    }
    p.bump();

    if !p.at(TokenKind::Integer) {
        let message = format!("Expected field number after '{} {} ='.", ty, name);
        p.error(Some((m, NodeKind::Field)), Recovery::Statement, message);
        return;
    }
    let number = p.text();
    p.bump_as(NodeKind::FieldNumber);
    p.expect_terminator(
        m,
        NodeKind::Field,
        format!("Expected ';' after '{} {} = {}'.", ty, name, number),
    );
}

// ============================================================================
// Components
// ============================================================================

fn component_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected identifier after '{}'.", KEYWORD_COMPONENT);
        p.error(Some((m, NodeKind::Component)), Recovery::Braces, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::DefinitionName);

    if !p.at(TokenKind::LBrace) {
        let message = format!("Expected '{{' after '{} {}'.", KEYWORD_COMPONENT, name);
        p.error(Some((m, NodeKind::Component)), Recovery::Braces, message);
        return;
    }
    p.bump();

    component_contents(p);

    if !p.at(TokenKind::RBrace) {
        let message = format!(
            "Invalid '{}' inside {} {}.",
            p.found(),
            KEYWORD_COMPONENT,
            name
        );
        p.error(Some((m, NodeKind::Component)), Recovery::Braces, message);
        return;
    }
    p.bump();
    m.done(p, NodeKind::Component);
}

fn component_contents(p: &mut Parser<'_>) {
    loop {
        let before = p.position();
        if at_option_statement(p) {
            option_definition(p);
        } else if p.at(TokenKind::LBracket) {
            annotation(p);
        } else if p.at_word(KEYWORD_ID) {
            component_id(p);
        } else if p.at_word(KEYWORD_DATA) {
            data_definition(p);
        } else if p.at_word(KEYWORD_EVENT) {
            event_definition(p);
        } else if p.at_word(KEYWORD_COMMAND) {
            command_definition(p);
        } else if p.at(TokenKind::Identifier) {
            field_definition(p);
        } else {
            return;
        }
        p.ensure_progress(before);
    }
}

fn component_id(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Equals) {
        let message = format!("Expected '=' after '{}'.", KEYWORD_ID);
        p.error(Some((m, NodeKind::ComponentId)), Recovery::Statement, message);
        return;
    }
    p.bump();

    if !p.at(TokenKind::Integer) {
        let message = format!("Expected a number after '{} ='.", KEYWORD_ID);
        p.error(Some((m, NodeKind::ComponentId)), Recovery::Statement, message);
        return;
    }
    let number = p.text();
    p.bump_as(NodeKind::FieldNumber);
    p.expect_terminator(
        m,
        NodeKind::ComponentId,
        format!("Expected ';' after '{} = {}'.", KEYWORD_ID, number),
    );
}

fn data_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected typename after '{}'.", KEYWORD_DATA);
        p.error(Some((m, NodeKind::Data)), Recovery::Statement, message);
        return;
    }
    let Some((m, ty)) = field_type(p, m, NodeKind::Data) else {
        return;
    };
    p.expect_terminator(
        m,
        NodeKind::Data,
        format!("Expected ';' after '{} {}'.", KEYWORD_DATA, ty),
    );
}

fn event_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected typename after '{}'.", KEYWORD_EVENT);
        p.error(Some((m, NodeKind::Event)), Recovery::Statement, message);
        return;
    }
    let Some((m, ty)) = field_type(p, m, NodeKind::Event) else {
        return;
    };

    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected event name after '{} {}'.", KEYWORD_EVENT, ty);
        p.error(Some((m, NodeKind::Event)), Recovery::Statement, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::FieldName);
    p.expect_terminator(
        m,
        NodeKind::Event,
        format!("Expected ';' after '{} {} {}'.", KEYWORD_EVENT, ty, name),
    );
}

/// `command Response name(Request);`
fn command_definition(p: &mut Parser<'_>) {
    let m = p.mark();
    p.bump_as(NodeKind::Keyword);
    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected response type after '{}'.", KEYWORD_COMMAND);
        p.error(Some((m, NodeKind::Command)), Recovery::Statement, message);
        return;
    }
    let response = p.text();
    p.bump_as(NodeKind::TypeNameRef);

    if !p.at(TokenKind::Identifier) {
        let message = format!(
            "Expected command name after '{} {}'.",
            KEYWORD_COMMAND, response
        );
        p.error(Some((m, NodeKind::Command)), Recovery::Statement, message);
        return;
    }
    let name = p.text();
    p.bump_as(NodeKind::FieldName);

    if !p.at(TokenKind::LParen) {
        let message = format!(
            "Expected '(' after '{} {} {}'.",
            KEYWORD_COMMAND, response, name
        );
        p.error(Some((m, NodeKind::Command)), Recovery::Statement, message);
        return;
    }
    p.bump();

    if !p.at(TokenKind::Identifier) {
        let message = format!("Expected request type after '{}('.", name);
        p.error(Some((m, NodeKind::Command)), Recovery::Statement, message);
        return;
    }
    let request = p.text();
    p.bump_as(NodeKind::TypeNameRef);

    if !p.at(TokenKind::RParen) {
        let message = format!("Expected ')' after '{}({}'.", name, request);
        p.error(Some((m, NodeKind::Command)), Recovery::Statement, message);
        return;
    }
    p.bump();
    p.expect_terminator(
        m,
        NodeKind::Command,
        format!(
            "Expected ';' after '{} {} {}({})'.",
            KEYWORD_COMMAND, response, name, request
        ),
    );
}
