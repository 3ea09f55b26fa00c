//! Composite node kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a composite syntax node
///
/// Leaf tokens keep their [`TokenKind`](crate::lexer::TokenKind); every
/// grammar construct, including the one-token wrappers around names and
/// literals, gets one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    SchemaFile,
    Keyword,

    // Top-level statements
    Package,
    PackageName,
    Import,
    ImportFilename,
    Option,
    OptionName,
    OptionValue,

    // Definitions
    Type,
    Enum,
    Component,
    DefinitionName,
    Field,
    FieldType,
    TypeName,
    TypeParameterName,
    FieldName,
    FieldNumber,
    EnumValue,
    ComponentId,
    Data,
    Event,
    Command,
    TypeNameRef,

    // Annotations
    Annotation,
    AnnotationQualifier,
    FieldRef,
    FieldArray,
    NewInstance,
    NewInstanceName,

    // Values
    PrimitiveInt,
    PrimitiveDouble,
    PrimitiveBool,
    PrimitiveString,
    EmptyOption,
    EnumOrInstanceRef,
    FieldList,
    FieldMap,
    FieldMapEntry,

    /// Tokens skipped during recovery; carries the diagnostic message
    Error,
}

impl NodeKind {
    pub fn debug_name(self) -> &'static str {
        match self {
            NodeKind::SchemaFile => "SCHEMA_FILE",
            NodeKind::Keyword => "KEYWORD",
            NodeKind::Package => "PACKAGE",
            NodeKind::PackageName => "PACKAGE_NAME",
            NodeKind::Import => "IMPORT",
            NodeKind::ImportFilename => "IMPORT_FILENAME",
            NodeKind::Option => "OPTION",
            NodeKind::OptionName => "OPTION_NAME",
            NodeKind::OptionValue => "OPTION_VALUE",
            NodeKind::Type => "TYPE",
            NodeKind::Enum => "ENUM",
            NodeKind::Component => "COMPONENT",
            NodeKind::DefinitionName => "DEFINITION_NAME",
            NodeKind::Field => "FIELD",
            NodeKind::FieldType => "FIELD_TYPE",
            NodeKind::TypeName => "TYPE_NAME",
            NodeKind::TypeParameterName => "TYPE_PARAM_NAME",
            NodeKind::FieldName => "FIELD_NAME",
            NodeKind::FieldNumber => "FIELD_NUMBER",
            NodeKind::EnumValue => "ENUM_VALUE",
            NodeKind::ComponentId => "COMPONENT_ID",
            NodeKind::Data => "DATA",
            NodeKind::Event => "EVENT",
            NodeKind::Command => "COMMAND",
            NodeKind::TypeNameRef => "TYPE_NAME_REF",
            NodeKind::Annotation => "ANNOTATION",
            NodeKind::AnnotationQualifier => "ANNOTATION_QUALIFIER",
            NodeKind::FieldRef => "FIELD_REF",
            NodeKind::FieldArray => "FIELD_ARRAY",
            NodeKind::NewInstance => "NEW_INSTANCE",
            NodeKind::NewInstanceName => "NEW_INSTANCE_NAME",
            NodeKind::PrimitiveInt => "PRIMITIVE_INT",
            NodeKind::PrimitiveDouble => "PRIMITIVE_DOUBLE",
            NodeKind::PrimitiveBool => "PRIMITIVE_BOOL",
            NodeKind::PrimitiveString => "PRIMITIVE_STRING",
            NodeKind::EmptyOption => "EMPTY_OPTION",
            NodeKind::EnumOrInstanceRef => "ENUM_OR_INSTANCE_REF",
            NodeKind::FieldList => "FIELD_LIST",
            NodeKind::FieldMap => "FIELD_MAP",
            NodeKind::FieldMapEntry => "FIELD_MAP_ENTRY",
            NodeKind::Error => "ERROR",
        }
    }

    /// Nodes whose text names a definition elsewhere
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            NodeKind::TypeName
                | NodeKind::TypeParameterName
                | NodeKind::FieldType
                | NodeKind::TypeNameRef
                | NodeKind::NewInstanceName
                | NodeKind::EnumOrInstanceRef
                | NodeKind::FieldRef
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.debug_name())
    }
}
