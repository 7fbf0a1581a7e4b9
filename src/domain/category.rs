//! Token categories and classification passes.
//!
//! The declaration order of [`Category`] is the paint priority: a category
//! with a smaller ordinal wins where ranges of two categories overlap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of token a classified range belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    // Semantic kinds
    Macro,
    Enumerator,
    GlobalVariable,
    LocalVariable,
    Parameter,
    Type,
    RefType,
    ValueType,
    Function,
    MemberFunction,
    MemberField,
    StaticMemberFunction,
    StaticMemberField,
    Property,
    Event,
    ClassTemplate,
    GenericType,
    FunctionTemplate,
    Namespace,
    Label,
    UdlRaw,
    UdlNumber,
    UdlString,
    OperatorFunction,
    MemberOperator,
    NewDelete,
    // Lexical kinds
    Identifier,
    Comment,
    Keyword,
    PreprocessorKeyword,
    Operator,
    Variable,
    NumberLiteral,
    StringLiteral,
    XmlDocComment,
    XmlDocTag,
}

impl Category {
    /// Every category, in priority order.
    pub const ALL: [Category; 36] = [
        Category::Macro,
        Category::Enumerator,
        Category::GlobalVariable,
        Category::LocalVariable,
        Category::Parameter,
        Category::Type,
        Category::RefType,
        Category::ValueType,
        Category::Function,
        Category::MemberFunction,
        Category::MemberField,
        Category::StaticMemberFunction,
        Category::StaticMemberField,
        Category::Property,
        Category::Event,
        Category::ClassTemplate,
        Category::GenericType,
        Category::FunctionTemplate,
        Category::Namespace,
        Category::Label,
        Category::UdlRaw,
        Category::UdlNumber,
        Category::UdlString,
        Category::OperatorFunction,
        Category::MemberOperator,
        Category::NewDelete,
        Category::Identifier,
        Category::Comment,
        Category::Keyword,
        Category::PreprocessorKeyword,
        Category::Operator,
        Category::Variable,
        Category::NumberLiteral,
        Category::StringLiteral,
        Category::XmlDocComment,
        Category::XmlDocTag,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`Category::ALL`]; lower values paint on top.
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Name used in configuration files and traces.
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Macro => "macro",
            Category::Enumerator => "enumerator",
            Category::GlobalVariable => "globalVariable",
            Category::LocalVariable => "localVariable",
            Category::Parameter => "parameter",
            Category::Type => "type",
            Category::RefType => "refType",
            Category::ValueType => "valueType",
            Category::Function => "function",
            Category::MemberFunction => "memberFunction",
            Category::MemberField => "memberField",
            Category::StaticMemberFunction => "staticMemberFunction",
            Category::StaticMemberField => "staticMemberField",
            Category::Property => "property",
            Category::Event => "event",
            Category::ClassTemplate => "classTemplate",
            Category::GenericType => "genericType",
            Category::FunctionTemplate => "functionTemplate",
            Category::Namespace => "namespace",
            Category::Label => "label",
            Category::UdlRaw => "udlRaw",
            Category::UdlNumber => "udlNumber",
            Category::UdlString => "udlString",
            Category::OperatorFunction => "operatorFunction",
            Category::MemberOperator => "memberOperator",
            Category::NewDelete => "newDelete",
            Category::Identifier => "identifier",
            Category::Comment => "comment",
            Category::Keyword => "keyword",
            Category::PreprocessorKeyword => "preprocessorKeyword",
            Category::Operator => "operator",
            Category::Variable => "variable",
            Category::NumberLiteral => "numberLiteral",
            Category::StringLiteral => "stringLiteral",
            Category::XmlDocComment => "xmlDocComment",
            Category::XmlDocTag => "xmlDocTag",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown token category: {s}"))
    }
}

/// One of the two independent classification producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pass {
    /// Fast lexical classification
    Syntactic,
    /// Slower classification that needs full analysis
    Semantic,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Syntactic => f.write_str("syntactic"),
            Pass::Semantic => f.write_str("semantic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_ordinal_order() {
        for (index, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.ordinal(), index, "{category} out of order");
        }
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("notACategory".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_names_match_config_names() {
        let json = serde_json::to_string(&Category::StaticMemberField).unwrap();
        assert_eq!(json, "\"staticMemberField\"");
        let parsed: Category = serde_json::from_str("\"xmlDocTag\"").unwrap();
        assert_eq!(parsed, Category::XmlDocTag);
    }

    #[test]
    fn test_semantic_kinds_outrank_lexical_kinds() {
        assert!(Category::Function < Category::Identifier);
        assert!(Category::Macro < Category::Keyword);
    }
}
