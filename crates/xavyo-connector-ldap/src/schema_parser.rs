//! RFC 4512 object class description parsing
//!
//! Only the parts needed for the inheritance relation are extracted: every
//! `NAME` alias and the `SUP` list. A definition looks like
//!
//! ```text
//! ( 2.5.6.7 NAME 'organizationalPerson' SUP person STRUCTURAL MAY ( title $ ou ) )
//! ```

use std::collections::{BTreeSet, HashMap};

use xavyo_oc_hierarchy::{ancestors_from_parents, AncestorScope, AncestorSet, ClassName};

/// Names and superclasses of one object class definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectClassDefinition {
    /// Numeric OID.
    pub oid: String,
    /// All names, the first being the primary one.
    pub names: Vec<String>,
    /// Direct superclasses from the `SUP` clause.
    pub superclasses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Dollar,
    Quoted(String),
    Word(String),
}

fn tokenize(definition: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = definition.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '$' => {
                chars.next();
                tokens.push(Token::Dollar);
            }
            '\'' => {
                chars.next();
                let mut value = String::new();
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    value.push(c);
                }
                tokens.push(Token::Quoted(value));
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '$' | '\'') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    tokens
}

/// Read the value following a keyword: one item, or a parenthesised list.
fn keyword_values(tokens: &[Token], keyword: &str) -> Vec<String> {
    // Keywords only appear at nesting depth 1, directly inside the outer parens.
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < tokens.len() {
        match &tokens[idx] {
            Token::Open => depth += 1,
            Token::Close => depth = depth.saturating_sub(1),
            Token::Word(w) if depth == 1 && w.eq_ignore_ascii_case(keyword) => {
                return collect_values(&tokens[idx + 1..]);
            }
            _ => {}
        }
        idx += 1;
    }
    Vec::new()
}

fn collect_values(rest: &[Token]) -> Vec<String> {
    match rest.first() {
        Some(Token::Open) => rest[1..]
            .iter()
            .take_while(|t| **t != Token::Close)
            .filter_map(|t| match t {
                Token::Quoted(v) | Token::Word(v) if !v.is_empty() => Some(v.clone()),
                _ => None,
            })
            .collect(),
        Some(Token::Quoted(v)) | Some(Token::Word(v)) => vec![v.clone()],
        _ => Vec::new(),
    }
}

/// Parse one `objectClasses` value. Returns `None` when it carries no name.
pub fn parse_object_class_definition(definition: &str) -> Option<ObjectClassDefinition> {
    let tokens = tokenize(definition);

    let oid = match tokens.get(1) {
        Some(Token::Word(oid)) if tokens.first() == Some(&Token::Open) => oid.clone(),
        _ => return None,
    };

    let names = keyword_values(&tokens, "NAME");
    if names.is_empty() {
        return None;
    }

    Some(ObjectClassDefinition {
        oid,
        names,
        superclasses: keyword_values(&tokens, "SUP"),
    })
}

/// Direct superclass relation of a whole schema, keyed by every class alias.
#[derive(Debug, Clone, Default)]
pub struct SuperclassIndex {
    parents: HashMap<ClassName, Vec<ClassName>>,
    oid_names: HashMap<String, ClassName>,
}

impl SuperclassIndex {
    /// Build an index from `objectClasses` values, skipping unparsable ones.
    pub fn from_definitions<I, S>(definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed: Vec<ObjectClassDefinition> = definitions
            .into_iter()
            .filter_map(|d| parse_object_class_definition(d.as_ref()))
            .collect();

        let mut index = Self::default();
        for def in &parsed {
            index
                .oid_names
                .insert(def.oid.clone(), ClassName::new(def.names[0].as_str()));
        }

        for def in parsed {
            // SUP may name a class by OID instead of name.
            let superclasses: Vec<ClassName> = def
                .superclasses
                .iter()
                .map(|sup| {
                    index
                        .oid_names
                        .get(sup)
                        .cloned()
                        .unwrap_or_else(|| ClassName::new(sup.as_str()))
                })
                .collect();

            for name in &def.names {
                index
                    .parents
                    .insert(ClassName::new(name.as_str()), superclasses.clone());
            }
        }

        index
    }

    /// Number of class names (aliases included) in the index.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Direct superclasses of a class, if the class is defined.
    pub fn superclasses(&self, class: &ClassName) -> Option<&[ClassName]> {
        self.parents.get(class).map(Vec::as_slice)
    }

    /// Ancestor sets of the given classes; undefined classes are left out.
    pub fn ancestors(
        &self,
        classes: &BTreeSet<ClassName>,
        scope: AncestorScope,
    ) -> HashMap<ClassName, AncestorSet> {
        ancestors_from_parents(&self.parents, classes, scope)
    }

    /// Consume the index into its direct-parent map.
    pub fn into_parents(self) -> HashMap<ClassName, Vec<ClassName>> {
        self.parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENLDAP_DEFS: &[&str] = &[
        "( 2.5.6.0 NAME 'top' DESC 'top of the superclass chain' ABSTRACT MUST objectClass )",
        "( 2.5.6.6 NAME 'person' DESC 'RFC2256: a person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY ( userPassword $ telephoneNumber $ seeAlso $ description ) )",
        "( 2.5.6.7 NAME 'organizationalPerson' DESC 'RFC2256: an organizational person' SUP person STRUCTURAL MAY ( title $ x121Address $ registeredAddress ) )",
        "( 2.16.840.1.113730.3.2.2 NAME 'inetOrgPerson' DESC 'RFC2798: Internet Organizational Person' SUP organizationalPerson STRUCTURAL MAY ( audio $ businessCategory $ carLicense ) )",
        "( 2.5.6.9 NAME ( 'groupOfNames' 'gon' ) SUP top STRUCTURAL MUST ( member $ cn ) )",
        "( 1.3.6.1.4.1.4203.1.4.1 NAME ( 'OpenLDAProotDSE' 'LDAProotDSE' ) DESC 'OpenLDAP Root DSE object' SUP top STRUCTURAL MAY cn )",
    ];

    fn class(name: &str) -> ClassName {
        ClassName::new(name)
    }

    #[test]
    fn test_parse_single_name_and_sup() {
        let def = parse_object_class_definition(OPENLDAP_DEFS[2]).unwrap();
        assert_eq!(def.oid, "2.5.6.7");
        assert_eq!(def.names, vec!["organizationalPerson"]);
        assert_eq!(def.superclasses, vec!["person"]);
    }

    #[test]
    fn test_parse_name_list() {
        let def = parse_object_class_definition(OPENLDAP_DEFS[4]).unwrap();
        assert_eq!(def.names, vec!["groupOfNames", "gon"]);
        assert_eq!(def.superclasses, vec!["top"]);
    }

    #[test]
    fn test_parse_no_sup() {
        let def = parse_object_class_definition(OPENLDAP_DEFS[0]).unwrap();
        assert!(def.superclasses.is_empty());
    }

    #[test]
    fn test_parse_multiple_sup() {
        let def = parse_object_class_definition(
            "( 1.2.3.4 NAME 'hybrid' SUP ( person $ groupOfNames ) AUXILIARY )",
        )
        .unwrap();
        assert_eq!(def.superclasses, vec!["person", "groupOfNames"]);
    }

    #[test]
    fn test_keywords_inside_desc_are_ignored() {
        let def = parse_object_class_definition(
            "( 1.2.3.5 NAME 'tricky' DESC 'SUP fake NAME bogus' SUP top STRUCTURAL )",
        )
        .unwrap();
        assert_eq!(def.names, vec!["tricky"]);
        assert_eq!(def.superclasses, vec!["top"]);
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert!(parse_object_class_definition("( 2.5.6.6 SUP top )").is_none());
        assert!(parse_object_class_definition("garbage").is_none());
        assert!(parse_object_class_definition("").is_none());
    }

    #[test]
    fn test_index_keys_every_alias() {
        let index = SuperclassIndex::from_definitions(OPENLDAP_DEFS);
        assert_eq!(index.len(), 8);
        assert_eq!(index.superclasses(&class("GON")), Some(&[class("top")][..]));
        assert_eq!(
            index.superclasses(&class("ldaprootdse")),
            index.superclasses(&class("OpenLDAProotDSE"))
        );
    }

    #[test]
    fn test_index_resolves_sup_by_oid() {
        let index = SuperclassIndex::from_definitions([
            "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )",
            "( 2.5.6.6 NAME 'person' SUP 2.5.6.0 STRUCTURAL )",
        ]);
        assert_eq!(index.superclasses(&class("person")), Some(&[class("top")][..]));
    }

    #[test]
    fn test_index_ancestors_by_scope() {
        let index = SuperclassIndex::from_definitions(OPENLDAP_DEFS);
        let wanted: BTreeSet<ClassName> = [class("inetOrgPerson"), class("unknownClass")]
            .into_iter()
            .collect();

        let direct = index.ancestors(&wanted, AncestorScope::Direct);
        assert_eq!(direct.len(), 1);
        assert_eq!(
            direct[&class("inetOrgPerson")],
            AncestorSet::from([class("organizationalPerson")])
        );

        let transitive = index.ancestors(&wanted, AncestorScope::Transitive);
        assert_eq!(
            transitive[&class("inetOrgPerson")],
            AncestorSet::from([class("organizationalPerson"), class("person"), class("top")])
        );
    }
}
