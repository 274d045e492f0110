use std::path::Path;
use std::fs::File;
use std::io::{BufReader, Read};
use json_comments::{CommentSettings, StripComments};
use serde_json as json;

use crate::{
    grammar::{normalize::split_expansion, Expansion, NonTerminal},
    error::ParsingError,
};

/// Parse one alternative. Unsplit strings get normalized, lists of strings
/// are taken as they are.
fn parse_alternative(key: &str, value: &json::Value) -> Result<Expansion, String> {
    match value {
        json::Value::String(alternative) => Ok(split_expansion(alternative)),
        json::Value::Array(tokens) => {
            let mut symbols = Vec::with_capacity(tokens.len());
            
            for token in tokens {
                match token.as_str() {
                    Some(token) => symbols.push(token),
                    None => return Err(format!("Right-hand-side of '{}' must only contain strings", key)),
                }
            }
            
            Ok(Expansion::from_tokens(symbols))
        },
        _ => Err(format!("Right-hand-side of '{}' must be an array of strings or an array of arrays of strings", key)),
    }
}

pub(crate) fn parse_grammar(value: json::Value) -> Result<Vec<(NonTerminal, Vec<Expansion>)>, String> {
    let mut rules = Vec::new();
    
    let object = match value {
        json::Value::Object(object) => object,
        _ => return Err("Grammar must be specified as an object".to_string()),
    };
    
    for (key, value) in &object {
        // LHS must be a non-terminal
        let lhs = match NonTerminal::new(key.as_str()) {
            Some(lhs) => lhs,
            None => return Err(format!("'{}' is not a valid non-terminal", key)),
        };
        
        let rhs = match value {
            json::Value::Array(rhs) => rhs,
            _ => return Err(format!("Right-hand-side of '{}' must be an array", key)),
        };
        
        // Either all alternatives are strings or all are lists
        if let Some(first) = rhs.first() {
            if rhs.iter().any(|alt| alt.is_string() != first.is_string()) {
                return Err(format!("Right-hand-side of '{}' mixes strings and arrays", key));
            }
        }
        
        let mut expansions = Vec::with_capacity(rhs.len());
        
        for alternative in rhs {
            expansions.push(parse_alternative(key, alternative)?);
        }
        
        rules.push((lhs, expansions));
    }
    
    Ok(rules)
}

/// Parse grammar source text. C-style comments are allowed.
pub(crate) fn parse_reader<R: Read>(reader: R) -> Result<Vec<(NonTerminal, Vec<Expansion>)>, String> {
    let reader = StripComments::with_settings(CommentSettings::c_style(), reader);
    
    let value: json::Value = match json::from_reader(reader) {
        Ok(value) => value,
        Err(e) => return Err(format!("Invalid JSON syntax: {}", e)),
    };
    
    parse_grammar(value)
}

pub(crate) fn parse_json(path: &Path) -> Result<Vec<(NonTerminal, Vec<Expansion>)>, ParsingError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(ParsingError::new(path, format!("Could not open grammar file: {}", e))),
    };
    
    parse_reader(BufReader::new(file)).map_err(|e| ParsingError::new(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    
    fn parse(source: &str) -> Result<Vec<(NonTerminal, Vec<Expansion>)>, String> {
        parse_reader(source.as_bytes())
    }
    
    #[test]
    fn test_unsplit() {
        let rules = parse_json(Path::new("test-data/grammars/expr.json")).unwrap();
        assert_eq!(rules.len(), 5);
        assert_eq!(rules[0].0.as_str(), "<start>");
        assert_eq!(rules[1].1[0], Expansion::from_tokens(["<term>", "+", "<expr>"]));
    }
    
    #[test]
    fn test_split() {
        let rules = parse_json(Path::new("test-data/grammars/split.json")).unwrap();
        assert_eq!(rules[1].1[1], Expansion::from_tokens(["<var>", " = ", "<value>"]));
    }
    
    #[test]
    fn test_invalid_shapes() {
        assert!(parse("[1, 2]").is_err());
        assert!(parse(r#"{"start": ["a"]}"#).is_err());
        assert!(parse(r#"{"<start>": "a"}"#).is_err());
        assert!(parse(r#"{"<start>": [1]}"#).is_err());
        assert!(parse(r#"{"<start>": [["a", 1]]}"#).is_err());
        assert!(parse(r#"{"<start>": ["a" "b"]}"#).is_err());
        assert!(parse_json(Path::new("test-data/grammars/invalid-shape.json")).is_err());
    }
    
    #[test]
    fn test_missing_file() {
        let err = parse_json(Path::new("test-data/grammars/does-not-exist.json")).unwrap_err();
        assert_eq!(err.path(), Path::new("test-data/grammars/does-not-exist.json"));
    }
}
