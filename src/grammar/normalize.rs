use crate::grammar::{Expansion, NonTerminal, Symbol, Terminal};

/// Length of the non-terminal token at the start of `buf`, if there is one.
/// A non-terminal is a `<`, followed by anything but `<`, `>` or a space, followed by `>`.
fn nonterminal_len(buf: &[u8]) -> Option<usize> {
    if buf.first() != Some(&b'<') {
        return None;
    }
    
    for (i, c) in buf.iter().enumerate().skip(1) {
        match c {
            b'>' => return Some(i + 1),
            b'<' | b' ' => return None,
            _ => {},
        }
    }
    
    None
}

/// Split an alternative like `"(<expr>)"` into the symbols `(`, `<expr>`, `)`.
/// Text between non-terminals becomes a single terminal. The empty string
/// yields one empty terminal.
pub(crate) fn split_expansion(alternative: &str) -> Expansion {
    if alternative.is_empty() {
        return Expansion::new(vec![Symbol::Terminal(Terminal::new(""))]);
    }
    
    let buf = alternative.as_bytes();
    let mut symbols = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;
    
    while cursor < buf.len() {
        match nonterminal_len(&buf[cursor..]) {
            Some(len) => {
                if text_start < cursor {
                    symbols.push(Symbol::Terminal(Terminal::new(&alternative[text_start..cursor])));
                }
                
                // Bracket and delimiters are ASCII so the slice is on char boundaries
                let token = &alternative[cursor..cursor + len];
                symbols.push(match NonTerminal::new(token) {
                    Some(nonterm) => Symbol::NonTerminal(nonterm),
                    None => Symbol::Terminal(Terminal::new(token)),
                });
                
                cursor += len;
                text_start = cursor;
            },
            None => cursor += 1,
        }
    }
    
    if text_start < buf.len() {
        symbols.push(Symbol::Terminal(Terminal::new(&alternative[text_start..])));
    }
    
    Expansion::new(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    
    fn tokens(alternative: &str) -> Vec<String> {
        split_expansion(alternative).symbols().iter().map(|s| s.as_str().to_string()).collect()
    }
    
    #[test]
    fn test_split() {
        assert_eq!(tokens("<term>+<expr>"), vec!["<term>", "+", "<expr>"]);
        assert_eq!(tokens("(<expr>)"), vec!["(", "<expr>", ")"]);
        assert_eq!(tokens("<a><b>"), vec!["<a>", "<b>"]);
        assert_eq!(tokens("7"), vec!["7"]);
    }
    
    #[test]
    fn test_split_empty() {
        assert_eq!(tokens(""), vec![""]);
    }
    
    #[test]
    fn test_split_brackets_in_text() {
        assert_eq!(tokens("a<b<c>"), vec!["a<b", "<c>"]);
        assert_eq!(tokens("x < y"), vec!["x < y"]);
        assert_eq!(tokens("<not a nt>"), vec!["<not a nt>"]);
        assert_eq!(tokens("1 <op> 2"), vec!["1 ", "<op>", " 2"]);
    }
    
    #[test]
    fn test_split_classifies() {
        let expansion = split_expansion("<digit>.<digit>");
        assert_eq!(expansion.nonterminals().len(), 2);
        assert!(matches!(expansion.symbols()[1], Symbol::Terminal(_)));
    }
}
