//! Extra-argument tokenizer
//!
//! A loose splitter for the `other` field, not a shell lexer: quote
//! characters are kept in the output and nothing is unescaped.

const QUOTES: [char; 2] = ['"', '\''];

enum Run {
    /// A word that is exactly one quote character
    Lone(char),
    /// A word starting with a quote that it does not close
    Attached(char),
}

fn opens_run(word: &str) -> Option<Run> {
    let quote = word.chars().next().filter(|c| QUOTES.contains(c))?;
    if word.len() == quote.len_utf8() {
        Some(Run::Lone(quote))
    } else if word.ends_with(quote) {
        None
    } else {
        Some(Run::Attached(quote))
    }
}

/// Split extra runner arguments into command tokens
///
/// Words are separated by ASCII spaces. A lone `"` or `'` word starts a run
/// that swallows the following words, without separators, up to the next
/// lone matching quote. A word such as `"b` starts a run that is rejoined
/// with single spaces up to a word ending in the same quote. Unclosed runs
/// are emitted as accumulated.
pub fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut words = raw.split(' ').filter(|word| !word.is_empty());

    while let Some(word) = words.next() {
        let mut buffer = word.to_string();
        match opens_run(word) {
            Some(Run::Lone(quote)) => {
                for next in words.by_ref() {
                    buffer.push_str(next);
                    if next.len() == quote.len_utf8() && next.starts_with(quote) {
                        break;
                    }
                }
            }
            Some(Run::Attached(quote)) => {
                for next in words.by_ref() {
                    buffer.push(' ');
                    buffer.push_str(next);
                    if next.ends_with(quote) {
                        break;
                    }
                }
            }
            None => {}
        }
        tokens.push(buffer);
    }

    tokens
}
