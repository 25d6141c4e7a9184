// src/report/demangle.rs

use cpp_demangle::{DemangleOptions, Symbol};

/// Opening marker of a quoted symbol, as in linker output like
/// ``undefined reference to `_ZN3foo3barEv'``.
const OPEN: &str = "`_";
const CLOSE: char = '\'';

/// Raw symbols (marker and quote stripped) quoted on one line.
pub fn mangled_tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace().filter_map(|token| {
        if !token.starts_with(OPEN) {
            return None;
        }
        // Keep the leading underscore; only the backtick is the marker.
        token[1..].strip_suffix(CLOSE)
    })
}

/// Best-effort demangling. `None` when the symbol does not parse or
/// demangles to itself.
pub fn demangle_symbol(raw: &str) -> Option<String> {
    let symbol = Symbol::new(raw).ok()?;
    let demangled = symbol.demangle(&DemangleOptions::default()).ok()?;
    (demangled != raw).then_some(demangled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_quoted_symbols_only() {
        let line = "foo.o: undefined reference to `_ZN3foo3barEv' and `bar' and _Zplain";
        let tokens: Vec<_> = mangled_tokens(line).collect();
        assert_eq!(tokens, vec!["_ZN3foo3barEv"]);
    }

    #[test]
    fn unterminated_quote_is_ignored() {
        assert_eq!(mangled_tokens("`_ZN3foo3barEv").count(), 0);
    }

    #[test]
    fn demangles_itanium_symbols() {
        assert_eq!(demangle_symbol("_ZN3foo3barEv").as_deref(), Some("foo::bar()"));
    }

    #[test]
    fn garbage_is_not_demangled() {
        assert_eq!(demangle_symbol("_not_a_symbol"), None);
    }
}
