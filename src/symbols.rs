//! Heuristic symbol extraction.
//!
//! Maps (file suffix, text content) to an ordered, deduplicated list of
//! declared symbols using a fixed per-suffix rule table. The rules are
//! line-start regexes, deliberately heuristic rather than an AST. Language
//! support is data: extending it means adding a table entry, not touching
//! the scan.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Symbol;

/// One (kind, line-start pattern) rule. Table order is match order.
struct SymbolRule {
    kind: &'static str,
    pattern: &'static str,
}

/// Per-suffix rule tables. Suffixes are matched case-insensitively.
const RULE_TABLE: &[(&str, &[SymbolRule])] = &[
    (
        ".go",
        &[
            // The optional parenthesized receiver clause is matched but not
            // captured, so methods index under their bare name.
            SymbolRule {
                kind: "func",
                pattern: r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "type",
                pattern: r"^\s*type\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "const",
                pattern: r"^\s*const\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "var",
                pattern: r"^\s*var\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
        ],
    ),
    (
        ".py",
        &[
            SymbolRule {
                kind: "class",
                pattern: r"^\s*class\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "def",
                pattern: r"^\s*def\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
        ],
    ),
    (
        ".ts",
        &[
            SymbolRule {
                kind: "function",
                pattern: r"^\s*function\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "class",
                pattern: r"^\s*class\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
        ],
    ),
    (
        ".tsx",
        &[
            SymbolRule {
                kind: "function",
                pattern: r"^\s*function\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "class",
                pattern: r"^\s*class\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
        ],
    ),
    (
        ".js",
        &[
            SymbolRule {
                kind: "function",
                pattern: r"^\s*function\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
            SymbolRule {
                kind: "class",
                pattern: r"^\s*class\s+([A-Za-z_][A-Za-z0-9_]*)",
            },
        ],
    ),
];

static COMPILED_RULES: LazyLock<HashMap<&'static str, Vec<(&'static str, Regex)>>> =
    LazyLock::new(|| {
        RULE_TABLE
            .iter()
            .map(|(suffix, rules)| {
                let compiled = rules
                    .iter()
                    .map(|rule| {
                        (
                            rule.kind,
                            Regex::new(rule.pattern).expect("invalid symbol rule pattern"),
                        )
                    })
                    .collect();
                (*suffix, compiled)
            })
            .collect()
    });

/// The compiled rule list for a path's suffix, or `None` when unsupported.
fn rules_for(path: &str) -> Option<&'static [(&'static str, Regex)]> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    COMPILED_RULES
        .get(format!(".{}", ext).as_str())
        .map(|rules| rules.as_slice())
}

/// Scan `content` and return declared symbols in first-seen order.
///
/// Every line is tested against every rule for the suffix, in table order. A
/// symbol name is recorded at most once across the whole scan: whichever
/// rule matches it first wins, and later matches of the same name under a
/// different kind are discarded. Unsupported suffixes yield an empty list.
pub fn extract_symbols(path: &str, content: &str) -> Vec<Symbol> {
    let Some(rules) = rules_for(path) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for line in content.lines() {
        for (kind, regex) in rules {
            let Some(captures) = regex.captures(line) else {
                continue;
            };
            let Some(name) = captures.get(1) else {
                continue;
            };
            let name = name.as_str();
            if !name.is_empty() && seen.insert(name.to_string()) {
                symbols.push(Symbol {
                    name: name.to_string(),
                    kind,
                });
            }
        }
    }
    symbols
}
