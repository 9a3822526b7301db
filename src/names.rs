//! Identifier case conversion
//!
//! Shared by the IR builder (derived operation ids) and the render helpers
//! (symbol-safe names in generated code). All functions are pure.

/// Words that cannot be used as bare identifiers in generated TypeScript
const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "let", "static", "yield", "await",
    "implements", "interface", "package", "private", "protected", "public",
];

/// Split an identifier-ish string into words.
///
/// Boundaries are non-alphanumeric characters, lower→upper transitions and
/// the end of an acronym (`HTTPServer` → `HTTP`, `Server`).
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

/// `order-items` → `OrderItems`, `productId` → `ProductId`
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// `order-items` → `orderItems`, `ProductId` → `productId`
pub fn to_camel_case(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::with_capacity(s.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// `ProductId` → `product_id`
pub fn to_snake_case(s: &str) -> String {
    join_lower(s, "_")
}

/// `ProductId` → `product-id`
pub fn to_kebab_case(s: &str) -> String {
    join_lower(s, "-")
}

/// `productId` → `PRODUCT_ID`
pub fn to_constant_case(s: &str) -> String {
    to_snake_case(s).to_ascii_uppercase()
}

fn join_lower(s: &str, separator: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Make a camelCase name usable as a TypeScript binding
pub fn safe_identifier(s: &str) -> String {
    let mut name = to_camel_case(s);
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if RESERVED_WORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

/// Whether a property name can appear unquoted in an object literal/type
pub fn is_plain_property(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}
