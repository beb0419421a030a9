// Licensed under the Apache-2.0 license

//! Identifier folding for generated names.
//!
//! Register and field names are free text (`"Debug Module Control"`,
//! `"hartsel[9:0]"`); every backend needs an identifier-safe spelling:
//!
//! - [`latex_identifier`] for TeX macro names, which may contain letters only,
//! - [`c_identifier`] for C macros and functions,
//! - [`camel_case`] and [`scala_identifier`] for Scala bundle types/fields,
//! - [`label`] for cross-reference anchors.

/// Digit runs spelled out by [`latex_identifier`], longest first so that
/// `32` becomes `thirtytwo` rather than `threetwo`.
const SPELLED: &[(&str, &str)] = &[
    ("64", "sixtyfour"),
    ("32", "thirtytwo"),
    ("28", "twentyeight"),
    ("16", "sixteen"),
    ("15", "fifteen"),
    ("11", "eleven"),
    ("9", "nine"),
    ("8", "eight"),
    ("7", "seven"),
    ("6", "six"),
    ("5", "five"),
    ("4", "four"),
    ("3", "three"),
    ("2", "two"),
    ("1", "one"),
    ("0", "zero"),
];

/// Fold `text` into letters only: digits are spelled out and everything
/// else that is not alphanumeric is dropped.
///
/// # Examples
/// ```
/// use regspec_generator::util::latex_identifier;
/// assert_eq!(latex_identifier("sbaccess32"), "sbaccessthirtytwo");
/// assert_eq!(latex_identifier("data 0"), "datazero");
/// ```
pub fn latex_identifier(text: &str) -> String {
    let mut result: String = text.chars().filter(|c| c.is_alphanumeric()).collect();
    for (digits, word) in SPELLED {
        result = result.replace(digits, word);
    }
    result
}

/// Join the folded parts of a multi-part name, capitalizing every part after
/// the first.
///
/// # Examples
/// ```
/// use regspec_generator::util::latex_identifier_parts;
/// assert_eq!(latex_identifier_parts(&["dcsr", "step"]), "dcsrStep");
/// ```
pub fn latex_identifier_parts(parts: &[&str]) -> String {
    let mut result = String::new();
    for (i, part) in parts.iter().enumerate() {
        let folded = latex_identifier(part);
        if i == 0 {
            result.push_str(&folded);
        } else {
            let mut chars = folded.chars();
            if let Some(first) = chars.next() {
                result.extend(first.to_uppercase());
                result.push_str(chars.as_str());
            }
        }
    }
    result
}

/// Replace every non-word character with `_`.
///
/// # Examples
/// ```
/// use regspec_generator::util::c_identifier;
/// assert_eq!(c_identifier("hart sel.lo"), "hart_sel_lo");
/// ```
pub fn c_identifier(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Cross-reference label: lowercase, with whitespace removed.
pub fn label(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Converts a name to CamelCase (PascalCase).
///
/// Handles various edge cases:
/// - Leading digits get underscore prefix
/// - Punctuation and whitespace start a new word
///
/// # Examples
/// ```
/// use regspec_generator::util::camel_case;
/// assert_eq!(camel_case("debug module_status"), "DebugModuleStatus");
/// assert_eq!(camel_case("DMCONTROL"), "Dmcontrol");
/// ```
pub fn camel_case(name: &str) -> String {
    let mut result = String::new();
    if let Some(c) = name.chars().next() {
        if c.is_ascii_digit() {
            result.push('_');
        }
    }
    let mut upper_next = true;
    for c in name.chars() {
        if c.is_ascii_punctuation() || c.is_ascii_whitespace() {
            upper_next = true;
        } else {
            result.push(if upper_next {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            });
            upper_next = false;
        }
    }
    result
}

/// Lowercase C identifier that is also a legal Scala `val` name.
pub fn scala_identifier(name: &str) -> String {
    let mut result = c_identifier(name).to_lowercase();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    tweak_keywords(&result).to_string()
}

/// Appends underscore suffix to Scala keywords to avoid conflicts.
fn tweak_keywords(s: &str) -> &str {
    match s {
        "abstract" => "abstract_",
        "case" => "case_",
        "catch" => "catch_",
        "class" => "class_",
        "def" => "def_",
        "do" => "do_",
        "else" => "else_",
        "extends" => "extends_",
        "false" => "false_",
        "final" => "final_",
        "for" => "for_",
        "if" => "if_",
        "implicit" => "implicit_",
        "import" => "import_",
        "lazy" => "lazy_",
        "match" => "match_",
        "new" => "new_",
        "null" => "null_",
        "object" => "object_",
        "override" => "override_",
        "package" => "package_",
        "private" => "private_",
        "protected" => "protected_",
        "return" => "return_",
        "sealed" => "sealed_",
        "super" => "super_",
        "this" => "this_",
        "throw" => "throw_",
        "trait" => "trait_",
        "true" => "true_",
        "try" => "try_",
        "type" => "type_",
        "val" => "val_",
        "var" => "var_",
        "while" => "while_",
        "with" => "with_",
        "yield" => "yield_",
        s => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latex_identifier() {
        assert_eq!(latex_identifier("abstractauto"), "abstractauto");
        assert_eq!(latex_identifier("data11"), "dataeleven");
        assert_eq!(latex_identifier("sbaddress3"), "sbaddressthree");
        assert_eq!(latex_identifier("progbuf15"), "progbuffifteen");
        assert_eq!(latex_identifier("a/b (c)\\_d"), "abcd");
        // Sequential replacement, so 164 folds the 64 first.
        assert_eq!(latex_identifier("x164"), "xonesixtyfour");
    }

    #[test]
    fn test_latex_identifier_parts() {
        assert_eq!(latex_identifier_parts(&["dmcontrol", "haltreq"]), "dmcontrolHaltreq");
        assert_eq!(latex_identifier_parts(&["sb", "32", "x"]), "sbThirtytwoX");
        assert_eq!(latex_identifier_parts(&["a", ""]), "a");
    }

    #[test]
    fn test_c_identifier() {
        assert_eq!(c_identifier("sbaccess128"), "sbaccess128");
        assert_eq!(c_identifier("a-b c"), "a_b_c");
    }

    #[test]
    fn test_label() {
        assert_eq!(label("Debug Module Status"), "debugmodulestatus");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("my_register"), "MyRegister");
        assert_eq!(camel_case("0abc"), "_0abc");
        assert_eq!(camel_case("type"), "Type");
    }

    #[test]
    fn test_scala_identifier() {
        assert_eq!(scala_identifier("Type"), "type_");
        assert_eq!(scala_identifier("0"), "_0");
        assert_eq!(scala_identifier("hart.sel"), "hart_sel");
    }
}
