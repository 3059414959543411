//! Inline `style` attribute declarations.
//!
//! Only the flat `property: value; ...` form is handled. Values containing
//! `;` inside quotes or `url()` are not supported.

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// Split a style attribute into declarations. Each chunk is split at its
/// first `:`; chunks without a colon or with an empty side are skipped.
pub fn parse_declarations(style: &str) -> Vec<Declaration> {
    style
        .split(';')
        .filter_map(|chunk| {
            let (property, value) = chunk.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration {
                property: property.to_ascii_lowercase(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Join declarations with `; `.
pub fn serialize_declarations(decls: &[Declaration]) -> String {
    decls
        .iter()
        .map(|d| format!("{}: {}", d.property, d.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Read one property from a style attribute.
pub fn get_property(style: &str, property: &str) -> Option<String> {
    let property = to_kebab_case(property);
    parse_declarations(style)
        .into_iter()
        .rev()
        .find(|d| d.property == property)
        .map(|d| d.value)
}

/// Set one property, replacing an existing declaration in place or
/// appending. An empty value removes the property.
pub fn set_property(style: &str, property: &str, value: &str) -> String {
    let property = to_kebab_case(property);
    let value = value.trim();
    let mut decls = parse_declarations(style);
    match decls.iter().position(|d| d.property == property) {
        Some(_) if value.is_empty() => decls.retain(|d| d.property != property),
        Some(pos) => {
            decls[pos].value = value.to_string();
            let mut seen = false;
            decls.retain(|d| {
                if d.property != property {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None if value.is_empty() => {}
        None => decls.push(Declaration {
            property,
            value: value.to_string(),
        }),
    }
    serialize_declarations(&decls)
}

/// `backgroundColor` → `background-color`. Names already in kebab-case and
/// custom properties (`--x`) pass through unchanged.
pub fn to_kebab_case(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
