//! Right-hand-side expression assembly
//!
//! Turns the reactions of one region into one rate-of-change expression per
//! species: `Σ ν · (rate)` over every reaction where the species has a
//! non-zero net coefficient. Local reaction parameters are substituted as
//! literal values before the expression reaches a math backend.

use super::ReactionDef;

/// Replace every standalone identifier named in `parameters` by its value
///
/// Function names (identifiers directly followed by `(`) and the exponent part
/// of numeric literals are left untouched. Values are wrapped in parentheses
/// so negative parameters stay correct next to any operator.
pub fn inline_parameters(expression: &str, parameters: &[(String, f64)]) -> String {
    if parameters.is_empty() {
        return expression.to_string();
    }

    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // exponent: 1e-3, 2.5E+7
            if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                let mut j = i + 1;
                if j < chars.len() && matches!(chars[j], '+' | '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            out.extend(&chars[start..i]);
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();

            let is_call = chars[i..].iter().find(|c| !c.is_whitespace()) == Some(&'(');
            match parameters.iter().find(|(p, _)| *p == name) {
                Some((_, value)) if !is_call => out.push_str(&format!("({})", value)),
                _ => out.push_str(&name),
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Build the net rate expression of each species in `species`
///
/// Reactions are taken in the given order; a species untouched by every
/// reaction gets the expression `0`.
pub fn rate_expressions(species: &[String], reactions: &[&ReactionDef]) -> Vec<String> {
    let rates: Vec<String> = reactions
        .iter()
        .map(|r| inline_parameters(&r.rate, &r.parameters))
        .collect();

    species
        .iter()
        .map(|s| {
            let mut expression = String::new();
            for (reaction, rate) in reactions.iter().zip(&rates) {
                let nu = reaction.coefficient(s);
                if nu == 0.0 {
                    continue;
                }
                let magnitude = nu.abs();
                let term = if magnitude == 1.0 {
                    format!("({})", rate)
                } else {
                    format!("{} * ({})", magnitude, rate)
                };
                if expression.is_empty() {
                    if nu < 0.0 {
                        expression.push('-');
                    }
                } else {
                    expression.push_str(if nu < 0.0 { " - " } else { " + " });
                }
                expression.push_str(&term);
            }
            if expression.is_empty() {
                expression.push('0');
            }
            expression
        })
        .collect()
}
