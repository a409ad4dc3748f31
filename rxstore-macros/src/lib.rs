//! Procedural macros for rxstore

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(ActionTypes)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action_types), supports(enum_unit))]
struct ActionTypesOpts {
    ident: syn::Ident,
    data: darling::ast::Data<ActionTypeVariant, ()>,

    /// Prepended to every default canonical value (namespacing)
    #[darling(default)]
    prefix: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action_type))]
struct ActionTypeVariant {
    ident: syn::Ident,

    /// Explicit symbolic name
    #[darling(default)]
    name: Option<String>,

    /// Explicit canonical value (the prefix is not applied)
    #[darling(default)]
    value: Option<String>,
}

/// Convert PascalCase to SCREAMING_SNAKE_CASE
///
/// Acronyms stay together: `HTTPFetch` becomes `HTTP_FETCH`.
fn to_screaming_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                result.push('_');
            }
        }
        result.extend(ch.to_uppercase());
    }
    result
}

/// Derive macro for the ActionTypeSet trait
///
/// Each unit variant becomes one action type. The symbolic name defaults to
/// the variant name in SCREAMING_SNAKE_CASE; the canonical value defaults to
/// the optional container `prefix` followed by the name.
///
/// Also generates inherent `name()`, `value()` and `all()` helpers so the
/// trait does not need to be in scope.
///
/// # Example
/// ```ignore
/// #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
/// #[action_types(prefix = "menu/")]
/// enum MenuAction {
///     Open,
///     SaveAs,
///     #[action_type(value = "UNDO_REDO")]
///     UndoRedo,
/// }
///
/// assert_eq!(MenuAction::SaveAs.name(), "SAVE_AS");
/// assert_eq!(MenuAction::SaveAs.value(), "menu/SAVE_AS");
/// assert_eq!(MenuAction::UndoRedo.value(), "UNDO_REDO");
/// ```
#[proc_macro_derive(ActionTypes, attributes(action_types, action_type))]
pub fn derive_action_types(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionTypesOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "ActionTypes can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let prefix = opts.prefix.clone().unwrap_or_default();
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(variants.len());

    for v in variants.iter() {
        let symbolic = v
            .name
            .clone()
            .unwrap_or_else(|| to_screaming_snake_case(&v.ident.to_string()));
        if symbolic.is_empty() {
            return syn::Error::new_spanned(&v.ident, "action type name must not be empty")
                .to_compile_error()
                .into();
        }
        if !seen.insert(symbolic.clone()) {
            return syn::Error::new_spanned(
                &v.ident,
                format!("duplicate action type name `{}`", symbolic),
            )
            .to_compile_error()
            .into();
        }
        let canonical = v
            .value
            .clone()
            .unwrap_or_else(|| format!("{}{}", prefix, symbolic));
        entries.push((&v.ident, symbolic, canonical));
    }

    let name_arms = entries.iter().map(|(variant, symbolic, _)| {
        quote! { #name::#variant => #symbolic }
    });
    let value_arms = entries.iter().map(|(variant, _, canonical)| {
        quote! { #name::#variant => #canonical }
    });
    let all_variants = entries.iter().map(|(variant, _, _)| quote! { #name::#variant });

    let expanded: proc_macro2::TokenStream = quote! {
        impl #name {
            /// Symbolic name used to subscribe
            pub fn name(&self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }

            /// Canonical value carried by dispatched events
            pub fn value(&self) -> &'static str {
                match self {
                    #(#value_arms,)*
                }
            }

            /// Every action type of this set
            pub fn all() -> &'static [Self] {
                static ALL: &[#name] = &[#(#all_variants),*];
                ALL
            }
        }

        impl rxstore::ActionTypeSet for #name {
            fn name(&self) -> &'static str {
                #name::name(self)
            }

            fn value(&self) -> &'static str {
                #name::value(self)
            }

            fn all() -> &'static [Self] {
                #name::all()
            }
        }
    };

    TokenStream::from(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("Save"), "SAVE");
        assert_eq!(to_screaming_snake_case("UndoRedo"), "UNDO_REDO");
        assert_eq!(to_screaming_snake_case("HTTPFetch"), "HTTP_FETCH");
        assert_eq!(to_screaming_snake_case("Page2Next"), "PAGE2_NEXT");
    }
}
