use proc_macro::TokenStream;
use syn::LitStr;

mod codegen;
mod validate;

/// The key! macro for compile-time checked translation keys.
///
/// Validates a dotted key literal against the key alphabet and expands to a
/// `::lokal::Key` built without runtime validation. An invalid literal is a
/// compile error pointing at the literal.
///
/// # Example
///
/// ```ignore
/// let key = key!("UI.Item.Sword.name");
/// assert_eq!(key.len(), 4);
///
/// // error: key "UI..name" has an empty segment at index 1
/// let bad = key!("UI..name");
/// ```
#[proc_macro]
pub fn key(input: TokenStream) -> TokenStream {
    let literal = syn::parse_macro_input!(input as LitStr);

    match validate::validate(&literal) {
        Ok(segments) => codegen::codegen(&segments).into(),
        Err(e) => e.to_compile_error().into(),
    }
}
