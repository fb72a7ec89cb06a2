//! Expansion of validated key literals.

use proc_macro2::TokenStream;
use quote::quote;

/// Expands to a `Key` built from already validated segments.
pub fn codegen(segments: &[String]) -> TokenStream {
    quote! {
        ::lokal::Key::from_validated_segments(&[#(#segments),*])
    }
}
