use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, DeriveInput};

/// Derive `nestrouter::resolver::Dependency` for a type that implements `Default`.
///
/// The generated `construct` never fails; write the impl by hand when
/// construction can fail.
#[proc_macro_derive(Dependency)]
pub fn derive_dependency(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let ident = &input.ident;

    let mut generics = input.generics.clone();
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote! { Self: ::std::default::Default + 'static });
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::nestrouter::resolver::Dependency for #ident #ty_generics #where_clause {
            fn construct() -> ::std::result::Result<Self, ::nestrouter::resolver::DependencyError> {
                ::std::result::Result::Ok(<Self as ::std::default::Default>::default())
            }
        }
    };
    TokenStream::from(expanded)
}
