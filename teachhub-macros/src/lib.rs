//! Procedural macros for the TeachHub backend
//!
//! - `mutation_result!` - declare the `{ success, error, <entity> }` payload
//!   returned by every create/update mutation

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Attribute, Ident, Token, Type};

/// Declare a GraphQL mutation payload.
///
/// # Usage
///
/// ```ignore
/// mutation_result!(
///     /// Result of creating or updating a course
///     CourseResult, course: Course
/// );
///
/// // No entity, only the status fields
/// mutation_result!(MutationResult);
/// ```
///
/// The generated struct derives `async_graphql::SimpleObject` and gets two
/// constructors: `ok(..)` and `failure(message)`. When an entity field is
/// declared it is `None` on failure.
#[proc_macro]
pub fn mutation_result(input: TokenStream) -> TokenStream {
    let MutationResultInput { attrs, name, field } = parse_macro_input!(input as MutationResultInput);

    let output = match field {
        Some((field_name, field_type)) => quote! {
            #(#attrs)*
            #[derive(Debug, Clone, async_graphql::SimpleObject)]
            pub struct #name {
                /// Whether the mutation was applied
                pub success: bool,
                /// Reason the mutation was rejected
                pub error: Option<String>,
                pub #field_name: Option<#field_type>,
            }

            impl #name {
                pub fn ok(#field_name: #field_type) -> Self {
                    Self {
                        success: true,
                        error: None,
                        #field_name: Some(#field_name),
                    }
                }

                pub fn failure(message: impl Into<String>) -> Self {
                    Self {
                        success: false,
                        error: Some(message.into()),
                        #field_name: None,
                    }
                }
            }
        },
        None => quote! {
            #(#attrs)*
            #[derive(Debug, Clone, async_graphql::SimpleObject)]
            pub struct #name {
                /// Whether the mutation was applied
                pub success: bool,
                /// Reason the mutation was rejected
                pub error: Option<String>,
            }

            impl #name {
                pub fn ok() -> Self {
                    Self { success: true, error: None }
                }

                pub fn failure(message: impl Into<String>) -> Self {
                    Self {
                        success: false,
                        error: Some(message.into()),
                    }
                }
            }
        },
    };

    output.into()
}

struct MutationResultInput {
    attrs: Vec<Attribute>,
    name: Ident,
    field: Option<(Ident, Type)>,
}

impl Parse for MutationResultInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let name: Ident = input.parse()?;

        let field = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            let field_name: Ident = input.parse()?;
            input.parse::<Token![:]>()?;
            let field_type: Type = input.parse()?;
            Some((field_name, field_type))
        } else {
            None
        };

        // tolerate a trailing comma
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }

        Ok(MutationResultInput { attrs, name, field })
    }
}
